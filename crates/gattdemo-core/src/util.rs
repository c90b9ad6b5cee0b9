//! Helpers for turning btleplug identities into [`PeripheralInfo`].

use btleplug::api::PeripheralProperties;
use btleplug::platform::PeripheralId;

use gattdemo_types::PeripheralInfo;

/// Address btleplug reports on macOS, where MAC addresses are hidden.
const HIDDEN_ADDRESS: &str = "00:00:00:00:00:00";

/// Format a peripheral ID as a string.
///
/// `PeripheralId` only exposes its value through `Debug`, which wraps it
/// as `PeripheralId(...)`.
pub fn format_peripheral_id(id: &PeripheralId) -> String {
    strip_id_wrapper(&format!("{:?}", id)).to_string()
}

fn strip_id_wrapper(debug: &str) -> &str {
    debug
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
}

/// Pick the identifier to show for a peripheral: its address, or the
/// platform ID where the address is hidden.
pub fn create_identifier(address: &str, peripheral_id: &PeripheralId) -> String {
    choose_identifier(address, || format_peripheral_id(peripheral_id))
}

fn choose_identifier(address: &str, fallback: impl FnOnce() -> String) -> String {
    if address == HIDDEN_ADDRESS {
        fallback()
    } else {
        address.to_string()
    }
}

/// Build a [`PeripheralInfo`] from the properties btleplug collected.
pub fn peripheral_info(id: &PeripheralId, properties: Option<&PeripheralProperties>) -> PeripheralInfo {
    match properties {
        Some(props) => PeripheralInfo {
            id: create_identifier(&props.address.to_string(), id),
            name: props.local_name.clone(),
            services: props.services.clone(),
            rssi: props.rssi,
        },
        None => PeripheralInfo::new(format_peripheral_id(id), None),
    }
}
