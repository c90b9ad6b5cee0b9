//! Bluetooth UUIDs for the standard GATT services the demo talks to.
//!
//! Besides the constants, this module resolves the names used in
//! configuration files: Web Bluetooth style well-known names
//! (`battery_service`), 16-bit aliases (`0x180f`, `180F`) and full UUIDs.

use uuid::{Uuid, uuid};

use crate::error::{ParseError, ParseResult};

/// Bluetooth Base UUID; 16-bit aliases are substituted into its first field.
pub const BASE_UUID: Uuid = uuid!("00000000-0000-1000-8000-00805f9b34fb");

// --- Standard BLE Service UUIDs ---

/// Generic Access Profile (GAP) service.
pub const GAP_SERVICE: Uuid = uuid!("00001800-0000-1000-8000-00805f9b34fb");

/// Generic Attribute Profile (GATT) service.
pub const GATT_SERVICE: Uuid = uuid!("00001801-0000-1000-8000-00805f9b34fb");

/// Device Information service.
pub const DEVICE_INFO_SERVICE: Uuid = uuid!("0000180a-0000-1000-8000-00805f9b34fb");

/// Battery service.
pub const BATTERY_SERVICE: Uuid = uuid!("0000180f-0000-1000-8000-00805f9b34fb");

// --- Device Information Characteristic UUIDs ---

/// Device name characteristic.
pub const DEVICE_NAME: Uuid = uuid!("00002a00-0000-1000-8000-00805f9b34fb");

/// System ID characteristic.
pub const SYSTEM_ID: Uuid = uuid!("00002a23-0000-1000-8000-00805f9b34fb");

/// Model number string characteristic.
pub const MODEL_NUMBER: Uuid = uuid!("00002a24-0000-1000-8000-00805f9b34fb");

/// Serial number string characteristic.
pub const SERIAL_NUMBER: Uuid = uuid!("00002a25-0000-1000-8000-00805f9b34fb");

/// Firmware revision string characteristic.
pub const FIRMWARE_REVISION: Uuid = uuid!("00002a26-0000-1000-8000-00805f9b34fb");

/// Hardware revision string characteristic.
pub const HARDWARE_REVISION: Uuid = uuid!("00002a27-0000-1000-8000-00805f9b34fb");

/// Software revision string characteristic.
pub const SOFTWARE_REVISION: Uuid = uuid!("00002a28-0000-1000-8000-00805f9b34fb");

/// Manufacturer name string characteristic.
pub const MANUFACTURER_NAME: Uuid = uuid!("00002a29-0000-1000-8000-00805f9b34fb");

/// PnP ID characteristic.
pub const PNP_ID: Uuid = uuid!("00002a50-0000-1000-8000-00805f9b34fb");

// --- Battery Characteristic UUIDs ---

/// Battery level characteristic.
pub const BATTERY_LEVEL: Uuid = uuid!("00002a19-0000-1000-8000-00805f9b34fb");

const SERVICE_NAMES: &[(&str, Uuid)] = &[
    ("generic_access", GAP_SERVICE),
    ("generic_attribute", GATT_SERVICE),
    ("device_information", DEVICE_INFO_SERVICE),
    ("battery_service", BATTERY_SERVICE),
];

const CHARACTERISTIC_NAMES: &[(&str, Uuid)] = &[
    ("gap.device_name", DEVICE_NAME),
    ("battery_level", BATTERY_LEVEL),
    ("system_id", SYSTEM_ID),
    ("model_number_string", MODEL_NUMBER),
    ("serial_number_string", SERIAL_NUMBER),
    ("firmware_revision_string", FIRMWARE_REVISION),
    ("hardware_revision_string", HARDWARE_REVISION),
    ("software_revision_string", SOFTWARE_REVISION),
    ("manufacturer_name_string", MANUFACTURER_NAME),
    ("pnp_id", PNP_ID),
];

/// Build a full UUID from a 16-bit SIG-assigned alias.
#[must_use]
pub const fn from_short(alias: u16) -> Uuid {
    Uuid::from_u128(BASE_UUID.as_u128() | ((alias as u128) << 96))
}

/// Return the 16-bit alias of a UUID built on the Bluetooth Base UUID.
#[must_use]
pub fn to_short(uuid: Uuid) -> Option<u16> {
    let value = uuid.as_u128();
    let mask = !(0xFFFF_FFFFu128 << 96);
    if value & mask == BASE_UUID.as_u128() && value >> 112 == 0 {
        Some((value >> 96) as u16)
    } else {
        None
    }
}

/// Resolve a service name, alias or UUID string.
///
/// # Examples
///
/// ```
/// use gattdemo_types::uuid::{resolve_service, BATTERY_SERVICE};
///
/// assert_eq!(resolve_service("battery_service").unwrap(), BATTERY_SERVICE);
/// assert_eq!(resolve_service("0x180F").unwrap(), BATTERY_SERVICE);
/// ```
pub fn resolve_service(name: &str) -> ParseResult<Uuid> {
    resolve(name, SERVICE_NAMES)
}

/// Resolve a characteristic name, alias or UUID string.
pub fn resolve_characteristic(name: &str) -> ParseResult<Uuid> {
    resolve(name, CHARACTERISTIC_NAMES)
}

fn resolve(name: &str, table: &[(&str, Uuid)]) -> ParseResult<Uuid> {
    let trimmed = name.trim();
    let lower = trimmed.to_ascii_lowercase();

    if let Some((_, uuid)) = table.iter().find(|(known, _)| *known == lower) {
        return Ok(*uuid);
    }

    let hex = lower.strip_prefix("0x").unwrap_or(&lower);
    if (1..=4).contains(&hex.len())
        && let Ok(alias) = u16::from_str_radix(hex, 16)
    {
        return Ok(from_short(alias));
    }

    Uuid::parse_str(trimmed).map_err(|_| ParseError::UnknownUuidName(trimmed.to_string()))
}

/// Human-readable label for a known characteristic.
#[must_use]
pub fn characteristic_label(uuid: Uuid) -> Option<&'static str> {
    let label = match uuid {
        DEVICE_NAME => "Device Name",
        BATTERY_LEVEL => "Battery Level",
        SYSTEM_ID => "System ID",
        MODEL_NUMBER => "Model Number",
        SERIAL_NUMBER => "Serial Number",
        FIRMWARE_REVISION => "Firmware Revision",
        HARDWARE_REVISION => "Hardware Revision",
        SOFTWARE_REVISION => "Software Revision",
        MANUFACTURER_NAME => "Manufacturer Name",
        PNP_ID => "PnP ID",
        _ => return None,
    };
    Some(label)
}

/// Human-readable label for a known service.
#[must_use]
pub fn service_label(uuid: Uuid) -> Option<&'static str> {
    let label = match uuid {
        GAP_SERVICE => "Generic Access",
        GATT_SERVICE => "Generic Attribute",
        DEVICE_INFO_SERVICE => "Device Information",
        BATTERY_SERVICE => "Battery",
        _ => return None,
    };
    Some(label)
}
