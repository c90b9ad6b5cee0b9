//! Conditional visibility of screen content and actions.

use crate::state::ConnectionState;
use crate::workflow::StepId;

/// Produce `content` when `when` holds, nothing otherwise.
pub fn visible<T>(when: bool, content: impl FnOnce() -> T) -> Option<T> {
    when.then(content)
}

/// Actions to offer for the given state, in menu order.
///
/// | State | Actions |
/// |-------|---------|
/// | no peripheral | discover peripheral, list known peripherals |
/// | peripheral, no session | open session |
/// | session | close session, then per branch: discover the service, or read it once discovered |
pub fn visible_actions(state: &ConnectionState) -> Vec<StepId> {
    let session = state.has_session();
    let groups = [
        visible(!state.has_peripheral(), || {
            vec![StepId::DiscoverPeripheral, StepId::ListKnownPeripherals]
        }),
        visible(state.has_peripheral() && !session, || vec![StepId::OpenSession]),
        visible(session, || vec![StepId::CloseSession]),
        visible(session && !state.has_battery_service(), || {
            vec![StepId::DiscoverBatteryService]
        }),
        visible(session && state.has_battery_service(), || {
            vec![StepId::ReadBatteryLevel]
        }),
        visible(session && !state.has_info_service(), || {
            vec![StepId::DiscoverInfoService]
        }),
        visible(session && state.has_info_service(), || {
            vec![StepId::ReadInfoFields]
        }),
    ];
    groups.into_iter().flatten().flatten().collect()
}
