//! Text rendering of the workflow screen.
//!
//! The screen is a list of panels, each shown only while the state it
//! describes exists, followed by the activity log.

use gattdemo_core::{ConnectionState, LogEntry, visible};
use gattdemo_types::PeripheralInfo;

use crate::style;

fn peripheral_panel(state: &ConnectionState, no_color: bool) -> Option<Vec<String>> {
    let peripheral = state.peripheral()?;
    let session = if state.has_session() {
        "connected"
    } else {
        "not connected"
    };
    Some(vec![
        style::heading("Device", no_color),
        format!("Device Name: {}", peripheral.name().unwrap_or("Unknown")),
        format!("Device Id:   {}", peripheral.id()),
        format!("GATT:        {}", session),
    ])
}

fn battery_panel(level: u8, no_color: bool) -> Vec<String> {
    vec![
        style::heading("Battery", no_color),
        format!("Battery Level: {}", style::format_battery(level, no_color)),
    ]
}

fn info_panel(state: &ConnectionState, no_color: bool) -> Vec<String> {
    let fields = state.info_fields().unwrap_or_default();
    let joined = fields
        .iter()
        .map(|f| f.value.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = vec![
        style::heading("Device Info", no_color),
        format!("Device Info: {}", joined),
    ];
    lines.extend(fields.iter().map(|f| format!("  {}", f)));
    lines
}

fn known_panel(known: &[PeripheralInfo], no_color: bool) -> Vec<String> {
    let mut lines = vec![style::heading("Known Devices", no_color)];
    if known.is_empty() {
        lines.push("  (none)".to_string());
    }
    lines.extend(known.iter().map(|p| format!("  {}", p)));
    lines
}

/// Render every visible panel.
pub fn render_panels(state: &ConnectionState, no_color: bool) -> Vec<String> {
    let panels = [
        visible(state.has_peripheral(), || peripheral_panel(state, no_color)).flatten(),
        state.battery_level().map(|level| battery_panel(level, no_color)),
        visible(state.has_info_fields(), || info_panel(state, no_color)),
        state
            .known_peripherals()
            .map(|known| known_panel(known, no_color)),
    ];
    panels.into_iter().flatten().flatten().collect()
}

/// Render one activity log line.
pub fn render_entry(entry: &LogEntry, no_color: bool) -> String {
    entry.format_with_tag(style::format_tag(entry.tag, no_color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gattdemo_core::mock::{MockPeripheral, MockPlatform};
    use gattdemo_core::{LogTag, StepId, Workflow};
    use gattdemo_types::uuid::{MANUFACTURER_NAME, MODEL_NUMBER};
    use gattdemo_types::{DeviceFilter, RequestOptions};
    use std::sync::Arc;
    use time::macros::datetime;

    #[test]
    fn test_empty_state_renders_nothing() {
        assert!(render_panels(&ConnectionState::new(), true).is_empty());
    }

    #[tokio::test]
    async fn test_panels_follow_state() {
        let peripheral = MockPeripheral::builder("MC330-0001")
            .id("C0:FF:EE:00:33:01")
            .battery_level(75)
            .device_info([(MANUFACTURER_NAME, "Acme"), (MODEL_NUMBER, "MC330")])
            .build();
        let workflow = Workflow::new(
            Arc::new(MockPlatform::new().peripheral(peripheral)),
            RequestOptions::with_filter(DeviceFilter::name_prefix("MC330")),
        );

        workflow.run(StepId::DiscoverPeripheral).await;
        let lines = render_panels(&workflow.state(), true);
        assert_eq!(
            lines,
            vec![
                "== Device ==",
                "Device Name: MC330-0001",
                "Device Id:   C0:FF:EE:00:33:01",
                "GATT:        not connected",
            ]
        );

        for step in [
            StepId::OpenSession,
            StepId::DiscoverBatteryService,
            StepId::ReadBatteryLevel,
            StepId::DiscoverInfoService,
            StepId::ReadInfoFields,
        ] {
            workflow.run(step).await;
        }
        let lines = render_panels(&workflow.state(), true);
        assert!(lines.contains(&"GATT:        connected".to_string()));
        assert!(lines.contains(&"Battery Level: 75%".to_string()));
        assert!(lines.contains(&"Device Info: Acme MC330".to_string()));
        assert!(lines.contains(&"  Model Number: MC330".to_string()));
    }

    #[test]
    fn test_known_panel_shows_empty_listing() {
        let mut state = ConnectionState::new();
        state.set_known_peripherals(Some(Vec::new()));
        assert_eq!(
            render_panels(&state, true),
            vec!["== Known Devices ==", "  (none)"]
        );
    }

    #[test]
    fn test_render_entry() {
        let entry = LogEntry {
            timestamp: datetime!(2024-01-02 08:04:59 UTC),
            tag: LogTag::Error,
            name: "OpenSession".into(),
            message: Some("GATT not available".into()),
        };
        assert_eq!(
            render_entry(&entry, true),
            "[08:04] error OpenSession: GATT not available"
        );
        assert_eq!(render_entry(&entry, true), entry.to_string());
    }

    #[test]
    fn test_colored_entry_keeps_layout() {
        let entry = LogEntry {
            timestamp: datetime!(2024-01-02 08:04:59 UTC),
            tag: LogTag::Success,
            name: "ReadBatteryLevel".into(),
            message: None,
        };
        let line = render_entry(&entry, false);
        assert!(line.starts_with("[08:04] "));
        assert!(line.contains("success"));
        assert!(line.ends_with(" ReadBatteryLevel"));
    }
}
