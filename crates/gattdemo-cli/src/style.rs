//! Visual styling utilities for the CLI.
//!
//! Spinners for pending steps and colours for log tags, both switched off
//! when colour is disabled or stderr is not a terminal.

use std::io::{self, IsTerminal};
use std::time::Duration;

use gattdemo_core::LogTag;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_TICK_CHARS)
}

/// Spinner shown while a step is pending; hidden when not on a terminal.
pub fn step_spinner(label: &str, enabled: bool) -> ProgressBar {
    if !enabled || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(format!("{}...", label));
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Colour a log tag.
pub fn format_tag(tag: LogTag, no_color: bool) -> String {
    let text = tag.as_str();
    if no_color {
        return text.to_string();
    }
    match tag {
        LogTag::Start => text.dimmed().to_string(),
        LogTag::Success => text.green().to_string(),
        LogTag::Error => text.red().bold().to_string(),
    }
}

/// Panel heading.
pub fn heading(text: &str, no_color: bool) -> String {
    if no_color {
        format!("== {} ==", text)
    } else {
        format!("== {} ==", text.bold().cyan())
    }
}

/// Colour a battery percentage by charge.
pub fn format_battery(level: u8, no_color: bool) -> String {
    let text = format!("{}%", level);
    if no_color {
        return text;
    }
    match level {
        0..=20 => text.red().to_string(),
        21..=50 => text.yellow().to_string(),
        _ => text.green().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_is_plain() {
        assert_eq!(format_tag(LogTag::Error, true), "error");
        assert_eq!(format_battery(75, true), "75%");
        assert_eq!(heading("Device", true), "== Device ==");
    }

    #[test]
    fn test_colored_output_keeps_text() {
        let tag = format_tag(LogTag::Success, false);
        assert!(tag.contains("success"));
        assert!(tag.contains("\x1b["));

        let low = format_battery(10, false);
        assert!(low.contains("10%"));
        assert_ne!(low, "10%");
    }

    #[test]
    fn test_disabled_spinner_is_hidden() {
        assert!(step_spinner("Check battery", false).is_hidden());
    }
}
