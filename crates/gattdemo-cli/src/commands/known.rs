//! Known command implementation.

use anyhow::{Result, bail};
use gattdemo_core::{StepId, Workflow};
use owo_colors::OwoColorize;

use crate::screen;

pub async fn cmd_known(workflow: &Workflow, json: bool, no_color: bool) -> Result<()> {
    let outcome = workflow.run(StepId::ListKnownPeripherals).await;
    if let Some(message) = outcome.message() {
        bail!("Failed to list known peripherals: {}", message);
    }

    let state = workflow.state();
    let known = state.known_peripherals().unwrap_or_default();
    if json {
        println!("{}", serde_json::to_string_pretty(known)?);
        return Ok(());
    }

    if known.is_empty() {
        println!("No known peripherals.");
        return Ok(());
    }
    let count = format!("{}", known.len());
    println!(
        "{} known peripheral(s):",
        if no_color {
            count
        } else {
            count.bold().to_string()
        }
    );
    for line in screen::render_panels(&state, no_color).iter().skip(1) {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gattdemo_core::mock::MockPlatform;
    use gattdemo_types::RequestOptions;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_known_lists_without_advancing() {
        let workflow = Workflow::new(Arc::new(MockPlatform::demo()), RequestOptions::accept_all());
        cmd_known(&workflow, true, true).await.unwrap();

        let state = workflow.state();
        assert_eq!(state.known_peripherals().map(<[_]>::len), Some(1));
        assert!(!state.has_peripheral());
        assert_eq!(workflow.log().len(), 2);
    }
}
