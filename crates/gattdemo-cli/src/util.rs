//! Utility functions for CLI operations.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::{Select, theme::ColorfulTheme};
use gattdemo_core::mock::MockPlatform;
use gattdemo_core::{BlePlatform, Chooser, Platform};
use gattdemo_types::PeripheralInfo;

use crate::config::Config;

/// Whether both stdin and stderr are attached to a terminal.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// A chooser that prompts with a selection list; Esc cancels.
pub fn prompt_chooser() -> Chooser {
    Arc::new(|candidates: &[PeripheralInfo]| {
        let items: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select a device (Esc to cancel)")
            .items(&items)
            .default(0)
            .interact_opt()
            .unwrap_or_else(|e| {
                tracing::warn!("Device prompt failed: {}", e);
                None
            })
    })
}

/// Build the platform the workflow runs against.
pub async fn build_platform(config: &Config, mock: bool, interactive: bool) -> Result<Arc<dyn Platform>> {
    if mock {
        tracing::info!("Using demo peripherals");
        return Ok(Arc::new(MockPlatform::demo()));
    }

    let chooser = if interactive {
        prompt_chooser()
    } else {
        BlePlatform::first_match()
    };
    let platform = BlePlatform::new(chooser)
        .await
        .context("Failed to open the Bluetooth adapter")?
        .scan_options(config.scan_options())
        .connection_config(config.connection_config());
    Ok(Arc::new(platform))
}

/// Write `content` to a file, or to stdout when the path is `-`.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if path == Path::new("-") {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_output_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        write_output(&path, "{}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_write_output_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("log.jsonl");
        let err = write_output(&path, "{}").unwrap_err();
        assert!(err.to_string().contains("Failed to write"));
    }

    #[tokio::test]
    async fn test_mock_platform_needs_no_adapter() {
        let platform = build_platform(&Config::default(), true, false).await.unwrap();
        let known = platform.known_peripherals().await.unwrap();
        assert_eq!(known.len(), 1);
    }
}
