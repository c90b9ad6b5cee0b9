//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use gattdemo_core::{ConnectionConfig, ScanOptions};
use gattdemo_types::uuid::resolve_service;
use gattdemo_types::{DeviceFilter, RequestOptions};
use serde::{Deserialize, Serialize};

use crate::cli::RequestArgs;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Advertised name prefix to request
    #[serde(default = "default_name_prefix", skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,

    /// Exact advertised name to request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Services the peripheral must advertise
    #[serde(default)]
    pub services: Vec<String>,

    /// Offer every peripheral in range, ignoring the filter keys
    #[serde(default)]
    pub accept_all: bool,

    /// Services the workflow will access after connecting
    #[serde(default = "default_optional_services")]
    pub optional_services: Vec<String>,

    /// Scan duration in seconds
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Characteristic read timeout in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,

    /// Log filter used when neither RUST_LOG nor --verbose/--quiet is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

fn default_name_prefix() -> Option<String> {
    Some("MC330".to_string())
}

fn default_optional_services() -> Vec<String> {
    vec![
        "battery_service".to_string(),
        "device_information".to_string(),
    ]
}

fn default_scan_timeout() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_read_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            name: None,
            services: Vec::new(),
            accept_all: false,
            optional_services: default_optional_services(),
            scan_timeout: default_scan_timeout(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            log_level: None,
            no_color: false,
        }
    }
}

impl Config {
    /// Default configuration file location.
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gattdemo")
            .join("config.toml")
    }

    /// Load from `path`. A missing or unreadable file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Write to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply command-line overrides.
    ///
    /// Any filter flag replaces the whole filter from the file.
    pub fn apply(&mut self, args: &RequestArgs) {
        if args.accept_all {
            self.accept_all = true;
        }
        if args.name_prefix.is_some() || args.name.is_some() || !args.services.is_empty() {
            self.name_prefix = args.name_prefix.clone();
            self.name = args.name.clone();
            self.services = args.services.clone();
            self.accept_all = false;
        }
        if let Some(secs) = args.scan_timeout {
            self.scan_timeout = secs;
        }
    }

    /// Build the peripheral request described by this configuration.
    pub fn request_options(&self) -> Result<RequestOptions> {
        let mut request = if self.accept_all {
            RequestOptions::accept_all()
        } else {
            let services = self
                .services
                .iter()
                .map(|s| resolve_service(s))
                .collect::<Result<Vec<_>, _>>()
                .context("Invalid service in filter")?;
            RequestOptions::with_filter(DeviceFilter {
                name: self.name.clone(),
                name_prefix: self.name_prefix.clone(),
                services,
            })
        };

        for service in &self.optional_services {
            let uuid = resolve_service(service)
                .with_context(|| format!("Invalid optional service '{}'", service))?;
            request = request.optional_service(uuid);
        }

        request
            .validate()
            .context("Invalid peripheral request in configuration")?;
        Ok(request)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new().duration_secs(self.scan_timeout)
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::default()
            .connection_timeout(Duration::from_secs(self.connect_timeout))
            .read_timeout(Duration::from_secs(self.read_timeout))
    }
}
