//! Device discovery and scanning.
//!
//! Scans with btleplug for a fixed duration and keeps the peripherals that
//! match a [`RequestOptions`].

use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::sleep;
use tracing::{debug, info};

use gattdemo_types::{PeripheralInfo, RequestOptions};

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::util::peripheral_info;

/// Options for scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to scan for devices.
    pub duration: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set scan duration in seconds.
    #[must_use]
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.duration = Duration::from_secs(secs);
        self
    }
}

/// A peripheral found by a scan together with its identity.
#[derive(Debug, Clone)]
pub struct DiscoveredPeripheral {
    /// btleplug handle.
    pub peripheral: Peripheral,
    /// Identity snapshot taken during the scan.
    pub info: PeripheralInfo,
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Scan for peripherals matching `request`.
///
/// An empty list means nothing matched; it is not an error here.
pub async fn scan_with_adapter(
    adapter: &Adapter,
    request: &RequestOptions,
    options: &ScanOptions,
) -> Result<Vec<DiscoveredPeripheral>> {
    info!(
        "Starting BLE scan for {} seconds...",
        options.duration.as_secs()
    );

    let filter = ScanFilter {
        services: request.scan_services(),
    };
    adapter.start_scan(filter).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    let discovered = collect_peripherals(adapter)
        .await?
        .into_iter()
        .filter(|d| {
            let keep = request.matches(&d.info);
            if !keep {
                debug!("Skipping non-matching peripheral: {}", d.info);
            }
            keep
        })
        .collect::<Vec<_>>();

    info!("Scan complete. {} matching peripheral(s)", discovered.len());
    Ok(discovered)
}

/// Peripherals the adapter already knows about, without starting a scan.
pub async fn known_with_adapter(adapter: &Adapter) -> Result<Vec<DiscoveredPeripheral>> {
    let known = collect_peripherals(adapter).await?;
    debug!("Adapter knows {} peripheral(s)", known.len());
    Ok(known)
}

async fn collect_peripherals(adapter: &Adapter) -> Result<Vec<DiscoveredPeripheral>> {
    let peripherals = adapter.peripherals().await?;
    let mut discovered = Vec::with_capacity(peripherals.len());

    for peripheral in peripherals {
        let properties = match peripheral.properties().await {
            Ok(properties) => properties,
            Err(e) => {
                debug!("Error reading peripheral properties: {}", e);
                continue;
            }
        };
        let info = peripheral_info(&peripheral.id(), properties.as_ref());
        discovered.push(DiscoveredPeripheral { peripheral, info });
    }

    Ok(discovered)
}
