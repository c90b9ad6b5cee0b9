//! btleplug implementation of the [`crate::platform`] traits.
//!
//! A peripheral request scans for [`ScanOptions::duration`], keeps the
//! peripherals that match the request, and hands them to a [`Chooser`]. In
//! the CLI the chooser is an interactive prompt, which plays the part of the
//! platform's consent dialog.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{CharPropFlags, Peripheral as _};
use btleplug::platform::{Adapter, Peripheral};
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

use gattdemo_types::{PeripheralInfo, RequestOptions};

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::platform::{
    Characteristic, CharacteristicHandle, PeripheralHandle, Platform, Service, ServiceHandle,
    Session, SessionHandle,
};
use crate::scan::{DiscoveredPeripheral, ScanOptions, get_adapter, known_with_adapter, scan_with_adapter};

/// Picks one of the candidate peripherals, or `None` to cancel.
///
/// Runs on a blocking thread, so it may prompt the user.
pub type Chooser = Arc<dyn Fn(&[PeripheralInfo]) -> Option<usize> + Send + Sync>;

/// Default timeout for BLE characteristic read operations.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE connection operations.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for BLE connection timeouts.
///
/// These bound the btleplug calls themselves; the workflow adds no timeouts
/// of its own.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gattdemo_core::ble::ConnectionConfig;
///
/// let config = ConnectionConfig::default()
///     .connection_timeout(Duration::from_secs(20))
///     .read_timeout(Duration::from_secs(15));
/// assert_eq!(config.read_timeout, Duration::from_secs(15));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing a BLE connection.
    pub connection_timeout: Duration,
    /// Timeout for service discovery after connection.
    pub discovery_timeout: Duration,
    /// Timeout for BLE read operations.
    pub read_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Create a new connection config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Longer timeouts for challenging RF environments.
    pub fn challenging_environment() -> Self {
        Self {
            connection_timeout: Duration::from_secs(25),
            discovery_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(15),
        }
    }

    /// Short timeouts for nearby devices with strong signals.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(8),
            discovery_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the service discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Platform backed by the first btleplug adapter.
pub struct BlePlatform {
    /// Kept alive for as long as peripherals obtained from it are in use.
    adapter: Adapter,
    scan: ScanOptions,
    config: ConnectionConfig,
    chooser: Chooser,
}

impl std::fmt::Debug for BlePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlePlatform")
            .field("scan", &self.scan)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BlePlatform {
    /// Open the first Bluetooth adapter.
    pub async fn new(chooser: Chooser) -> Result<Self> {
        let adapter = get_adapter().await?;
        Ok(Self::with_adapter(adapter, chooser))
    }

    /// Use an already opened adapter.
    pub fn with_adapter(adapter: Adapter, chooser: Chooser) -> Self {
        Self {
            adapter,
            scan: ScanOptions::default(),
            config: ConnectionConfig::default(),
            chooser,
        }
    }

    /// A chooser that always takes the first candidate.
    pub fn first_match() -> Chooser {
        Arc::new(|candidates: &[PeripheralInfo]| (!candidates.is_empty()).then_some(0))
    }

    /// Set the scan options used by peripheral requests.
    #[must_use]
    pub fn scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    /// Set the connection timeouts.
    #[must_use]
    pub fn connection_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    fn wrap(&self, discovered: DiscoveredPeripheral) -> PeripheralHandle {
        Arc::new(BlePeripheral {
            peripheral: discovered.peripheral,
            info: discovered.info,
            config: self.config.clone(),
        })
    }
}

#[async_trait]
impl Platform for BlePlatform {
    #[tracing::instrument(level = "info", skip_all)]
    async fn request_peripheral(&self, request: &RequestOptions) -> Result<PeripheralHandle> {
        request.validate()?;
        if !request.optional_services.is_empty() {
            debug!("Optional services: {:?}", request.optional_services);
        }

        let candidates = scan_with_adapter(&self.adapter, request, &self.scan).await?;
        if candidates.is_empty() {
            return Err(Error::DeviceNotFound(DeviceNotFoundReason::NoDevicesInRange));
        }

        let infos: Vec<PeripheralInfo> = candidates.iter().map(|c| c.info.clone()).collect();
        let chooser = Arc::clone(&self.chooser);
        let choice = tokio::task::spawn_blocking(move || chooser(&infos))
            .await
            .map_err(|_| Error::Cancelled)?;

        let chosen = choice
            .and_then(|index| candidates.into_iter().nth(index))
            .ok_or(Error::Cancelled)?;
        info!("Selected peripheral: {}", chosen.info);
        Ok(self.wrap(chosen))
    }

    async fn known_peripherals(&self) -> Result<Vec<PeripheralHandle>> {
        let known = known_with_adapter(&self.adapter).await?;
        Ok(known.into_iter().map(|d| self.wrap(d)).collect())
    }
}

/// A btleplug peripheral.
#[derive(Debug)]
pub struct BlePeripheral {
    peripheral: Peripheral,
    info: PeripheralInfo,
    config: ConnectionConfig,
}

#[async_trait]
impl crate::platform::Peripheral for BlePeripheral {
    fn id(&self) -> &str {
        &self.info.id
    }

    fn name(&self) -> Option<&str> {
        self.info.name.as_deref()
    }

    fn has_gatt(&self) -> bool {
        // every BLE peripheral btleplug reports is reachable over GATT
        true
    }

    fn info(&self) -> PeripheralInfo {
        self.info.clone()
    }

    #[tracing::instrument(level = "info", skip(self), fields(peripheral = %self.info))]
    async fn connect(&self) -> Result<SessionHandle> {
        if !self.peripheral.is_connected().await.unwrap_or(false) {
            info!("Connecting to device...");
            timeout(self.config.connection_timeout, self.peripheral.connect())
                .await
                .map_err(|_| Error::timeout("connect to device", self.config.connection_timeout))??;
            info!("Connected!");
        }

        info!("Discovering services...");
        timeout(
            self.config.discovery_timeout,
            self.peripheral.discover_services(),
        )
        .await
        .map_err(|_| Error::timeout("discover services", self.config.discovery_timeout))??;

        for service in self.peripheral.services() {
            debug!("  Service: {} (primary: {})", service.uuid, service.primary);
            for characteristic in &service.characteristics {
                debug!("    Characteristic: {}", characteristic.uuid);
            }
        }

        Ok(Arc::new(BleSession {
            peripheral: self.peripheral.clone(),
            peripheral_id: self.info.id.clone(),
            config: self.config.clone(),
        }))
    }
}

/// An open btleplug connection.
#[derive(Debug)]
pub struct BleSession {
    peripheral: Peripheral,
    peripheral_id: String,
    config: ConnectionConfig,
}

#[async_trait]
impl Session for BleSession {
    fn peripheral_id(&self) -> &str {
        &self.peripheral_id
    }

    async fn primary_service(&self, uuid: Uuid) -> Result<ServiceHandle> {
        let services = self.peripheral.services();
        // some backends do not flag primary services, so fall back to any match
        let service = services
            .iter()
            .find(|s| s.uuid == uuid && s.primary)
            .or_else(|| services.iter().find(|s| s.uuid == uuid))
            .cloned()
            .ok_or_else(|| Error::service_not_found(uuid))?;

        Ok(Arc::new(BleService {
            peripheral: self.peripheral.clone(),
            service,
            read_timeout: self.config.read_timeout,
        }))
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    #[tracing::instrument(level = "info", skip(self), fields(peripheral = %self.peripheral_id))]
    async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from device...");
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

/// A primary service on a btleplug connection.
#[derive(Debug)]
pub struct BleService {
    peripheral: Peripheral,
    service: btleplug::api::Service,
    read_timeout: Duration,
}

impl BleService {
    fn wrap(&self, characteristic: &btleplug::api::Characteristic) -> CharacteristicHandle {
        Arc::new(BleCharacteristic {
            peripheral: self.peripheral.clone(),
            characteristic: characteristic.clone(),
            read_timeout: self.read_timeout,
        })
    }
}

#[async_trait]
impl Service for BleService {
    fn uuid(&self) -> Uuid {
        self.service.uuid
    }

    async fn characteristic(&self, uuid: Uuid) -> Result<CharacteristicHandle> {
        self.service
            .characteristics
            .iter()
            .find(|c| c.uuid == uuid)
            .map(|c| self.wrap(c))
            .ok_or_else(|| Error::characteristic_not_found(uuid, self.service.uuid))
    }

    async fn characteristics(&self) -> Result<Vec<CharacteristicHandle>> {
        Ok(self
            .service
            .characteristics
            .iter()
            .map(|c| self.wrap(c))
            .collect())
    }
}

/// A characteristic on a btleplug connection.
#[derive(Debug)]
pub struct BleCharacteristic {
    peripheral: Peripheral,
    characteristic: btleplug::api::Characteristic,
    read_timeout: Duration,
}

#[async_trait]
impl Characteristic for BleCharacteristic {
    fn uuid(&self) -> Uuid {
        self.characteristic.uuid
    }

    fn is_readable(&self) -> bool {
        self.characteristic.properties.contains(CharPropFlags::READ)
    }

    async fn read_value(&self) -> Result<Vec<u8>> {
        let uuid = self.characteristic.uuid;
        let data = timeout(self.read_timeout, self.peripheral.read(&self.characteristic))
            .await
            .map_err(|_| Error::timeout(format!("read characteristic {}", uuid), self.read_timeout))??;
        debug!("Read {} bytes from {}", data.len(), uuid);
        Ok(data)
    }
}
