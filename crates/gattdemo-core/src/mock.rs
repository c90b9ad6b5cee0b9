//! Mock platform implementation for testing.
//!
//! This module provides an in-memory implementation of every
//! [`crate::platform`] trait, so the workflow can be exercised without BLE
//! hardware. The CLI also uses it for `--mock` demo runs.
//!
//! # Features
//!
//! - **Failure injection**: make connects or reads fail with a message
//! - **Latency simulation**: delay each platform call, which together with
//!   paused tokio time gives deterministic completion orders in tests
//! - **Chooser simulation**: pick a candidate by index or cancel the request
//!
//! # Example
//!
//! ```
//! use gattdemo_core::mock::{MockPeripheral, MockPlatform};
//! use gattdemo_core::platform::Platform;
//! use gattdemo_types::{DeviceFilter, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let platform = MockPlatform::new()
//!         .peripheral(MockPeripheral::builder("MC330-0001").battery_level(75).build());
//!
//!     let request = RequestOptions::with_filter(DeviceFilter::name_prefix("MC330"));
//!     let peripheral = platform.request_peripheral(&request).await.unwrap();
//!     assert_eq!(peripheral.name(), Some("MC330-0001"));
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use gattdemo_types::uuid::{
    BATTERY_LEVEL, BATTERY_SERVICE, DEVICE_INFO_SERVICE, FIRMWARE_REVISION, HARDWARE_REVISION,
    MANUFACTURER_NAME, MODEL_NUMBER, SERIAL_NUMBER,
};
use gattdemo_types::{PeripheralInfo, RequestOptions};

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::platform::{
    Characteristic, CharacteristicHandle, Peripheral, PeripheralHandle, Platform, Service,
    ServiceHandle, Session, SessionHandle,
};

async fn simulate_latency(latency_ms: &AtomicU64) {
    let latency = latency_ms.load(Ordering::Relaxed);
    if latency > 0 {
        tokio::time::sleep(Duration::from_millis(latency)).await;
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// How the mock platform answers a peripheral request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockChoice {
    /// Take the first matching candidate.
    #[default]
    First,
    /// Take the candidate at this index; out of range behaves like `Cancel`.
    Index(usize),
    /// Dismiss the chooser.
    Cancel,
}

/// A mock characteristic holding a fixed value.
#[derive(Debug)]
pub struct MockCharacteristic {
    uuid: Uuid,
    readable: bool,
    value: RwLock<Vec<u8>>,
    /// Simulated read latency in milliseconds (0 = no delay).
    read_latency_ms: AtomicU64,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    read_count: AtomicU32,
}

impl MockCharacteristic {
    /// Create a readable characteristic with the given value.
    pub fn new(uuid: Uuid, value: impl Into<Vec<u8>>) -> Self {
        Self {
            uuid,
            readable: true,
            value: RwLock::new(value.into()),
            read_latency_ms: AtomicU64::new(0),
            should_fail: AtomicBool::new(false),
            fail_message: RwLock::new("Mock read failure".to_string()),
            read_count: AtomicU32::new(0),
        }
    }

    /// Set the simulated read latency.
    #[must_use]
    pub fn read_latency(self, latency: Duration) -> Self {
        self.read_latency_ms.store(millis(latency), Ordering::Relaxed);
        self
    }

    /// Mark the characteristic as not readable.
    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Make every read fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.should_fail.store(true, Ordering::Relaxed);
        self.fail_message = RwLock::new(message.to_string());
        self
    }

    /// Replace the stored value.
    pub async fn set_value(&self, value: impl Into<Vec<u8>>) {
        *self.value.write().await = value.into();
    }

    /// Change the simulated read latency.
    pub fn set_read_latency(&self, latency: Duration) {
        self.read_latency_ms.store(millis(latency), Ordering::Relaxed);
    }

    /// Number of successful and failed reads so far.
    pub fn read_count(&self) -> u32 {
        self.read_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Characteristic for MockCharacteristic {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn is_readable(&self) -> bool {
        self.readable
    }

    async fn read_value(&self) -> Result<Vec<u8>> {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        simulate_latency(&self.read_latency_ms).await;

        if !self.readable {
            return Err(Error::ReadFailed {
                uuid: self.uuid.to_string(),
                reason: "characteristic is not readable".to_string(),
            });
        }
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::ReadFailed {
                uuid: self.uuid.to_string(),
                reason: self.fail_message.read().await.clone(),
            });
        }
        Ok(self.value.read().await.clone())
    }
}

/// A mock primary service.
#[derive(Debug)]
pub struct MockService {
    uuid: Uuid,
    characteristics: Vec<Arc<MockCharacteristic>>,
    /// Simulated latency of characteristic lookups in milliseconds.
    lookup_latency_ms: AtomicU64,
}

impl MockService {
    /// Create a service with characteristics in listing order.
    pub fn new(uuid: Uuid, characteristics: Vec<MockCharacteristic>) -> Self {
        Self {
            uuid,
            characteristics: characteristics.into_iter().map(Arc::new).collect(),
            lookup_latency_ms: AtomicU64::new(0),
        }
    }

    /// Battery service with a single Battery Level characteristic.
    pub fn battery(level: u8) -> Self {
        Self::new(BATTERY_SERVICE, vec![MockCharacteristic::new(BATTERY_LEVEL, [level])])
    }

    /// Device Information service with one string characteristic per field.
    pub fn device_info<'a>(fields: impl IntoIterator<Item = (Uuid, &'a str)>) -> Self {
        let characteristics = fields
            .into_iter()
            .map(|(uuid, value)| MockCharacteristic::new(uuid, value.as_bytes()))
            .collect();
        Self::new(DEVICE_INFO_SERVICE, characteristics)
    }

    /// Set the simulated lookup latency.
    #[must_use]
    pub fn lookup_latency(self, latency: Duration) -> Self {
        self.lookup_latency_ms.store(millis(latency), Ordering::Relaxed);
        self
    }

    /// Access a characteristic for test control.
    pub fn mock_characteristic(&self, uuid: Uuid) -> Option<Arc<MockCharacteristic>> {
        self.characteristics.iter().find(|c| c.uuid == uuid).cloned()
    }
}

#[async_trait]
impl Service for MockService {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn characteristic(&self, uuid: Uuid) -> Result<CharacteristicHandle> {
        simulate_latency(&self.lookup_latency_ms).await;
        self.mock_characteristic(uuid)
            .map(|c| c as CharacteristicHandle)
            .ok_or_else(|| Error::characteristic_not_found(uuid, self.uuid))
    }

    async fn characteristics(&self) -> Result<Vec<CharacteristicHandle>> {
        simulate_latency(&self.lookup_latency_ms).await;
        Ok(self
            .characteristics
            .iter()
            .map(|c| Arc::clone(c) as CharacteristicHandle)
            .collect())
    }
}

/// A mock GATT session.
#[derive(Debug)]
pub struct MockSession {
    peripheral_id: String,
    services: Vec<Arc<MockService>>,
    connected: Arc<AtomicBool>,
    service_latency_ms: u64,
}

#[async_trait]
impl Session for MockSession {
    fn peripheral_id(&self) -> &str {
        &self.peripheral_id
    }

    async fn primary_service(&self, uuid: Uuid) -> Result<ServiceHandle> {
        if self.service_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.service_latency_ms)).await;
        }
        if !self.connected.load(Ordering::Relaxed) {
            return Err(Error::NotConnected);
        }
        self.services
            .iter()
            .find(|s| s.uuid == uuid)
            .map(|s| Arc::clone(s) as ServiceHandle)
            .ok_or_else(|| Error::service_not_found(uuid))
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::Relaxed);
        Ok(())
    }
}

/// A mock peripheral.
///
/// Build one with [`MockPeripheral::builder`].
#[derive(Debug)]
pub struct MockPeripheral {
    id: String,
    name: Option<String>,
    gatt: bool,
    advertised: Vec<Uuid>,
    services: Vec<Arc<MockService>>,
    connected: Arc<AtomicBool>,
    /// Simulated connect latency in milliseconds (0 = no delay).
    connect_latency_ms: AtomicU64,
    /// Simulated latency of service lookups in milliseconds.
    service_latency_ms: u64,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    connect_count: AtomicU32,
}

impl MockPeripheral {
    /// Start building a peripheral with the given advertised name.
    pub fn builder(name: &str) -> MockPeripheralBuilder {
        MockPeripheralBuilder::new(name)
    }

    /// Whether a session to this peripheral is currently open.
    pub fn is_connected_sync(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Number of connect attempts so far.
    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::Relaxed)
    }

    /// Access a service for test control.
    pub fn mock_service(&self, uuid: Uuid) -> Option<Arc<MockService>> {
        self.services.iter().find(|s| s.uuid == uuid).cloned()
    }

    /// Make connects fail (or succeed again).
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Change the simulated connect latency.
    pub fn set_connect_latency(&self, latency: Duration) {
        self.connect_latency_ms.store(millis(latency), Ordering::Relaxed);
    }

    fn advertised_info(&self) -> PeripheralInfo {
        PeripheralInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            services: self.advertised.clone(),
            rssi: Some(-55),
        }
    }
}

#[async_trait]
impl Peripheral for MockPeripheral {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn has_gatt(&self) -> bool {
        self.gatt
    }

    fn info(&self) -> PeripheralInfo {
        self.advertised_info()
    }

    async fn connect(&self) -> Result<SessionHandle> {
        self.connect_count.fetch_add(1, Ordering::Relaxed);
        simulate_latency(&self.connect_latency_ms).await;

        if !self.gatt {
            return Err(Error::ConnectionFailed(
                "peripheral has no GATT transport".to_string(),
            ));
        }
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::ConnectionFailed(self.fail_message.read().await.clone()));
        }

        self.connected.store(true, Ordering::Relaxed);
        Ok(Arc::new(MockSession {
            peripheral_id: self.id.clone(),
            services: self.services.clone(),
            connected: Arc::clone(&self.connected),
            service_latency_ms: self.service_latency_ms,
        }))
    }
}

/// Builder for [`MockPeripheral`].
#[derive(Debug)]
pub struct MockPeripheralBuilder {
    id: Option<String>,
    name: String,
    gatt: bool,
    advertise_services: bool,
    services: Vec<MockService>,
    connect_latency: Duration,
    service_latency: Duration,
    fail_message: Option<String>,
}

impl MockPeripheralBuilder {
    /// Create a builder for a GATT-capable peripheral with no services.
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            gatt: true,
            advertise_services: true,
            services: Vec::new(),
            connect_latency: Duration::ZERO,
            service_latency: Duration::ZERO,
            fail_message: None,
        }
    }

    /// Set the platform identifier (random `MOCK-XXXXXX` otherwise).
    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Peripheral without a GATT transport.
    #[must_use]
    pub fn without_gatt(mut self) -> Self {
        self.gatt = false;
        self
    }

    /// Do not advertise service UUIDs (they are still reachable once connected).
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.advertise_services = false;
        self
    }

    /// Add a battery service reporting `level` percent.
    #[must_use]
    pub fn battery_level(self, level: u8) -> Self {
        self.service(MockService::battery(level))
    }

    /// Add a device information service.
    #[must_use]
    pub fn device_info<'a>(self, fields: impl IntoIterator<Item = (Uuid, &'a str)>) -> Self {
        self.service(MockService::device_info(fields))
    }

    /// Add an arbitrary service.
    #[must_use]
    pub fn service(mut self, service: MockService) -> Self {
        self.services.push(service);
        self
    }

    /// Set the simulated connect latency.
    #[must_use]
    pub fn connect_latency(mut self, latency: Duration) -> Self {
        self.connect_latency = latency;
        self
    }

    /// Set the simulated latency of primary service lookups.
    #[must_use]
    pub fn service_latency(mut self, latency: Duration) -> Self {
        self.service_latency = latency;
        self
    }

    /// Make connects fail with `message`.
    #[must_use]
    pub fn fail_connect(mut self, message: &str) -> Self {
        self.fail_message = Some(message.to_string());
        self
    }

    /// Build the mock peripheral.
    #[must_use]
    pub fn build(self) -> Arc<MockPeripheral> {
        let advertised = if self.advertise_services {
            self.services.iter().map(|s| s.uuid).collect()
        } else {
            Vec::new()
        };

        Arc::new(MockPeripheral {
            id: self
                .id
                .unwrap_or_else(|| format!("MOCK-{:06X}", rand::random::<u32>() % 0xFFFFFF)),
            name: Some(self.name),
            gatt: self.gatt,
            advertised,
            services: self.services.into_iter().map(Arc::new).collect(),
            connected: Arc::new(AtomicBool::new(false)),
            connect_latency_ms: AtomicU64::new(millis(self.connect_latency)),
            service_latency_ms: millis(self.service_latency),
            should_fail: AtomicBool::new(self.fail_message.is_some()),
            fail_message: RwLock::new(
                self.fail_message
                    .unwrap_or_else(|| "Mock connection failure".to_string()),
            ),
            connect_count: AtomicU32::new(0),
        })
    }
}

/// A mock platform serving a fixed set of peripherals.
#[derive(Debug, Default)]
pub struct MockPlatform {
    in_range: Vec<Arc<MockPeripheral>>,
    known: Vec<Arc<MockPeripheral>>,
    choice: MockChoice,
    /// Simulated chooser latency in milliseconds.
    request_latency_ms: AtomicU64,
    request_count: AtomicU32,
}

impl MockPlatform {
    /// Create an empty platform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peripheral in range.
    #[must_use]
    pub fn peripheral(mut self, peripheral: Arc<MockPeripheral>) -> Self {
        self.in_range.push(peripheral);
        self
    }

    /// Add a peripheral to the known (previously authorized) list.
    #[must_use]
    pub fn known(mut self, peripheral: Arc<MockPeripheral>) -> Self {
        self.known.push(peripheral);
        self
    }

    /// Set how requests are answered.
    #[must_use]
    pub fn choice(mut self, choice: MockChoice) -> Self {
        self.choice = choice;
        self
    }

    /// Set the simulated request latency.
    #[must_use]
    pub fn request_latency(self, latency: Duration) -> Self {
        self.request_latency_ms.store(millis(latency), Ordering::Relaxed);
        self
    }

    /// Number of requests so far.
    pub fn request_count(&self) -> u32 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// A ready-made platform for demo runs: one well-behaved `MC330`
    /// peripheral, one without GATT, and short latencies.
    pub fn demo() -> Self {
        let latency = Duration::from_millis(300);
        let sensor = MockPeripheral::builder("MC330-0001")
            .id("C0:FF:EE:00:33:01")
            .battery_level(75)
            .device_info([
                (MANUFACTURER_NAME, "Acme Instruments"),
                (MODEL_NUMBER, "MC330"),
                (SERIAL_NUMBER, "330-000117"),
                (HARDWARE_REVISION, "B2"),
                (FIRMWARE_REVISION, "1.4.2"),
            ])
            .connect_latency(latency)
            .service_latency(latency)
            .build();
        let beacon = MockPeripheral::builder("MC330-BEACON")
            .id("C0:FF:EE:00:33:02")
            .without_gatt()
            .build();

        Self::new()
            .peripheral(Arc::clone(&sensor))
            .peripheral(Arc::clone(&beacon))
            .known(sensor)
            .request_latency(latency)
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn request_peripheral(&self, request: &RequestOptions) -> Result<PeripheralHandle> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        request.validate()?;
        simulate_latency(&self.request_latency_ms).await;

        let candidates: Vec<&Arc<MockPeripheral>> = self
            .in_range
            .iter()
            .filter(|p| request.matches(&p.advertised_info()))
            .collect();
        if candidates.is_empty() {
            return Err(Error::DeviceNotFound(DeviceNotFoundReason::NoDevicesInRange));
        }

        let index = match self.choice {
            MockChoice::First => Some(0),
            MockChoice::Index(i) => Some(i),
            MockChoice::Cancel => None,
        };
        index
            .and_then(|i| candidates.get(i))
            .map(|p| Arc::clone(p) as PeripheralHandle)
            .ok_or(Error::Cancelled)
    }

    async fn known_peripherals(&self) -> Result<Vec<PeripheralHandle>> {
        Ok(self
            .known
            .iter()
            .map(|p| Arc::clone(p) as PeripheralHandle)
            .collect())
    }
}
