//! The pairing state machine.
//!
//! ```text
//! Idle → HasPeripheral → HasSession → {battery service, info service} → {battery level, info fields}
//! ```
//!
//! Each transition is a [`StepId`]. A step checks its prerequisite
//! synchronously, clones the handle it needs out of the [`ConnectionState`]
//! and returns the pending platform call; only when that call succeeds does it
//! write its artifact back. A failed step therefore never changes the state.
//!
//! Steps take `&self`, so two different steps may be in flight at once:
//!
//! ```
//! use std::sync::Arc;
//! use gattdemo_core::mock::MockPlatform;
//! use gattdemo_core::{StepId, Workflow};
//! use gattdemo_types::{DeviceFilter, RequestOptions};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let request = RequestOptions::with_filter(DeviceFilter::name_prefix("MC330"));
//! let workflow = Workflow::new(Arc::new(MockPlatform::demo()), request);
//!
//! workflow.run(StepId::DiscoverPeripheral).await;
//! workflow.run(StepId::OpenSession).await;
//! tokio::join!(
//!     workflow.run(StepId::DiscoverBatteryService),
//!     workflow.run(StepId::DiscoverInfoService),
//! );
//! workflow.run(StepId::ReadBatteryLevel).await;
//! assert_eq!(workflow.state().battery_level(), Some(75));
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use gattdemo_types::uuid::{BATTERY_LEVEL, BATTERY_SERVICE, DEVICE_INFO_SERVICE};
use gattdemo_types::{InfoField, RequestOptions, decode_battery_level};

use crate::error::{Error, Prerequisite, Result};
use crate::log::ActivityLog;
use crate::panel::visible_actions;
use crate::platform::Platform;
use crate::runner::{StepFuture, StepOutcome, StepRunner};
use crate::state::ConnectionState;

/// The fixed registry of workflow steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    DiscoverPeripheral,
    ListKnownPeripherals,
    OpenSession,
    CloseSession,
    DiscoverBatteryService,
    DiscoverInfoService,
    ReadBatteryLevel,
    ReadInfoFields,
}

impl StepId {
    /// Every step, in menu order.
    pub const ALL: [StepId; 8] = [
        StepId::DiscoverPeripheral,
        StepId::ListKnownPeripherals,
        StepId::OpenSession,
        StepId::CloseSession,
        StepId::DiscoverBatteryService,
        StepId::ReadBatteryLevel,
        StepId::DiscoverInfoService,
        StepId::ReadInfoFields,
    ];

    /// Name used in the activity log.
    pub fn name(&self) -> &'static str {
        match self {
            StepId::DiscoverPeripheral => "DiscoverPeripheral",
            StepId::ListKnownPeripherals => "ListKnownPeripherals",
            StepId::OpenSession => "OpenSession",
            StepId::CloseSession => "CloseSession",
            StepId::DiscoverBatteryService => "DiscoverBatteryService",
            StepId::DiscoverInfoService => "DiscoverInfoService",
            StepId::ReadBatteryLevel => "ReadBatteryLevel",
            StepId::ReadInfoFields => "ReadInfoFields",
        }
    }

    /// Human-readable action label.
    pub fn label(&self) -> &'static str {
        match self {
            StepId::DiscoverPeripheral => "Get device details",
            StepId::ListKnownPeripherals => "List known devices",
            StepId::OpenSession => "Connect GATT server",
            StepId::CloseSession => "Disconnect GATT server",
            StepId::DiscoverBatteryService => "Check battery",
            StepId::DiscoverInfoService => "Check device info",
            StepId::ReadBatteryLevel => "Check battery percentage",
            StepId::ReadInfoFields => "Check device info text",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Drives the steps against a [`Platform`] and records them in an [`ActivityLog`].
pub struct Workflow {
    platform: Arc<dyn Platform>,
    request: RequestOptions,
    state: Mutex<ConnectionState>,
    runner: StepRunner,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("request", &self.request)
            .field("state", &*self.lock())
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// Create a workflow with a fresh activity log.
    pub fn new(platform: Arc<dyn Platform>, request: RequestOptions) -> Self {
        Self::with_log(platform, request, ActivityLog::new())
    }

    /// Create a workflow that appends to an existing log.
    pub fn with_log(platform: Arc<dyn Platform>, request: RequestOptions, log: ActivityLog) -> Self {
        Self {
            platform,
            request,
            state: Mutex::new(ConnectionState::new()),
            runner: StepRunner::new(log),
        }
    }

    pub fn log(&self) -> &ActivityLog {
        self.runner.log()
    }

    pub fn request(&self) -> &RequestOptions {
        &self.request
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        self.lock().clone()
    }

    /// Actions that are currently offered.
    pub fn available_steps(&self) -> Vec<StepId> {
        visible_actions(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a step's result, provided the handle it was derived from is still current.
    fn commit(
        &self,
        still_current: impl FnOnce(&ConnectionState) -> bool,
        missing: Prerequisite,
        update: impl FnOnce(&mut ConnectionState),
    ) -> Result<()> {
        let mut state = self.lock();
        if !still_current(&state) {
            return Err(Error::missing(missing));
        }
        update(&mut state);
        Ok(())
    }

    /// Run a step through the [`StepRunner`].
    pub async fn run(&self, step: StepId) -> StepOutcome {
        let runner = &self.runner;
        let name = step.name();
        match step {
            StepId::DiscoverPeripheral => runner.run(name, || self.discover_peripheral()).await,
            StepId::ListKnownPeripherals => {
                runner.run(name, || self.list_known_peripherals()).await
            }
            StepId::OpenSession => runner.run(name, || self.open_session()).await,
            StepId::CloseSession => runner.run(name, || self.close_session()).await,
            StepId::DiscoverBatteryService => {
                runner.run(name, || self.discover_battery_service()).await
            }
            StepId::DiscoverInfoService => runner.run(name, || self.discover_info_service()).await,
            StepId::ReadBatteryLevel => runner.run(name, || self.read_battery_level()).await,
            StepId::ReadInfoFields => runner.run(name, || self.read_info_fields()).await,
        }
    }

    /// Ask the platform for a peripheral matching the request.
    pub fn discover_peripheral(&self) -> Result<StepFuture<'_>> {
        Ok(Box::pin(async move {
            let peripheral = self.platform.request_peripheral(&self.request).await?;
            info!("Selected peripheral {}", peripheral.info());

            let previous = {
                let mut state = self.lock();
                let previous = state.session().cloned();
                state.clear_session();
                state.set_peripheral(Some(peripheral));
                previous
            };
            if let Some(session) = previous {
                warn!("Replacing peripheral; closing the previous session");
                if let Err(e) = session.disconnect().await {
                    warn!("Failed to close the previous session: {}", e);
                }
            }
            Ok(())
        }))
    }

    /// List previously authorized peripherals. Does not advance the state machine.
    pub fn list_known_peripherals(&self) -> Result<StepFuture<'_>> {
        Ok(Box::pin(async move {
            let known = self.platform.known_peripherals().await?;
            let infos: Vec<_> = known.iter().map(|p| p.info()).collect();
            info!("{} known peripheral(s)", infos.len());
            self.lock().set_known_peripherals(Some(infos));
            Ok(())
        }))
    }

    /// Connect to the selected peripheral's GATT server.
    pub fn open_session(&self) -> Result<StepFuture<'_>> {
        let peripheral = self
            .lock()
            .peripheral()
            .cloned()
            .ok_or(Error::missing(Prerequisite::Peripheral))?;
        if !peripheral.has_gatt() {
            return Err(Error::missing(Prerequisite::Gatt));
        }

        Ok(Box::pin(async move {
            let session = peripheral.connect().await?;
            self.commit(
                |state| state.peripheral().is_some_and(|current| same(current, &peripheral)),
                Prerequisite::Peripheral,
                |state| state.set_session(Some(session)),
            )
        }))
    }

    /// Disconnect and drop the session together with everything read through it.
    pub fn close_session(&self) -> Result<StepFuture<'_>> {
        let session = self
            .lock()
            .session()
            .cloned()
            .ok_or(Error::missing(Prerequisite::Session))?;

        Ok(Box::pin(async move {
            session.disconnect().await?;
            let mut state = self.lock();
            if state.session().is_some_and(|current| same(current, &session)) {
                state.clear_session();
            }
            Ok(())
        }))
    }

    /// Look up the battery service on the open session.
    pub fn discover_battery_service(&self) -> Result<StepFuture<'_>> {
        let session = self
            .lock()
            .session()
            .cloned()
            .ok_or(Error::missing(Prerequisite::Session))?;

        Ok(Box::pin(async move {
            let service = session.primary_service(BATTERY_SERVICE).await?;
            self.commit(
                |state| state.session().is_some_and(|current| same(current, &session)),
                Prerequisite::Session,
                |state| state.set_battery_service(Some(service)),
            )
        }))
    }

    /// Look up the device information service on the open session.
    pub fn discover_info_service(&self) -> Result<StepFuture<'_>> {
        let session = self
            .lock()
            .session()
            .cloned()
            .ok_or(Error::missing(Prerequisite::Session))?;

        Ok(Box::pin(async move {
            let service = session.primary_service(DEVICE_INFO_SERVICE).await?;
            self.commit(
                |state| state.session().is_some_and(|current| same(current, &session)),
                Prerequisite::Session,
                |state| state.set_info_service(Some(service)),
            )
        }))
    }

    /// Read the battery level from byte 0 of the characteristic value.
    pub fn read_battery_level(&self) -> Result<StepFuture<'_>> {
        let service = self
            .lock()
            .battery_service()
            .cloned()
            .ok_or(Error::missing(Prerequisite::BatteryService))?;

        Ok(Box::pin(async move {
            let characteristic = service.characteristic(BATTERY_LEVEL).await?;
            let raw = characteristic.read_value().await?;
            let level = decode_battery_level(&raw)?;
            info!("Battery level: {}%", level);

            self.commit(
                |state| state.battery_service().is_some_and(|current| same(current, &service)),
                Prerequisite::BatteryService,
                |state| state.set_battery_level(Some(level)),
            )
        }))
    }

    /// Read every readable characteristic of the info service, one at a time.
    pub fn read_info_fields(&self) -> Result<StepFuture<'_>> {
        let service = self
            .lock()
            .info_service()
            .cloned()
            .ok_or(Error::missing(Prerequisite::DeviceInfoService))?;

        Ok(Box::pin(async move {
            let characteristics = service.characteristics().await?;
            let mut fields = Vec::with_capacity(characteristics.len());
            for characteristic in characteristics.iter().filter(|c| c.is_readable()) {
                let raw = characteristic.read_value().await?;
                let field = InfoField::from_bytes(characteristic.uuid(), &raw);
                debug!("{}", field);
                fields.push(field);
            }
            info!("Read {} device information field(s)", fields.len());

            self.commit(
                |state| state.info_service().is_some_and(|current| same(current, &service)),
                Prerequisite::DeviceInfoService,
                |state| state.set_info_fields(Some(fields)),
            )
        }))
    }
}

/// Whether two handles point at the same object.
fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogTag;
    use crate::mock::{MockCharacteristic, MockChoice, MockPeripheral, MockPlatform, MockService};
    use crate::runner::FailureStage;
    use gattdemo_types::DeviceFilter;
    use gattdemo_types::uuid::{FIRMWARE_REVISION, MANUFACTURER_NAME, MODEL_NUMBER};
    use std::time::Duration;

    fn request() -> RequestOptions {
        RequestOptions::with_filter(DeviceFilter::name_prefix("MC330"))
    }

    fn workflow(platform: MockPlatform) -> Workflow {
        Workflow::new(Arc::new(platform), request())
    }

    fn sensor() -> Arc<MockPeripheral> {
        MockPeripheral::builder("MC330-0001")
            .battery_level(0x4B)
            .device_info([(MANUFACTURER_NAME, "Acme"), (MODEL_NUMBER, "MC330")])
            .build()
    }

    async fn connected(platform: MockPlatform) -> Workflow {
        let workflow = workflow(platform);
        assert!(workflow.run(StepId::DiscoverPeripheral).await.is_success());
        assert!(workflow.run(StepId::OpenSession).await.is_success());
        workflow
    }

    fn assert_one_start_one_terminal(log: &ActivityLog) {
        let entries = log.entries();
        for step in StepId::ALL {
            let starts = entries
                .iter()
                .filter(|e| e.name == step.name() && e.tag == LogTag::Start)
                .count();
            let terminals = entries
                .iter()
                .filter(|e| e.name == step.name() && e.tag.is_terminal())
                .count();
            assert_eq!(starts, terminals, "{}", step.name());
        }
    }

    #[tokio::test]
    async fn test_steps_on_empty_state_fail_without_mutation() {
        let cases = [
            (StepId::OpenSession, "peripheral not available"),
            (StepId::CloseSession, "session not available"),
            (StepId::DiscoverBatteryService, "session not available"),
            (StepId::DiscoverInfoService, "session not available"),
            (StepId::ReadBatteryLevel, "battery service not available"),
            (
                StepId::ReadInfoFields,
                "device information service not available",
            ),
        ];

        for (step, expected) in cases {
            let workflow = workflow(MockPlatform::new().peripheral(sensor()));
            let outcome = workflow.run(step).await;

            assert_eq!(
                outcome,
                StepOutcome::Failed {
                    stage: FailureStage::Construction,
                    message: expected.to_string()
                }
            );
            let state = workflow.state();
            assert!(!state.has_peripheral());
            assert!(!state.has_session());
            assert!(!state.has_battery_service());
            assert!(!state.has_info_service());
            assert!(!state.has_battery_level());
            assert!(!state.has_info_fields());

            let entries = workflow.log().entries();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[1].tag, LogTag::Error);
            assert_eq!(entries[1].message.as_deref(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_reads_before_discovery_leave_session_state_alone() {
        let workflow = connected(MockPlatform::new().peripheral(sensor())).await;

        let outcome = workflow.run(StepId::ReadBatteryLevel).await;
        assert_eq!(outcome.message(), Some("battery service not available"));
        let outcome = workflow.run(StepId::ReadInfoFields).await;
        assert_eq!(
            outcome.message(),
            Some("device information service not available")
        );

        let state = workflow.state();
        assert!(state.has_session());
        assert!(!state.has_battery_level());
        assert!(!state.has_info_fields());
    }

    #[tokio::test]
    async fn test_full_walkthrough() {
        let workflow = connected(MockPlatform::new().peripheral(sensor())).await;

        for step in [
            StepId::DiscoverBatteryService,
            StepId::ReadBatteryLevel,
            StepId::DiscoverInfoService,
            StepId::ReadInfoFields,
        ] {
            assert!(workflow.run(step).await.is_success(), "{}", step.name());
        }

        let state = workflow.state();
        assert_eq!(state.battery_level(), Some(75));
        let values: Vec<&str> = state
            .info_fields()
            .unwrap()
            .iter()
            .map(|f| f.value.as_str())
            .collect();
        assert_eq!(values, vec!["Acme", "MC330"]);
        assert!(state.is_consistent());
        assert_eq!(workflow.log().len(), 12);
        assert_one_start_one_terminal(workflow.log());
    }

    #[tokio::test]
    async fn test_discover_peripheral_cancelled() {
        let workflow = workflow(
            MockPlatform::new()
                .peripheral(sensor())
                .choice(MockChoice::Cancel),
        );
        let outcome = workflow.run(StepId::DiscoverPeripheral).await;

        assert!(matches!(
            outcome,
            StepOutcome::Failed {
                stage: FailureStage::Completion,
                ..
            }
        ));
        assert_eq!(
            outcome.message(),
            Some("Peripheral request cancelled by user")
        );
        assert!(!workflow.state().has_peripheral());
        assert_eq!(
            workflow.available_steps(),
            vec![StepId::DiscoverPeripheral, StepId::ListKnownPeripherals]
        );
    }

    #[tokio::test]
    async fn test_peripheral_without_gatt() {
        let beacon = MockPeripheral::builder("MC330-BEACON").without_gatt().build();
        let workflow = workflow(MockPlatform::new().peripheral(beacon));

        assert!(workflow.run(StepId::DiscoverPeripheral).await.is_success());
        let outcome = workflow.run(StepId::OpenSession).await;

        assert!(outcome.message().unwrap().contains("GATT not available"));
        let last = workflow.log().entries().pop().unwrap();
        assert_eq!(last.tag, LogTag::Error);
        assert!(last.message.unwrap().contains("GATT not available"));
        assert!(!workflow.state().has_session());
    }

    #[tokio::test]
    async fn test_connect_failure_propagates_verbatim() {
        let peripheral = MockPeripheral::builder("MC330-0002")
            .fail_connect("transport refused")
            .build();
        let workflow = workflow(MockPlatform::new().peripheral(peripheral.clone()));
        workflow.run(StepId::DiscoverPeripheral).await;

        let outcome = workflow.run(StepId::OpenSession).await;
        assert!(outcome.message().unwrap().contains("transport refused"));
        assert!(!workflow.state().has_session());

        // Retrying the same action works once the fault clears.
        peripheral.set_should_fail(false, None).await;
        assert!(workflow.run(StepId::OpenSession).await.is_success());
        assert_eq!(peripheral.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_battery_level_decodes_first_byte() {
        let peripheral = MockPeripheral::builder("MC330-0003")
            .service(MockService::new(
                BATTERY_SERVICE,
                vec![MockCharacteristic::new(BATTERY_LEVEL, vec![0x4B, 0xFF])],
            ))
            .build();
        let workflow = connected(MockPlatform::new().peripheral(peripheral)).await;
        workflow.run(StepId::DiscoverBatteryService).await;
        workflow.run(StepId::ReadBatteryLevel).await;

        assert_eq!(workflow.state().battery_level(), Some(75));
    }

    #[tokio::test]
    async fn test_empty_battery_value_is_invalid_data() {
        let peripheral = MockPeripheral::builder("MC330-0004")
            .service(MockService::new(
                BATTERY_SERVICE,
                vec![MockCharacteristic::new(BATTERY_LEVEL, Vec::new())],
            ))
            .build();
        let workflow = connected(MockPlatform::new().peripheral(peripheral)).await;
        workflow.run(StepId::DiscoverBatteryService).await;

        let outcome = workflow.run(StepId::ReadBatteryLevel).await;
        assert!(outcome.message().unwrap().starts_with("Invalid data"));
        assert!(!workflow.state().has_battery_level());
    }

    #[tokio::test]
    async fn test_missing_service_leaves_branch_pending() {
        let peripheral = MockPeripheral::builder("MC330-0005").build();
        let workflow = connected(MockPlatform::new().peripheral(peripheral)).await;

        let outcome = workflow.run(StepId::DiscoverBatteryService).await;
        assert!(outcome.message().unwrap().contains("Service not found"));
        assert!(!workflow.state().has_battery_service());
        assert!(
            workflow
                .available_steps()
                .contains(&StepId::DiscoverBatteryService)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_info_fields_keep_listing_order() {
        let service = MockService::new(
            DEVICE_INFO_SERVICE,
            vec![
                MockCharacteristic::new(MANUFACTURER_NAME, "Acme")
                    .read_latency(Duration::from_millis(300)),
                MockCharacteristic::new(MODEL_NUMBER, "MC330")
                    .read_latency(Duration::from_millis(10)),
                MockCharacteristic::new(BATTERY_LEVEL, vec![1]).write_only(),
                MockCharacteristic::new(FIRMWARE_REVISION, "1.4.2")
                    .read_latency(Duration::from_millis(100)),
            ],
        );
        let peripheral = MockPeripheral::builder("MC330-0006").service(service).build();
        let workflow = connected(MockPlatform::new().peripheral(peripheral)).await;
        workflow.run(StepId::DiscoverInfoService).await;

        assert!(workflow.run(StepId::ReadInfoFields).await.is_success());
        let state = workflow.state();
        let fields = state.info_fields().unwrap();
        let uuids: Vec<_> = fields.iter().map(|f| f.uuid).collect();
        assert_eq!(uuids, vec![MANUFACTURER_NAME, MODEL_NUMBER, FIRMWARE_REVISION]);
        let values: Vec<&str> = fields.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["Acme", "MC330", "1.4.2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_steps_log_both_starts_first() {
        let service = MockService::new(
            BATTERY_SERVICE,
            vec![
                MockCharacteristic::new(BATTERY_LEVEL, vec![0x4B])
                    .read_latency(Duration::from_millis(200)),
            ],
        );
        let info = MockService::device_info([(MODEL_NUMBER, "MC330")]);
        if let Some(model) = info.mock_characteristic(MODEL_NUMBER) {
            model.set_read_latency(Duration::from_millis(100));
        }
        let peripheral = MockPeripheral::builder("MC330-0007")
            .service(service)
            .service(info)
            .build();
        let workflow = connected(MockPlatform::new().peripheral(peripheral)).await;
        workflow.run(StepId::DiscoverBatteryService).await;
        workflow.run(StepId::DiscoverInfoService).await;

        let mark = workflow.log().len();
        let (battery, info) = tokio::join!(
            workflow.run(StepId::ReadBatteryLevel),
            workflow.run(StepId::ReadInfoFields),
        );
        assert!(battery.is_success());
        assert!(info.is_success());

        let entries = workflow.log().since(mark);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].tag, LogTag::Start);
        assert_eq!(entries[1].tag, LogTag::Start);
        assert!(entries[2].tag.is_terminal());
        assert!(entries[3].tag.is_terminal());
        for name in ["ReadBatteryLevel", "ReadInfoFields"] {
            assert_eq!(entries.iter().filter(|e| e.name == name).count(), 2);
        }

        let state = workflow.state();
        assert_eq!(state.battery_level(), Some(75));
        assert_eq!(state.info_fields().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_close_session_clears_downstream() {
        let peripheral = sensor();
        let workflow = connected(MockPlatform::new().peripheral(peripheral.clone())).await;
        workflow.run(StepId::DiscoverBatteryService).await;
        workflow.run(StepId::ReadBatteryLevel).await;

        assert!(workflow.run(StepId::CloseSession).await.is_success());
        let state = workflow.state();
        assert!(state.has_peripheral());
        assert!(!state.has_session());
        assert!(!state.has_battery_service());
        assert!(!state.has_battery_level());
        assert!(!peripheral.is_connected_sync());
        assert_eq!(workflow.available_steps(), vec![StepId::OpenSession]);
    }

    #[tokio::test]
    async fn test_rediscovery_closes_previous_session() {
        let peripheral = sensor();
        let workflow = connected(MockPlatform::new().peripheral(peripheral.clone())).await;
        workflow.run(StepId::DiscoverBatteryService).await;
        assert!(peripheral.is_connected_sync());

        assert!(workflow.run(StepId::DiscoverPeripheral).await.is_success());
        let state = workflow.state();
        assert!(state.has_peripheral());
        assert!(!state.has_session());
        assert!(!state.has_battery_service());
        assert!(state.is_consistent());
        assert!(!peripheral.is_connected_sync());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_during_discovery_discards_result() {
        let peripheral = MockPeripheral::builder("MC330-0008")
            .battery_level(10)
            .service_latency(Duration::from_millis(100))
            .build();
        let workflow = connected(MockPlatform::new().peripheral(peripheral)).await;

        let (discover, close) = tokio::join!(
            workflow.run(StepId::DiscoverBatteryService),
            workflow.run(StepId::CloseSession),
        );

        assert!(close.is_success());
        assert!(!discover.is_success());
        let state = workflow.state();
        assert!(!state.has_battery_service());
        assert!(state.is_consistent());
    }

    #[tokio::test]
    async fn test_list_known_does_not_advance() {
        let platform = MockPlatform::new().known(sensor());
        let workflow = workflow(platform);

        assert!(workflow.run(StepId::ListKnownPeripherals).await.is_success());
        let state = workflow.state();
        assert_eq!(state.known_peripherals().unwrap().len(), 1);
        assert_eq!(
            state.known_peripherals().unwrap()[0].name.as_deref(),
            Some("MC330-0001")
        );
        assert!(!state.has_peripheral());
    }

    #[test]
    fn test_step_names_are_unique() {
        let mut names: Vec<_> = StepId::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StepId::ALL.len());
        assert_eq!(StepId::OpenSession.to_string(), "Connect GATT server");
    }
}
