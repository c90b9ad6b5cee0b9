//! Step-by-step BLE pairing and GATT read workflow.
//!
//! This crate drives a peripheral through a small state machine: pick a
//! peripheral, open a GATT session, discover the Battery and Device
//! Information services, then read the battery level and the device
//! information strings. Each step is a single user-triggered action that is
//! logged to an [`ActivityLog`].
//!
//! # Features
//!
//! - **Explicit state**: [`ConnectionState`] holds one optional artifact per
//!   stage; [`panel::visible_actions`] derives the actions to offer from it
//! - **Uniform logging**: [`StepRunner`] records `start` and exactly one
//!   terminal entry for every step, and never lets a failure escape
//! - **Precondition checks**: every step re-validates its prerequisite before
//!   touching the platform, independent of which actions the UI offers
//! - **Pluggable platform**: the [`platform`] traits are implemented over
//!   btleplug in [`ble`] and in memory in [`mock`]
//!
//! # Platform Differences
//!
//! Peripheral identifiers come from btleplug. On macOS they are
//! CoreBluetooth UUIDs that are stable per host; on Linux and Windows they are
//! MAC addresses. See [`util::create_identifier`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gattdemo_core::{BlePlatform, StepId, Workflow};
//! use gattdemo_types::{DeviceFilter, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = BlePlatform::new(BlePlatform::first_match()).await?;
//!     let request = RequestOptions::with_filter(DeviceFilter::name_prefix("MC330"));
//!     let workflow = Workflow::new(Arc::new(platform), request);
//!
//!     for step in [
//!         StepId::DiscoverPeripheral,
//!         StepId::OpenSession,
//!         StepId::DiscoverBatteryService,
//!         StepId::ReadBatteryLevel,
//!     ] {
//!         workflow.run(step).await;
//!     }
//!
//!     for entry in workflow.log().entries() {
//!         println!("{}", entry);
//!     }
//!     Ok(())
//! }
//! ```

pub mod ble;
pub mod error;
pub mod log;
pub mod mock;
pub mod panel;
pub mod platform;
pub mod runner;
pub mod scan;
pub mod state;
pub mod util;
pub mod workflow;

// Core exports
pub use ble::{BlePlatform, Chooser, ConnectionConfig};
pub use error::{DeviceNotFoundReason, Error, Prerequisite, Result};
pub use log::{ActivityLog, LogEntry, LogTag};
pub use panel::{visible, visible_actions};
pub use platform::{
    Characteristic, Peripheral, PeripheralHandle, Platform, Service, ServiceHandle, Session,
    SessionHandle,
};
pub use runner::{FailureStage, StepOutcome, StepRunner};
pub use scan::ScanOptions;
pub use state::{Branch, ConnectionState, Stage};
pub use util::{create_identifier, format_peripheral_id};
pub use workflow::{StepId, Workflow};

// Re-export from gattdemo-types
pub use gattdemo_types::uuid as uuids;
pub use gattdemo_types::{DeviceFilter, InfoField, PeripheralInfo, RequestOptions};
