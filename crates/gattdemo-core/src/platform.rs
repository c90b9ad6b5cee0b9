//! Trait abstractions over the wireless-peripheral platform.
//!
//! The workflow only ever talks to these traits. [`crate::ble`] implements
//! them on top of btleplug and [`crate::mock`] implements them in memory, so
//! the same steps drive real hardware and the tests.
//!
//! The handles form a chain: a [`Platform`] yields [`Peripheral`]s, a
//! peripheral opens a [`Session`], a session yields primary [`Service`]s and a
//! service yields [`Characteristic`]s. Every handle is shared as an `Arc<dyn _>`
//! so the connection state can hand clones to in-flight steps.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use gattdemo_types::{PeripheralInfo, RequestOptions};

use crate::error::Result;

/// Shared handle to a peripheral.
pub type PeripheralHandle = Arc<dyn Peripheral>;

/// Shared handle to an open GATT session.
pub type SessionHandle = Arc<dyn Session>;

/// Shared handle to a discovered primary service.
pub type ServiceHandle = Arc<dyn Service>;

/// Shared handle to a characteristic.
pub type CharacteristicHandle = Arc<dyn Characteristic>;

/// Entry point to the platform's peripheral access.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Ask the user to pick a peripheral matching `request`.
    ///
    /// Dismissing the chooser must surface as [`crate::Error::Cancelled`].
    async fn request_peripheral(&self, request: &RequestOptions) -> Result<PeripheralHandle>;

    /// List peripherals the platform already knows about, without prompting.
    async fn known_peripherals(&self) -> Result<Vec<PeripheralHandle>>;
}

/// A discovered peripheral.
#[async_trait]
pub trait Peripheral: Send + Sync + fmt::Debug {
    /// Platform identifier.
    fn id(&self) -> &str;

    /// Advertised name, if any.
    fn name(&self) -> Option<&str>;

    /// Whether the peripheral exposes a GATT transport that can be connected.
    fn has_gatt(&self) -> bool;

    /// Connect to the peripheral's attribute server.
    async fn connect(&self) -> Result<SessionHandle>;

    /// Identity snapshot for listings.
    fn info(&self) -> PeripheralInfo {
        PeripheralInfo::new(self.id(), self.name())
    }
}

/// An open connection to a peripheral's attribute server.
#[async_trait]
pub trait Session: Send + Sync + fmt::Debug {
    /// Identifier of the peripheral this session belongs to.
    fn peripheral_id(&self) -> &str;

    /// Look up a primary service by UUID.
    async fn primary_service(&self, uuid: Uuid) -> Result<ServiceHandle>;

    /// Query the transport's connection state.
    async fn is_connected(&self) -> bool;

    /// Close the session.
    async fn disconnect(&self) -> Result<()>;
}

/// A primary service discovered on a session.
#[async_trait]
pub trait Service: Send + Sync + fmt::Debug {
    /// Service UUID.
    fn uuid(&self) -> Uuid;

    /// Look up a characteristic by UUID.
    async fn characteristic(&self, uuid: Uuid) -> Result<CharacteristicHandle>;

    /// All characteristics of the service, in the order the service lists them.
    async fn characteristics(&self) -> Result<Vec<CharacteristicHandle>>;
}

/// A single attribute value within a service.
#[async_trait]
pub trait Characteristic: Send + Sync + fmt::Debug {
    /// Characteristic UUID.
    fn uuid(&self) -> Uuid;

    /// Whether the characteristic permits reads.
    fn is_readable(&self) -> bool;

    /// Read the raw value.
    async fn read_value(&self) -> Result<Vec<u8>>;
}
