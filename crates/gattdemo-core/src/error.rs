//! Error types for gattdemo-core.
//!
//! Failures fall into three groups, and the activity log shows all of them the
//! same way (`error <step>: <message>`):
//!
//! | Group | Variants | Raised |
//! |-------|----------|--------|
//! | Precondition | [`Error::MissingPrerequisite`] | before the step's platform call starts |
//! | Platform rejection | [`Error::Cancelled`], [`Error::DeviceNotFound`], [`Error::ServiceNotFound`], [`Error::CharacteristicNotFound`], [`Error::Bluetooth`], [`Error::Timeout`], [`Error::NotConnected`], [`Error::ConnectionFailed`], [`Error::ReadFailed`] | while the platform call is pending |
//! | Decoding | [`Error::InvalidData`] | after a read completes |
//!
//! None of them is retried. A failed step leaves the connection state as it
//! was, so the same action can simply be chosen again.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while driving the pairing workflow.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// A step was started before the artifact it needs exists.
    #[error("{0} not available")]
    MissingPrerequisite(Prerequisite),

    /// The user dismissed the peripheral chooser.
    #[error("Peripheral request cancelled by user")]
    Cancelled,

    /// No peripheral matched the request.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// The session dropped before or during the operation.
    #[error("Not connected to device")]
    NotConnected,

    /// The peripheral refused or dropped the connection attempt.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Reading a characteristic failed.
    #[error("Read failed from characteristic {uuid}: {reason}")]
    ReadFailed {
        /// The characteristic UUID.
        uuid: String,
        /// The reason for the failure.
        reason: String,
    },

    /// The peripheral has no primary service with this UUID.
    #[error("Service not found: {uuid}")]
    ServiceNotFound {
        /// The service UUID that was requested.
        uuid: String,
    },

    /// The service has no characteristic with this UUID.
    #[error("Characteristic not found: {uuid} (in service {service})")]
    CharacteristicNotFound {
        /// The characteristic UUID that was requested.
        uuid: String,
        /// The service that was searched.
        service: String,
    },

    /// Failed to decode data received from the device.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A platform call timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The artifact a step was missing when it was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Prerequisite {
    /// No peripheral has been selected.
    Peripheral,
    /// The selected peripheral exposes no GATT transport.
    Gatt,
    /// No GATT session is open.
    Session,
    /// The battery service has not been discovered.
    BatteryService,
    /// The device information service has not been discovered.
    DeviceInfoService,
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Peripheral => "peripheral",
            Self::Gatt => "GATT",
            Self::Session => "session",
            Self::BatteryService => "battery service",
            Self::DeviceInfoService => "device information service",
        };
        f.write_str(name)
    }
}

/// Reason why a device was not found.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// No matching devices found during scan.
    NoDevicesInRange,
    /// No Bluetooth adapter available.
    NoAdapter,
}

impl fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevicesInRange => write!(f, "no matching devices in range"),
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
        }
    }
}

impl Error {
    /// Create a missing-prerequisite error.
    pub fn missing(prerequisite: Prerequisite) -> Self {
        Self::MissingPrerequisite(prerequisite)
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a service not found error.
    pub fn service_not_found(uuid: impl fmt::Display) -> Self {
        Self::ServiceNotFound {
            uuid: uuid.to_string(),
        }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl fmt::Display, service: impl fmt::Display) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.to_string(),
            service: service.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether this error is a precondition failure rather than a platform one.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingPrerequisite(_))
    }
}

impl From<gattdemo_types::ParseError> for Error {
    fn from(err: gattdemo_types::ParseError) -> Self {
        match err {
            gattdemo_types::ParseError::InvalidRequest(msg) => Error::InvalidConfig(msg),
            gattdemo_types::ParseError::UnknownUuidName(name) => {
                Error::InvalidConfig(format!("unknown UUID name '{}'", name))
            }
            other => Error::InvalidData(other.to_string()),
        }
    }
}

/// Result type alias using gattdemo-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
