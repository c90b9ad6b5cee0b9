//! Error types for data parsing in gattdemo-types.

use thiserror::Error;

/// Errors that can occur when decoding attribute values or interpreting
/// request parameters.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in gattdemo-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The attribute value was shorter than the decoder needs.
    #[error("Insufficient bytes: requires {expected} bytes, got {actual}")]
    InsufficientBytes {
        /// Minimum number of bytes required.
        expected: usize,
        /// Number of bytes received.
        actual: usize,
    },

    /// A value could not be interpreted.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A service or characteristic name is neither a known name, a 16-bit
    /// alias nor a UUID.
    #[error("Unknown UUID name: {0}")]
    UnknownUuidName(String),

    /// A peripheral request is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias using gattdemo-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
