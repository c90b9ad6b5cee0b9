//! Platform-agnostic types for the gattdemo BLE pairing demo.
//!
//! This crate holds what both the btleplug backend and the in-memory mock
//! need to agree on:
//!
//! - Standard GATT UUIDs and name resolution
//! - Peripheral identity and request filters
//! - Decoders for the Battery Level and Device Information values
//! - Error types for decoding
//!
//! # Example
//!
//! ```
//! use gattdemo_types::{DeviceFilter, PeripheralInfo, RequestOptions, decode_battery_level};
//!
//! let request = RequestOptions::with_filter(DeviceFilter::name_prefix("MC330"));
//! assert!(request.matches(&PeripheralInfo::new("AA:BB", Some("MC330-01"))));
//! assert_eq!(decode_battery_level(&[75]).unwrap(), 75);
//! ```

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use types::{
    DeviceFilter, InfoField, PeripheralInfo, RequestOptions, decode_battery_level, decode_text,
};
pub use uuid as uuids;
