//! Core types shared by the platform backends and the workflow.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParseError, ParseResult};

/// Identity of a discovered peripheral, as shown in listings and choosers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeripheralInfo {
    /// Platform identifier (MAC address on Linux/Windows, UUID on macOS).
    pub id: String,
    /// Advertised local name, if any.
    pub name: Option<String>,
    /// Service UUIDs seen in advertisements.
    #[cfg_attr(feature = "serde", serde(default))]
    pub services: Vec<Uuid>,
    /// Signal strength at discovery time.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rssi: Option<i16>,
}

impl PeripheralInfo {
    /// Create an info record with only an id and a name.
    pub fn new(id: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
            services: Vec::new(),
            rssi: None,
        }
    }
}

impl fmt::Display for PeripheralInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.id),
            None => write!(f, "Unknown ({})", self.id),
        }
    }
}

/// One entry of a peripheral request filter.
///
/// Every field that is set must match; unset fields match anything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceFilter {
    /// Exact advertised name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
    /// Prefix of the advertised name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name_prefix: Option<String>,
    /// Services the peripheral must advertise.
    #[cfg_attr(feature = "serde", serde(default))]
    pub services: Vec<Uuid>,
}

impl DeviceFilter {
    /// Filter on a name prefix.
    pub fn name_prefix(prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Filter on an exact name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Filter on advertised services.
    pub fn services(services: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            services: services.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Whether the filter sets no constraint at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.name_prefix.is_none() && self.services.is_empty()
    }

    /// Check a peripheral against this filter.
    #[must_use]
    pub fn matches(&self, info: &PeripheralInfo) -> bool {
        if let Some(name) = &self.name
            && info.name.as_deref() != Some(name.as_str())
        {
            return false;
        }
        if let Some(prefix) = &self.name_prefix
            && !info
                .name
                .as_deref()
                .is_some_and(|n| n.starts_with(prefix.as_str()))
        {
            return false;
        }
        self.services
            .iter()
            .all(|service| info.services.contains(service))
    }
}

/// Parameters of a peripheral request.
///
/// Either `accept_all` is set, or at least one filter is given; not both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RequestOptions {
    /// Candidate filters; a peripheral matching any of them is offered.
    #[cfg_attr(feature = "serde", serde(default))]
    pub filters: Vec<DeviceFilter>,
    /// Offer every peripheral in range.
    #[cfg_attr(feature = "serde", serde(default))]
    pub accept_all: bool,
    /// Services the caller intends to use after connecting.
    #[cfg_attr(feature = "serde", serde(default))]
    pub optional_services: Vec<Uuid>,
}

impl RequestOptions {
    /// Request peripherals matching a single filter.
    pub fn with_filter(filter: DeviceFilter) -> Self {
        Self {
            filters: vec![filter],
            ..Self::default()
        }
    }

    /// Request any peripheral in range.
    pub fn accept_all() -> Self {
        Self {
            accept_all: true,
            ..Self::default()
        }
    }

    /// Add a service the caller will access.
    #[must_use]
    pub fn optional_service(mut self, service: Uuid) -> Self {
        if !self.optional_services.contains(&service) {
            self.optional_services.push(service);
        }
        self
    }

    /// Check that the request is well-formed.
    pub fn validate(&self) -> ParseResult<()> {
        if self.accept_all && !self.filters.is_empty() {
            return Err(ParseError::InvalidRequest(
                "filters cannot be combined with accept_all".to_string(),
            ));
        }
        if !self.accept_all && self.filters.is_empty() {
            return Err(ParseError::InvalidRequest(
                "either filters or accept_all must be given".to_string(),
            ));
        }
        if self.filters.iter().any(DeviceFilter::is_empty) {
            return Err(ParseError::InvalidRequest("empty filter".to_string()));
        }
        Ok(())
    }

    /// Whether a peripheral should be offered for this request.
    #[must_use]
    pub fn matches(&self, info: &PeripheralInfo) -> bool {
        self.accept_all || self.filters.iter().any(|f| f.matches(info))
    }

    /// Service UUIDs to pass to a platform scan filter, if every filter
    /// constrains services.
    #[must_use]
    pub fn scan_services(&self) -> Vec<Uuid> {
        if self.accept_all || self.filters.iter().any(|f| f.services.is_empty()) {
            return Vec::new();
        }
        let mut services: Vec<Uuid> = Vec::new();
        for uuid in self.filters.iter().flat_map(|f| f.services.iter()) {
            if !services.contains(uuid) {
                services.push(*uuid);
            }
        }
        services
    }
}

/// A decoded Device Information value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InfoField {
    /// Characteristic the value was read from.
    pub uuid: Uuid,
    /// Decoded text.
    pub value: String,
}

impl InfoField {
    /// Decode a raw characteristic value.
    pub fn from_bytes(uuid: Uuid, bytes: &[u8]) -> Self {
        Self {
            uuid,
            value: decode_text(bytes),
        }
    }

    /// Display label for the characteristic, falling back to its UUID.
    #[must_use]
    pub fn label(&self) -> String {
        crate::uuid::characteristic_label(self.uuid)
            .map(str::to_string)
            .unwrap_or_else(|| self.uuid.to_string())
    }
}

impl fmt::Display for InfoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.value)
    }
}

/// Decode the battery level (percent) from a Battery Level value.
///
/// Only byte 0 is significant; trailing bytes are ignored.
///
/// # Examples
///
/// ```
/// use gattdemo_types::decode_battery_level;
///
/// assert_eq!(decode_battery_level(&[0x4B]).unwrap(), 75);
/// assert!(decode_battery_level(&[]).is_err());
/// ```
pub fn decode_battery_level(bytes: &[u8]) -> ParseResult<u8> {
    bytes.first().copied().ok_or(ParseError::InsufficientBytes {
        expected: 1,
        actual: 0,
    })
}

/// Decode a UTF-8 string value.
///
/// Invalid sequences are replaced with U+FFFD rather than rejected.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuid::{BATTERY_SERVICE, DEVICE_INFO_SERVICE, MODEL_NUMBER};
    use proptest::prelude::*;

    fn info(name: Option<&str>, services: &[Uuid]) -> PeripheralInfo {
        PeripheralInfo {
            id: "AA:BB:CC:DD:EE:FF".to_string(),
            name: name.map(str::to_string),
            services: services.to_vec(),
            rssi: Some(-60),
        }
    }

    #[test]
    fn test_name_prefix_filter() {
        let filter = DeviceFilter::name_prefix("MC330");
        assert!(filter.matches(&info(Some("MC330-1234"), &[])));
        assert!(!filter.matches(&info(Some("Thermo 12345"), &[])));
        assert!(!filter.matches(&info(None, &[])));
    }

    #[test]
    fn test_exact_name_filter() {
        let filter = DeviceFilter::name("Scale");
        assert!(filter.matches(&info(Some("Scale"), &[])));
        assert!(!filter.matches(&info(Some("Scale 2"), &[])));
    }

    #[test]
    fn test_service_filter_requires_all_services() {
        let filter = DeviceFilter::services([BATTERY_SERVICE, DEVICE_INFO_SERVICE]);
        assert!(filter.matches(&info(None, &[DEVICE_INFO_SERVICE, BATTERY_SERVICE])));
        assert!(!filter.matches(&info(None, &[BATTERY_SERVICE])));
    }

    #[test]
    fn test_combined_filter_fields() {
        let filter = DeviceFilter {
            name_prefix: Some("MC".to_string()),
            services: vec![BATTERY_SERVICE],
            ..DeviceFilter::default()
        };
        assert!(filter.matches(&info(Some("MC330"), &[BATTERY_SERVICE])));
        assert!(!filter.matches(&info(Some("MC330"), &[])));
        assert!(!filter.matches(&info(Some("XY"), &[BATTERY_SERVICE])));
    }

    #[test]
    fn test_request_matches_any_filter() {
        let request = RequestOptions {
            filters: vec![DeviceFilter::name("A"), DeviceFilter::name_prefix("MC")],
            ..RequestOptions::default()
        };
        assert!(request.matches(&info(Some("A"), &[])));
        assert!(request.matches(&info(Some("MC330"), &[])));
        assert!(!request.matches(&info(Some("B"), &[])));
        assert!(RequestOptions::accept_all().matches(&info(None, &[])));
    }

    #[test]
    fn test_request_validation() {
        assert!(RequestOptions::accept_all().validate().is_ok());
        assert!(
            RequestOptions::with_filter(DeviceFilter::name_prefix("MC330"))
                .validate()
                .is_ok()
        );

        let err = RequestOptions::default().validate().unwrap_err();
        assert!(err.to_string().contains("either filters or accept_all"));

        let mut both = RequestOptions::accept_all();
        both.filters.push(DeviceFilter::name("x"));
        assert!(both.validate().is_err());

        let empty = RequestOptions::with_filter(DeviceFilter::default());
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_scan_services() {
        let request = RequestOptions {
            filters: vec![
                DeviceFilter::services([BATTERY_SERVICE]),
                DeviceFilter::services([BATTERY_SERVICE, DEVICE_INFO_SERVICE]),
            ],
            ..RequestOptions::default()
        };
        assert_eq!(
            request.scan_services(),
            vec![BATTERY_SERVICE, DEVICE_INFO_SERVICE]
        );

        // a name-only filter cannot be expressed as a service scan
        let mixed = RequestOptions {
            filters: vec![
                DeviceFilter::services([BATTERY_SERVICE]),
                DeviceFilter::name_prefix("MC"),
            ],
            ..RequestOptions::default()
        };
        assert!(mixed.scan_services().is_empty());
    }

    #[test]
    fn test_optional_service_dedup() {
        let request = RequestOptions::accept_all()
            .optional_service(BATTERY_SERVICE)
            .optional_service(BATTERY_SERVICE);
        assert_eq!(request.optional_services, vec![BATTERY_SERVICE]);
    }

    #[test]
    fn test_decode_battery_level() {
        assert_eq!(decode_battery_level(&[0x4B]).unwrap(), 75);
        assert_eq!(decode_battery_level(&[0xFF, 0x01]).unwrap(), 255);
        let err = decode_battery_level(&[]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InsufficientBytes {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"MC330"), "MC330");
        assert_eq!(decode_text(&[0x66, 0x6F, 0xFF]), "fo\u{FFFD}");
        assert_eq!(decode_text(&[]), "");
    }

    #[test]
    fn test_info_field_label() {
        let field = InfoField::from_bytes(MODEL_NUMBER, b"MC330");
        assert_eq!(field.label(), "Model Number");
        assert_eq!(field.to_string(), "Model Number: MC330");

        let custom = InfoField::from_bytes(BATTERY_SERVICE, b"x");
        assert_eq!(custom.label(), BATTERY_SERVICE.to_string());
    }

    #[test]
    fn test_peripheral_info_display() {
        assert_eq!(
            info(Some("MC330"), &[]).to_string(),
            "MC330 (AA:BB:CC:DD:EE:FF)"
        );
        assert_eq!(info(None, &[]).to_string(), "Unknown (AA:BB:CC:DD:EE:FF)");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_request_options_deserialize_defaults() {
        let request: RequestOptions = serde_json::from_str(r#"{"accept_all": true}"#).unwrap();
        assert!(request.accept_all);
        assert!(request.filters.is_empty());
        assert!(request.optional_services.is_empty());
    }

    proptest! {
        #[test]
        fn battery_level_is_first_byte(bytes in proptest::collection::vec(any::<u8>(), 1..16)) {
            prop_assert_eq!(decode_battery_level(&bytes).unwrap(), bytes[0]);
        }

        #[test]
        fn valid_utf8_decodes_unchanged(text in "\\PC{0,32}") {
            prop_assert_eq!(decode_text(text.as_bytes()), text);
        }

        #[test]
        fn decode_text_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode_text(&bytes);
        }
    }
}
