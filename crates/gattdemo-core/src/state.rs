//! The artifacts the pairing workflow accumulates.
//!
//! [`ConnectionState`] is a plain container: one optional value and one
//! setter per artifact, with `has_*` helpers computed on read. It performs no
//! validation; the workflow steps check their own prerequisites before they
//! write into it.

use std::fmt;

use gattdemo_types::{InfoField, PeripheralInfo};

use crate::platform::{PeripheralHandle, ServiceHandle, SessionHandle};

/// Progress of one capability branch (battery or device information).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// The service has not been discovered yet.
    Pending,
    /// The service is discovered but nothing has been read.
    HasService,
    /// A reading has been stored.
    HasReading,
}

/// State-machine position derived from which artifacts are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing selected.
    Idle,
    /// A peripheral is selected but no session is open.
    HasPeripheral,
    /// A session is open; the two capability branches progress independently.
    HasSession {
        /// Battery branch.
        battery: Branch,
        /// Device information branch.
        info: Branch,
    },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "Idle"),
            Stage::HasPeripheral => write!(f, "HasPeripheral"),
            Stage::HasSession { battery, info } => {
                write!(f, "HasSession (battery: {:?}, info: {:?})", battery, info)
            }
        }
    }
}

/// Everything the workflow has obtained so far.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    peripheral: Option<PeripheralHandle>,
    session: Option<SessionHandle>,
    battery_service: Option<ServiceHandle>,
    info_service: Option<ServiceHandle>,
    battery_level: Option<u8>,
    info_fields: Option<Vec<InfoField>>,
    known_peripherals: Option<Vec<PeripheralInfo>>,
}

impl ConnectionState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Peripheral ---

    pub fn peripheral(&self) -> Option<&PeripheralHandle> {
        self.peripheral.as_ref()
    }

    pub fn set_peripheral(&mut self, peripheral: Option<PeripheralHandle>) {
        self.peripheral = peripheral;
    }

    pub fn has_peripheral(&self) -> bool {
        self.peripheral.is_some()
    }

    // --- Session ---

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    pub fn set_session(&mut self, session: Option<SessionHandle>) {
        self.session = session;
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    // --- Services ---

    pub fn battery_service(&self) -> Option<&ServiceHandle> {
        self.battery_service.as_ref()
    }

    pub fn set_battery_service(&mut self, service: Option<ServiceHandle>) {
        self.battery_service = service;
    }

    pub fn has_battery_service(&self) -> bool {
        self.battery_service.is_some()
    }

    pub fn info_service(&self) -> Option<&ServiceHandle> {
        self.info_service.as_ref()
    }

    pub fn set_info_service(&mut self, service: Option<ServiceHandle>) {
        self.info_service = service;
    }

    pub fn has_info_service(&self) -> bool {
        self.info_service.is_some()
    }

    // --- Readings ---

    pub fn battery_level(&self) -> Option<u8> {
        self.battery_level
    }

    pub fn set_battery_level(&mut self, level: Option<u8>) {
        self.battery_level = level;
    }

    pub fn has_battery_level(&self) -> bool {
        self.battery_level.is_some()
    }

    pub fn info_fields(&self) -> Option<&[InfoField]> {
        self.info_fields.as_deref()
    }

    pub fn set_info_fields(&mut self, fields: Option<Vec<InfoField>>) {
        self.info_fields = fields;
    }

    pub fn has_info_fields(&self) -> bool {
        self.info_fields.is_some()
    }

    // --- Known peripherals ---

    /// Listing of previously authorized peripherals; independent of the chain.
    pub fn known_peripherals(&self) -> Option<&[PeripheralInfo]> {
        self.known_peripherals.as_deref()
    }

    pub fn set_known_peripherals(&mut self, known: Option<Vec<PeripheralInfo>>) {
        self.known_peripherals = known;
    }

    /// Drop the session and everything discovered or read through it.
    pub fn clear_session(&mut self) {
        self.session = None;
        self.battery_service = None;
        self.info_service = None;
        self.battery_level = None;
        self.info_fields = None;
    }

    /// Current state-machine position.
    pub fn stage(&self) -> Stage {
        if !self.has_peripheral() {
            return Stage::Idle;
        }
        if !self.has_session() {
            return Stage::HasPeripheral;
        }
        Stage::HasSession {
            battery: branch(self.has_battery_service(), self.has_battery_level()),
            info: branch(self.has_info_service(), self.has_info_fields()),
        }
    }

    /// Whether every artifact's predecessors in the chain are present.
    pub fn is_consistent(&self) -> bool {
        let session_ok = !self.has_session() || self.has_peripheral();
        let services_ok =
            !(self.has_battery_service() || self.has_info_service()) || self.has_session();
        let battery_ok = !self.has_battery_level() || self.has_battery_service();
        let info_ok = !self.has_info_fields() || self.has_info_service();
        session_ok && services_ok && battery_ok && info_ok
    }
}

fn branch(has_service: bool, has_reading: bool) -> Branch {
    match (has_service, has_reading) {
        (_, true) => Branch::HasReading,
        (true, false) => Branch::HasService,
        (false, false) => Branch::Pending,
    }
}
