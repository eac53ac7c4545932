pub mod driver;
pub mod link;
pub mod mock;

pub use driver::{NativePortDriver, PortDriver, PortHandle};
pub use link::SerialLink;
pub use mock::MockPortDriver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Baud rate the CHP controller firmware runs at
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Serial port as reported by the OS enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDescriptor {
    pub path: String,
    pub description: String,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    pub vendor_id: Option<String>,
    pub product_id: Option<String>,
    pub pnp_id: Option<String>,
    pub location_id: Option<String>,
}

impl PortDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: "Serial Port".to_string(),
            manufacturer: None,
            serial_number: None,
            vendor_id: None,
            product_id: None,
            pnp_id: None,
            location_id: None,
        }
    }

    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vendor_id = Some(format!("{:04x}", vid));
        self.product_id = Some(format!("{:04x}", pid));
        self
    }
}

/// Link connection state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Opening,
    Open,
    Closing,
    Error(String),
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

/// Status event emitted on every link transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkStatus {
    pub is_open: bool,
    pub path: String,
    pub state: ConnectionState,
    pub changed_at: DateTime<Utc>,
}

impl LinkStatus {
    pub fn new(path: impl Into<String>, state: ConnectionState) -> Self {
        Self {
            is_open: state.is_open(),
            path: path.into(),
            state,
            changed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("Port {0} is still opening")]
    AlreadyOpening(String),

    #[error("Port {path} unavailable: {reason}")]
    PortUnavailable { path: String, reason: String },

    #[error("Failed to close {path}: {reason}")]
    CloseFailed { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    #[error("Port not open")]
    NotOpen,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Timed out waiting for device report")]
    Timeout,
}

impl From<std::io::Error> for WriteError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            WriteError::Timeout
        } else {
            WriteError::Io(e.to_string())
        }
    }
}
