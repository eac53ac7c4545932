pub mod catalog;
pub mod codec;
pub mod controller;
pub mod models;
pub mod protocol;

pub use codec::DeviceCommandCodec;
pub use controller::{ControllerHandle, ControllerState, DeviceController};
pub use models::*;
pub use protocol::{DeviceProtocol, MirrorProtocol, QueryProtocol};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed device report: {0}")]
    MalformedReport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadbackError {
    #[error("Serial communication error: {0}")]
    Link(#[from] crate::serial::WriteError),
}
