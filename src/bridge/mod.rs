pub mod channel;
pub mod messages;
pub mod stdio;

pub use channel::{next_of_kind, BridgeClient};
pub use messages::*;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Bridge channel closed")]
    ChannelClosed,

    #[error("Timed out waiting for {0:?}")]
    Timeout(EventKind),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid message: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
