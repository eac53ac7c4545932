//! Read-back of the device state after a confirmed write.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::models::StateOption;
use super::ReadbackError;
use crate::serial::SerialLink;

#[async_trait::async_trait]
pub trait DeviceProtocol: Send {
    /// Raw state report after `written` has reached the device
    async fn read_back(
        &mut self,
        link: &mut SerialLink,
        written: &StateOption,
    ) -> Result<Vec<u8>, ReadbackError>;
}

/// In-process model of the light controller: the state it reports is the
/// canonical code of the command it just accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct MirrorProtocol;

impl MirrorProtocol {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl DeviceProtocol for MirrorProtocol {
    async fn read_back(
        &mut self,
        _link: &mut SerialLink,
        written: &StateOption,
    ) -> Result<Vec<u8>, ReadbackError> {
        Ok(written.c_command.as_bytes().to_vec())
    }
}

/// Asks the device for its state over the wire
#[derive(Debug, Clone)]
pub struct QueryProtocol {
    query: Vec<u8>,
    timeout: Duration,
}

impl QueryProtocol {
    pub fn new(query: impl Into<Vec<u8>>, timeout: Duration) -> Self {
        Self {
            query: query.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl DeviceProtocol for QueryProtocol {
    async fn read_back(
        &mut self,
        link: &mut SerialLink,
        _written: &StateOption,
    ) -> Result<Vec<u8>, ReadbackError> {
        link.write(&self.query).await?;
        Ok(link.read_report(self.timeout).await?)
    }
}

/// How the controller learns the device state after a write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReadbackMode {
    #[default]
    Mirror,
    Query { command: String, timeout_ms: u64 },
}

impl ReadbackMode {
    pub fn build(&self) -> Box<dyn DeviceProtocol> {
        match self {
            ReadbackMode::Mirror => Box::new(MirrorProtocol::new()),
            ReadbackMode::Query { command, timeout_ms } => Box::new(QueryProtocol::new(
                command.as_bytes().to_vec(),
                Duration::from_millis(*timeout_ms),
            )),
        }
    }
}
