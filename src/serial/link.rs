use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::driver::{PortDriver, PortHandle};
use super::{ConnectionError, ConnectionState, LinkStatus, PortDescriptor, WriteError};

/// Single owner of the native serial handle.
///
/// Every transition is reported on the status channel exactly once, so the
/// controller can forward link changes in the order they happened.
pub struct SerialLink {
    driver: Arc<dyn PortDriver>,
    handle: Option<Box<dyn PortHandle>>,
    state: ConnectionState,
    path: String,
    status_tx: mpsc::UnboundedSender<LinkStatus>,
}

impl SerialLink {
    pub fn new(driver: Arc<dyn PortDriver>, status_tx: mpsc::UnboundedSender<LinkStatus>) -> Self {
        Self {
            driver,
            handle: None,
            state: ConnectionState::Disconnected,
            path: String::new(),
            status_tx,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Path of the current (or last used) port
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open() && self.handle.is_some()
    }

    /// Snapshot of the link without emitting anything
    pub fn status(&self) -> LinkStatus {
        LinkStatus::new(&self.path, self.state.clone())
    }

    /// Open `path`, closing any previous handle first
    pub async fn open(&mut self, path: &str, baud_rate: u32) -> Result<(), ConnectionError> {
        if self.state == ConnectionState::Opening {
            return Err(ConnectionError::AlreadyOpening(self.path.clone()));
        }

        if self.state != ConnectionState::Disconnected {
            log::info!("Closing {} before opening {}", self.path, path);
            if let Err(e) = self.close().await {
                log::warn!("{}", e);
            }
        }

        log::info!("Opening serial port: {}", path);
        self.path = path.to_string();
        self.state = ConnectionState::Opening;

        match self.driver.open(path, baud_rate).await {
            Ok(handle) => {
                self.handle = Some(handle);
                self.transition(ConnectionState::Open);
                log::info!("Serial port {} open", path);
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                log::error!("Failed to open {}: {}", path, reason);
                self.transition(ConnectionState::Error(reason.clone()));
                Err(ConnectionError::PortUnavailable {
                    path: path.to_string(),
                    reason,
                })
            }
        }
    }

    /// Release the handle. Closing a disconnected link does nothing.
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }

        log::info!("Disconnecting from {}", self.path);
        self.state = ConnectionState::Closing;
        let result = match self.handle.take() {
            Some(handle) => handle.close().await,
            None => Ok(()),
        };
        self.transition(ConnectionState::Disconnected);

        result.map_err(|e| ConnectionError::CloseFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write one command. A transport error leaves the link open.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        if !self.state.is_open() {
            return Err(WriteError::NotOpen);
        }
        let handle = self.handle.as_mut().ok_or(WriteError::NotOpen)?;

        log::debug!("Writing {} to {}", hex::encode(bytes), self.path);
        if let Err(e) = handle.write_all(bytes).await {
            log::error!("Write to {} failed: {}", self.path, e);
            self.emit();
            return Err(WriteError::from(e));
        }
        Ok(())
    }

    /// Read one report line from the device
    pub async fn read_report(&mut self, timeout: Duration) -> Result<Vec<u8>, WriteError> {
        if !self.state.is_open() {
            return Err(WriteError::NotOpen);
        }
        let handle = self.handle.as_mut().ok_or(WriteError::NotOpen)?;

        match handle.read_line(timeout).await {
            Ok(report) => Ok(report),
            Err(e) => {
                let err = WriteError::from(e);
                if err != WriteError::Timeout {
                    log::error!("Read from {} failed: {}", self.path, err);
                    self.emit();
                }
                Err(err)
            }
        }
    }

    /// Enumerate ports. Failures degrade to an empty list.
    pub fn list(&self) -> Vec<PortDescriptor> {
        match self.driver.list() {
            Ok(ports) => ports,
            Err(e) => {
                log::warn!("Failed to enumerate serial ports: {}", e);
                Vec::new()
            }
        }
    }

    fn transition(&mut self, state: ConnectionState) {
        self.state = state;
        self.emit();
    }

    fn emit(&self) {
        let _ = self.status_tx.send(self.status());
    }
}
