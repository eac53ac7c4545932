use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use super::codec::DeviceCommandCodec;
use super::models::{CommandRequest, DeviceState};
use super::protocol::DeviceProtocol;
use crate::bridge::{AppInfo, BridgeClient, BridgeEvent, BridgeRequest, ConnectionStatus, PortList, StateSnapshot};
use crate::serial::{ConnectionError, LinkStatus, SerialLink, DEFAULT_BAUD_RATE};

/// Controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    Idle,
    AwaitingWriteAck,
    Faulted,
}

/// Owns the serial link and the authoritative device state.
///
/// Requests are drained one at a time from a single queue, so at most one
/// write is ever outstanding and every broadcast leaves in the order it was
/// produced.
pub struct DeviceController {
    link: SerialLink,
    link_status: mpsc::UnboundedReceiver<LinkStatus>,
    codec: DeviceCommandCodec,
    protocol: Box<dyn DeviceProtocol>,
    device_state: DeviceState,
    state_tx: watch::Sender<ControllerState>,
    events: broadcast::Sender<BridgeEvent>,
    app_info: AppInfo,
    baud_rate: u32,
}

impl DeviceController {
    pub fn new(
        link: SerialLink,
        link_status: mpsc::UnboundedReceiver<LinkStatus>,
        codec: DeviceCommandCodec,
        protocol: Box<dyn DeviceProtocol>,
        events: broadcast::Sender<BridgeEvent>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ControllerState::Idle);
        Self {
            link,
            link_status,
            codec,
            protocol,
            device_state: DeviceState::unknown(),
            state_tx,
            events,
            app_info: AppInfo {
                app_name: env!("CARGO_PKG_NAME").to_string(),
                app_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    pub fn with_app_info(mut self, app_info: AppInfo) -> Self {
        self.app_info = app_info;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn state(&self) -> ControllerState {
        *self.state_tx.borrow()
    }

    /// Run the controller on its own task
    pub fn spawn(self, request_capacity: usize) -> ControllerHandle {
        let (request_tx, request_rx) = mpsc::channel(request_capacity);
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let events = self.events.clone();
        let state_rx = self.state_tx.subscribe();

        let task = tokio::spawn(self.run(request_rx, stop_rx));

        ControllerHandle {
            client: BridgeClient::new(request_tx, events),
            state_rx,
            stop_tx,
            task,
        }
    }

    async fn run(mut self, mut requests: mpsc::Receiver<BridgeRequest>, mut stop_rx: mpsc::Receiver<()>) {
        log::info!("Device controller started");

        loop {
            let request = tokio::select! {
                biased;
                Some(()) = stop_rx.recv() => break,
                request = requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };
            // Not part of the select: an in-flight write always runs to completion
            self.handle_request(request).await;
        }

        if let Err(e) = self.link.close().await {
            log::warn!("{}", e);
        }
        self.flush_link_status();
        log::info!("Device controller stopped");
    }

    /// Apply one bridge request
    pub async fn handle_request(&mut self, request: BridgeRequest) {
        match request {
            BridgeRequest::AppInfoRequest => {
                self.publish(BridgeEvent::AppInfoResponse(self.app_info.clone()));
            }
            BridgeRequest::StateRequest => self.publish_state(),
            BridgeRequest::ConnectionStatusRequest => self.publish_link_status(),
            BridgeRequest::PortScanRequest => {
                log::info!("Scan request received.");
                let port_list = self.link.list();
                log::debug!("Found {} ports", port_list.len());
                self.publish(BridgeEvent::PortScanResponse(PortList { port_list }));
            }
            BridgeRequest::PortConnectRequest(connect) => self.connect(&connect.path).await,
            BridgeRequest::PortDisconnectRequest => self.disconnect().await,
            BridgeRequest::StateChangeRequest(change) => {
                self.apply(CommandRequest::new(change.command)).await;
            }
        }
    }

    async fn connect(&mut self, path: &str) {
        let result = self.link.open(path, self.baud_rate).await;
        let flushed = self.flush_link_status();

        match result {
            Ok(()) => {
                if self.state() == ControllerState::Faulted {
                    log::info!("Link to {} re-established, clearing fault", path);
                }
                self.set_state(ControllerState::Idle);
            }
            Err(ConnectionError::AlreadyOpening(pending)) => {
                log::warn!("{} is still opening, ignoring connect to {}", pending, path);
            }
            Err(e) => log::error!("{}", e),
        }

        if flushed == 0 {
            self.publish_link_status();
        }
    }

    async fn disconnect(&mut self) {
        log::info!("Disconnecting COM Port.");
        if let Err(e) = self.link.close().await {
            log::warn!("{}", e);
        }
        if self.flush_link_status() == 0 {
            self.publish_link_status();
        }
    }

    async fn apply(&mut self, request: CommandRequest) {
        if self.state() == ControllerState::Faulted {
            log::warn!(
                "Rejecting request {} ({}): controller faulted, reconnect required",
                request.request_id,
                request.target_command
            );
            self.publish_link_status();
            return;
        }

        let target = match self.codec.resolve(&request.target_command) {
            Ok((group, option)) if self.device_state.matches(option) => {
                // Re-selecting the active state turns the group off
                let default = group.default_state().unwrap_or(option);
                log::debug!("{} already active, toggling {} to {}", option.proper_name, group.title, default.proper_name);
                default.clone()
            }
            Ok((_, option)) => option.clone(),
            Err(e) => {
                log::warn!("Rejecting request {}: {}", request.request_id, e);
                return;
            }
        };

        let bytes = match self.codec.encode(&target) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Rejecting request {}: {}", request.request_id, e);
                return;
            }
        };

        self.set_state(ControllerState::AwaitingWriteAck);

        if let Err(e) = self.link.write(&bytes).await {
            log::error!("Error with write of {}: {}", target.serial_command, e);
            self.fault();
            return;
        }
        log::info!("Wrote {} (request {})", target.serial_command, request.request_id);

        let report = match self.protocol.read_back(&mut self.link, &target).await {
            Ok(report) => report,
            Err(e) => {
                log::error!("Failed to read device state after {}: {}", target.serial_command, e);
                self.fault();
                return;
            }
        };

        match self.codec.decode(&report) {
            Ok(code) => {
                self.device_state = DeviceState::confirmed(code);
                self.flush_link_status();
                self.set_state(ControllerState::Idle);
                self.publish_state();
            }
            Err(e) => {
                // Keep the last known good state
                log::warn!("{}", e);
                self.set_state(ControllerState::Idle);
                if self.flush_link_status() == 0 {
                    self.publish_link_status();
                }
            }
        }
    }

    fn fault(&mut self) {
        self.set_state(ControllerState::Faulted);
        if self.flush_link_status() == 0 {
            self.publish_link_status();
        }
    }

    fn set_state(&self, state: ControllerState) {
        self.state_tx.send_replace(state);
    }

    /// Forward pending link transitions; returns how many were sent
    fn flush_link_status(&mut self) -> usize {
        let mut count = 0;
        while let Ok(status) = self.link_status.try_recv() {
            self.publish(BridgeEvent::ConnectionStatusBroadcast(ConnectionStatus::from(&status)));
            count += 1;
        }
        count
    }

    fn publish_link_status(&self) {
        let status = self.link.status();
        self.publish(BridgeEvent::ConnectionStatusBroadcast(ConnectionStatus::from(&status)));
    }

    fn publish_state(&self) {
        self.publish(BridgeEvent::StateBroadcast(StateSnapshot::from(&self.device_state)));
    }

    fn publish(&self, event: BridgeEvent) {
        if self.events.send(event).is_err() {
            log::debug!("No bridge subscribers");
        }
    }
}

/// Handle on a spawned controller task
pub struct ControllerHandle {
    client: BridgeClient,
    state_rx: watch::Receiver<ControllerState>,
    stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    pub fn client(&self) -> BridgeClient {
        self.client.clone()
    }

    pub fn state(&self) -> ControllerState {
        *self.state_rx.borrow()
    }

    /// Stop after the request being processed, then close the link
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(()).await;
        if tokio::time::timeout(Duration::from_secs(2), self.task).await.is_err() {
            log::warn!("Device controller did not stop in time");
        }
    }
}
