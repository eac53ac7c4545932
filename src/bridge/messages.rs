//! Message kinds exchanged between the UI and the controller.
//!
//! Every message serializes as `{"kind": ..., "payload": ...}`; payload field
//! names are the contract the UI process relies on.

use serde::{Deserialize, Serialize};

use crate::device::DeviceState;
use crate::serial::{LinkStatus, PortDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub app_name: String,
    pub app_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConnect {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(rename = "CHPState")]
    pub chp_state: Option<String>,
}

impl From<&DeviceState> for StateSnapshot {
    fn from(state: &DeviceState) -> Self {
        Self {
            chp_state: state.code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub com_status: bool,
    pub com_port: String,
}

impl From<&LinkStatus> for ConnectionStatus {
    fn from(status: &LinkStatus) -> Self {
        Self {
            com_status: status.is_open,
            com_port: status.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortList {
    pub port_list: Vec<PortDescriptor>,
}

/// UI → controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum BridgeRequest {
    AppInfoRequest,
    StateChangeRequest(StateChange),
    StateRequest,
    ConnectionStatusRequest,
    PortScanRequest,
    PortConnectRequest(PortConnect),
    PortDisconnectRequest,
}

impl BridgeRequest {
    pub fn state_change(command: impl Into<String>) -> Self {
        BridgeRequest::StateChangeRequest(StateChange {
            command: command.into(),
        })
    }

    pub fn connect(path: impl Into<String>) -> Self {
        BridgeRequest::PortConnectRequest(PortConnect { path: path.into() })
    }

    /// The event kind that answers this request
    pub fn response_kind(&self) -> EventKind {
        match self {
            BridgeRequest::AppInfoRequest => EventKind::AppInfoResponse,
            BridgeRequest::StateChangeRequest(_) | BridgeRequest::StateRequest => EventKind::StateBroadcast,
            BridgeRequest::ConnectionStatusRequest
            | BridgeRequest::PortConnectRequest(_)
            | BridgeRequest::PortDisconnectRequest => EventKind::ConnectionStatusBroadcast,
            BridgeRequest::PortScanRequest => EventKind::PortScanResponse,
        }
    }
}

/// Controller → UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum BridgeEvent {
    AppInfoResponse(AppInfo),
    StateBroadcast(StateSnapshot),
    ConnectionStatusBroadcast(ConnectionStatus),
    PortScanResponse(PortList),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AppInfoResponse,
    StateBroadcast,
    ConnectionStatusBroadcast,
    PortScanResponse,
}

impl BridgeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BridgeEvent::AppInfoResponse(_) => EventKind::AppInfoResponse,
            BridgeEvent::StateBroadcast(_) => EventKind::StateBroadcast,
            BridgeEvent::ConnectionStatusBroadcast(_) => EventKind::ConnectionStatusBroadcast,
            BridgeEvent::PortScanResponse(_) => EventKind::PortScanResponse,
        }
    }
}
