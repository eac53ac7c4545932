use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;

use super::messages::{BridgeEvent, BridgeRequest, EventKind};
use super::{BridgeError, Result};

/// UI-side end of the bridge. Cheap to clone; every clone shares the same
/// request queue and broadcast stream.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    requests: mpsc::Sender<BridgeRequest>,
    events: broadcast::Sender<BridgeEvent>,
}

impl BridgeClient {
    pub fn new(requests: mpsc::Sender<BridgeRequest>, events: broadcast::Sender<BridgeEvent>) -> Self {
        Self { requests, events }
    }

    /// Fire-and-forget request
    pub async fn send(&self, request: BridgeRequest) -> Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| BridgeError::ChannelClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Send a request and resolve with the first event of its response kind.
    /// Later events of that kind are left to other subscribers.
    ///
    /// Waits without bound: if the answer is lost to subscriber lag this never
    /// resolves. Use [`request_once_timeout`](Self::request_once_timeout) when
    /// the caller cannot block indefinitely.
    pub async fn request_once(&self, request: BridgeRequest) -> Result<BridgeEvent> {
        let kind = request.response_kind();
        // Subscribe before sending so a fast reply cannot be missed
        let mut rx = self.subscribe();
        self.send(request).await?;
        next_of_kind(&mut rx, kind).await
    }

    pub async fn request_once_timeout(&self, request: BridgeRequest, timeout: Duration) -> Result<BridgeEvent> {
        let kind = request.response_kind();
        tokio::time::timeout(timeout, self.request_once(request))
            .await
            .map_err(|_| BridgeError::Timeout(kind))?
    }
}

/// Wait for the next event of `kind`, skipping everything else.
///
/// A lagged receiver keeps waiting even when the skipped events held the one
/// being awaited, so wrap this in a timeout if an answer is required.
pub async fn next_of_kind(rx: &mut broadcast::Receiver<BridgeEvent>, kind: EventKind) -> Result<BridgeEvent> {
    loop {
        match rx.recv().await {
            Ok(event) if event.kind() == kind => return Ok(event),
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("Bridge subscriber lagged, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => return Err(BridgeError::ChannelClosed),
        }
    }
}
