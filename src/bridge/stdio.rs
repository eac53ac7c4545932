//! Newline-delimited JSON transport for a UI running in another process.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::RecvError};

use super::channel::BridgeClient;
use super::messages::{BridgeEvent, BridgeRequest};
use super::Result;

/// Forward requests read from `reader` to the controller and every event from
/// `events` to `writer`, one JSON object per line, until the input closes.
///
/// `events` is taken from the caller so broadcasts produced before serving
/// starts (such as an auto-connect) are not lost.
pub async fn serve<R, W>(
    client: BridgeClient,
    mut events: broadcast::Receiver<BridgeEvent>,
    reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<BridgeRequest>(&line) {
                            Ok(request) => {
                                log::debug!("Bridge request: {:?}", request);
                                client.send(request).await?;
                            }
                            Err(e) => log::warn!("Ignoring malformed bridge message {:?}: {}", line, e),
                        }
                    }
                    None => {
                        log::info!("Bridge input closed");
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => write_event(&mut writer, &event).await?,
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Bridge output lagged, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    writer.flush().await?;
    Ok(())
}

async fn write_event<W: AsyncWrite + Unpin>(writer: &mut W, event: &BridgeEvent) -> Result<()> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}
