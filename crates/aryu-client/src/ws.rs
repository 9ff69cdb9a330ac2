//! WebSocket transport for channels.
//!
//! Provides [`WsTransport`], which opens one WebSocket per channel and
//! bridges it to a [`Link`]. This is a thin layer that only moves text
//! frames; parsing and state stay in the channel manager.

use aryu_app::{Inbound, Link, Transport};
use aryu_core::ChannelConfig;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

/// Transport errors.
#[derive(Debug, Error)]
pub enum WsError {
    /// Handshake failed.
    #[error("websocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Opens WebSocket connections.
#[derive(Debug, Clone)]
pub struct WsTransport {
    capacity: usize,
}

impl WsTransport {
    /// Transport with queue sizes from the configuration.
    pub fn new(config: &ChannelConfig) -> Self {
        Self { capacity: config.outgoing_capacity }
    }
}

impl Transport for WsTransport {
    type Error = WsError;

    async fn connect(&mut self, address: &str) -> Result<Link, Self::Error> {
        let (stream, _) = connect_async(address).await?;
        let (mut sink, mut source) = stream.split();

        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<String>(self.capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>(self.capacity);

        // Spawn connection handler
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = outgoing_rx.recv() => {
                        let Some(text) = frame else {
                            let _ = sink.send(WsMessage::Close(None)).await;
                            break;
                        };
                        if let Err(e) = sink.send(WsMessage::Text(text)).await {
                            let _ = inbound_tx.send(Inbound::Error(e.to_string())).await;
                            break;
                        }
                    },
                    message = source.next() => match message {
                        Some(Ok(WsMessage::Text(text))) => {
                            if inbound_tx.send(Inbound::Text(text)).await.is_err() {
                                break;
                            }
                        },
                        Some(Ok(WsMessage::Close(frame))) => {
                            tracing::debug!(?frame, "server closed websocket");
                            let _ = inbound_tx.send(Inbound::Closed).await;
                            break;
                        },
                        // Pings are answered by tungstenite; binary frames are not part of the protocol
                        Some(Ok(_)) => {},
                        Some(Err(e)) => {
                            let _ = inbound_tx.send(Inbound::Error(e.to_string())).await;
                            break;
                        },
                        None => {
                            let _ = inbound_tx.send(Inbound::Closed).await;
                            break;
                        },
                    },
                }
            }
        });

        Ok(Link::new(outgoing_tx, inbound_rx).with_task(handle.abort_handle()))
    }
}
