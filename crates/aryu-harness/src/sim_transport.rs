//! Simulation transport implementing the Transport trait.
//!
//! `SimTransport` stands in for the WebSocket transport. Every connect
//! creates an in-memory link whose far ends stay with the transport, so a
//! test can push frames as the server, close or fail the connection, and
//! read what the client wrote. Clones share state, so one clone goes into
//! the runtime and another stays with the test.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aryu_app::{Inbound, Link, Transport};
use aryu_proto::ServerEvent;
use tokio::sync::mpsc;

/// Queue depth of simulated links in both directions.
const LINK_CAPACITY: usize = 64;

/// Error type for the simulation transport.
#[derive(Debug, Clone)]
pub struct SimTransportError(pub String);

impl std::fmt::Display for SimTransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimTransportError: {}", self.0)
    }
}

impl std::error::Error for SimTransportError {}

/// Server side of one simulated connection.
struct SimLink {
    address: String,
    inbound: mpsc::Sender<Inbound>,
    outgoing: mpsc::Receiver<String>,
}

#[derive(Default)]
struct SharedState {
    links: Vec<SimLink>,
    refuse_next: Option<String>,
    hang_next: bool,
}

/// In-memory transport for deterministic testing.
#[derive(Clone, Default)]
pub struct SimTransport {
    state: Arc<Mutex<SharedState>>,
}

impl SimTransport {
    /// Create a transport that accepts every connect.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next connect fail with `reason`.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        self.lock().refuse_next = Some(reason.into());
    }

    /// Make the next connect never complete.
    pub fn hang_next(&self) {
        self.lock().hang_next = true;
    }

    /// Number of successful connects so far.
    pub fn connects(&self) -> usize {
        self.lock().links.len()
    }

    /// Addresses of successful connects, in order.
    pub fn addresses(&self) -> Vec<String> {
        self.lock().links.iter().map(|l| l.address.clone()).collect()
    }

    /// Connections whose client side is still held open.
    pub fn live_links(&self) -> usize {
        self.lock().links.iter().filter(|l| !l.inbound.is_closed()).count()
    }

    /// Push a raw text frame on the newest live connection.
    ///
    /// Returns `false` if no connection is live.
    pub fn push_raw(&self, frame: impl Into<String>) -> bool {
        self.deliver(Inbound::Text(frame.into()))
    }

    /// Push a server event on the newest live connection.
    pub fn push(&self, event: &ServerEvent) -> bool {
        match serde_json::to_string(event) {
            Ok(raw) => self.push_raw(raw),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode simulated event");
                false
            },
        }
    }

    /// Close the newest live connection from the server side.
    pub fn close_remote(&self) -> bool {
        self.deliver(Inbound::Closed)
    }

    /// Fail the newest live connection.
    pub fn fail_remote(&self, reason: impl Into<String>) -> bool {
        self.deliver(Inbound::Error(reason.into()))
    }

    /// Drain every frame the client wrote, across all connections.
    pub fn take_sent(&self) -> Vec<String> {
        let mut state = self.lock();
        let mut sent = Vec::new();
        for link in &mut state.links {
            while let Ok(frame) = link.outgoing.try_recv() {
                sent.push(frame);
            }
        }
        sent
    }

    fn deliver(&self, inbound: Inbound) -> bool {
        let state = self.lock();
        let Some(link) = state.links.iter().rev().find(|l| !l.inbound.is_closed()) else {
            return false;
        };
        link.inbound.try_send(inbound).is_ok()
    }
}

impl Transport for SimTransport {
    type Error = SimTransportError;

    async fn connect(&mut self, address: &str) -> Result<Link, Self::Error> {
        let hang = std::mem::take(&mut self.lock().hang_next);
        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();
        if let Some(reason) = state.refuse_next.take() {
            return Err(SimTransportError(reason));
        }

        let (outgoing_tx, outgoing_rx) = mpsc::channel(LINK_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(LINK_CAPACITY);
        state.links.push(SimLink {
            address: address.to_owned(),
            inbound: inbound_tx,
            outgoing: outgoing_rx,
        });

        Ok(Link::new(outgoing_tx, inbound_rx))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn connect_records_address() {
        let mut transport = SimTransport::new();
        let _link = transport.connect("ws://host/ws/chat/1/?token=t").await.unwrap();

        assert_eq!(transport.connects(), 1);
        assert_eq!(transport.addresses(), vec!["ws://host/ws/chat/1/?token=t".to_owned()]);
        assert_eq!(transport.live_links(), 1);
    }

    #[tokio::test]
    async fn dropping_link_closes_connection() {
        let mut transport = SimTransport::new();
        let link = transport.connect("ws://host/a").await.unwrap();
        drop(link);

        assert_eq!(transport.live_links(), 0);
        assert!(!transport.push_raw("{}"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_connect_applies_once() {
        let mut transport = SimTransport::new();
        transport.hang_next();

        let hung = tokio::time::timeout(Duration::from_secs(60), transport.connect("ws://host/a"));
        assert!(hung.await.is_err());
        assert!(transport.connect("ws://host/a").await.is_ok());
        assert_eq!(transport.connects(), 1);
    }

    #[tokio::test]
    async fn refused_connect_fails_once() {
        let mut transport = SimTransport::new();
        transport.refuse_next("connection refused");

        assert!(transport.connect("ws://host/a").await.is_err());
        assert!(transport.connect("ws://host/a").await.is_ok());
    }
}
