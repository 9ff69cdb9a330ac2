//! Channel lifecycle management.
//!
//! A [`ChannelManager`] owns at most one live connection. Opening a channel
//! closes whatever was open before, so a client never holds two sockets for
//! the same manager. Each open produces a fresh [`ChannelHandle`] tagged
//! with a generation number; operations through a stale handle are no-ops.
//!
//! The socket itself sits behind the [`Transport`] trait. A transport only
//! has to produce a [`Link`]: a pair of queues carrying text frames out and
//! [`Inbound`] events in. The production WebSocket transport and the
//! in-memory simulation transport both fit that shape.
//!
//! There is no reconnect. A closed or failed channel stays that way until
//! it is opened again.

use std::{future::Future, time::Duration};

use aryu_core::{ChannelConfig, SessionContext};
use aryu_proto::{ClientCommand, Resource, envelope};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::AbortHandle,
};

use crate::{Action, ConnectionState};

/// Event delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text frame.
    Text(String),
    /// The peer closed the connection.
    Closed,
    /// The connection failed.
    Error(String),
}

/// Time a transport task gets to send its close frame after its link is
/// dropped, before it is aborted.
pub const LINK_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Queues connecting a channel to its transport task.
///
/// Dropping a link closes both queues. If the transport runs a background
/// task, its abort handle is attached; the task sees its outgoing queue
/// close and gets [`LINK_CLOSE_GRACE`] to shut the socket down cleanly
/// before it is aborted.
#[derive(Debug)]
pub struct Link {
    outgoing: mpsc::Sender<String>,
    incoming: mpsc::Receiver<Inbound>,
    task: Option<AbortHandle>,
}

impl Link {
    /// Create a link from its two queues.
    pub fn new(outgoing: mpsc::Sender<String>, incoming: mpsc::Receiver<Inbound>) -> Self {
        Self { outgoing, incoming, task: None }
    }

    /// Attach the transport task that services this link.
    #[must_use]
    pub fn with_task(mut self, task: AbortHandle) -> Self {
        self.task = Some(task);
        self
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(LINK_CLOSE_GRACE).await;
                    task.abort();
                });
            },
            Err(_) => task.abort(),
        }
    }
}

/// Establishes connections for a [`ChannelManager`].
pub trait Transport: Send {
    /// Transport-specific connection error.
    type Error: std::error::Error + Send + 'static;

    /// Connect to a channel address.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn connect(&mut self, address: &str) -> impl Future<Output = Result<Link, Self::Error>> + Send;
}

/// Reasons a command was not written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Handle is not the current channel, or the channel is not open.
    #[error("channel {generation} is not open")]
    NotOpen {
        /// Generation of the handle used.
        generation: u64,
    },

    /// Outgoing queue is full.
    #[error("outgoing queue full")]
    QueueFull,

    /// Transport task is gone.
    #[error("transport disconnected")]
    Disconnected,

    /// Command could not be serialized.
    #[error(transparent)]
    Encode(#[from] aryu_proto::EnvelopeError),
}

/// Identifies one open of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    generation: u64,
    resource: Resource,
}

impl ChannelHandle {
    /// Monotonic id of this open.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resource the channel is bound to.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }
}

struct Current {
    handle: ChannelHandle,
    state: ConnectionState,
    link: Option<Link>,
}

impl Current {
    fn drop_link(&mut self) {
        self.link = None;
    }
}

/// Owns the single live connection of a client.
pub struct ChannelManager<T: Transport> {
    transport: T,
    config: ChannelConfig,
    token: String,
    next_generation: u64,
    current: Option<Current>,
}

impl<T: Transport> ChannelManager<T> {
    /// Create a manager. The session token is sent as the socket credential.
    pub fn new(transport: T, config: ChannelConfig, session: &SessionContext) -> Self {
        Self { transport, config, token: session.token.clone(), next_generation: 1, current: None }
    }

    /// Open a channel for `resource`, closing the current one first.
    ///
    /// Returns the new handle and the actions describing what happened, in
    /// order. A failed or timed-out connect still returns a handle; its
    /// state is [`ConnectionState::Error`].
    pub async fn open(&mut self, resource: Resource) -> (ChannelHandle, Vec<Action>) {
        let mut actions = self.close_current();

        let generation = self.next_generation;
        self.next_generation += 1;
        let handle = ChannelHandle { generation, resource: resource.clone() };
        actions.push(Action::Opening { resource: resource.clone() });

        let mut current =
            Current { handle: handle.clone(), state: ConnectionState::Connecting, link: None };

        let result = match self.config.address_for(&resource, &self.token) {
            Ok(address) => {
                tracing::info!(%resource, generation, "opening channel");
                let limit = self.config.connect_timeout;
                match tokio::time::timeout(limit, self.transport.connect(&address)).await {
                    Ok(connected) => connected.map_err(|e| e.to_string()),
                    Err(_) => Err(format!("timed out after {}ms", limit.as_millis())),
                }
            },
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(link) => {
                current.state = ConnectionState::Open;
                current.link = Some(link);
                actions.push(Action::ConnectionOpened);
            },
            Err(reason) => {
                tracing::warn!(%resource, generation, %reason, "channel failed to open");
                current.state = ConnectionState::Error;
                actions.push(Action::ConnectionError {
                    message: format!("Could not connect to {resource}: {reason}"),
                });
            },
        }

        self.current = Some(current);
        (handle, actions)
    }

    /// Write a command to the channel. Fire-and-forget: success means the
    /// frame was queued, not delivered.
    pub fn send(
        &self,
        handle: &ChannelHandle,
        command: &ClientCommand,
    ) -> Result<(), ChannelError> {
        let not_open = ChannelError::NotOpen { generation: handle.generation };

        let Some(current) = self.current.as_ref().filter(|c| c.handle == *handle) else {
            tracing::warn!(generation = handle.generation, "dropping command for stale channel");
            return Err(not_open);
        };
        let Some(link) = current.link.as_ref().filter(|_| current.state == ConnectionState::Open)
        else {
            tracing::warn!(generation = handle.generation, state = ?current.state, "dropping command for closed channel");
            return Err(not_open);
        };

        let frame = command.encode()?;
        match link.outgoing.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(generation = handle.generation, "outgoing queue full, dropping command");
                Err(ChannelError::QueueFull)
            },
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(generation = handle.generation, "transport gone, dropping command");
                Err(ChannelError::Disconnected)
            },
        }
    }

    /// Close a channel. Closing a stale or already-closed handle does
    /// nothing.
    pub fn close(&mut self, handle: &ChannelHandle) -> Vec<Action> {
        if self.current.as_ref().is_some_and(|c| c.handle == *handle) {
            self.close_current()
        } else {
            Vec::new()
        }
    }

    /// Close whatever channel is current.
    pub fn close_current(&mut self) -> Vec<Action> {
        let Some(mut current) = self.current.take() else {
            return Vec::new();
        };

        current.drop_link();
        tracing::info!(resource = %current.handle.resource, generation = current.handle.generation, "channel closed");

        match current.state {
            ConnectionState::Closed => Vec::new(),
            _ => vec![Action::ConnectionClosed],
        }
    }

    /// State of the channel behind `handle`. Any handle other than the
    /// current one reads as [`ConnectionState::Closed`].
    pub fn state(&self, handle: &ChannelHandle) -> ConnectionState {
        self.current
            .as_ref()
            .filter(|c| c.handle == *handle)
            .map_or(ConnectionState::Closed, |c| c.state)
    }

    /// Handle of the current channel, if any.
    pub fn current(&self) -> Option<&ChannelHandle> {
        self.current.as_ref().map(|c| &c.handle)
    }

    /// True if the current channel is open and has a live link.
    pub fn is_open(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.state == ConnectionState::Open && c.link.is_some())
    }

    /// Wait for the next action from the current channel.
    ///
    /// Frames that fail to parse are dropped and the wait continues. When
    /// the transport ends or fails, the channel transitions and the
    /// corresponding action is returned. Returns `None` if no channel is
    /// open.
    ///
    /// Cancel-safe: dropping the future loses no frame.
    pub async fn recv(&mut self) -> Option<Action> {
        loop {
            let current = self.current.as_mut()?;
            let link = current.link.as_mut()?;
            let generation = current.handle.generation;

            match link.incoming.recv().await {
                Some(Inbound::Text(raw)) => {
                    if let Some(event) = envelope::parse(&raw) {
                        tracing::trace!(generation, kind = event.kind(), "frame received");
                        return Some(Action::from(event));
                    }
                },
                Some(Inbound::Closed) | None => {
                    tracing::info!(generation, "channel closed by peer");
                    current.state = ConnectionState::Closed;
                    current.drop_link();
                    return Some(Action::ConnectionClosed);
                },
                Some(Inbound::Error(reason)) => {
                    tracing::warn!(generation, %reason, "channel transport error");
                    current.state = ConnectionState::Error;
                    current.drop_link();
                    return Some(Action::ConnectionError {
                        message: format!("Connection lost: {reason}"),
                    });
                },
            }
        }
    }
}
