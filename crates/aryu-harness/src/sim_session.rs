//! A production [`Runtime`] wired to simulated parts.
//!
//! Tests drive the session with intents and server pushes and observe it
//! through the recording surface. Run under `#[tokio::test(start_paused =
//! true)]` so that [`SimSession::settle`] and backend latency are exact.

use std::{convert::Infallible, time::Duration};

use aryu_app::{Intent, Runtime, ViewModel};
use aryu_core::{ChannelConfig, SessionContext};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{RecordingSurface, SimBackend, SimTransport};

/// Virtual time given to the runtime to drain ready work.
const SETTLE: Duration = Duration::from_millis(1);

/// Runtime task plus handles to its simulated parts.
pub struct SimSession {
    /// Transport the runtime connects through.
    pub transport: SimTransport,
    /// Backend the runtime reconciles against.
    pub backend: SimBackend,
    /// Surface the runtime renders to.
    pub surface: RecordingSurface,
    intents: mpsc::Sender<Intent>,
    task: JoinHandle<Result<(), Infallible>>,
}

impl SimSession {
    /// Spawn a runtime with the default configuration.
    pub fn start(session: SessionContext, backend: SimBackend) -> Self {
        Self::start_with(ChannelConfig::default(), session, backend)
    }

    /// Spawn a runtime with a custom configuration.
    pub fn start_with(config: ChannelConfig, session: SessionContext, backend: SimBackend) -> Self {
        let transport = SimTransport::new();
        let surface = RecordingSurface::new();
        let runtime =
            Runtime::new(transport.clone(), backend.clone(), surface.clone(), config, session);

        let (intents, rx) = mpsc::channel(64);
        let task = tokio::spawn(runtime.run(rx));

        Self { transport, backend, surface, intents, task }
    }

    /// Deliver an intent and let the runtime process it.
    pub async fn intent(&self, intent: Intent) {
        if self.intents.send(intent).await.is_err() {
            tracing::warn!("runtime already stopped");
        }
        Self::settle().await;
    }

    /// Let every ready task run to completion.
    pub async fn settle() {
        tokio::time::sleep(SETTLE).await;
    }

    /// Advance virtual time, then settle.
    pub async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
        Self::settle().await;
    }

    /// Latest rendered view model.
    pub fn view(&self) -> ViewModel {
        self.surface.last()
    }

    /// Quit the runtime and wait for it to stop. Returns `true` if it
    /// stopped cleanly.
    pub async fn quit(self) -> bool {
        let _ = self.intents.send(Intent::Quit).await;
        matches!(self.task.await, Ok(Ok(())))
    }
}
