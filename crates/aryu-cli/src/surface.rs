//! Surface that reports view-model changes through `tracing`.

use std::{collections::HashSet, convert::Infallible};

use aryu_app::{ConnectionState, Surface, ViewModel};
use aryu_proto::ItemId;

/// One-line digest of a view model. Logged only when it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Connection state.
    pub connection: ConnectionState,
    /// Number of items.
    pub items: usize,
    /// Number of unread items.
    pub unread: usize,
    /// Number of sends in flight.
    pub pending: usize,
    /// Acknowledged question, if any.
    pub question: Option<usize>,
    /// Countdown running.
    pub running: bool,
}

impl Summary {
    /// Digest a view model.
    pub fn of(view: &ViewModel) -> Self {
        Self {
            connection: view.connection(),
            items: view.items().len(),
            unread: view.unread_count(),
            pending: view.pending().len(),
            question: view.quiz().current_question_index(),
            running: view.quiz().is_running(),
        }
    }
}

/// Logs new items, state changes, and toasts.
#[derive(Debug, Default)]
pub struct LogSurface {
    last: Option<Summary>,
    seen: HashSet<ItemId>,
}

impl LogSurface {
    /// Create a surface that has shown nothing yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for LogSurface {
    type Error = Infallible;

    fn render(&mut self, view: &ViewModel) -> Result<(), Self::Error> {
        for item in view.items() {
            if self.seen.insert(item.id) {
                let sender = item.sender.as_ref().and_then(|s| s.name.as_deref()).unwrap_or("system");
                tracing::info!(id = item.id, %sender, read = item.read, "{}", item.body);
            }
        }

        let summary = Summary::of(view);
        if self.last.as_ref() != Some(&summary) {
            tracing::info!(
                connection = ?summary.connection,
                items = summary.items,
                unread = summary.unread,
                pending = summary.pending,
                question = ?summary.question,
                running = summary.running,
                "view updated"
            );
            if let Some(question) = view.quiz().question().filter(|_| summary.running) {
                tracing::info!(index = question.index, "{}", question.prompt);
            }
            self.last = Some(summary);
        }
        Ok(())
    }

    fn toast(&mut self, message: &str) -> Result<(), Self::Error> {
        tracing::warn!("{message}");
        Ok(())
    }
}
