//! Surface that records everything it is shown.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    convert::Infallible,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use aryu_app::{Surface, ViewModel};

use crate::invariants::ViewSnapshot;

#[derive(Default)]
struct Recorded {
    views: Vec<ViewModel>,
    toasts: Vec<String>,
}

/// Records every render and toast. Clones share the recording.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingSurface {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Most recently rendered view model.
    pub fn last(&self) -> ViewModel {
        self.lock().views.last().cloned().unwrap_or_default()
    }

    /// Number of renders so far.
    pub fn renders(&self) -> usize {
        self.lock().views.len()
    }

    /// Toasts shown so far, in order.
    pub fn toasts(&self) -> Vec<String> {
        self.lock().toasts.clone()
    }

    /// Snapshots of every render, oldest first.
    pub fn history(&self) -> Vec<ViewSnapshot> {
        self.lock().views.iter().map(ViewSnapshot::capture).collect()
    }
}

impl Surface for RecordingSurface {
    type Error = Infallible;

    fn render(&mut self, view: &ViewModel) -> Result<(), Self::Error> {
        self.lock().views.push(view.clone());
        Ok(())
    }

    fn toast(&mut self, message: &str) -> Result<(), Self::Error> {
        self.lock().toasts.push(message.to_owned());
        Ok(())
    }
}
