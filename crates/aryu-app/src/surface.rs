//! Presentation seam.
//!
//! A [`Surface`] is whatever shows the view model to a person: a terminal
//! log in the CLI, a recording buffer in tests. The runtime renders after
//! every batch of actions and raises one toast per new user-facing error.

use crate::ViewModel;

/// Receives view-model updates from the [`crate::Runtime`].
pub trait Surface: Send {
    /// Surface-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Show the current view model.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails. The runtime stops.
    fn render(&mut self, view: &ViewModel) -> Result<(), Self::Error>;

    /// Show a transient error message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be shown. The runtime stops.
    fn toast(&mut self, message: &str) -> Result<(), Self::Error>;
}
