//! Deterministic simulation harness for Aryu realtime channel testing.
//!
//! In-memory implementations of the Transport, Backend, and Surface traits so
//! the production [`aryu_app::Runtime`] runs unchanged under a paused tokio
//! clock.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks over a history of view-model snapshots. Invariants verify WHAT must
//! be true across all execution paths, not specific scenarios. Use
//! [`InvariantRegistry::standard()`] for the view-model invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod invariants;
pub mod recording_surface;
pub mod sim_backend;
pub mod sim_session;
pub mod sim_transport;

pub use invariants::{
    ExistingItemsKeepOrder, Invariant, InvariantRegistry, InvariantResult, ItemSnapshot,
    QuestionIndexMonotonic, QuizSnapshot, TimerGatedByAck, UniqueItemIds, UnreadMatchesItems,
    ViewSnapshot, Violation,
};
pub use recording_surface::RecordingSurface;
pub use sim_backend::SimBackend;
pub use sim_session::SimSession;
pub use sim_transport::{SimTransport, SimTransportError};
