//! Application layer for Aryu realtime channels
//!
//! Pure view-model reducer, channel lifecycle, and a generic runtime that
//! reconciles socket pushes with the HTTP API. The same runtime code runs
//! against real sockets in the CLI and against simulated ones in tests.
//!
//! # Components
//!
//! - [`reduce`]: Pure view-model reducer over [`Action`]s
//! - [`ChannelManager`]: Owns the single live socket, generation-tagged
//! - [`Transport`]: Trait for socket I/O
//! - [`Backend`]: Trait for the request/response API
//! - [`Surface`]: Trait for presentation
//! - [`Runtime`]: Generic orchestration loop over the three traits

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod backend;
mod channel;
mod intent;
mod reducer;
mod runtime;
mod state;
mod surface;

pub use action::Action;
pub use backend::{ApiError, Backend, Draft, DraftAttachment, GENERIC_ERROR_MESSAGE};
pub use channel::{
    ChannelError, ChannelHandle, ChannelManager, Inbound, LINK_CLOSE_GRACE, Link, Transport,
};
pub use intent::Intent;
pub use reducer::{reduce, reduce_all};
pub use runtime::{Runtime, START_NOT_PERMITTED};
pub use state::{ConnectionState, PendingItem, QuizState, ViewModel};
pub use surface::Surface;
