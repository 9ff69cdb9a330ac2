//! Wire format for Aryu realtime channels.
//!
//! Every frame on a channel is a UTF-8 JSON text message shaped as an
//! envelope: `{ "type": <tag>, ...payload }`. This crate owns the closed set
//! of tags the portal understands, the typed payloads behind them, and the
//! address scheme used to reach a channel.
//!
//! # Components
//!
//! - [`ServerEvent`]: events pushed by the backend
//! - [`ClientCommand`]: commands written by the client
//! - [`envelope::parse`]: lenient decoder that drops bad frames
//! - [`Resource`]: the `(kind, id)` pair a channel is bound to

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod errors;
mod item;
mod resource;

pub use envelope::{ClientCommand, ServerEvent};
pub use errors::{EnvelopeError, ProtocolError};
pub use item::{Attachment, AttachmentKind, Item, ItemId, QuizQuestion, SenderRef};
pub use resource::{Resource, ResourceId, ResourceKind, channel_address};
