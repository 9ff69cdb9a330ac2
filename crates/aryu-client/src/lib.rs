//! Production I/O for Aryu realtime channels
//!
//! The request shapes and response decoding live here as plain functions so
//! they can be tested without a network. The actual transports sit behind
//! the `transport` feature:
//!
//! - [`WsTransport`]: WebSocket implementation of [`aryu_app::Transport`]
//! - [`HttpBackend`]: REST implementation of [`aryu_app::Backend`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod body;
mod endpoints;
#[cfg(feature = "transport")]
mod http;
#[cfg(feature = "transport")]
mod ws;

pub use endpoints::Endpoints;
#[cfg(feature = "transport")]
pub use http::HttpBackend;
#[cfg(feature = "transport")]
pub use ws::{WsError, WsTransport};
