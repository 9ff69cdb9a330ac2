//! Shared context for Aryu realtime channels.
//!
//! Holds what every channel needs but none of them owns: who the user is
//! ([`SessionContext`]) and how to reach the backend ([`ChannelConfig`]).
//! Both are built once at application root and passed down explicitly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod session;

pub use config::ChannelConfig;
pub use error::{ConfigError, SessionError};
pub use session::{LoginType, SessionContext, UserProfile};
