//! Error types for session loading and configuration.

use std::io;

use thiserror::Error;

/// Errors reading the persisted session blob.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Blob could not be read from disk.
    #[error("failed to read session: {0}")]
    Io(#[from] io::Error),

    /// Blob is not a valid session.
    #[error("invalid session blob: {0}")]
    Invalid(#[from] serde_json::Error),

    /// Blob parsed but carries no token.
    #[error("session has no token")]
    MissingToken,
}

/// Errors validating a [`crate::ChannelConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Origin is not a usable http(s)/ws(s) address.
    #[error("invalid origin: {0}")]
    Origin(#[from] aryu_proto::ProtocolError),

    /// API base is not an http(s) URL.
    #[error("invalid api base {0:?}: expected http:// or https://")]
    ApiBase(String),

    /// A duration or capacity was zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Offending field name.
        field: &'static str,
    },
}
