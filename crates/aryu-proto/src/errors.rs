//! Error types for the wire layer.

use thiserror::Error;

/// Result alias for address and encoding operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while building channel addresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Origin has no host part.
    #[error("invalid origin {origin:?}: missing host")]
    MissingHost {
        /// Origin as configured.
        origin: String,
    },

    /// Origin scheme is not one of http, https, ws, wss.
    #[error("unsupported origin scheme {scheme:?}")]
    UnsupportedScheme {
        /// Scheme found in the origin.
        scheme: String,
    },

    /// Resource id is empty or contains a path separator.
    #[error("invalid resource id {0:?}")]
    InvalidResourceId(String),
}

/// Reasons a text frame could not be turned into a [`crate::ServerEvent`],
/// or a command could not be serialized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Frame is not valid JSON.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame is JSON but has no string `type` field.
    #[error("frame has no type tag")]
    MissingType,

    /// Tag is not part of the known set.
    #[error("unknown frame type {0:?}")]
    UnknownType(String),

    /// Tag is known but the payload does not match its schema.
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload {
        /// Tag of the frame.
        kind: String,
        /// Decoder message.
        reason: String,
    },

    /// Command could not be serialized.
    #[error("failed to encode command: {0}")]
    Encode(String),
}

impl EnvelopeError {
    /// Returns true if the frame was well-formed but carried a tag this
    /// client does not know. Such frames come from newer servers and are
    /// expected, unlike the other variants.
    pub fn is_forward_compatible(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}
