//! Tagged JSON envelopes.
//!
//! Frames in both directions share one shape: an object whose `type` field
//! names the event and whose remaining fields are its payload. Decoding is
//! done in two steps so that an unknown tag can be told apart from a broken
//! payload: first the raw JSON and its tag, then the typed payload for tags
//! in [`ServerEvent::KNOWN_TYPES`].
//!
//! # Invariants
//!
//! - [`parse`] never panics and never returns an event whose tag is outside
//!   the known set.
//! - Unknown tags are not errors for the channel. New server event kinds must
//!   not break old clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::EnvelopeError,
    item::{Item, QuizQuestion},
};

/// Events pushed by the backend over a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A single chat message was delivered.
    ChatMessage {
        /// The delivered message.
        message: Item,
    },

    /// Full history of a chat room, sent after connecting.
    MessageHistory {
        /// Messages in display order.
        messages: Vec<Item>,
    },

    /// A single notification was pushed.
    Notification {
        /// The pushed notification.
        notification: Item,
    },

    /// Current notification feed, sent after connecting.
    InitNotifications {
        /// Notifications in display order.
        notifications: Vec<Item>,
    },

    /// The server started the countdown for a question.
    StartQuestion {
        /// Zero-based index of the started question.
        question_index: usize,
    },

    /// The server published a question to the room.
    SendQuestion {
        /// Question content.
        question: QuizQuestion,
    },

    /// The server rejected something the client did.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl ServerEvent {
    /// Tags this client understands.
    pub const KNOWN_TYPES: [&'static str; 7] = [
        "chat_message",
        "message_history",
        "notification",
        "init_notifications",
        "start_question",
        "send_question",
        "error",
    ];

    /// Tag of this event as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChatMessage { .. } => "chat_message",
            Self::MessageHistory { .. } => "message_history",
            Self::Notification { .. } => "notification",
            Self::InitNotifications { .. } => "init_notifications",
            Self::StartQuestion { .. } => "start_question",
            Self::SendQuestion { .. } => "send_question",
            Self::Error { .. } => "error",
        }
    }
}

/// Commands written by the client over a channel.
///
/// Messages and read receipts go over HTTP so the server can confirm them;
/// the socket only carries commands the server acknowledges with a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Ask the server to start the countdown for a question. The server
    /// answers with a `start_question` event to every client in the room.
    StartQuestion {
        /// Zero-based index of the question to start.
        question_index: usize,
    },
}

impl ClientCommand {
    /// Serialize to a text frame.
    pub fn encode(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Encode(e.to_string()))
    }
}

/// Decode a text frame, reporting why it was rejected.
pub fn decode(raw: &str) -> Result<ServerEvent, EnvelopeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        _ => return Err(EnvelopeError::MissingType),
    };

    if !ServerEvent::KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(EnvelopeError::UnknownType(kind));
    }

    serde_json::from_value(value)
        .map_err(|e| EnvelopeError::InvalidPayload { kind, reason: e.to_string() })
}

/// Decode a text frame, dropping anything that is not a known event.
///
/// Rejected frames are logged and yield `None`; the caller keeps the channel
/// open and moves on to the next frame.
pub fn parse(raw: &str) -> Option<ServerEvent> {
    match decode(raw) {
        Ok(event) => Some(event),
        Err(err) if err.is_forward_compatible() => {
            tracing::trace!(%err, "ignoring frame");
            None
        },
        Err(err) => {
            tracing::debug!(%err, len = raw.len(), "dropping frame");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_message() {
        let raw = r#"{"type":"chat_message","message":{"id":3,"message":"hello"}}"#;
        assert_eq!(parse(raw), Some(ServerEvent::ChatMessage { message: Item::new(3, "hello") }));
    }

    #[test]
    fn parses_history_in_order() {
        let raw = r#"{"type":"message_history","messages":[{"id":1},{"id":2}]}"#;
        let Some(ServerEvent::MessageHistory { messages }) = parse(raw) else {
            panic!("expected history");
        };
        assert_eq!(messages.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn parses_quiz_events() {
        assert_eq!(
            parse(r#"{"type":"start_question","question_index":4}"#),
            Some(ServerEvent::StartQuestion { question_index: 4 })
        );

        let raw = r#"{"type":"send_question","question":{"index":0,"prompt":"Capital of India?"}}"#;
        assert!(matches!(parse(raw), Some(ServerEvent::SendQuestion { .. })));
    }

    #[test]
    fn malformed_frame_is_dropped() {
        assert_eq!(parse("not json"), None);
        assert!(matches!(decode("not json"), Err(EnvelopeError::Malformed(_))));
    }

    #[test]
    fn frame_without_tag_is_dropped() {
        assert_eq!(decode(r#"{"message":"x"}"#), Err(EnvelopeError::MissingType));
        assert_eq!(decode(r#"{"type":7}"#), Err(EnvelopeError::MissingType));
        assert_eq!(decode("[1,2]"), Err(EnvelopeError::MissingType));
    }

    #[test]
    fn unknown_tag_is_ignored() {
        assert_eq!(parse(r#"{"type":"poll_closed","poll":1}"#), None);
        assert_eq!(
            decode(r#"{"type":"poll_closed"}"#),
            Err(EnvelopeError::UnknownType("poll_closed".into()))
        );
    }

    #[test]
    fn known_tag_with_bad_payload_is_rejected() {
        let err = decode(r#"{"type":"chat_message","message":"just text"}"#);
        assert!(matches!(err, Err(EnvelopeError::InvalidPayload { ref kind, .. }) if kind == "chat_message"));
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let raw = r#"{"type":"error","message":"room closed","code":4403}"#;
        assert_eq!(parse(raw), Some(ServerEvent::Error { message: "room closed".into() }));
    }

    #[test]
    fn kind_matches_wire_tag() {
        let events = [
            ServerEvent::ChatMessage { message: Item::new(1, "a") },
            ServerEvent::MessageHistory { messages: vec![] },
            ServerEvent::Notification { notification: Item::new(1, "a") },
            ServerEvent::InitNotifications { notifications: vec![] },
            ServerEvent::StartQuestion { question_index: 0 },
            ServerEvent::Error { message: "x".into() },
        ];

        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
            assert!(ServerEvent::KNOWN_TYPES.contains(&event.kind()));
        }
    }
}
