//! Fuzz target for structurally valid JSON envelopes
//!
//! Raw bytes rarely get past the JSON layer, so this target builds objects
//! with a `type` tag and a handful of payload fields and feeds those to the
//! parser instead.
//!
//! # Strategy
//!
//! - Known tags with payload fields of the wrong type
//! - Unknown tags with plausible payloads
//! - Missing or non-string tags
//!
//! # Invariants
//!
//! - NEVER panic
//! - Unknown tags are never returned as events
//! - Known tags either parse or are rejected as invalid payloads

#![no_main]

use arbitrary::Arbitrary;
use aryu_proto::{EnvelopeError, ServerEvent, envelope};
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};

const FIELDS: [&str; 8] =
    ["message", "messages", "notification", "notifications", "question", "question_index", "id", "read"];

#[derive(Debug, Arbitrary)]
enum Tag {
    Known(u8),
    Other(String),
    Number(i64),
    Missing,
}

#[derive(Debug, Arbitrary)]
enum Field {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Item { id: u64, body: String, read: bool },
    List(Vec<u64>),
}

impl Field {
    fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Int(n) => Value::from(n),
            Self::Text(s) => Value::String(s),
            Self::Item { id, body, read } => {
                serde_json::json!({ "id": id, "message": body, "read": read })
            },
            Self::List(ids) => Value::Array(
                ids.into_iter().map(|id| serde_json::json!({ "id": id })).collect(),
            ),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Envelope {
    tag: Tag,
    fields: Vec<(u8, Field)>,
}

fuzz_target!(|envelope: Envelope| {
    let mut object = Map::new();

    let known = match envelope.tag {
        Tag::Known(i) => {
            let kind = ServerEvent::KNOWN_TYPES[i as usize % ServerEvent::KNOWN_TYPES.len()];
            object.insert("type".into(), Value::from(kind));
            true
        },
        Tag::Other(kind) => {
            let known = ServerEvent::KNOWN_TYPES.contains(&kind.as_str());
            object.insert("type".into(), Value::String(kind));
            known
        },
        Tag::Number(n) => {
            object.insert("type".into(), Value::from(n));
            false
        },
        Tag::Missing => false,
    };

    for (slot, field) in envelope.fields.into_iter().take(8) {
        let name = FIELDS[slot as usize % FIELDS.len()];
        object.insert(name.into(), field.into_value());
    }

    let raw = Value::Object(object).to_string();
    match envelope::decode(&raw) {
        Ok(event) => assert!(known && ServerEvent::KNOWN_TYPES.contains(&event.kind())),
        Err(EnvelopeError::InvalidPayload { .. }) => assert!(known),
        Err(EnvelopeError::UnknownType(_) | EnvelopeError::MissingType) => assert!(!known),
        Err(err) => panic!("unexpected rejection of well-formed JSON: {err}"),
    }
});
