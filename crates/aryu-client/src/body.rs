//! Response decoding and request field names.
//!
//! The API is inconsistent about list shapes (bare array or a paginated
//! `{ "results": [...] }` page) and error bodies (`message` or `detail`).
//! Everything here normalizes that into [`ApiError`] and plain vectors.

use aryu_app::ApiError;
use aryu_proto::AttachmentKind;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// Multipart field carrying the text of a message.
pub const BODY_FIELD: &str = "body";

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Page { results: Vec<T> },
}

/// Decode a list response in either shape.
pub fn decode_list<T: DeserializeOwned>(raw: &[u8]) -> Result<Vec<T>, ApiError> {
    match serde_json::from_slice(raw) {
        Ok(Listing::Bare(items)) => Ok(items),
        Ok(Listing::Page { results }) => Ok(results),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

/// Decode a single-object response.
pub fn decode_one<T: DeserializeOwned>(raw: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(raw).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Server-provided reason from an error body, if there is one.
pub fn error_message(raw: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(raw).ok()?;
    ["message", "detail"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

/// Error for a non-success response.
pub fn status_error(code: u16, raw: &[u8]) -> ApiError {
    ApiError::Status { code, message: error_message(raw) }
}

/// Multipart field an attachment is uploaded under.
pub fn attachment_field(kind: AttachmentKind) -> &'static str {
    match kind {
        AttachmentKind::Audio => "audio",
        AttachmentKind::File | AttachmentKind::Image => "file",
    }
}

#[cfg(test)]
mod tests {
    use aryu_proto::Item;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn list_accepts_bare_array() {
        let items: Vec<Item> = decode_list(br#"[{"id":1,"message":"a"},{"id":2}]"#).unwrap();
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn list_accepts_paginated_page() {
        let raw = br#"{"count":1,"next":null,"results":[{"id":9,"is_read":true}]}"#;
        let items: Vec<Item> = decode_list(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].read);
    }

    #[test]
    fn list_rejects_other_shapes() {
        let result: Result<Vec<Item>, _> = decode_list(br#"{"items":[]}"#);
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn error_prefers_message_then_detail() {
        assert_eq!(error_message(br#"{"message":"File too large"}"#).as_deref(), Some("File too large"));
        assert_eq!(
            error_message(br#"{"detail":"Authentication credentials were not provided."}"#).as_deref(),
            Some("Authentication credentials were not provided.")
        );
        assert_eq!(error_message(br#"{"message":"  "}"#), None);
        assert_eq!(error_message(b"<html>502</html>"), None);
    }

    #[test]
    fn status_error_falls_back_to_generic_text() {
        let err = status_error(502, b"Bad Gateway");
        assert_eq!(err, ApiError::Status { code: 502, message: None });
        assert_eq!(err.user_message(), aryu_app::GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn audio_goes_to_its_own_field() {
        assert_eq!(attachment_field(AttachmentKind::Audio), "audio");
        assert_eq!(attachment_field(AttachmentKind::Image), "file");
    }

    proptest! {
        #[test]
        fn prop_error_message_never_panics(raw in prop::collection::vec(any::<u8>(), 0..128)) {
            let _ = error_message(&raw);
        }
    }
}
