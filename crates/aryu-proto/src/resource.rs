//! Channel resources and their socket addresses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Kind of resource a channel is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// One chat room (or one direct conversation).
    Chat,
    /// The notification feed of one user.
    Notifications,
    /// One live quiz room.
    Quiz,
}

impl ResourceKind {
    /// Path segment used in socket and HTTP addresses.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Notifications => "notifications",
            Self::Quiz => "quiz",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "notifications" => Ok(Self::Notifications),
            "quiz" => Ok(Self::Quiz),
            other => Err(format!("unknown resource kind {other:?}")),
        }
    }
}

/// Identifier of a room, user feed, or quiz, as the backend spells it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Create an id, rejecting values that cannot be used verbatim as a
    /// path segment: separators, escapes, whitespace and dot segments.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let dot_segment = id == "." || id == "..";
        if id.is_empty()
            || dot_segment
            || id.contains(['/', '\\', '?', '#', '%'])
            || id.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ProtocolError::InvalidResourceId(id));
        }
        Ok(Self(id))
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `(kind, id)` pair. One channel is bound to exactly one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource id.
    pub id: ResourceId,
}

impl Resource {
    /// Create a resource.
    pub fn new(kind: ResourceKind, id: impl Into<ResourceId>) -> Self {
        Self { kind, id: id.into() }
    }

    /// Chat room resource.
    pub fn chat(id: impl Into<ResourceId>) -> Self {
        Self::new(ResourceKind::Chat, id)
    }

    /// Notification feed resource.
    pub fn notifications(id: impl Into<ResourceId>) -> Self {
        Self::new(ResourceKind::Notifications, id)
    }

    /// Quiz room resource.
    pub fn quiz(id: impl Into<ResourceId>) -> Self {
        Self::new(ResourceKind::Quiz, id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Build the socket address for a resource.
///
/// The result is `ws[s]://host/ws/<kind>/<id>/?token=<token>`, with the
/// token form-encoded. An `http` origin maps to `ws`, `https` to `wss`;
/// `ws`/`wss` origins are used as is and a bare host defaults to `wss`.
/// Any path on the origin is ignored.
pub fn channel_address(origin: &str, resource: &Resource, token: &str) -> Result<String> {
    let origin = origin.trim().trim_end_matches('/');

    let (scheme, rest) = match origin.split_once("://") {
        Some(("http" | "ws", rest)) => ("ws", rest),
        Some(("https" | "wss", rest)) => ("wss", rest),
        Some((scheme, _)) => {
            return Err(ProtocolError::UnsupportedScheme { scheme: scheme.to_string() });
        },
        None => ("wss", origin),
    };

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Err(ProtocolError::MissingHost { origin: origin.to_string() });
    }

    let token: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
    Ok(format!("{scheme}://{host}/ws/{}/{}/?token={token}", resource.kind, resource.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_follows_origin_scheme() {
        let room = Resource::chat(12);

        assert_eq!(
            channel_address("http://localhost:8000", &room, "abc").ok(),
            Some("ws://localhost:8000/ws/chat/12/?token=abc".to_string())
        );
        assert_eq!(
            channel_address("https://portal.aryu.in/", &room, "abc").ok(),
            Some("wss://portal.aryu.in/ws/chat/12/?token=abc".to_string())
        );
        assert_eq!(
            channel_address("portal.aryu.in", &Resource::quiz(3), "t").ok(),
            Some("wss://portal.aryu.in/ws/quiz/3/?token=t".to_string())
        );
    }

    #[test]
    fn address_drops_origin_path() {
        let feed = Resource::notifications(7);
        assert_eq!(
            channel_address("https://portal.aryu.in/admin/dashboard", &feed, "t").ok(),
            Some("wss://portal.aryu.in/ws/notifications/7/?token=t".to_string())
        );
    }

    #[test]
    fn address_rejects_bad_origins() {
        let room = Resource::chat(1);
        assert!(matches!(
            channel_address("ftp://host", &room, "t"),
            Err(ProtocolError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            channel_address("https://", &room, "t"),
            Err(ProtocolError::MissingHost { .. })
        ));
    }

    #[test]
    fn resource_id_rejects_path_characters() {
        assert!(ResourceId::new("room-4").is_ok());
        assert!(ResourceId::new("").is_err());
        assert!(ResourceId::new("a/b").is_err());
        assert!(ResourceId::new("a b").is_err());
        assert!(ResourceId::new("a?x=1").is_err());
        assert!(ResourceId::new("a\\b").is_err());
    }

    #[test]
    fn resource_id_rejects_dot_segments_and_escapes() {
        assert!(ResourceId::new(".").is_err());
        assert!(ResourceId::new("..").is_err());
        assert!(ResourceId::new("%2e%2e").is_err());
        assert!(ResourceId::new("a%2Fb").is_err());
        assert!(ResourceId::new("a\tb").is_err());
        assert!(ResourceId::new("v1.2").is_ok());
    }

    #[test]
    fn address_encodes_token() {
        let room = Resource::chat(1);
        assert_eq!(
            channel_address("https://host", &room, "a&b#c+d=e f").ok(),
            Some("wss://host/ws/chat/1/?token=a%26b%23c%2Bd%3De+f".to_string())
        );
        assert_eq!(
            channel_address("https://host", &room, "eyJ.x-y_z").ok(),
            Some("wss://host/ws/chat/1/?token=eyJ.x-y_z".to_string())
        );
    }

    #[test]
    fn kind_parses_its_own_segment() {
        for kind in [ResourceKind::Chat, ResourceKind::Notifications, ResourceKind::Quiz] {
            assert_eq!(kind.segment().parse::<ResourceKind>(), Ok(kind));
        }
        assert!("events".parse::<ResourceKind>().is_err());
    }
}
