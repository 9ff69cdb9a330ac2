//! Payload entities: chat messages, notifications, quiz questions.
//!
//! The backend is loose about field names (`message` vs `body`, `is_read` vs
//! `read`, sender as an id or an object). These types absorb that variance
//! at the decode boundary so nothing downstream has to.

use serde::{Deserialize, Serialize};

/// Server-assigned item id. Unique within one resource's list.
pub type ItemId = u64;

/// A chat message or a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Server-assigned id.
    pub id: ItemId,

    /// Author. `None` for system notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<SenderRef>,

    /// Text content.
    #[serde(default, alias = "message", alias = "content")]
    pub body: String,

    /// Files and voice notes attached to the item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    /// Creation timestamp as sent by the server (RFC 3339).
    #[serde(default, alias = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Whether the current user has read the item.
    #[serde(default, alias = "is_read")]
    pub read: bool,
}

impl Item {
    /// Create an unread item with only a body. Mostly useful in tests.
    pub fn new(id: ItemId, body: impl Into<String>) -> Self {
        Self {
            id,
            sender: None,
            body: body.into(),
            attachments: Vec::new(),
            created_at: None,
            read: false,
        }
    }

    /// Set the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: SenderRef) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the read flag.
    #[must_use]
    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }
}

/// Reference to the user who produced an item.
///
/// Accepts either a bare numeric id or an object with `id` and `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSender")]
pub struct SenderRef {
    /// User id.
    pub id: u64,
    /// Display name, when the server includes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SenderRef {
    /// Sender known only by id.
    pub fn id(id: u64) -> Self {
        Self { id, name: None }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSender {
    Id(u64),
    Object {
        id: u64,
        #[serde(default, alias = "username", alias = "full_name")]
        name: Option<String>,
    },
}

impl From<RawSender> for SenderRef {
    fn from(raw: RawSender) -> Self {
        match raw {
            RawSender::Id(id) => Self { id, name: None },
            RawSender::Object { id, name } => Self { id, name },
        }
    }
}

/// Attachment media type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Generic file.
    #[default]
    File,
    /// Recorded voice note.
    Audio,
    /// Image.
    Image,
}

/// A file attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Media type.
    #[serde(default, alias = "type")]
    pub kind: AttachmentKind,
    /// Download location.
    #[serde(alias = "file")]
    pub url: String,
    /// Original file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One question of a live quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Zero-based position in the quiz.
    #[serde(alias = "question_index")]
    pub index: usize,

    /// Backend id of the question, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Question text.
    #[serde(alias = "question", alias = "text")]
    pub prompt: String,

    /// Answer choices.
    #[serde(default)]
    pub options: Vec<String>,

    /// Countdown length in seconds.
    #[serde(default, alias = "time_limit", skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}
