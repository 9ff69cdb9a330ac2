//! HTTP reconciliation path.
//!
//! The [`Backend`] trait is the request/response side of a session: it reads
//! authoritative item lists and performs writes the server has to confirm.
//! The runtime applies writes optimistically, then refetches; whatever the
//! refetch returns replaces the optimistic state.

use std::future::Future;

use aryu_proto::{AttachmentKind, Item, ItemId, QuizQuestion, Resource};
use thiserror::Error;

/// Shown when the server gave no usable reason.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Failed HTTP request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Server answered with a non-success status.
    #[error("request failed with status {code}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// `message` or `detail` from the error body, if any.
        message: Option<String>,
    },

    /// Request never reached the server, or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Request exceeded its deadline.
    #[error("request timed out")]
    Timeout,
}

impl ApiError {
    /// Message suitable for a toast. Prefers the server's wording and falls
    /// back to [`GENERIC_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message: Some(message), .. } if !message.trim().is_empty() => {
                message.clone()
            },
            _ => GENERIC_ERROR_MESSAGE.to_owned(),
        }
    }
}

/// File attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAttachment {
    /// How the server should store it. Audio goes to its own form field.
    pub kind: AttachmentKind,
    /// Original file name.
    pub name: String,
    /// Raw content.
    pub bytes: Vec<u8>,
}

/// Outgoing message before the server has seen it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Text content. May be empty when attachments are present.
    pub body: String,
    /// Files to upload with the message.
    pub attachments: Vec<DraftAttachment>,
}

impl Draft {
    /// Text-only draft.
    pub fn text(body: impl Into<String>) -> Self {
        Self { body: body.into(), attachments: Vec::new() }
    }

    /// Add an attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: DraftAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// True if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty() && self.attachments.is_empty()
    }

    /// Attachment file names, in order.
    pub fn attachment_names(&self) -> Vec<String> {
        self.attachments.iter().map(|a| a.name.clone()).collect()
    }
}

/// Request/response access to the resources behind a channel.
///
/// Implementations are cheap to clone; the runtime clones one into every
/// background request. All returned futures must be `Send` so they can run
/// on a task.
pub trait Backend: Clone + Send + Sync + 'static {
    /// Authoritative item list for a resource, in display order.
    fn list_items(
        &self,
        resource: &Resource,
    ) -> impl Future<Output = Result<Vec<Item>, ApiError>> + Send;

    /// One item by id.
    fn get_one(
        &self,
        resource: &Resource,
        id: ItemId,
    ) -> impl Future<Output = Result<Item, ApiError>> + Send;

    /// Create an item. Returns the item as stored by the server.
    fn send(
        &self,
        resource: &Resource,
        draft: &Draft,
    ) -> impl Future<Output = Result<Item, ApiError>> + Send;

    /// Mark one item as read.
    fn mark_read(
        &self,
        resource: &Resource,
        id: ItemId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Mark every item of a resource as read.
    fn mark_all_read(&self, resource: &Resource)
    -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Questions of a quiz, ordered by index.
    fn list_questions(
        &self,
        resource: &Resource,
    ) -> impl Future<Output = Result<Vec<QuizQuestion>, ApiError>> + Send;
}
