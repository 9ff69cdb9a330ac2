//! Reducer inputs.
//!
//! Every server event and every user-triggered state change is normalized
//! into an [`Action`] before it touches the view model. Server events map
//! through [`From<ServerEvent>`]; the runtime produces the rest.

use aryu_proto::{Item, ItemId, QuizQuestion, Resource, ServerEvent};

use crate::PendingItem;

/// Tagged state transitions applied by [`crate::reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A channel for `resource` is being opened.
    Opening {
        /// Resource the channel is bound to.
        resource: Resource,
    },

    /// Transport opened.
    ConnectionOpened,

    /// Transport closed cleanly or was torn down.
    ConnectionClosed,

    /// Transport failed.
    ConnectionError {
        /// Diagnostic shown to the user.
        message: String,
    },

    /// Authoritative item list, from a history frame or an HTTP read.
    HistorySnapshot(Vec<Item>),

    /// One item pushed over the channel.
    ItemDelivered(Item),

    /// One item was read.
    MarkRead {
        /// Item id.
        id: ItemId,
    },

    /// Every item was read.
    MarkAllRead,

    /// Optimistic copy of an outgoing message.
    PendingAdded(PendingItem),

    /// Server accepted an outgoing message.
    PendingConfirmed {
        /// Local id of the pending entry.
        local_id: u64,
        /// Item as stored by the server.
        item: Item,
    },

    /// Server rejected an outgoing message, or the request failed.
    PendingFailed {
        /// Local id of the pending entry.
        local_id: u64,
        /// User-facing reason.
        reason: String,
    },

    /// An HTTP request failed. Data is left as it was.
    RequestFailed {
        /// User-facing reason.
        message: String,
    },

    /// The server sent an `error` frame.
    ServerError {
        /// Server-provided reason.
        message: String,
    },

    /// The user asked to start a question. Does not start the timer.
    StartRequested {
        /// Question to start.
        question_index: usize,
    },

    /// The server started a question.
    StartAcknowledged {
        /// Started question.
        question_index: usize,
    },

    /// The server published a question.
    QuestionDelivered(QuizQuestion),

    /// Full question list loaded over HTTP.
    QuestionsLoaded(Vec<QuizQuestion>),

    /// The countdown for the current question ran out.
    TimerElapsed,

    /// The user dismissed the current notice.
    DismissNotice,
}

impl Action {
    /// Variant name, for logs and invariant reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opening { .. } => "opening",
            Self::ConnectionOpened => "connection_opened",
            Self::ConnectionClosed => "connection_closed",
            Self::ConnectionError { .. } => "connection_error",
            Self::HistorySnapshot(_) => "history_snapshot",
            Self::ItemDelivered(_) => "item_delivered",
            Self::MarkRead { .. } => "mark_read",
            Self::MarkAllRead => "mark_all_read",
            Self::PendingAdded(_) => "pending_added",
            Self::PendingConfirmed { .. } => "pending_confirmed",
            Self::PendingFailed { .. } => "pending_failed",
            Self::RequestFailed { .. } => "request_failed",
            Self::ServerError { .. } => "server_error",
            Self::StartRequested { .. } => "start_requested",
            Self::StartAcknowledged { .. } => "start_acknowledged",
            Self::QuestionDelivered(_) => "question_delivered",
            Self::QuestionsLoaded(_) => "questions_loaded",
            Self::TimerElapsed => "timer_elapsed",
            Self::DismissNotice => "dismiss_notice",
        }
    }

    /// User-facing message carried by error actions.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::ConnectionError { message }
            | Self::RequestFailed { message }
            | Self::ServerError { message }
            | Self::PendingFailed { reason: message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<ServerEvent> for Action {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::ChatMessage { message: item }
            | ServerEvent::Notification { notification: item } => Self::ItemDelivered(item),
            ServerEvent::MessageHistory { messages: items }
            | ServerEvent::InitNotifications { notifications: items } => {
                Self::HistorySnapshot(items)
            },
            ServerEvent::StartQuestion { question_index } => {
                Self::StartAcknowledged { question_index }
            },
            ServerEvent::SendQuestion { question } => Self::QuestionDelivered(question),
            ServerEvent::Error { message } => Self::ServerError { message },
        }
    }
}
