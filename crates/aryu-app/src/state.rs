//! Observable view-model types.
//!
//! [`ViewModel`] is the client-held projection of server state for one
//! channel. It is only ever produced by [`crate::reduce`]; nothing else
//! mutates it. Derived values such as the unread count are computed from the
//! item list on demand and never stored, so they cannot drift.

use aryu_proto::{Item, ItemId, QuizQuestion, Resource};

/// Connection state of the current channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport is being established.
    Connecting,
    /// Transport is open and frames flow.
    Open,
    /// No transport, either never opened or closed cleanly.
    #[default]
    Closed,
    /// Transport failed. Stays here until the channel is opened again.
    Error,
}

/// An outgoing message whose HTTP send has not completed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    /// Client-local id, unique per runtime.
    pub local_id: u64,
    /// Text content.
    pub body: String,
    /// File names of attachments being uploaded.
    pub attachment_names: Vec<String>,
}

/// Live quiz state for the quiz room variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizState {
    pub(crate) current_question_index: Option<usize>,
    pub(crate) timer_key: u64,
    pub(crate) is_running: bool,
    pub(crate) pending_start: Option<usize>,
    pub(crate) question: Option<QuizQuestion>,
    pub(crate) questions: Vec<QuizQuestion>,
}

impl QuizState {
    /// Index of the last question the server started. `None` before the
    /// first start.
    pub fn current_question_index(&self) -> Option<usize> {
        self.current_question_index
    }

    /// Changes on every acknowledged start so the countdown restarts.
    pub fn timer_key(&self) -> u64 {
        self.timer_key
    }

    /// True while the server-acknowledged countdown runs.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Start requested by this client and not yet acknowledged.
    pub fn pending_start(&self) -> Option<usize> {
        self.pending_start
    }

    /// Question currently shown.
    pub fn question(&self) -> Option<&QuizQuestion> {
        self.question.as_ref()
    }

    /// All questions of the quiz, as loaded over HTTP.
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Lowest index a start may target without moving backwards.
    pub(crate) fn floor(&self) -> usize {
        self.current_question_index.unwrap_or(0)
    }
}

/// View model of one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewModel {
    pub(crate) resource: Option<Resource>,
    pub(crate) connection: ConnectionState,
    pub(crate) items: Vec<Item>,
    pub(crate) pending: Vec<PendingItem>,
    pub(crate) notice: Option<String>,
    pub(crate) quiz: QuizState,
}

impl ViewModel {
    /// Empty view model with no resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource this view model belongs to.
    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    /// Connection state.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Confirmed items in display order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Item by id.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Outgoing messages still in flight, in send order.
    pub fn pending(&self) -> &[PendingItem] {
        &self.pending
    }

    /// Number of unread items.
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|item| !item.read).count()
    }

    /// User-facing error or status message. `None` if nothing to show.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Quiz state.
    pub fn quiz(&self) -> &QuizState {
        &self.quiz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_view_model_is_closed_and_empty() {
        let view = ViewModel::new();
        assert_eq!(view.connection(), ConnectionState::Closed);
        assert!(view.items().is_empty());
        assert_eq!(view.unread_count(), 0);
        assert!(!view.quiz().is_running());
        assert_eq!(view.quiz().current_question_index(), None);
    }

    #[test]
    fn unread_count_is_projection_of_items() {
        let view = ViewModel {
            items: vec![Item::new(1, "a"), Item::new(2, "b").with_read(true), Item::new(3, "c")],
            ..ViewModel::default()
        };
        assert_eq!(view.unread_count(), 2);
        assert_eq!(view.item(2).map(|i| i.read), Some(true));
    }
}
