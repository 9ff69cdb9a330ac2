//! Observable view-model snapshots for invariant checking.
//!
//! Snapshots capture what a user could see at one point in time. Invariants
//! operate on a history of snapshots rather than live state, and the same
//! snapshots serialize for insta assertions.

use aryu_app::{Action, ViewModel};
use aryu_proto::ItemId;
use serde::Serialize;

/// One item as it appears in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSnapshot {
    /// Item id.
    pub id: ItemId,
    /// Text content.
    pub body: String,
    /// Read flag.
    pub read: bool,
}

/// Quiz portion of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuizSnapshot {
    /// Last acknowledged question.
    pub current: Option<usize>,
    /// Countdown restart key.
    pub timer_key: u64,
    /// Countdown running.
    pub running: bool,
    /// Requested but unacknowledged start.
    pub pending_start: Option<usize>,
    /// Index of the displayed question.
    pub question: Option<usize>,
}

/// Snapshot of one view model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    /// Bound resource as `kind/id`.
    pub resource: Option<String>,
    /// Connection state name.
    pub connection: String,
    /// Items in display order.
    pub items: Vec<ItemSnapshot>,
    /// Unread counter as exposed by the view model.
    pub unread_count: usize,
    /// Local ids of pending sends.
    pub pending: Vec<u64>,
    /// Current notice.
    pub notice: Option<String>,
    /// Quiz state.
    pub quiz: QuizSnapshot,
    /// Action that produced this view, when known.
    #[serde(skip)]
    pub cause: Option<&'static str>,
}

impl ViewSnapshot {
    /// Capture a view model.
    pub fn capture(view: &ViewModel) -> Self {
        let quiz = view.quiz();
        Self {
            resource: view.resource().map(ToString::to_string),
            connection: format!("{:?}", view.connection()),
            items: view
                .items()
                .iter()
                .map(|item| ItemSnapshot { id: item.id, body: item.body.clone(), read: item.read })
                .collect(),
            unread_count: view.unread_count(),
            pending: view.pending().iter().map(|p| p.local_id).collect(),
            notice: view.notice().map(str::to_owned),
            quiz: QuizSnapshot {
                current: quiz.current_question_index(),
                timer_key: quiz.timer_key(),
                running: quiz.is_running(),
                pending_start: quiz.pending_start(),
                question: quiz.question().map(|q| q.index),
            },
            cause: None,
        }
    }

    /// Capture a view model together with the action that produced it.
    pub fn after(view: &ViewModel, action: &Action) -> Self {
        Self { cause: Some(action.name()), ..Self::capture(view) }
    }

    /// Ids of the items, in order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.id).collect()
    }
}
