//! View-model reducer.
//!
//! [`reduce`] is the only writer of [`ViewModel`]. It is a pure function of
//! its inputs: the previous state is borrowed and never modified, no I/O
//! happens, and applying the same actions to the same state always yields
//! the same result.
//!
//! # Invariants
//!
//! - Item ids are unique within `items`.
//! - Existing items are never reordered.
//! - `quiz.current_question_index` never decreases.
//! - `quiz.is_running` only becomes true on `StartAcknowledged`.

use std::collections::HashSet;

use aryu_proto::{Item, QuizQuestion};

use crate::{Action, ConnectionState, ViewModel};

/// Apply one action to a view model, returning the next view model.
pub fn reduce(state: &ViewModel, action: &Action) -> ViewModel {
    let mut next = state.clone();

    match action {
        Action::Opening { resource } => {
            if next.resource.as_ref() != Some(resource) {
                next = ViewModel { resource: Some(resource.clone()), ..ViewModel::default() };
            }
            next.connection = ConnectionState::Connecting;
        },
        Action::ConnectionOpened => {
            next.connection = ConnectionState::Open;
        },
        Action::ConnectionClosed => {
            next.connection = ConnectionState::Closed;
        },
        Action::ConnectionError { message } => {
            next.connection = ConnectionState::Error;
            next.notice = Some(message.clone());
        },
        Action::HistorySnapshot(items) => {
            next.items = dedupe(items);
        },
        Action::ItemDelivered(item) => upsert(&mut next.items, item),
        Action::MarkRead { id } => {
            if let Some(item) = next.items.iter_mut().find(|item| item.id == *id) {
                item.read = true;
            }
        },
        Action::MarkAllRead => {
            for item in &mut next.items {
                item.read = true;
            }
        },
        Action::PendingAdded(pending) => {
            if !next.pending.iter().any(|p| p.local_id == pending.local_id) {
                next.pending.push(pending.clone());
            }
        },
        Action::PendingConfirmed { local_id, item } => {
            next.pending.retain(|p| p.local_id != *local_id);
            upsert(&mut next.items, item);
        },
        Action::PendingFailed { local_id, reason } => {
            next.pending.retain(|p| p.local_id != *local_id);
            next.notice = Some(reason.clone());
        },
        Action::RequestFailed { message } | Action::ServerError { message } => {
            next.notice = Some(message.clone());
        },
        Action::StartRequested { question_index } => {
            if *question_index >= next.quiz.floor() {
                next.quiz.pending_start = Some(*question_index);
            }
        },
        Action::StartAcknowledged { question_index } => {
            let index = *question_index;
            if index >= next.quiz.floor() {
                let quiz = &mut next.quiz;
                quiz.current_question_index = Some(index);
                quiz.timer_key += 1;
                quiz.is_running = true;
                if quiz.pending_start.is_some_and(|pending| pending <= index) {
                    quiz.pending_start = None;
                }
                if quiz.question.as_ref().is_none_or(|q| q.index != index)
                    && let Some(question) = find_question(&quiz.questions, index)
                {
                    quiz.question = Some(question.clone());
                }
            }
        },
        Action::QuestionDelivered(question) => {
            if question.index >= next.quiz.floor() {
                next.quiz.question = Some(question.clone());
            }
        },
        Action::QuestionsLoaded(questions) => {
            next.quiz.questions.clone_from(questions);
        },
        Action::TimerElapsed => {
            next.quiz.is_running = false;
        },
        Action::DismissNotice => {
            next.notice = None;
        },
    }

    next
}

/// Apply a sequence of actions in order.
pub fn reduce_all<'a>(state: &ViewModel, actions: impl IntoIterator<Item = &'a Action>) -> ViewModel {
    actions.into_iter().fold(state.clone(), |acc, action| reduce(&acc, action))
}

/// Keep the first occurrence of each id, preserving order.
fn dedupe(items: &[Item]) -> Vec<Item> {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().filter(|item| seen.insert(item.id)).cloned().collect()
}

/// Replace an item with the same id in place, or append it.
fn upsert(items: &mut Vec<Item>, item: &Item) {
    match items.iter_mut().find(|existing| existing.id == item.id) {
        Some(existing) => existing.clone_from(item),
        None => items.push(item.clone()),
    }
}

fn find_question(questions: &[QuizQuestion], index: usize) -> Option<&QuizQuestion> {
    questions.iter().find(|q| q.index == index)
}
