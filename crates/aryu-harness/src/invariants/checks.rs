//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, ViewSnapshot, Violation};

/// Pairs of consecutive snapshots bound to the same resource.
fn same_resource_windows(
    history: &[ViewSnapshot],
) -> impl Iterator<Item = (&ViewSnapshot, &ViewSnapshot)> {
    history.windows(2).filter_map(|w| match w {
        [before, after] if before.resource == after.resource && after.cause != Some("opening") => {
            Some((before, after))
        },
        _ => None,
    })
}

/// The unread counter equals the number of unread items.
///
/// The counter is derived, so this only fails if someone starts storing it.
pub struct UnreadMatchesItems;

impl Invariant for UnreadMatchesItems {
    fn name(&self) -> &'static str {
        "unread_matches_items"
    }

    fn check(&self, history: &[ViewSnapshot]) -> InvariantResult {
        for (step, snapshot) in history.iter().enumerate() {
            let unread = snapshot.items.iter().filter(|i| !i.read).count();
            if unread != snapshot.unread_count {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {step}: counter {} but {unread} unread items",
                        snapshot.unread_count
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Item ids and pending local ids are unique.
pub struct UniqueItemIds;

impl Invariant for UniqueItemIds {
    fn name(&self) -> &'static str {
        "unique_item_ids"
    }

    fn check(&self, history: &[ViewSnapshot]) -> InvariantResult {
        for (step, snapshot) in history.iter().enumerate() {
            let mut seen = HashSet::new();
            if let Some(dup) = snapshot.items.iter().find(|i| !seen.insert(i.id)) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("step {step}: item {} appears twice", dup.id),
                });
            }

            let mut seen = HashSet::new();
            if let Some(dup) = snapshot.pending.iter().find(|id| !seen.insert(**id)) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("step {step}: pending {dup} appears twice"),
                });
            }
        }
        Ok(())
    }
}

/// The acknowledged question index never decreases within one resource.
pub struct QuestionIndexMonotonic;

impl Invariant for QuestionIndexMonotonic {
    fn name(&self) -> &'static str {
        "question_index_monotonic"
    }

    fn check(&self, history: &[ViewSnapshot]) -> InvariantResult {
        for (before, after) in same_resource_windows(history) {
            if after.quiz.current < before.quiz.current {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "question index went {:?} → {:?} on {:?}",
                        before.quiz.current, after.quiz.current, after.cause
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The countdown only starts on a server acknowledgment.
///
/// Whenever the countdown goes from stopped to running, the timer key must
/// have advanced, and only a `start_acknowledged` action advances it.
pub struct TimerGatedByAck;

impl Invariant for TimerGatedByAck {
    fn name(&self) -> &'static str {
        "timer_gated_by_ack"
    }

    fn check(&self, history: &[ViewSnapshot]) -> InvariantResult {
        for (before, after) in same_resource_windows(history) {
            let key_moved = after.quiz.timer_key != before.quiz.timer_key;

            if after.quiz.timer_key < before.quiz.timer_key {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "timer key went {} → {}",
                        before.quiz.timer_key, after.quiz.timer_key
                    ),
                });
            }
            if !before.quiz.running && after.quiz.running && !key_moved {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("countdown started without a new key on {:?}", after.cause),
                });
            }
            if key_moved && after.cause.is_some_and(|cause| cause != "start_acknowledged") {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("timer key moved on {:?}", after.cause),
                });
            }
        }
        Ok(())
    }
}

/// Incremental actions never reorder items already shown.
///
/// Only a full snapshot may replace the list. Every other known action
/// keeps the previous ids as a prefix of the new ones.
pub struct ExistingItemsKeepOrder;

impl Invariant for ExistingItemsKeepOrder {
    fn name(&self) -> &'static str {
        "existing_items_keep_order"
    }

    fn check(&self, history: &[ViewSnapshot]) -> InvariantResult {
        for (before, after) in same_resource_windows(history) {
            let Some(cause) = after.cause else {
                continue;
            };
            if cause == "history_snapshot" {
                continue;
            }

            let (old, new) = (before.item_ids(), after.item_ids());
            if !new.starts_with(&old) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{cause} changed {old:?} into {new:?}"),
                });
            }
        }
        Ok(())
    }
}
