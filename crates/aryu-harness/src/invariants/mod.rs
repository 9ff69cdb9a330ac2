//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during execution. Unlike
//! example-based tests that check specific scenarios, invariants verify
//! behavioral properties across all possible action sequences.
//!
//! # Architecture
//!
//! Observable state is extracted from each [`aryu_app::ViewModel`] into a
//! [`ViewSnapshot`]. Registered [`Invariant`] checks then run over the whole
//! history, so both per-state and transition properties can be expressed.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.check_all(&surface.history())?;
//! ```

mod checks;
mod snapshot;

pub use checks::{
    ExistingItemsKeepOrder, QuestionIndexMonotonic, TimerGatedByAck, UniqueItemIds,
    UnreadMatchesItems,
};
pub use snapshot::{ItemSnapshot, QuizSnapshot, ViewSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against a history of view snapshots.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant over a history, oldest first.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, history: &[ViewSnapshot]) -> InvariantResult;
}

/// Registry of invariants to check.
///
/// Use [`InvariantRegistry::standard()`] for the view-model invariants.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard view-model invariants.
    ///
    /// Includes:
    /// - [`UnreadMatchesItems`]: counter equals unread items
    /// - [`UniqueItemIds`]: no duplicate items or pending entries
    /// - [`QuestionIndexMonotonic`]: question index never decreases
    /// - [`TimerGatedByAck`]: countdown starts only on acknowledgment
    /// - [`ExistingItemsKeepOrder`]: only snapshots reorder items
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(UnreadMatchesItems);
        registry.add(UniqueItemIds);
        registry.add(QuestionIndexMonotonic);
        registry.add(TimerGatedByAck);
        registry.add(ExistingItemsKeepOrder);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against a history.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, history: &[ViewSnapshot]) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(history).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic, reason = "test assertion helper")]
    pub fn assert_all(&self, history: &[ViewSnapshot], context: &str) {
        if let Err(violations) = self.check_all(history) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
