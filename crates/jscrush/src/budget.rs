//! # Search Budget
//!
//! Iteration-boundary bounds threaded into the beam search's outer loop:
//! a state-count cap, a wall-clock deadline, and a
//! cooperative cancel flag. Checked once per iteration so a worker run
//! can actually stop mid-search rather than only being noticed once the
//! search has already returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Why a budgeted search stopped early, if it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStop {
    /// The caller requested cancellation via the shared cancel flag.
    Cancelled,
    /// `max_states` search-graph nodes had been recorded.
    StatesExhausted,
    /// The wall-clock deadline passed.
    TimedOut,
}

/// The bounds a beam search checks at every iteration boundary. `None`
/// fields (the default, via [`SearchBudget::unbounded`]) mean "no
/// bound" — the synchronous crusher/beam strategies run under this.
#[derive(Debug, Clone, Default)]
pub struct SearchBudget {
    max_states: Option<u64>,
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl SearchBudget {
    /// No bounds at all: the search only stops when it runs out of
    /// positive-gain patterns or fresh tokens.
    pub fn unbounded() -> Self {
        SearchBudget::default()
    }

    /// Build a budget from a worker's configured limits.
    ///
    /// ## Arguments
    /// * `max_states` - stop once this many search-graph nodes exist.
    /// * `deadline` - stop once `Instant::now()` passes this point.
    /// * `cancel` - stop as soon as this flag is set.
    pub fn new(
        max_states: u64,
        deadline: Instant,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        SearchBudget {
            max_states: Some(max_states),
            deadline: Some(deadline),
            cancel: Some(cancel),
        }
    }

    /// Check every configured bound against the current state count.
    ///
    /// ## Arguments
    /// * `states_explored` - the number of search-graph nodes recorded
    ///   so far, checked against `max_states`.
    ///
    /// ## Returns
    /// Why the search should stop, if any bound has been crossed.
    pub fn check(
        &self,
        states_explored: u64,
    ) -> Option<BudgetStop> {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::SeqCst) {
                return Some(BudgetStop::Cancelled);
            }
        }
        if let Some(max_states) = self.max_states {
            if states_explored >= max_states {
                return Some(BudgetStop::StatesExhausted);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some(BudgetStop::TimedOut);
            }
        }
        None
    }
}
