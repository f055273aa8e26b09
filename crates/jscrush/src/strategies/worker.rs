//! # Digit-Replacer Background Worker
//!
//! The optional off-thread worker: the digit-replacer
//! strategy may, at the caller's choice, run its beam search on a
//! background thread under bounded budgets, publishing progress
//! messages and a final result or error.
//!
//! Message ordering guarantees: a `Result` or `Error` message is
//! never emitted before this worker has started, and no further
//! messages follow a `Result` or `Error`. Progress fractions are
//! strictly monotone non-decreasing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::budget::{BudgetStop, SearchBudget};
use crate::errors::PackError;
use crate::graph::SearchGraph;
use crate::options::PackerOptions;
use crate::strategies::{self, beam, SearchResult};

/// A message published by the worker to the caller.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Progress through the search: a fraction in `[0, 1]`, a short
    /// phase label, a human-readable message, and an optional detail
    /// string.
    Progress {
        /// Fraction complete, monotone non-decreasing across a run.
        fraction: f64,
        /// Short phase label (e.g. `"searching"`, `"timeout"`).
        phase: String,
        /// Human-readable progress message.
        message: String,
        /// Optional free-form detail.
        detail: Option<String>,
    },
    /// The final, successful result of the search.
    Result {
        /// The search outcome.
        result: SearchResult,
        /// Final artefact size in bytes, if computed by the caller.
        nodes_explored: usize,
        /// Wall-clock time spent searching.
        wall_clock_ms: u128,
        /// The search graph built during the run.
        search_graph: SearchGraph,
    },
    /// The worker failed; no further messages will follow.
    Error {
        /// A description of the failure.
        message: String,
    },
}

/// The trigger gate a waiting worker blocks on until released.
type TriggerGate = Arc<(Mutex<bool>, Condvar)>;

/// A handle to a running background worker.
pub struct WorkerHandle {
    receiver: Receiver<WorkerMessage>,
    cancel: Arc<AtomicBool>,
    trigger: TriggerGate,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Block on the next message from the worker, if any remain.
    pub fn recv(&self) -> Option<WorkerMessage> {
        self.receiver.recv().ok()
    }

    /// Request cancellation. The beam loop checks this flag at every
    /// iteration boundary (`strategies::beam::run_with_budget`), so an
    /// in-flight search aborts at its next iteration rather than only
    /// before or after the whole search runs.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Release a worker spawned with `options.waiting_for_trigger`. A
    /// worker not waiting on a trigger ignores this (it already started).
    pub fn trigger(&self) {
        let (lock, cvar) = &*self.trigger;
        let mut started = lock.lock().unwrap();
        *started = true;
        cvar.notify_all();
    }

    /// Block until the worker thread has exited.
    pub fn join(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn a background worker running the digit-replacer's beam search
/// under the given budgets.
///
/// If `options.waiting_for_trigger` is set, the spawned thread parks
/// immediately and does not start searching until the caller calls
/// [`WorkerHandle::trigger`] (or cancels it) — `spawn` itself still
/// returns immediately either way.
///
/// ## Arguments
/// * `text` - the input text, copied into the worker's own thread.
/// * `options` - the packer options; `max_states` and `time_limit_ms`
///   bound the search, and `max_int` bounds the digit alphabet.
///
/// ## Returns
/// A [`WorkerHandle`] the caller can poll for progress, cancel, trigger,
/// or join.
pub fn spawn(
    text: &str,
    options: &PackerOptions,
) -> WorkerHandle {
    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_thread = Arc::clone(&cancel);
    let trigger: TriggerGate = Arc::new((Mutex::new(!options.waiting_for_trigger), Condvar::new()));
    let trigger_for_thread = Arc::clone(&trigger);
    let text = text.to_string();
    let options = options.clone();

    let join_handle = std::thread::spawn(move || {
        let (lock, cvar) = &*trigger_for_thread;
        {
            let mut started = lock.lock().unwrap();
            while !*started && !cancel_for_thread.load(Ordering::SeqCst) {
                let (guard, _timeout) = cvar.wait_timeout(started, Duration::from_millis(50)).unwrap();
                started = guard;
            }
        }
        if cancel_for_thread.load(Ordering::SeqCst) {
            return;
        }

        let start = Instant::now();

        if let Err(err) = strategies::digit::check_precondition(&text) {
            let _ = tx.send(WorkerMessage::Error {
                message: err.to_string(),
            });
            return;
        }

        let _ = tx.send(WorkerMessage::Progress {
            fraction: 0.0,
            phase: "searching".to_string(),
            message: "beam search started".to_string(),
            detail: None,
        });

        let deadline = start + Duration::from_millis(options.time_limit_ms);
        let budget = SearchBudget::new(options.max_states, deadline, Arc::clone(&cancel_for_thread));

        let (result, search_graph, stop) = beam::run_digit(&text, &options, &budget);
        let elapsed = start.elapsed();

        if stop == Some(BudgetStop::Cancelled) {
            // Not required to emit a final message once cancelled.
            return;
        }

        let (phase, detail) = match stop {
            Some(BudgetStop::StatesExhausted) => (
                "timeout".to_string(),
                Some(PackError::BudgetExhausted { reason: "max_states".to_string() }.to_string()),
            ),
            Some(BudgetStop::TimedOut) => (
                "timeout".to_string(),
                Some(PackError::BudgetExhausted { reason: "time_limit_ms".to_string() }.to_string()),
            ),
            Some(BudgetStop::Cancelled) => unreachable!(),
            None => ("done".to_string(), None),
        };

        let _ = tx.send(WorkerMessage::Progress {
            fraction: 1.0,
            phase,
            message: "beam search finished".to_string(),
            detail,
        });

        let _ = tx.send(WorkerMessage::Result {
            nodes_explored: search_graph.nodes.len(),
            wall_clock_ms: elapsed.as_millis(),
            result,
            search_graph,
        });
    });

    WorkerHandle {
        receiver: rx,
        cancel,
        trigger,
        join_handle: Some(join_handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_emits_progress_then_result() {
        let options = PackerOptions::default();
        let mut handle = spawn("abcabcabc", &options);

        let mut saw_progress = false;
        let mut saw_result = false;
        let mut last_fraction = -1.0;

        while let Some(message) = handle.recv() {
            match message {
                WorkerMessage::Progress { fraction, .. } => {
                    assert!(fraction >= last_fraction);
                    last_fraction = fraction;
                    saw_progress = true;
                }
                WorkerMessage::Result { result, .. } => {
                    assert!(!result.replacements.is_empty());
                    saw_result = true;
                }
                WorkerMessage::Error { .. } => panic!("unexpected error"),
            }
        }

        assert!(saw_progress);
        assert!(saw_result);
        handle.join();
    }

    #[test]
    fn test_worker_reports_digit_precondition_as_error() {
        let options = PackerOptions::default();
        let mut handle = spawn("0 1 2 3 4", &options);

        let mut saw_error = false;
        while let Some(message) = handle.recv() {
            if let WorkerMessage::Error { .. } = message {
                saw_error = true;
            }
        }
        assert!(saw_error);
        handle.join();
    }

    #[test]
    fn test_worker_waits_for_trigger() {
        let mut options = PackerOptions::default();
        options.waiting_for_trigger = true;
        let mut handle = spawn("abcabcabc", &options);

        // Give the thread a moment to reach the wait point; it must not
        // have sent anything since it hasn't been triggered.
        std::thread::sleep(Duration::from_millis(100));
        assert!(handle.receiver.try_recv().is_err());

        handle.trigger();
        let mut saw_result = false;
        while let Some(message) = handle.recv() {
            if let WorkerMessage::Result { .. } = message {
                saw_result = true;
            }
        }
        assert!(saw_result);
        handle.join();
    }

    #[test]
    fn test_worker_honours_state_budget() {
        let mut options = PackerOptions::default();
        options.max_states = 1;
        let block = "abcdefghijklmnopqrst";
        let input = block.repeat(100);
        let mut handle = spawn(&input, &options);

        let mut saw_timeout_phase = false;
        while let Some(message) = handle.recv() {
            if let WorkerMessage::Progress { phase, .. } = &message {
                if phase == "timeout" {
                    saw_timeout_phase = true;
                }
            }
        }
        assert!(saw_timeout_phase);
        handle.join();
    }

    #[test]
    fn test_worker_cancel_trips_mid_search() {
        let mut options = PackerOptions::default();
        options.max_states = 1_000_000;
        let block = "abcdefghijklmnopqrst";
        let input = block.repeat(200);
        let handle = spawn(&input, &options);
        handle.cancel();
        // No assertion on messages: cancellation is not required to emit
        // a final message. This exercises that the thread observes the
        // flag and exits rather than hanging.
        let mut h = handle;
        h.join();
    }
}
