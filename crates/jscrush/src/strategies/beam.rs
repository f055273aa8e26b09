//! # Beam-Search Solver
//!
//! Maintains up to *W* partial solutions, expanding each by its top-*B*
//! patterns and keeping the best *W* children by predicted score.
//! Sibling expansions within one iteration are independent and are
//! evaluated in parallel with `rayon`.

use ahash::AHashSet;
use dary_heap::OctonaryHeap;
use rayon::prelude::*;

use crate::analyser;
use crate::budget::{BudgetStop, SearchBudget};
use crate::graph::SearchGraph;
use crate::options::PackerOptions;
use crate::pattern::Pattern;
use crate::predictor::{self, PredictorCache};
use crate::scorer;

use super::{apply_binding, Binding, SearchResult, TokenAlphabet};

/// A live partial solution tracked by the beam.
#[derive(Debug, Clone)]
struct BeamState {
    node_id: usize,
    text: String,
    replacements: Vec<Binding>,
    available: Vec<Pattern>,
    used_tokens: AHashSet<u8>,
    cumulative_gain: i64,
    predicted_score: f64,
    depth: u32,
}

/// One candidate child produced by expanding a single parent state with
/// a single pattern.
struct Candidate {
    parent_node_id: usize,
    state: BeamState,
    applied_pattern: String,
    applied_gain: i64,
}

fn root_state(
    text: &str,
    delimiter: u8,
) -> BeamState {
    let available = analyser::enumerate(text, delimiter);
    BeamState {
        node_id: 0,
        text: text.to_string(),
        replacements: Vec::new(),
        available,
        used_tokens: AHashSet::new(),
        cumulative_gain: 0,
        predicted_score: 0.0,
        depth: 0,
    }
}

/// A pattern ordered solely by `gain`, for the bounded top-`B` heap in
/// [`expand_state`]. `std::cmp::Reverse` over this turns
/// [`OctonaryHeap`]'s default max-heap into the min-heap a bounded
/// "keep the B largest" selection needs.
struct ByGain(Pattern);

impl PartialEq for ByGain {
    fn eq(&self, other: &Self) -> bool {
        self.0.gain == other.0.gain
    }
}
impl Eq for ByGain {}
impl PartialOrd for ByGain {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ByGain {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.gain.cmp(&other.0.gain)
    }
}

/// Keep the `branch_factor` highest-gain patterns from `patterns` using a
/// bounded 8-ary heap rather than a full sort.
fn top_by_gain(
    patterns: Vec<Pattern>,
    branch_factor: usize,
) -> Vec<Pattern> {
    if branch_factor == 0 {
        return Vec::new();
    }
    let mut heap: OctonaryHeap<std::cmp::Reverse<ByGain>> = OctonaryHeap::with_capacity(branch_factor + 1);
    for p in patterns {
        heap.push(std::cmp::Reverse(ByGain(p)));
        if heap.len() > branch_factor {
            heap.pop();
        }
    }
    let mut out: Vec<Pattern> = heap.into_iter().map(|std::cmp::Reverse(ByGain(p))| p).collect();
    out.sort_by(|a, b| b.gain.cmp(&a.gain));
    out
}

/// Expand a single beam state into up to `branch_factor` children.
fn expand_state(
    state: &BeamState,
    original_text: &str,
    options: &PackerOptions,
    alphabet: TokenAlphabet,
) -> Vec<Candidate> {
    let mut recounted = analyser::recount(state.available.clone(), &state.text, options.delimiter);
    scorer::score_all(&mut recounted, &options.weights);
    let recounted = top_by_gain(recounted, options.branch_factor);

    let token = match alphabet.next_token(original_text, &state.used_tokens, options.delimiter) {
        Some(t) => t,
        None => return Vec::new(),
    };

    recounted
        .into_iter()
        .filter(|p| p.gain > 0)
        .map(|chosen| {
            let (new_text, copies) = apply_binding(&state.text, &chosen.string, token);
            let remaining: Vec<Pattern> = state
                .available
                .iter()
                .filter(|p| p.string != chosen.string)
                .cloned()
                .collect();
            let mut used_tokens = state.used_tokens.clone();
            used_tokens.insert(token);
            let mut cache = PredictorCache::new();
            let lookahead = predictor::predict(
                &new_text,
                &remaining,
                options.look_ahead_depth,
                options.look_ahead_discount,
                options.delimiter,
                &options.weights,
                &mut cache,
            );
            let cumulative_gain = state.cumulative_gain + chosen.gain;
            let predicted_score =
                cumulative_gain as f64 + options.look_ahead_discount * lookahead;

            let mut replacements = state.replacements.clone();
            replacements.push(Binding {
                token,
                pattern: chosen.string.clone(),
                copies,
                gain: chosen.gain,
                score: chosen.score,
            });

            Candidate {
                parent_node_id: state.node_id,
                applied_pattern: chosen.string.clone(),
                applied_gain: chosen.gain,
                state: BeamState {
                    node_id: 0, // assigned after graph recording
                    text: new_text,
                    replacements,
                    available: remaining,
                    used_tokens,
                    cumulative_gain,
                    predicted_score,
                    depth: state.depth + 1,
                },
            }
        })
        .collect()
}

/// Run the beam search to completion on `text`, drawing tokens from the
/// printable-byte alphabet and under no budget.
///
/// ## Arguments
/// * `text` - the input text to compress.
/// * `options` - the packer options (beam width, branch factor,
///   look-ahead depth, etc).
///
/// ## Returns
/// The best [`SearchResult`] found, and the [`SearchGraph`] recorded
/// while searching.
pub fn run(
    text: &str,
    options: &PackerOptions,
) -> (SearchResult, SearchGraph) {
    let (result, graph, _stop) = run_with_budget(text, options, TokenAlphabet::Bytes, &SearchBudget::unbounded());
    (result, graph)
}

/// Run the beam search restricted to the digit-token alphabet, under
/// the given budget.
///
/// ## Arguments
/// * `text` - the input text to compress; must already be digit-free
///   (checked by [`super::digit::check_precondition`]).
/// * `options` - the packer options; `max_int` bounds the digit alphabet.
/// * `budget` - iteration-boundary state-count, deadline, and
///   cancellation bounds.
///
/// ## Returns
/// The best [`SearchResult`] found, the [`SearchGraph`] recorded while
/// searching, and why the search stopped early, if it did.
pub fn run_digit(
    text: &str,
    options: &PackerOptions,
    budget: &SearchBudget,
) -> (SearchResult, SearchGraph, Option<BudgetStop>) {
    let n = options.max_int.clamp(1, 10) as u8;
    run_with_budget(text, options, TokenAlphabet::Digits(n), budget)
}

/// Run the beam search to completion on `text` under a token alphabet
/// and budget, checking the budget once per iteration.
///
/// ## Arguments
/// * `text` - the input text to compress.
/// * `options` - the packer options (beam width, branch factor,
///   look-ahead depth, etc).
/// * `alphabet` - which token alphabet to draw fresh tokens from.
/// * `budget` - iteration-boundary state-count, deadline, and
///   cancellation bounds; use [`SearchBudget::unbounded`] for none.
///
/// ## Returns
/// The best [`SearchResult`] found, the [`SearchGraph`] recorded while
/// searching, and why the search stopped early, if a budget tripped.
pub fn run_with_budget(
    text: &str,
    options: &PackerOptions,
    alphabet: TokenAlphabet,
    budget: &SearchBudget,
) -> (SearchResult, SearchGraph, Option<BudgetStop>) {
    let mut graph = SearchGraph::with_root();
    let mut beam = vec![root_state(text, options.delimiter)];

    let mut best_gain = 0i64;
    let mut best_state = beam[0].clone();
    let mut stop_reason = None;

    let safety_iterations = options.max_replacements.max(1) * 4;
    let mut iterations = 0usize;

    loop {
        iterations += 1;
        if iterations > safety_iterations {
            log::warn!("beam search: iteration budget exhausted, stopping early");
            break;
        }

        if let Some(stop) = budget.check(graph.nodes.len() as u64) {
            log::warn!("beam search: external budget exhausted ({stop:?}), stopping early");
            stop_reason = Some(stop);
            break;
        }

        let head_has_gain = beam
            .iter()
            .any(|s| s.available.iter().any(|p| p.gain > 0) && s.depth < options.max_replacements as u32);
        if !head_has_gain {
            break;
        }

        let all_candidates: Vec<Candidate> = beam
            .par_iter()
            .flat_map(|state| expand_state(state, text, options, alphabet).into_par_iter())
            .collect();

        if all_candidates.is_empty() {
            break;
        }

        let mut next_states: Vec<BeamState> = Vec::new();
        let mut seen_texts: AHashSet<String> = AHashSet::new();

        // Re-insert the unchanged parents as "stop here" options.
        for parent in &beam {
            if seen_texts.insert(parent.text.clone()) {
                next_states.push(parent.clone());
            }
        }

        for candidate in all_candidates {
            if !seen_texts.insert(candidate.state.text.clone()) {
                continue;
            }
            let node_id = graph.add_node(
                candidate.parent_node_id,
                candidate.state.depth,
                candidate.state.cumulative_gain,
                candidate.state.predicted_score,
                &candidate.applied_pattern,
                candidate.applied_gain,
            );
            let mut state = candidate.state;
            state.node_id = node_id;

            if state.cumulative_gain > best_gain {
                best_gain = state.cumulative_gain;
                best_state = state.clone();
            }
            next_states.push(state);
        }

        next_states.sort_by(|a, b| {
            if options.prioritize_highest_gain {
                b.cumulative_gain
                    .cmp(&a.cumulative_gain)
                    .then_with(|| b.predicted_score.partial_cmp(&a.predicted_score).unwrap_or(std::cmp::Ordering::Equal))
            } else {
                b.predicted_score
                    .partial_cmp(&a.predicted_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.cumulative_gain.cmp(&a.cumulative_gain))
            }
        });
        next_states.truncate(options.beam_width);

        let converged = next_states.len() == beam.len()
            && next_states
                .iter()
                .zip(beam.iter())
                .all(|(a, b)| a.text == b.text);
        beam = next_states;
        if converged {
            break;
        }
    }

    graph.set_best_path(best_state.node_id);

    (
        SearchResult {
            text: best_state.text,
            replacements: best_state.replacements,
            cumulative_gain: best_state.cumulative_gain,
        },
        graph,
        stop_reason,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beam_abcabcabc() {
        let options = PackerOptions::default();
        let (result, graph) = run("abcabcabc", &options);
        assert!(!result.replacements.is_empty());
        assert!(result.cumulative_gain > 0);
        assert!(!graph.best_path.is_empty());
    }

    #[test]
    fn test_beam_no_repeats() {
        let options = PackerOptions::default();
        let (result, _graph) = run("abcdefgh", &options);
        assert!(result.replacements.is_empty());
        assert_eq!(result.text, "abcdefgh");
    }

    #[test]
    fn test_beam_synthetic_repeat_block_achieves_positive_gain() {
        let block = "abcdefghijklmnopqrst";
        let input = block.repeat(100);
        let mut options = PackerOptions::default();
        options.beam_width = 5;
        let (result, _graph) = run(&input, &options);
        assert!(result.cumulative_gain > 0);
    }

    #[test]
    fn test_run_digit_uses_only_digit_tokens() {
        let options = PackerOptions::default();
        let block = "abcdefghijklmnopqrst";
        let input = block.repeat(50);
        let (result, _graph, stop) = run_digit(&input, &options, &SearchBudget::unbounded());
        assert!(stop.is_none());
        assert!(!result.replacements.is_empty());
        for binding in &result.replacements {
            assert!(binding.token.is_ascii_digit(), "non-digit token {}", binding.token as char);
        }
    }

    #[test]
    fn test_run_digit_caps_token_count_at_max_int() {
        let mut options = PackerOptions::default();
        options.max_int = 3;
        options.branch_factor = 1;
        options.beam_width = 1;
        // Many independent two-char patterns, each worth replacing, so the
        // search would bind more than three tokens if the alphabet allowed it.
        let input = "aa11bb22cc33dd44ee55ff66".repeat(3);
        let (result, _graph, _stop) = run_digit(&input, &options, &SearchBudget::unbounded());
        assert!(result.replacements.len() <= 3);
    }

    #[test]
    fn test_run_with_budget_stops_on_state_cap() {
        let options = PackerOptions::default();
        let block = "abcdefghijklmnopqrst";
        let input = block.repeat(100);
        let budget = SearchBudget::new(1, std::time::Instant::now() + std::time::Duration::from_secs(60), std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)));
        let (_result, graph, stop) = run_with_budget(&input, &options, TokenAlphabet::Bytes, &budget);
        assert_eq!(stop, Some(BudgetStop::StatesExhausted));
        assert!(graph.nodes.len() <= 2);
    }

    #[test]
    fn test_run_with_budget_stops_on_cancel() {
        let options = PackerOptions::default();
        let block = "abcdefghijklmnopqrst";
        let input = block.repeat(100);
        let cancel = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        let budget = SearchBudget::new(u64::MAX, std::time::Instant::now() + std::time::Duration::from_secs(60), cancel);
        let (_result, _graph, stop) = run_with_budget(&input, &options, TokenAlphabet::Bytes, &budget);
        assert_eq!(stop, Some(BudgetStop::Cancelled));
    }
}
