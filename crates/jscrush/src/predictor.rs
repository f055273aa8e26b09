//! # Gain Predictor (look-ahead)
//!
//! A memoised, bounded-depth greedy projection used by the beam search to
//! rank candidate states by more than their immediate gain.

use ahash::AHashMap;

use crate::pattern::Pattern;
use crate::scorer::ScorerWeights;

/// A memoisation cache for look-ahead projections, keyed by the text the
/// projection was run against.
///
/// Bounded to the lifetime of a single search graph; never shared across
/// concurrent solver instances.
#[derive(Debug, Default)]
pub struct PredictorCache {
    cache: AHashMap<String, i64>,
}

impl PredictorCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        PredictorCache::default()
    }

    /// Number of entries currently memoised.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Project cumulative gain obtainable beyond the next replacement by
/// greedily applying the best available pattern, up to `depth` steps, and
/// discounting each step by `discount`.
///
/// ## Arguments
/// * `text` - the text at the head of the beam state being scored.
/// * `available` - the still-available patterns at this state.
/// * `depth` - remaining look-ahead budget.
/// * `discount` - per-step discount factor, typically in `[0.8, 1.0]`.
/// * `delimiter` - the string delimiter byte.
/// * `weights` - scorer weights used to pick the greedy step.
/// * `cache` - memoisation cache, keyed by `text`.
///
/// ## Returns
/// The discounted cumulative gain of the greedy look-ahead projection.
pub fn predict(
    text: &str,
    available: &[Pattern],
    depth: u32,
    discount: f64,
    delimiter: u8,
    weights: &ScorerWeights,
    cache: &mut PredictorCache,
) -> f64 {
    if depth == 0 || available.is_empty() {
        return 0.0;
    }
    if let Some(&cached) = cache.cache.get(text) {
        return cached as f64;
    }

    let recounted = crate::analyser::recount(available.to_vec(), text, delimiter);
    if recounted.is_empty() {
        cache.cache.insert(text.to_string(), 0);
        return 0.0;
    }

    let mut scored = recounted;
    crate::scorer::score_all(&mut scored, weights);
    let best_idx = match crate::scorer::best_candidate(&scored, weights) {
        Some(idx) => idx,
        None => {
            cache.cache.insert(text.to_string(), 0);
            return 0.0;
        }
    };
    let chosen = scored.remove(best_idx);
    let step_gain = chosen.gain;

    // The look-ahead never binds a real token, so any single-char
    // placeholder absent from the working text stands in for one.
    let (new_text, _) = crate::text::replace_counted(text, &chosen.string, "\u{FFFF}");
    let rest = predict(
        &new_text,
        &scored,
        depth - 1,
        discount,
        delimiter,
        weights,
        cache,
    );

    let total = step_gain as f64 + discount * rest;
    cache.cache.insert(text.to_string(), total as i64);
    total
}
