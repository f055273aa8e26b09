//! # Scorer
//!
//! Gain and weighted-score arithmetic. Every search strategy and
//! the token allocator route their candidate comparisons through here so
//! the tie-break contract stays in one place.

use std::cmp::Ordering;

use crate::pattern::Pattern;

/// Weights used to combine `gain`, `len`, and `copies` into a single
/// `score`, plus the tie-breaker factor applied to `copies` when `score`
/// and `gain` are equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerWeights {
    /// Weight applied to `gain`.
    pub gain_factor: f64,
    /// Weight applied to `len`.
    pub length_factor: f64,
    /// Weight applied to `copies`.
    pub copies_factor: f64,
    /// Weight applied to `copies` in the final tie-break.
    pub tiebreaker_factor: f64,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        ScorerWeights {
            gain_factor: 1.0,
            length_factor: 0.0,
            copies_factor: 0.0,
            tiebreaker_factor: 1.0,
        }
    }
}

/// The plain (one-byte token) gain formula: `copies·len − copies − len − 2`.
///
/// ## Arguments
/// * `copies` - live occurrence count.
/// * `len` - escaped byte length of the pattern string.
///
/// ## Returns
/// The net byte gain of binding this pattern to a one-byte token.
pub fn gain(
    copies: usize,
    len: usize,
) -> i64 {
    let copies = copies as i64;
    let len = len as i64;
    copies * len - copies - len - 2
}

/// The token-cost-aware gain formula used by the allocator, where
/// `token_cost` is the output byte cost of the token itself (1 for an
/// ordinary byte, 2 for the escaped backslash token).
///
/// ## Arguments
/// * `copies` - live occurrence count.
/// * `len` - escaped byte length of the pattern string.
/// * `token_cost` - byte cost of the bound token.
///
/// ## Returns
/// The net byte gain of binding this pattern to a token costing
/// `token_cost` bytes.
pub fn gain_with_token_cost(
    copies: usize,
    len: usize,
    token_cost: usize,
) -> i64 {
    let copies = copies as i64;
    let len = len as i64;
    let token_cost = token_cost as i64;
    copies * (len - token_cost) - len - 2 * token_cost
}

/// Compute the weighted `score` for a pattern given `copies`, `len`, and
/// `gain`.
///
/// ## Arguments
/// * `gain` - the pattern's net gain.
/// * `len` - the pattern's escaped byte length.
/// * `copies` - the pattern's occurrence count.
/// * `weights` - the weights to combine them with.
///
/// ## Returns
/// The weighted score.
pub fn score(
    gain: i64,
    len: usize,
    copies: usize,
    weights: &ScorerWeights,
) -> f64 {
    weights.gain_factor * gain as f64
        + weights.length_factor * len as f64
        + weights.copies_factor * copies as f64
}

/// Order two patterns by the scorer's tie-break contract: higher `score`
/// wins, then higher `gain`, then higher `tiebreaker_factor · copies`.
///
/// ## Arguments
/// * `a` - the left-hand pattern.
/// * `b` - the right-hand pattern.
/// * `weights` - the weights supplying the tiebreaker factor.
///
/// ## Returns
/// An `Ordering` such that `Greater` means `a` should be preferred over
/// `b`.
pub fn compare(
    a: &Pattern,
    b: &Pattern,
    weights: &ScorerWeights,
) -> Ordering {
    a.score
        .partial_cmp(&b.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.gain.cmp(&b.gain))
        .then_with(|| {
            let ta = weights.tiebreaker_factor * a.copies as f64;
            let tb = weights.tiebreaker_factor * b.copies as f64;
            ta.partial_cmp(&tb).unwrap_or(Ordering::Equal)
        })
}

/// Score every pattern in `patterns` in place using `weights`.
///
/// ## Arguments
/// * `patterns` - the patterns to score, mutated in place.
/// * `weights` - the scorer weights to apply.
pub fn score_all(
    patterns: &mut [Pattern],
    weights: &ScorerWeights,
) {
    for p in patterns.iter_mut() {
        p.score = score(p.gain, p.len, p.copies, weights);
    }
}

/// Pick the best-scoring pattern with positive gain from `patterns`.
///
/// ## Arguments
/// * `patterns` - the candidate patterns.
/// * `weights` - the scorer weights to break ties with.
///
/// ## Returns
/// The index of the best candidate, or `None` if no candidate has
/// `gain > 0`.
pub fn best_candidate(
    patterns: &[Pattern],
    weights: &ScorerWeights,
) -> Option<usize> {
    patterns
        .iter()
        .enumerate()
        .filter(|(_, p)| p.gain > 0)
        .max_by(|(_, a), (_, b)| compare(a, b, weights))
        .map(|(i, _)| i)
}
