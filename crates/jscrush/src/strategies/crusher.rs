//! # Crusher (single-pass greedy)
//!
//! The simplest search strategy: repeatedly pick the best-scoring
//! pattern, bind it to a fresh token, rewrite the text, and recurse until
//! no positive-gain pattern or free token remains.

use crate::analyser;
use crate::options::{CrushHeuristic, PackerOptions};
use crate::pattern::Pattern;
use crate::scorer::{self, ScorerWeights};

use ahash::AHashSet;

use super::{apply_binding, next_free_token, Binding, SearchResult};

/// A global iteration budget guarding against runaway loops on
/// pathological inputs.
const SAFETY_ITERATION_BUDGET: usize = 10_000;

/// Pick the index of the best candidate under a given heuristic.
fn pick_by_heuristic(
    patterns: &[Pattern],
    heuristic: CrushHeuristic,
    weights: &ScorerWeights,
) -> Option<usize> {
    match heuristic {
        CrushHeuristic::Balanced => scorer::best_candidate(patterns, weights),
        CrushHeuristic::MostCopies => patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| p.gain > 0)
            .max_by_key(|(_, p)| p.copies)
            .map(|(i, _)| i),
        CrushHeuristic::Longest => patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| p.gain > 0)
            .max_by_key(|(_, p)| p.len)
            .map(|(i, _)| i),
        CrushHeuristic::Density => patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| p.gain > 0)
            .max_by(|(_, a), (_, b)| {
                let da = a.gain as f64 / a.len.max(1) as f64;
                let db = b.gain as f64 / b.len.max(1) as f64;
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i),
        CrushHeuristic::Adaptive | CrushHeuristic::AdaptiveGain => {
            let variants = [
                CrushHeuristic::Balanced,
                CrushHeuristic::MostCopies,
                CrushHeuristic::Longest,
                CrushHeuristic::Density,
            ];
            let mut best: Option<usize> = None;
            for v in variants {
                if let Some(idx) = pick_by_heuristic(patterns, v, weights) {
                    best = match best {
                        None => Some(idx),
                        Some(cur) => {
                            let tiebreak_by_gain = matches!(heuristic, CrushHeuristic::AdaptiveGain);
                            let better = if tiebreak_by_gain {
                                patterns[idx].gain > patterns[cur].gain
                            } else {
                                scorer::compare(&patterns[idx], &patterns[cur], weights)
                                    == std::cmp::Ordering::Greater
                            };
                            if better {
                                Some(idx)
                            } else {
                                Some(cur)
                            }
                        }
                    };
                }
            }
            best
        }
    }
}

/// Run the greedy crusher to completion on `text`.
///
/// ## Arguments
/// * `text` - the input text to compress.
/// * `options` - the packer options (heuristic, weights, delimiter).
///
/// ## Returns
/// A [`SearchResult`] with the final text and the ordered replacement
/// list.
pub fn run(
    text: &str,
    options: &PackerOptions,
) -> SearchResult {
    let mut current = text.to_string();
    let mut replacements: Vec<Binding> = Vec::new();
    let mut cumulative_gain: i64 = 0;
    let mut used_tokens: AHashSet<u8> = AHashSet::new();

    let mut patterns = analyser::enumerate(&current, options.delimiter);
    scorer::score_all(&mut patterns, &options.weights);

    let mut iterations = 0;
    loop {
        iterations += 1;
        if iterations > SAFETY_ITERATION_BUDGET {
            log::warn!("crusher: safety iteration budget exhausted, stopping early");
            break;
        }
        if replacements.len() >= options.max_replacements {
            break;
        }

        let idx = match pick_by_heuristic(&patterns, options.heuristic, &options.weights) {
            Some(idx) => idx,
            None => break,
        };

        let token = match next_free_token(text, &used_tokens, options.delimiter) {
            Some(t) => t,
            None => break,
        };
        used_tokens.insert(token);

        let chosen = patterns.remove(idx);
        let (new_text, copies) = apply_binding(&current, &chosen.string, token);
        current = new_text;
        cumulative_gain += chosen.gain;

        replacements.push(Binding {
            token,
            pattern: chosen.string.clone(),
            copies,
            gain: chosen.gain,
            score: chosen.score,
        });

        patterns = analyser::recount(patterns, &current, options.delimiter);
        scorer::score_all(&mut patterns, &options.weights);
    }

    SearchResult {
        text: current,
        replacements,
        cumulative_gain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crusher_abcabcabc() {
        let options = PackerOptions::default();
        let result = run("abcabcabc", &options);
        assert_eq!(result.replacements.len(), 1);
        assert_eq!(result.replacements[0].pattern, "abc");
        assert_eq!(result.replacements[0].copies, 3);
        assert_eq!(result.replacements[0].gain, 1);
    }

    #[test]
    fn test_crusher_no_repeats_makes_no_replacement() {
        let options = PackerOptions::default();
        let result = run("abcdefgh", &options);
        assert!(result.replacements.is_empty());
        assert_eq!(result.text, "abcdefgh");
    }

    #[test]
    fn test_crusher_tongue_twister_round_trips_shorter() {
        let input = "She sells seashells by the seashore, The shells she sells are seashells, \
I'm sure. So if she sells seashells on the seashore, Then I'm sure she sells seashore shells.";
        let options = PackerOptions::default();
        let result = run(input, &options);
        assert!(!result.replacements.is_empty());
        let first = &result.replacements[0];
        assert!(first.pattern.contains("seashells") || first.pattern.contains(" seashells"));
    }

    #[test]
    fn test_crusher_respects_max_replacements() {
        let mut options = PackerOptions::default();
        options.max_replacements = 0;
        let result = run("abcabcabc", &options);
        assert!(result.replacements.is_empty());
    }
}
