//! # Packer Core API
//!
//! The external entry point: `pack(input, options) -> Vec<PackerData>`,
//! one `PackerData` per requested search strategy.

use ahash::AHashMap;

use crate::artefact::{self, ArtefactResult};
use crate::errors::PackResult;
use crate::graph::SearchGraph;
use crate::options::PackerOptions;
use crate::strategies::{beam, crusher, digit, Binding, SearchResult};
use crate::{analyser, text};

/// Which search strategy produced a [`PackerData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The single-pass greedy crusher.
    Crusher,
    /// The look-ahead beam search.
    Beam,
    /// The digit-token variant.
    Digit,
}

impl Strategy {
    /// The strategy's display name, as recorded on its `PackerData`.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Crusher => "crusher",
            Strategy::Beam => "beam",
            Strategy::Digit => "digit",
        }
    }
}

/// One stage of artefact construction: its byte length, text, and a
/// free-form report.
#[derive(Debug, Clone)]
pub struct ResultStage {
    /// Byte length of `output`, or `-1` on failure.
    pub length: i64,
    /// The stage's artefact text.
    pub output: String,
    /// Free-form textual report.
    pub details: String,
    /// Set for async variants; always `false` for synchronous runs.
    pub is_running: bool,
}

impl ResultStage {
    fn from_artefact(artefact: &ArtefactResult) -> Self {
        ResultStage {
            length: artefact.length,
            output: artefact.output.clone(),
            details: artefact.details.clone(),
            is_running: false,
        }
    }
}

/// The full output of running one strategy over one input.
#[derive(Debug, Clone)]
pub struct PackerData {
    /// Which strategy produced this result.
    pub strategy: Strategy,
    /// The untouched input text.
    pub original_text: String,
    /// The ordered replacement list the strategy produced.
    pub replacements: Vec<Binding>,
    /// Every substring the analyser considered, with its occurrence
    /// count, for diagnostic display.
    pub matches_lookup: AHashMap<String, usize>,
    /// `[construction, verified]` stages.
    pub result: [ResultStage; 2],
    /// The recorded search graph, for strategies that build one.
    pub search_graph: Option<SearchGraph>,
}

fn matches_lookup(
    text: &str,
    delimiter: u8,
) -> AHashMap<String, usize> {
    analyser::enumerate(text, delimiter)
        .into_iter()
        .map(|p| (p.string, p.copies))
        .collect()
}

fn build_packer_data(
    strategy: Strategy,
    original_text: &str,
    search_result: SearchResult,
    search_graph: Option<SearchGraph>,
    options: &PackerOptions,
) -> PackerData {
    // The digit variant has no allocator pass and a different decoder
    // shape, so it gets its own artefact builder rather than the
    // shared regex-character-class one.
    let artefact = match strategy {
        Strategy::Digit => artefact::build_digit(original_text, &search_result, options),
        Strategy::Crusher | Strategy::Beam => artefact::build(original_text, &search_result, options),
    };
    let construction = ResultStage::from_artefact(&artefact);
    let verified = ResultStage::from_artefact(&artefact);

    PackerData {
        strategy,
        original_text: original_text.to_string(),
        matches_lookup: matches_lookup(original_text, options.delimiter),
        replacements: search_result.replacements,
        result: [construction, verified],
        search_graph,
    }
}

fn error_packer_data(
    strategy: Strategy,
    original_text: &str,
    message: &str,
) -> PackerData {
    let stage = ResultStage {
        length: -1,
        output: String::new(),
        details: format!("Error: {message}"),
        is_running: false,
    };
    PackerData {
        strategy,
        original_text: original_text.to_string(),
        matches_lookup: AHashMap::new(),
        replacements: Vec::new(),
        result: [stage.clone(), stage],
        search_graph: None,
    }
}

/// Run every strategy in `strategies` over `input` and return one
/// `PackerData` per strategy.
///
/// ## Arguments
/// * `input` - the source text to compress.
/// * `options` - the packer options shared by every strategy run.
/// * `strategies` - which strategies to run, in the order requested.
///
/// ## Returns
/// One `PackerData` per requested strategy, in the same order.
pub fn pack(
    input: &str,
    options: &PackerOptions,
    strategies: &[Strategy],
) -> Vec<PackerData> {
    strategies
        .iter()
        .map(|&strategy| run_one(strategy, input, options))
        .collect()
}

fn run_one(
    strategy: Strategy,
    input: &str,
    options: &PackerOptions,
) -> PackerData {
    match strategy {
        Strategy::Crusher => {
            let result = crusher::run(input, options);
            build_packer_data(strategy, input, result, None, options)
        }
        Strategy::Beam => {
            let (result, graph) = beam::run(input, options);
            build_packer_data(strategy, input, result, Some(graph), options)
        }
        Strategy::Digit => match digit::run(input, options) {
            Ok(result) => build_packer_data(strategy, input, result, None, options),
            Err(err) => error_packer_data(strategy, input, &err.to_string()),
        },
    }
}

/// Run a single strategy and propagate its error instead of folding it
/// into a `PackerData` error report. Useful for callers (e.g. the CLI)
/// that want to surface a precondition failure as a hard error.
///
/// ## Arguments
/// * `input` - the source text to compress.
/// * `options` - the packer options.
/// * `strategy` - which strategy to run.
///
/// ## Returns
/// The strategy's `PackerData`, or a `PackError` if it failed outright.
pub fn pack_one(
    input: &str,
    options: &PackerOptions,
    strategy: Strategy,
) -> PackResult<PackerData> {
    match strategy {
        Strategy::Digit => {
            let result = digit::run(input, options)?;
            Ok(build_packer_data(strategy, input, result, None, options))
        }
        other => Ok(run_one(other, input, options)),
    }
}

/// Byte length of an already-built artefact's output, for CLI reporting.
pub fn output_len(data: &PackerData) -> usize {
    text::byte_len(&data.result[1].output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_crusher_round_trips() {
        let options = PackerOptions::default();
        let results = pack("abcabcabc", &options, &[Strategy::Crusher]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].strategy, Strategy::Crusher);
        assert!(results[0].result[1].length > 0);
    }

    #[test]
    fn test_pack_all_three_strategies() {
        let options = PackerOptions::default();
        let results = pack(
            "abcabcabc",
            &options,
            &[Strategy::Crusher, Strategy::Beam, Strategy::Digit],
        );
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].strategy, Strategy::Digit);
    }

    #[test]
    fn test_pack_digit_reports_error_for_digit_input() {
        let options = PackerOptions::default();
        let results = pack("0 1 2 3 4", &options, &[Strategy::Digit]);
        assert_eq!(results[0].result[0].length, -1);
        assert!(results[0].result[0].details.starts_with("Error:"));
    }

    #[test]
    fn test_pack_one_propagates_digit_error() {
        let options = PackerOptions::default();
        let err = pack_one("0 1 2 3 4", &options, Strategy::Digit).unwrap_err();
        assert!(matches!(err, crate::errors::PackError::DigitPrecondition { .. }));
    }
}
