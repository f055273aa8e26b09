//! # Packer Options
//!
//! The complete, documented option surface, plus the `CrushHeuristic` enum
//! selecting among the crusher's six interchangeable scoring variants.

use crate::scorer::ScorerWeights;

/// Which of the crusher's interchangeable heuristics picks the next
/// replacement at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrushHeuristic {
    /// The default weighted combination of gain, length, and copies.
    #[default]
    Balanced,
    /// Always prefer the pattern with the most occurrences.
    MostCopies,
    /// Always prefer the longest pattern string.
    Longest,
    /// Prefer patterns with the best gain-per-byte density.
    Density,
    /// Re-evaluate every other heuristic at each step and keep whichever
    /// would pick the highest-gain candidate.
    Adaptive,
    /// Like `Adaptive`, but breaks ties by raw gain rather than by the
    /// weighted score.
    AdaptiveGain,
}

/// The full, documented `PackerOptions` surface.
#[derive(Debug, Clone)]
pub struct PackerOptions {
    /// Selects the decoder form the artefact builder emits: the shorter
    /// `with(...)`-based form when `true` (default), or a longer,
    /// `with`-free form built from explicit `split`/`shift`/`join` calls
    /// when `false`. Both decode identically; see `artefact::build`.
    pub use_es6: bool,

    /// Beam width *W*. Default 5.
    pub beam_width: usize,
    /// Branch factor *B*: top-*B* children per expansion. Default 20.
    pub branch_factor: usize,
    /// Cap on total replacements. Default 100.
    pub max_replacements: usize,
    /// Gain-predictor look-ahead depth. Default 150.
    pub look_ahead_depth: u32,
    /// Per-step discount applied by the gain predictor. Default 0.9.
    pub look_ahead_discount: f64,
    /// `true` sorts the beam by cumulative gain; `false` by predicted
    /// score.
    pub prioritize_highest_gain: bool,

    /// Which crusher heuristic to run.
    pub heuristic: CrushHeuristic,
    /// Scorer weights feeding `score()`.
    pub weights: ScorerWeights,

    /// Digit-variant token count. Accepted range is `1..=100` but the
    /// effective alphabet is `max_int.clamp(1, 10)`: the digit decoder's
    /// `/\d/g` match only ever consumes one character, so at most the
    /// ten single digits are distinguishable (see `strategies::digit`).
    pub max_int: u32,
    /// Worker state-count budget: the beam search stops once this many
    /// search-graph nodes have been recorded (`strategies::beam::run_with_budget`).
    pub max_states: u64,
    /// Worker wall-clock budget in milliseconds, checked at the same
    /// iteration boundary as `max_states`.
    pub time_limit_ms: u64,
    /// Digit worker returns immediately without running until the caller
    /// calls `WorkerHandle::trigger()`.
    pub waiting_for_trigger: bool,

    /// String delimiter byte used for the packed literal. Default `` ` ``.
    pub delimiter: u8,
    /// Packed-text accumulator variable name emitted by the decoder.
    /// Default `_`.
    pub var_name: String,
    /// Glue wrapped around the decoder's init expression. Default empty.
    pub wrapped_init: String,
    /// Environment glue appended after the decoder. Default empty.
    pub env: String,
    /// Interpreter glue appended last. Default `eval(_)`.
    pub interp: String,
}

impl Default for PackerOptions {
    fn default() -> Self {
        PackerOptions {
            use_es6: true,
            beam_width: 5,
            branch_factor: 20,
            max_replacements: 100,
            look_ahead_depth: 150,
            look_ahead_discount: 0.9,
            prioritize_highest_gain: false,
            heuristic: CrushHeuristic::default(),
            weights: ScorerWeights::default(),
            max_int: 10,
            max_states: 500_000,
            time_limit_ms: 10 * 60 * 1000,
            waiting_for_trigger: false,
            delimiter: b'`',
            var_name: "_".to_string(),
            wrapped_init: String::new(),
            env: String::new(),
            interp: "eval(_)".to_string(),
        }
    }
}

impl PackerOptions {
    /// Select the decoder form the artefact builder emits.
    ///
    /// ## Arguments
    /// * `use_es6` - `true` for the shorter `with(...)`-based form.
    pub fn with_es6(
        self,
        use_es6: bool,
    ) -> Self {
        PackerOptions { use_es6, ..self }
    }

    /// Set the beam width *W*.
    ///
    /// ## Arguments
    /// * `beam_width` - number of partial solutions the beam retains.
    pub fn with_beam_width(
        self,
        beam_width: usize,
    ) -> Self {
        PackerOptions { beam_width, ..self }
    }

    /// Set the branch factor *B*.
    ///
    /// ## Arguments
    /// * `branch_factor` - number of top children expanded per state.
    pub fn with_branch_factor(
        self,
        branch_factor: usize,
    ) -> Self {
        PackerOptions { branch_factor, ..self }
    }

    /// Cap the total number of replacements a search may bind.
    ///
    /// ## Arguments
    /// * `max_replacements` - the cap.
    pub fn with_max_replacements(
        self,
        max_replacements: usize,
    ) -> Self {
        PackerOptions { max_replacements, ..self }
    }

    /// Set the gain-predictor look-ahead depth.
    ///
    /// ## Arguments
    /// * `look_ahead_depth` - remaining look-ahead budget per projection.
    pub fn with_look_ahead_depth(
        self,
        look_ahead_depth: u32,
    ) -> Self {
        PackerOptions { look_ahead_depth, ..self }
    }

    /// Set the gain predictor's per-step discount factor.
    ///
    /// ## Arguments
    /// * `look_ahead_discount` - typically in `[0.8, 1.0]`.
    pub fn with_look_ahead_discount(
        self,
        look_ahead_discount: f64,
    ) -> Self {
        PackerOptions { look_ahead_discount, ..self }
    }

    /// Choose the beam's sort key.
    ///
    /// ## Arguments
    /// * `prioritize_highest_gain` - `true` sorts by cumulative gain
    ///   instead of predicted score.
    pub fn with_prioritize_highest_gain(
        self,
        prioritize_highest_gain: bool,
    ) -> Self {
        PackerOptions { prioritize_highest_gain, ..self }
    }

    /// Select which crusher heuristic picks the next replacement.
    ///
    /// ## Arguments
    /// * `heuristic` - the heuristic to run.
    pub fn with_heuristic(
        self,
        heuristic: CrushHeuristic,
    ) -> Self {
        PackerOptions { heuristic, ..self }
    }

    /// Replace the scorer weights.
    ///
    /// ## Arguments
    /// * `weights` - the new `gain`/`length`/`copies`/tiebreaker weights.
    pub fn with_weights(
        self,
        weights: ScorerWeights,
    ) -> Self {
        PackerOptions { weights, ..self }
    }

    /// Set the digit-variant token count (effective alphabet clamped to
    /// `1..=10`; see `strategies::digit`).
    ///
    /// ## Arguments
    /// * `max_int` - the requested token count, in `1..=100`.
    pub fn with_max_int(
        self,
        max_int: u32,
    ) -> Self {
        PackerOptions { max_int, ..self }
    }

    /// Set the worker's state-count budget.
    ///
    /// ## Arguments
    /// * `max_states` - stop once this many search-graph nodes exist.
    pub fn with_max_states(
        self,
        max_states: u64,
    ) -> Self {
        PackerOptions { max_states, ..self }
    }

    /// Set the worker's wall-clock budget.
    ///
    /// ## Arguments
    /// * `time_limit_ms` - the budget, in milliseconds.
    pub fn with_time_limit_ms(
        self,
        time_limit_ms: u64,
    ) -> Self {
        PackerOptions { time_limit_ms, ..self }
    }

    /// Make a spawned digit worker wait for an explicit trigger before
    /// it starts searching.
    ///
    /// ## Arguments
    /// * `waiting_for_trigger` - `true` to wait for
    ///   `WorkerHandle::trigger()`.
    pub fn with_waiting_for_trigger(
        self,
        waiting_for_trigger: bool,
    ) -> Self {
        PackerOptions { waiting_for_trigger, ..self }
    }

    /// Set the string delimiter byte used for the packed literal.
    ///
    /// ## Arguments
    /// * `delimiter` - the delimiter byte.
    pub fn with_delimiter(
        self,
        delimiter: u8,
    ) -> Self {
        PackerOptions { delimiter, ..self }
    }

    /// Set the packed-text accumulator variable name the decoder emits.
    ///
    /// ## Arguments
    /// * `var_name` - the variable name.
    pub fn with_var_name<S: Into<String>>(
        self,
        var_name: S,
    ) -> Self {
        PackerOptions { var_name: var_name.into(), ..self }
    }

    /// Set the glue wrapped around the decoder's init expression.
    ///
    /// ## Arguments
    /// * `wrapped_init` - the glue text.
    pub fn with_wrapped_init<S: Into<String>>(
        self,
        wrapped_init: S,
    ) -> Self {
        PackerOptions { wrapped_init: wrapped_init.into(), ..self }
    }

    /// Set the environment glue appended after the decoder.
    ///
    /// ## Arguments
    /// * `env` - the glue text.
    pub fn with_env<S: Into<String>>(
        self,
        env: S,
    ) -> Self {
        PackerOptions { env: env.into(), ..self }
    }

    /// Set the interpreter glue appended last.
    ///
    /// ## Arguments
    /// * `interp` - the glue text.
    pub fn with_interp<S: Into<String>>(
        self,
        interp: S,
    ) -> Self {
        PackerOptions { interp: interp.into(), ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_beam_width_overrides_default() {
        let opts = PackerOptions::default().with_beam_width(9).with_max_int(7);
        assert_eq!(opts.beam_width, 9);
        assert_eq!(opts.max_int, 7);
    }

    #[test]
    fn test_default_options_match_spec() {
        let opts = PackerOptions::default();
        assert!(opts.use_es6);
        assert_eq!(opts.beam_width, 5);
        assert_eq!(opts.branch_factor, 20);
        assert_eq!(opts.max_replacements, 100);
        assert_eq!(opts.look_ahead_depth, 150);
        assert_eq!(opts.look_ahead_discount, 0.9);
        assert_eq!(opts.max_int, 10);
        assert_eq!(opts.interp, "eval(_)");
    }
}
