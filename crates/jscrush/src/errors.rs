//! # Error Types

/// Errors from `jscrush` packing operations.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// The digit-replacer strategy requires an input free of ASCII digits.
    #[error("digit-replacer precondition violated: input contains digit '{offending}'")]
    DigitPrecondition {
        /// The digit character found in the input.
        offending: char,
    },

    /// No printable byte is absent from the input, so no token alphabet exists.
    #[error("no tokens available: every printable byte is already present in the input")]
    NoFreeTokens,

    /// The decode simulation did not reproduce the original input.
    #[error("verification failed: decoded output does not match the original input")]
    VerificationFailed {
        /// The original input.
        expected: String,
        /// What the decode simulation produced instead.
        actual: String,
    },

    /// An allocator invariant was violated (e.g. the token cursor walked past every range).
    #[error("internal allocator error: {0}")]
    Internal(String),

    /// A worker's state-count or wall-clock budget ran out before the
    /// search converged. This is informational rather than fatal: a
    /// worker carries it as a detail string on its final `Result`
    /// message instead of returning it as an `Err` —
    /// the best solution found so far is still usable.
    #[error("search budget exhausted before convergence: {reason}")]
    BudgetExhausted {
        /// Which budget ran out (e.g. `"max_states"`, `"time_limit_ms"`).
        reason: String,
    },
}

/// Result type for `jscrush` operations.
pub type PackResult<T> = Result<T, PackError>;
