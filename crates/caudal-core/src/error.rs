//! Error types for chain building and scheduling.

use thiserror::Error;

/// Errors raised while configuring, building, or running an effect chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Effect constructor rejected its arguments.
    #[error("bad arguments for effect '{effect}': {reason}")]
    BadArguments {
        /// Name of the effect that rejected its arguments.
        effect: &'static str,
        /// Description of what was wrong.
        reason: String,
    },

    /// An effect cannot operate on the resolved signal format.
    #[error("effect '{effect}' does not support this format: {reason}")]
    UnsupportedFormat {
        /// Name of the effect that rejected the format.
        effect: &'static str,
        /// Description of the unsupported aspect.
        reason: String,
    },

    /// More than one user effect declares the same format-changing capability.
    #[error("only one effect may change the {0} in a chain")]
    ConflictingEffects(&'static str),

    /// A format-changing effect was requested but the formats already match.
    #[error("redundant effect: {0}")]
    RedundantEffect(String),

    /// Registry lookup miss.
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    /// Source read or destination write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Codec-level failure in a source or sink implementation.
    #[error("format error: {0}")]
    Format(String),

    /// An effect implementation broke a scheduler invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl ChainError {
    /// Create a [`ChainError::BadArguments`].
    pub fn bad_arguments(effect: &'static str, reason: impl Into<String>) -> Self {
        ChainError::BadArguments {
            effect,
            reason: reason.into(),
        }
    }

    /// Create a [`ChainError::UnsupportedFormat`].
    pub fn unsupported_format(effect: &'static str, reason: impl Into<String>) -> Self {
        ChainError::UnsupportedFormat {
            effect,
            reason: reason.into(),
        }
    }
}

/// Convenience result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
