//! Error types for lorenz-engine.
//!
//! Every fallible operation returns `Result<T, LorenzError>` instead of
//! panicking. Malformed calls are rejected before any integration work is
//! done; non-finite values produced by the dynamics are never reported here.

use thiserror::Error;

/// Result type alias for lorenz-engine operations.
pub type LorenzResult<T> = Result<T, LorenzError>;

/// Unified error type for all lorenz-engine operations.
#[derive(Debug, Error)]
pub enum LorenzError {
    // ===== Invalid Calls =====
    /// Timestep is zero, negative, or not finite.
    #[error("Invalid timestep: dt must be finite and positive, got {dt}")]
    InvalidTimestep {
        /// The rejected timestep.
        dt: f64,
    },

    /// Step count is not positive.
    #[error("Invalid step count: expected at least 1 step, got {steps}")]
    InvalidStepCount {
        /// The rejected step count.
        steps: usize,
    },

    /// Perturbation magnitude is zero, negative, or not finite.
    #[error("Invalid perturbation: epsilon must be finite and positive, got {epsilon}")]
    InvalidPerturbation {
        /// The rejected epsilon.
        epsilon: f64,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ===== Export Errors =====
    /// Export was cancelled before all points were written.
    #[error("Export cancelled after {written} of {total} points")]
    ExportCancelled {
        /// Points written before cancellation.
        written: usize,
        /// Points in the snapshot.
        total: usize,
    },

    /// Export worker failed.
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

impl LorenzError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an export failure.
    #[must_use]
    pub fn export(message: impl Into<String>) -> Self {
        Self::ExportFailed(message.into())
    }

    /// Check if this error rejects a malformed call (as opposed to an
    /// environmental failure such as I/O).
    #[must_use]
    pub const fn is_invalid_call(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimestep { .. }
                | Self::InvalidStepCount { .. }
                | Self::InvalidPerturbation { .. }
        )
    }
}

impl From<serde_json::Error> for LorenzError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Reject a timestep that is not finite and strictly positive.
///
/// # Errors
///
/// Returns [`LorenzError::InvalidTimestep`] for `dt <= 0`, NaN, or infinity.
pub fn check_timestep(dt: f64) -> LorenzResult<()> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(LorenzError::InvalidTimestep { dt })
    }
}
