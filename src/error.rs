//! Error types for the sound-reinforcements crate.
//!
//! All errors are raised synchronously at the point of the invalid
//! operation; pure math has no transient failure mode, so nothing is
//! retried. The engine never clamps or substitutes defaults for invalid
//! physical inputs — it fails loudly so acoustic results are never
//! silently wrong.

use thiserror::Error;

/// Error type for propagation and level-computation operations.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// A constructor parameter lies outside its physical range.
    #[error("{field} must be between {min} and {max}, found {value}")]
    Validation {
        /// Name of the offending parameter (e.g. "temperature").
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Lower bound of the valid range.
        min: f64,
        /// Upper bound of the valid range.
        max: f64,
    },

    /// A non-positive input reached a logarithmic or inverse-square formula.
    #[error("{quantity} must be > 0 for {operation}, found {value}")]
    Domain {
        /// Physical quantity that was non-positive (e.g. "pressure").
        quantity: &'static str,
        /// Operation that rejected it (e.g. "spl_from_pressure").
        operation: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Per-band array lengths disagree with the frequency band set.
    #[error("band array length mismatch in {operation}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Operation that detected the mismatch.
        operation: &'static str,
        /// Number of frequency bands expected.
        expected: usize,
        /// Length of the array actually supplied.
        found: usize,
    },

    /// A zero-length vector cannot define a direction.
    #[error("orientation vector ({x}, {y}, {z}) has zero norm")]
    DegenerateOrientation {
        /// Raw x component.
        x: f64,
        /// Raw y component.
        y: f64,
        /// Raw z component.
        z: f64,
    },

    /// A source chain was asked for an audio buffer it does not hold.
    #[error("no audio buffer named '{name}' in source chain")]
    UnknownAudio {
        /// The requested buffer name.
        name: String,
    },
}

/// Result type alias for propagation operations.
pub type Result<T> = std::result::Result<T, PropagationError>;

impl PropagationError {
    /// Returns true if this error came from constructor-range validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, PropagationError::Validation { .. })
    }

    /// Returns true if this error came from a math-domain violation.
    pub fn is_domain(&self) -> bool {
        matches!(self, PropagationError::Domain { .. })
    }
}
