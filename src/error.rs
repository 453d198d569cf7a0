//! Error types for movement scoring operations.
//!
//! Structural problems (mismatched shapes, a session without a reference,
//! unreadable collaborator data) are errors. Numeric degeneracies such as a
//! zero-norm sensor reading are not: they surface as
//! [`Similarity::Undefined`](crate::math::Similarity) and NaN scores instead.

use thiserror::Error;

/// Main error type for movement scoring operations.
#[derive(Error, Debug)]
pub enum ScoringError {
    /// Two sequences compared element-wise have different dimensions.
    #[error("Shape mismatch: {left:?} vs {right:?} (rows, channels)")]
    ShapeMismatch {
        /// Shape of the first operand.
        left: (usize, usize),
        /// Shape of the second operand.
        right: (usize, usize),
    },

    /// No reference trajectory is available for the session.
    #[error("No reference trajectory loaded")]
    MissingReference,

    /// Not enough samples to compute the requested quantity.
    #[error("Insufficient data: need at least {min} frames, got {actual}")]
    InsufficientData {
        /// Minimum number of frames required.
        min: usize,
        /// Number of frames available.
        actual: usize,
    },

    /// Input validation errors.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A collaborator record could not be parsed into four real channels.
    #[error("Malformed input at line {line}: {reason}")]
    MalformedInput {
        /// 1-based line of the offending record.
        line: u64,
        /// What could not be parsed.
        reason: String,
    },

    /// The session registry has no session under this id.
    #[error("Unknown session: {0}")]
    SessionNotFound(String),

    /// Filesystem error from a collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error.
    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for movement scoring operations.
pub type Result<T> = std::result::Result<T, ScoringError>;

impl ScoringError {
    /// Create a shape mismatch error from two `(rows, channels)` shapes.
    #[must_use]
    pub const fn shape_mismatch(left: (usize, usize), right: (usize, usize)) -> Self {
        Self::ShapeMismatch { left, right }
    }

    /// Create an insufficient data error.
    #[must_use]
    pub const fn insufficient_data(min: usize, actual: usize) -> Self {
        Self::InsufficientData { min, actual }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a malformed input error.
    #[must_use]
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            line,
            reason: reason.into(),
        }
    }

    /// Whether the error comes from comparing incompatible sequences.
    #[must_use]
    pub const fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScoringError::insufficient_data(2, 1);
        assert!(err.to_string().contains('2'));
        assert!(err.to_string().contains('1'));

        let err = ScoringError::shape_mismatch((10, 3), (9, 3));
        assert!(err.to_string().contains("(10, 3)"));
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_error_constructors() {
        let _ = ScoringError::invalid_input("test");
        let _ = ScoringError::invalid_config("sample_rate_hz must be positive");
        let err = ScoringError::malformed(7, "not a number");
        assert!(err.to_string().contains("line 7"));
        assert!(!err.is_shape_mismatch());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ScoringError = io.into();
        assert!(matches!(err, ScoringError::Io(_)));
    }
}
