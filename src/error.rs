//! Error type shared by every routine in the crate.

use thiserror::Error;

/// Errors reported while building or analyzing a state-space model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SystemError {
    /// Two matrices have incompatible shapes.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A matrix required by the model kind was not supplied.
    #[error("missing matrix: {0}")]
    MissingMatrix(String),

    /// The query is not defined for this kind of model.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A numerical decomposition did not converge.
    #[error("analysis failure: {0}")]
    AnalysisFailure(String),

    /// The sampling period is negative or not finite.
    #[error("invalid sampling period {0}: must be finite and >= 0")]
    InvalidSamplingPeriod(f64),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SystemError>;
