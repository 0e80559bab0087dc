use crate::lambda::SolverConfigBuilderError;
use thiserror::Error;

/// Error types for fuzzy measure, integral and index computations
#[derive(Debug, Error)]
pub enum FuzzyMeasureError {
    /// Element or subset outside the declared universe
    #[error("Element {element} is not part of a universe of {size} elements.")]
    InvalidElement { element: usize, size: usize },

    /// Densities or tables violating a measure-theoretic requirement
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Lambda family evaluated before its parameter was solved
    #[error("The lambda parameter has not been solved for this measure.")]
    NotInitialized,

    /// Root finder exceeded its iteration or tolerance budget
    #[error("Root finder did not converge after {iterations} iterations (residual {residual:e}).")]
    NoConvergence { iterations: usize, residual: f64 },

    /// Contribution vector length differs from the universe size
    #[error("Expected {expected} contributions, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Too many elements
    #[error(
        "There are too many elements ({count}); we limit to {limit} to keep subset enumeration tractable."
    )]
    TooManyElements { count: usize, limit: usize },

    #[error("Solver configuration build error: {0}")]
    SolverConfigBuild(#[from] SolverConfigBuilderError),
}

/// Result type alias for fuzzy measure operations
pub type Result<T> = std::result::Result<T, FuzzyMeasureError>;
