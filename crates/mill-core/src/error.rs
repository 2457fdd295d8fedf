//! Unified error types for the mill workspace
//!
//! [`MillError`] represents failures from any part of the pricing engine.
//! Expected search outcomes (an infeasible branch, a search that never closed
//! its gap) are *not* errors; they are reported through tagged result types
//! by the algorithms that produce them.
//!
//! # Example
//!
//! ```ignore
//! use mill_core::{Instance, MillResult};
//!
//! fn build() -> MillResult<Instance> {
//!     let instance = Instance::new(vec![vec![0, 0]], vec![vec![0, 0]], vec![10, 10])?;
//!     Ok(instance)
//! }
//! ```

use thiserror::Error;

/// Unified error type for all mill operations.
#[derive(Error, Debug)]
pub enum MillError {
    /// Data validation errors (malformed instances, mismatched vectors)
    #[error("Validation error: {0}")]
    Validation(String),

    /// External LP/MIP solver failures other than infeasibility
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using MillError.
pub type MillResult<T> = Result<T, MillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MillError::Solver("relaxation unbounded".into());
        assert!(err.to_string().contains("Solver error"));
        assert!(err.to_string().contains("relaxation unbounded"));
    }

    #[test]
    fn test_config_error_display() {
        let err = MillError::Config("branch and bound budget too small".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: branch and bound budget too small"
        );
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> MillResult<()> {
            Err(MillError::Validation("negative budget".into()))
        }

        fn outer() -> MillResult<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(MillError::Validation(_))));
    }
}
