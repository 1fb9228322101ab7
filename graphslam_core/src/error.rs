//! Error types for the GraphSLAM core.

use thiserror::Error;

/// Errors that can abort an estimation request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlamError {
    /// Malformed configuration or input that does not fit it
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Solver operation invoked out of order
    #[error("Illegal state: cannot {operation} while solver is {state}")]
    IllegalState {
        operation: &'static str,
        state: &'static str,
    },

    /// The information matrix could not be inverted
    #[error("Solver error: {0}")]
    Solver(String),
}

impl SlamError {
    /// Creates an invalid parameter error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates an illegal state error.
    pub fn illegal_state(operation: &'static str, state: &'static str) -> Self {
        Self::IllegalState { operation, state }
    }

    /// Creates a solver error.
    pub fn solver(msg: impl Into<String>) -> Self {
        Self::Solver(msg.into())
    }
}

/// Result alias used across the core.
pub type SlamResult<T> = Result<T, SlamError>;
