//! Error type for the std-side backends and boundary bridge

use matsquare_core::{ErrorCategory, MatrixError};
use thiserror::Error;

/// Errors surfaced to callers of this crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// Failure raised on the caller's side of any boundary
    #[error("{0}")]
    Matrix(MatrixError),

    /// Failure reported by a boundary entry point
    #[error("boundary call `{call}` failed: {error} ({message})")]
    Boundary {
        call: &'static str,
        error: MatrixError,
        message: String,
    },

    /// Boundary returned a status code outside the known set
    #[error("boundary call `{call}` returned unknown status {code}")]
    UnknownStatus { call: &'static str, code: i32 },

    /// Execution context could not be brought up
    #[error("failed to initialise boundary runtime")]
    RuntimeInit,

    #[cfg(feature = "serde")]
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<MatrixError> for BridgeError {
    fn from(error: MatrixError) -> Self {
        BridgeError::Matrix(error)
    }
}

impl BridgeError {
    /// Underlying capability error, if this failure carries one
    pub fn matrix_error(&self) -> Option<MatrixError> {
        match self {
            BridgeError::Matrix(error) => Some(*error),
            BridgeError::Boundary { error, .. } => Some(*error),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.matrix_error().map(|error| error.category())
    }

    /// Whether the failure was an allocation failure on either side
    pub fn is_allocation_failure(&self) -> bool {
        self.category() == Some(ErrorCategory::Allocation)
    }
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, BridgeError>;
