//! Error types for matrix capability operations
//!
//! Only recoverable failures live here. Contract violations (negative
//! dimensions, out-of-range indices, use of a freed handle, unknown axis
//! selectors) panic at the point of detection instead.

use crate::layout::Status;

/// Broad classification of a [`MatrixError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Storage could not be obtained
    Allocation,
    /// A value could not be carried across a boundary
    Marshaling,
    /// A byte buffer did not hold a valid layout
    Layout,
}

/// Errors that can occur during capability operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixError {
    /// A `rows x cols` matrix could not be allocated
    AllocationFailed { rows: usize, cols: usize },
    /// Handle token is null or not decodable
    InvalidToken,
    /// Handle token was minted by a different execution context
    ContextMismatch,
    /// Context token does not name a live execution context
    UnknownContext,
    /// Boundary call was given a null out-pointer
    NullOutPointer,
    /// Buffer too small for the requested layout
    InsufficientBuffer,
}

impl MatrixError {
    /// Classify this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            MatrixError::AllocationFailed { .. } => ErrorCategory::Allocation,
            MatrixError::InvalidToken
            | MatrixError::ContextMismatch
            | MatrixError::UnknownContext
            | MatrixError::NullOutPointer => ErrorCategory::Marshaling,
            MatrixError::InsufficientBuffer => ErrorCategory::Layout,
        }
    }

    /// Status code reported for this error at the C ABI
    pub const fn status(&self) -> Status {
        match self {
            MatrixError::AllocationFailed { .. } => Status::AllocationFailed,
            MatrixError::InvalidToken => Status::InvalidToken,
            MatrixError::ContextMismatch => Status::ContextMismatch,
            MatrixError::UnknownContext => Status::UnknownContext,
            MatrixError::NullOutPointer => Status::NullOutPointer,
            MatrixError::InsufficientBuffer => Status::InsufficientBuffer,
        }
    }
}

impl core::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MatrixError::AllocationFailed { rows, cols } => {
                write!(f, "Failed to allocate {rows}x{cols} matrix")
            }
            MatrixError::InvalidToken => write!(f, "Invalid matrix handle token"),
            MatrixError::ContextMismatch => {
                write!(f, "Matrix handle belongs to a different context")
            }
            MatrixError::UnknownContext => write!(f, "Unknown execution context"),
            MatrixError::NullOutPointer => write!(f, "Null out-pointer"),
            MatrixError::InsufficientBuffer => write!(f, "Insufficient buffer space"),
        }
    }
}

/// Result type for capability operations
pub type Result<T> = core::result::Result<T, MatrixError>;
