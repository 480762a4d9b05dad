//! Dimension and index validation
//!
//! Pure functions with no storage access. Failures that are contract
//! violations panic; failures that are recoverable return [`MatrixError`].
//!
//! [`MatrixError`]: crate::MatrixError

pub mod bounds;

pub use bounds::{cell_count, check_index, dimension_from_abi, index_from_abi, index_to_abi};
