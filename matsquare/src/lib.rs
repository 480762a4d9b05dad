//! matsquare - largest uniform square search over handle-addressed matrices
//!
//! The search never sees matrix memory. It runs purely through the
//! [`MatrixCapability`] trait, so the exact same code drives a backend whose
//! storage lives in the caller's address space and one whose storage sits
//! behind a C-ABI boundary.
//!
//! ## Architecture
//!
//! - **matsquare-core**: handle token, capability trait, result layout and
//!   errors (`no_std`, no storage)
//! - **matsquare**: backends, the search, instrumentation and the ABI
//!
//! ## Quick Start
//!
//! ```rust
//! use matsquare::{find_biggest_square, DirectBackend, OwnedMatrix};
//!
//! let backend = DirectBackend::new();
//! let matrix = OwnedMatrix::from_rows(
//!     &backend,
//!     &[vec![5.0, 5.0, 7.0], vec![5.0, 5.0, 7.0], vec![7.0, 7.0, 7.0]],
//! )
//! .unwrap();
//!
//! let result = find_biggest_square(&backend, matrix.handle()).unwrap();
//! assert_eq!((result.row(), result.column(), result.size()), (0, 0, 2));
//! ```
//!
//! ## Backends
//!
//! - [`DirectBackend`]: in-process arena, no marshaling
//! - [`BoundaryBackend`]: every call crosses `extern "C"` entry points in
//!   [`boundary::abi`]
//! - [`CountingCapability`]: wraps either to count calls and reject use of
//!   freed handles

// Re-export core abstractions
pub use matsquare_core::{
    Axis, BytePackager, ErrorCategory, MatrixCapability, MatrixError, MatrixHandle,
    PackagedResult, PodPackager, ResultPackager, SearchResult, Status,
};

pub mod batch;
pub mod boundary;
pub mod config;
pub mod direct_backend;
pub mod error;
pub mod instrumented;
pub mod owned;
pub mod search;

pub use batch::search_batch;
pub use boundary::{BoundaryBackend, BoundaryVTable};
pub use config::BackendConfig;
pub use direct_backend::DirectBackend;
pub use error::{BridgeError, Result};
pub use instrumented::{CallCounts, CountingCapability};
pub use owned::OwnedMatrix;
pub use search::find_biggest_square;
