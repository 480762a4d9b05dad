#![no_std]

//! matsquare core - capability contract for handle-addressed matrices
//!
//! This crate defines everything a matrix backend and a search over it have to
//! agree on, without owning any storage:
//!
//! - [`MatrixHandle`]: the opaque token a backend hands out from `create`
//! - [`MatrixCapability`]: the create/free/get/set/dimension interface
//! - [`SearchResult`] and [`PackagedResult`]: the search outcome and its
//!   fixed four-field layout for crossing a boundary
//! - [`MatrixError`] and [`Status`]: recoverable failures and their ABI codes
//!
//! Concrete backends and the search itself live in the `matsquare` crate.

pub mod error;
pub mod handle;
pub mod layout;
pub mod result;
pub mod traits;
pub mod validation;

pub use error::*;
pub use handle::MatrixHandle;
pub use layout::{Axis, PackagedResult, Status};
pub use result::{BytePackager, PodPackager, ResultPackager, SearchResult};
pub use traits::*;
pub use validation::{cell_count, check_index, dimension_from_abi, index_from_abi, index_to_abi};
