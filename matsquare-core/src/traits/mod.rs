//! Abstract interfaces for matrix backends
//!
//! This module defines the capability seam between a search and the storage
//! it runs over. Traits are pure interfaces - no concrete implementations.

pub mod capability;

pub use capability::MatrixCapability;
