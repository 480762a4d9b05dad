//! Foreign-function boundary backend
//!
//! The boundary has two sides:
//!
//! - the far side ([`abi`] and the isolate runtime behind it) owns storage
//!   and exports `extern "C"` entry points taking only primitive scalars;
//! - the caller side ([`BoundaryBackend`]) implements the capability trait by
//!   crossing through those entry points for every single operation.
//!
//! A search can therefore run on either side: generically over
//! [`BoundaryBackend`], where each cell access is a crossing, or next to the
//! storage through [`abi::msq_search`], where only the handle goes in and a
//! [`PackagedResult`](matsquare_core::PackagedResult) comes back.

pub mod abi;
pub mod bridge;
mod isolate;

pub use bridge::{BoundaryBackend, BoundaryVTable};
