//! Boundary layout definitions
//!
//! This module contains the primitive-only shapes that cross a foreign
//! boundary: status codes, the dimension axis selector and the packaged
//! search result. No behaviour beyond conversion lives here.

pub mod constants;
pub mod packed;

pub use constants::{Axis, Status};
pub use packed::PackagedResult;
