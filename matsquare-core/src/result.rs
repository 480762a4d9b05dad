//! Search result record and result packaging
//!
//! A [`SearchResult`] is built once at the end of a search and never mutated.
//! A [`ResultPackager`] turns it into whatever the invoking side of a
//! boundary expects.

use crate::layout::constants::NO_POSITION;
use crate::layout::PackagedResult;

/// Outcome of a largest-uniform-square search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    row: i64,
    column: i64,
    size: i64,
    elapsed_millis: i64,
}

impl SearchResult {
    pub const fn new(row: i64, column: i64, size: i64, elapsed_millis: i64) -> Self {
        Self {
            row,
            column,
            size,
            elapsed_millis,
        }
    }

    /// Result for a matrix with no cells
    pub const fn empty(elapsed_millis: i64) -> Self {
        Self::new(NO_POSITION, NO_POSITION, 0, elapsed_millis)
    }

    pub const fn row(&self) -> i64 {
        self.row
    }

    pub const fn column(&self) -> i64 {
        self.column
    }

    pub const fn size(&self) -> i64 {
        self.size
    }

    pub const fn elapsed_millis(&self) -> i64 {
        self.elapsed_millis
    }

    /// Whether a square of size at least one was found
    pub const fn is_found(&self) -> bool {
        self.size > 0
    }

    /// Compare position and size, ignoring timing
    pub const fn same_square(&self, other: &Self) -> bool {
        self.row == other.row && self.column == other.column && self.size == other.size
    }
}

impl From<SearchResult> for PackagedResult {
    fn from(result: SearchResult) -> Self {
        PackagedResult {
            row: result.row,
            column: result.column,
            size: result.size,
            elapsed_millis: result.elapsed_millis,
        }
    }
}

impl From<PackagedResult> for SearchResult {
    fn from(packed: PackagedResult) -> Self {
        SearchResult::new(packed.row, packed.column, packed.size, packed.elapsed_millis)
    }
}

/// Converts a [`SearchResult`] into a boundary-crossing representation
///
/// Implementations must keep the field order row, column, size, elapsed and
/// must not narrow any field.
pub trait ResultPackager {
    /// Representation handed back to the invoking side
    type Packaged;

    fn package(&self, result: SearchResult) -> Self::Packaged;
}

/// Packages into the `#[repr(C)]` [`PackagedResult`] layout
#[derive(Debug, Clone, Copy, Default)]
pub struct PodPackager;

impl ResultPackager for PodPackager {
    type Packaged = PackagedResult;

    fn package(&self, result: SearchResult) -> PackagedResult {
        result.into()
    }
}

/// Packages into 32 little-endian bytes for byte-oriented transports
#[derive(Debug, Clone, Copy, Default)]
pub struct BytePackager;

impl ResultPackager for BytePackager {
    type Packaged = [u8; PackagedResult::SIZE];

    fn package(&self, result: SearchResult) -> Self::Packaged {
        PackagedResult::from(result).to_le_bytes()
    }
}
