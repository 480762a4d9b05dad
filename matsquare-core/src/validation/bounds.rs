//! Bounds checks for matrix dimensions and cell indices

use crate::MatrixError;

/// Number of cells in a `rows x cols` matrix
///
/// Overflow means the storage can never be obtained, so it is reported as an
/// allocation failure rather than a contract violation.
pub const fn cell_count(rows: usize, cols: usize) -> Result<usize, MatrixError> {
    match rows.checked_mul(cols) {
        Some(cells) if cells <= isize::MAX as usize / core::mem::size_of::<f64>() => Ok(cells),
        _ => Err(MatrixError::AllocationFailed { rows, cols }),
    }
}

/// Assert that `(row, col)` lies inside a `rows x cols` matrix
///
/// # Panics
///
/// Panics on out-of-range indices.
#[inline]
#[track_caller]
pub fn check_index(row: usize, col: usize, rows: usize, cols: usize) {
    assert!(
        row < rows && col < cols,
        "matrix index ({row}, {col}) out of range for {rows}x{cols} matrix"
    );
}

/// Row-major offset of a checked index
#[inline]
pub const fn offset(row: usize, col: usize, cols: usize) -> usize {
    row * cols + col
}

/// Convert a dimension received over the ABI
///
/// # Panics
///
/// Panics on negative dimensions.
#[track_caller]
pub fn dimension_from_abi(value: i64) -> usize {
    match usize::try_from(value) {
        Ok(dimension) => dimension,
        Err(_) => panic!("negative matrix dimension {value}"),
    }
}

/// Convert a cell index received over the ABI
///
/// # Panics
///
/// Panics on negative indices.
#[track_caller]
pub fn index_from_abi(value: i64) -> usize {
    match usize::try_from(value) {
        Ok(index) => index,
        Err(_) => panic!("negative matrix index {value}"),
    }
}

/// Convert an index or dimension for sending over the ABI
///
/// Values beyond `i64::MAX` cannot name a real cell; they saturate so the far
/// side reports them as out of range.
pub fn index_to_abi(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
