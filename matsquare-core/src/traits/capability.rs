//! Matrix capability interface
//!
//! Every backend, whether its storage shares the caller's address space or
//! sits on the far side of a foreign-function boundary, exposes exactly this
//! set of operations. Nothing but a backend touches matrix memory.

use crate::handle::MatrixHandle;
use crate::layout::Axis;

/// Create/free/get/set/dimension operations over opaque handles
///
/// Methods take `&self`: backends are shared between callers and use interior
/// synchronization, so concurrent reads through one backend are allowed.
///
/// # Contract
///
/// - `create` returns a handle to a `rows x cols` matrix with unspecified
///   contents. It fails with an error only when storage cannot be obtained
///   or, for boundary backends, when the call cannot be marshaled.
/// - Exactly one `free` per `create`. Double free and use after free are
///   programming errors; a backend may panic on detecting them.
/// - `get`/`set` require `row < rows(handle)` and `col < cols(handle)`.
///   Out-of-range indices panic.
/// - `rows`/`cols` have no side effects.
pub trait MatrixCapability {
    /// Error reported for recoverable failures
    type Error;

    /// Allocate a new matrix
    fn create(&self, rows: usize, cols: usize) -> Result<MatrixHandle, Self::Error>;

    /// Release a matrix created by this backend
    fn free(&self, handle: MatrixHandle) -> Result<(), Self::Error>;

    /// Read one cell
    fn get(&self, handle: MatrixHandle, row: usize, col: usize) -> Result<f64, Self::Error>;

    /// Write one cell
    fn set(
        &self,
        handle: MatrixHandle,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), Self::Error>;

    /// Number of rows
    fn rows(&self, handle: MatrixHandle) -> Result<usize, Self::Error>;

    /// Number of columns
    fn cols(&self, handle: MatrixHandle) -> Result<usize, Self::Error>;

    /// Size along the selected axis
    fn dim(&self, handle: MatrixHandle, axis: Axis) -> Result<usize, Self::Error> {
        match axis {
            Axis::Rows => self.rows(handle),
            Axis::Cols => self.cols(handle),
        }
    }

    /// Dimensions as `(rows, cols)`
    fn dimensions(&self, handle: MatrixHandle) -> Result<(usize, usize), Self::Error> {
        Ok((self.rows(handle)?, self.cols(handle)?))
    }
}

impl<C: MatrixCapability + ?Sized> MatrixCapability for &C {
    type Error = C::Error;

    fn create(&self, rows: usize, cols: usize) -> Result<MatrixHandle, Self::Error> {
        (**self).create(rows, cols)
    }

    fn free(&self, handle: MatrixHandle) -> Result<(), Self::Error> {
        (**self).free(handle)
    }

    fn get(&self, handle: MatrixHandle, row: usize, col: usize) -> Result<f64, Self::Error> {
        (**self).get(handle, row, col)
    }

    fn set(
        &self,
        handle: MatrixHandle,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), Self::Error> {
        (**self).set(handle, row, col, value)
    }

    fn rows(&self, handle: MatrixHandle) -> Result<usize, Self::Error> {
        (**self).rows(handle)
    }

    fn cols(&self, handle: MatrixHandle) -> Result<usize, Self::Error> {
        (**self).cols(handle)
    }
}
