//! Owning guard for matrix handles
//!
//! A bare [`MatrixHandle`] borrows storage; an [`OwnedMatrix`] owns it and
//! frees it exactly once when dropped.

use matsquare_core::{MatrixCapability, MatrixHandle};
use tracing::warn;

/// Handle paired with the capability that created it, freed on drop
pub struct OwnedMatrix<'a, C: MatrixCapability + ?Sized> {
    capability: &'a C,
    handle: Option<MatrixHandle>,
}

impl<'a, C: MatrixCapability + ?Sized> OwnedMatrix<'a, C> {
    /// Allocate a `rows x cols` matrix with unspecified contents
    pub fn create(capability: &'a C, rows: usize, cols: usize) -> Result<Self, C::Error> {
        let handle = capability.create(rows, cols)?;
        Ok(Self {
            capability,
            handle: Some(handle),
        })
    }

    /// Allocate a matrix and fill it from row slices
    ///
    /// # Panics
    ///
    /// Panics if the rows are ragged.
    pub fn from_rows<R: AsRef<[f64]>>(capability: &'a C, rows: &[R]) -> Result<Self, C::Error> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        let matrix = Self::create(capability, rows.len(), cols)?;
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            assert_eq!(row.len(), cols, "ragged row {i}: expected {cols} columns");
            for (j, value) in row.iter().enumerate() {
                capability.set(matrix.handle(), i, j, *value)?;
            }
        }
        Ok(matrix)
    }

    /// Allocate a matrix and fill every cell with `value`
    pub fn filled(
        capability: &'a C,
        rows: usize,
        cols: usize,
        value: f64,
    ) -> Result<Self, C::Error> {
        Self::from_fn(capability, rows, cols, |_, _| value)
    }

    /// Allocate a matrix and fill cell `(i, j)` with `f(i, j)`
    pub fn from_fn(
        capability: &'a C,
        rows: usize,
        cols: usize,
        mut f: impl FnMut(usize, usize) -> f64,
    ) -> Result<Self, C::Error> {
        let matrix = Self::create(capability, rows, cols)?;
        for i in 0..rows {
            for j in 0..cols {
                capability.set(matrix.handle(), i, j, f(i, j))?;
            }
        }
        Ok(matrix)
    }

    /// Borrowed token for passing to capability calls
    pub fn handle(&self) -> MatrixHandle {
        match self.handle {
            Some(handle) => handle,
            None => unreachable!("owned matrix accessed after release"),
        }
    }

    pub fn capability(&self) -> &'a C {
        self.capability
    }

    /// Read the whole matrix back as rows
    pub fn to_rows(&self) -> Result<Vec<Vec<f64>>, C::Error> {
        let handle = self.handle();
        let (rows, cols) = self.capability.dimensions(handle)?;
        (0..rows)
            .map(|i| (0..cols).map(|j| self.capability.get(handle, i, j)).collect())
            .collect()
    }

    /// Give up ownership without freeing; the caller must free the handle
    pub fn into_handle(mut self) -> MatrixHandle {
        let handle = self.handle();
        self.handle = None;
        handle
    }

    /// Free now and observe the result instead of deferring to drop
    pub fn free(mut self) -> Result<(), C::Error> {
        let handle = self.handle();
        self.handle = None;
        self.capability.free(handle)
    }
}

impl<C: MatrixCapability + ?Sized> Drop for OwnedMatrix<'_, C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if self.capability.free(handle).is_err() {
                warn!(%handle, "failed to free owned matrix");
            }
        }
    }
}

impl<C: MatrixCapability + ?Sized> std::fmt::Debug for OwnedMatrix<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedMatrix").field("handle", &self.handle).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectBackend;

    #[test]
    fn test_drop_frees() {
        let backend = DirectBackend::new();
        {
            let _matrix = OwnedMatrix::create(&backend, 3, 3).unwrap();
            assert_eq!(backend.live_handles(), 1);
        }
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn test_from_rows_roundtrip() {
        let backend = DirectBackend::new();
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.5], vec![-6.0, 0.25]];
        let matrix = OwnedMatrix::from_rows(&backend, &rows).unwrap();
        assert_eq!(matrix.to_rows().unwrap(), rows);
    }

    #[test]
    fn test_into_handle_keeps_storage() {
        let backend = DirectBackend::new();
        let handle = OwnedMatrix::filled(&backend, 2, 2, 9.0).unwrap().into_handle();
        assert_eq!(backend.live_handles(), 1);
        assert_eq!(backend.get(handle, 1, 1).unwrap(), 9.0);
        backend.free(handle).unwrap();
    }

    #[test]
    fn test_explicit_free() {
        let backend = DirectBackend::new();
        let matrix = OwnedMatrix::create(&backend, 1, 4).unwrap();
        matrix.free().unwrap();
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    #[should_panic(expected = "ragged row")]
    fn test_ragged_rows_panic() {
        let backend = DirectBackend::new();
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        let _ = OwnedMatrix::from_rows(&backend, &rows);
    }
}
