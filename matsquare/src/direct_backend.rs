//! In-process matrix backend
//!
//! Handles resolve straight to storage in an arena owned by the backend; no
//! argument is marshaled and `get`/`set` are O(1). Cells are stored as atomic
//! bit patterns so that concurrent readers of one handle, and a writer of a
//! different handle, never need a lock on the cell data itself.

use crate::config::BackendConfig;
use hashbrown::HashMap;
use matsquare_core::validation::bounds::offset;
use matsquare_core::{cell_count, check_index, MatrixCapability, MatrixError, MatrixHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::trace;

/// Dense row-major `f64` storage
struct DenseStorage {
    rows: usize,
    cols: usize,
    cells: Box<[AtomicU64]>,
}

impl DenseStorage {
    fn allocate(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        let len = cell_count(rows, cols)?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| MatrixError::AllocationFailed { rows, cols })?;
        cells.resize_with(len, || AtomicU64::new(0));

        Ok(Self {
            rows,
            cols,
            cells: cells.into_boxed_slice(),
        })
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        check_index(row, col, self.rows, self.cols);
        f64::from_bits(self.cells[offset(row, col, self.cols)].load(Ordering::Relaxed))
    }

    #[inline]
    fn set(&self, row: usize, col: usize, value: f64) {
        check_index(row, col, self.rows, self.cols);
        self.cells[offset(row, col, self.cols)].store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Default)]
struct Arena {
    next_id: u64,
    cells_in_use: u64,
    matrices: HashMap<u64, DenseStorage>,
}

/// Matrix backend sharing the caller's address space
pub struct DirectBackend {
    config: BackendConfig,
    arena: RwLock<Arena>,
}

impl DirectBackend {
    /// Create a backend without an allocation ceiling
    pub fn new() -> Self {
        Self::with_config(BackendConfig::default())
    }

    pub fn with_config(config: BackendConfig) -> Self {
        Self {
            config,
            arena: RwLock::new(Arena::default()),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Number of handles created and not yet freed
    pub fn live_handles(&self) -> usize {
        self.read(|arena| arena.matrices.len())
    }

    /// Number of cells held by live handles
    pub fn cells_in_use(&self) -> u64 {
        self.read(|arena| arena.cells_in_use)
    }

    fn read<T>(&self, f: impl FnOnce(&Arena) -> T) -> T {
        let arena = self.arena.read().unwrap_or_else(PoisonError::into_inner);
        f(&arena)
    }

    fn with_storage<T>(&self, handle: MatrixHandle, f: impl FnOnce(&DenseStorage) -> T) -> T {
        self.read(|arena| match arena.matrices.get(&handle.into_raw()) {
            Some(storage) => f(storage),
            None => panic!("use of freed or foreign handle {handle}"),
        })
    }
}

impl Default for DirectBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DirectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectBackend")
            .field("config", &self.config)
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

impl MatrixCapability for DirectBackend {
    type Error = MatrixError;

    fn create(&self, rows: usize, cols: usize) -> Result<MatrixHandle, MatrixError> {
        let requested = cell_count(rows, cols)? as u64;
        let mut arena = self.arena.write().unwrap_or_else(PoisonError::into_inner);
        if !self.config.admits(arena.cells_in_use, requested) {
            return Err(MatrixError::AllocationFailed { rows, cols });
        }

        let storage = DenseStorage::allocate(rows, cols)?;
        arena.next_id += 1;
        let id = arena.next_id;
        arena.cells_in_use += requested;
        arena.matrices.insert(id, storage);

        let handle = MatrixHandle::from_raw(id).ok_or(MatrixError::InvalidToken)?;
        trace!(%handle, rows, cols, "direct create");
        Ok(handle)
    }

    fn free(&self, handle: MatrixHandle) -> Result<(), MatrixError> {
        let mut arena = self.arena.write().unwrap_or_else(PoisonError::into_inner);
        let Some(storage) = arena.matrices.remove(&handle.into_raw()) else {
            panic!("double free of handle {handle}");
        };
        arena.cells_in_use -= storage.cells.len() as u64;
        trace!(%handle, "direct free");
        Ok(())
    }

    fn get(&self, handle: MatrixHandle, row: usize, col: usize) -> Result<f64, MatrixError> {
        Ok(self.with_storage(handle, |storage| storage.get(row, col)))
    }

    fn set(
        &self,
        handle: MatrixHandle,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), MatrixError> {
        self.with_storage(handle, |storage| storage.set(row, col, value));
        Ok(())
    }

    fn rows(&self, handle: MatrixHandle) -> Result<usize, MatrixError> {
        Ok(self.with_storage(handle, |storage| storage.rows))
    }

    fn cols(&self, handle: MatrixHandle) -> Result<usize, MatrixError> {
        Ok(self.with_storage(handle, |storage| storage.cols))
    }
}
