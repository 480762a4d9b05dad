//! Far side of the boundary: isolates and their registry
//!
//! An [`Isolate`] is an execution context with its own matrix storage. Every
//! operation takes the isolate lock for the duration of that one call, so
//! crossings are serialized per call and never held across calls.
//!
//! Handle tokens carry the owning context in their upper 32 bits and a slot
//! number in the lower 32 bits. Slots are never reused within an isolate.

use crate::config::BackendConfig;
use hashbrown::HashMap;
use matsquare_core::validation::bounds::offset;
use matsquare_core::{cell_count, check_index, MatrixCapability, MatrixError, MatrixHandle};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace, warn};

struct FarMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Default)]
struct IsolateStorage {
    next_slot: u32,
    cells_in_use: u64,
    matrices: HashMap<u32, FarMatrix>,
}

/// Execution context owning matrix storage behind the boundary
pub(crate) struct Isolate {
    id: u32,
    config: BackendConfig,
    storage: Mutex<IsolateStorage>,
}

impl Isolate {
    fn new(id: u32, config: BackendConfig) -> Self {
        Self {
            id,
            config,
            storage: Mutex::new(IsolateStorage::default()),
        }
    }

    /// Context token naming this isolate
    pub(crate) fn context(&self) -> u64 {
        u64::from(self.id)
    }

    /// Decode a raw handle token received over the ABI
    pub(crate) fn handle_from_token(&self, raw: u64) -> Result<MatrixHandle, MatrixError> {
        let handle = MatrixHandle::from_raw(raw).ok_or(MatrixError::InvalidToken)?;
        if raw >> 32 != u64::from(self.id) {
            return Err(MatrixError::ContextMismatch);
        }
        if raw as u32 == 0 {
            return Err(MatrixError::InvalidToken);
        }
        Ok(handle)
    }

    pub(crate) fn live_handles(&self) -> usize {
        self.lock().matrices.len()
    }

    fn token(&self, slot: u32) -> Option<MatrixHandle> {
        MatrixHandle::from_raw((u64::from(self.id) << 32) | u64::from(slot))
    }

    fn lock(&self) -> MutexGuard<'_, IsolateStorage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_matrix<T>(&self, handle: MatrixHandle, f: impl FnOnce(&mut FarMatrix) -> T) -> T {
        let slot = handle.into_raw() as u32;
        let mut storage = self.lock();
        match storage.matrices.get_mut(&slot) {
            Some(matrix) => f(matrix),
            None => panic!("use of freed handle {handle} in context {}", self.id),
        }
    }
}

impl MatrixCapability for Isolate {
    type Error = MatrixError;

    fn create(&self, rows: usize, cols: usize) -> Result<MatrixHandle, MatrixError> {
        let len = cell_count(rows, cols)?;
        let mut storage = self.lock();
        if !self.config.admits(storage.cells_in_use, len as u64) {
            return Err(MatrixError::AllocationFailed { rows, cols });
        }
        let slot = storage
            .next_slot
            .checked_add(1)
            .ok_or(MatrixError::AllocationFailed { rows, cols })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| MatrixError::AllocationFailed { rows, cols })?;
        data.resize(len, 0.0);

        storage.next_slot = slot;
        storage.cells_in_use += len as u64;
        storage.matrices.insert(slot, FarMatrix { rows, cols, data });

        let handle = self.token(slot).ok_or(MatrixError::InvalidToken)?;
        trace!(context = self.id, %handle, rows, cols, "isolate create");
        Ok(handle)
    }

    fn free(&self, handle: MatrixHandle) -> Result<(), MatrixError> {
        let slot = handle.into_raw() as u32;
        let mut storage = self.lock();
        let Some(matrix) = storage.matrices.remove(&slot) else {
            panic!("double free of handle {handle} in context {}", self.id);
        };
        storage.cells_in_use -= matrix.data.len() as u64;
        trace!(context = self.id, %handle, "isolate free");
        Ok(())
    }

    fn get(&self, handle: MatrixHandle, row: usize, col: usize) -> Result<f64, MatrixError> {
        Ok(self.with_matrix(handle, |matrix| {
            check_index(row, col, matrix.rows, matrix.cols);
            matrix.data[offset(row, col, matrix.cols)]
        }))
    }

    fn set(
        &self,
        handle: MatrixHandle,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), MatrixError> {
        self.with_matrix(handle, |matrix| {
            check_index(row, col, matrix.rows, matrix.cols);
            matrix.data[offset(row, col, matrix.cols)] = value;
        });
        Ok(())
    }

    fn rows(&self, handle: MatrixHandle) -> Result<usize, MatrixError> {
        Ok(self.with_matrix(handle, |matrix| matrix.rows))
    }

    fn cols(&self, handle: MatrixHandle) -> Result<usize, MatrixError> {
        Ok(self.with_matrix(handle, |matrix| matrix.cols))
    }
}

type Registry = RwLock<HashMap<u32, Arc<Isolate>>>;

static NEXT_CONTEXT: AtomicU32 = AtomicU32::new(1);

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Bring up a new isolate and return its context token
///
/// Returns `None` once context ids are exhausted.
pub(crate) fn spawn(config: BackendConfig) -> Option<u64> {
    let id = NEXT_CONTEXT
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
        .ok()?;
    let isolate = Arc::new(Isolate::new(id, config));
    let context = isolate.context();
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(id, isolate);
    debug!(context, max_cells = ?config.max_cells, "isolate started");
    Some(context)
}

/// Resolve a context token to its isolate
pub(crate) fn lookup(context: u64) -> Result<Arc<Isolate>, MatrixError> {
    let id = u32::try_from(context).map_err(|_| MatrixError::UnknownContext)?;
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned()
        .ok_or(MatrixError::UnknownContext)
}

/// Tear down an isolate, releasing any storage still held by it
pub(crate) fn teardown(context: u64) -> Result<(), MatrixError> {
    let id = u32::try_from(context).map_err(|_| MatrixError::UnknownContext)?;
    let isolate = registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&id)
        .ok_or(MatrixError::UnknownContext)?;

    let leaked = isolate.live_handles();
    if leaked > 0 {
        warn!(context, leaked, "isolate torn down with live handles");
    } else {
        debug!(context, "isolate torn down");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_carry_context() {
        let context = spawn(BackendConfig::default()).unwrap();
        let isolate = lookup(context).unwrap();
        let handle = isolate.create(2, 2).unwrap();

        assert_eq!(handle.into_raw() >> 32, context);
        assert_eq!(isolate.handle_from_token(handle.into_raw()), Ok(handle));

        isolate.free(handle).unwrap();
        teardown(context).unwrap();
    }

    #[test]
    fn test_foreign_token_rejected() {
        let first = lookup(spawn(BackendConfig::default()).unwrap()).unwrap();
        let second = lookup(spawn(BackendConfig::default()).unwrap()).unwrap();
        let handle = first.create(1, 1).unwrap();

        assert_eq!(
            second.handle_from_token(handle.into_raw()),
            Err(MatrixError::ContextMismatch)
        );
        assert_eq!(first.handle_from_token(0), Err(MatrixError::InvalidToken));
        assert_eq!(
            first.handle_from_token(first.context() << 32),
            Err(MatrixError::InvalidToken)
        );

        first.free(handle).unwrap();
        teardown(first.context()).unwrap();
        teardown(second.context()).unwrap();
    }

    #[test]
    fn test_unknown_context() {
        assert!(matches!(lookup(0), Err(MatrixError::UnknownContext)));
        assert!(matches!(lookup(u64::MAX), Err(MatrixError::UnknownContext)));

        let context = spawn(BackendConfig::default()).unwrap();
        teardown(context).unwrap();
        assert!(matches!(lookup(context), Err(MatrixError::UnknownContext)));
        assert_eq!(teardown(context), Err(MatrixError::UnknownContext));
    }

    #[test]
    fn test_ceiling() {
        let context = spawn(BackendConfig::with_max_cells(4)).unwrap();
        let isolate = lookup(context).unwrap();
        let handle = isolate.create(2, 2).unwrap();
        assert_eq!(
            isolate.create(1, 1),
            Err(MatrixError::AllocationFailed { rows: 1, cols: 1 })
        );
        isolate.free(handle).unwrap();
        teardown(context).unwrap();
    }

    #[test]
    #[should_panic(expected = "use of freed handle")]
    fn test_use_after_free_panics() {
        let isolate = Isolate::new(u32::MAX, BackendConfig::default());
        let handle = isolate.create(1, 1).unwrap();
        isolate.free(handle).unwrap();
        let _ = isolate.get(handle, 0, 0);
    }
}
