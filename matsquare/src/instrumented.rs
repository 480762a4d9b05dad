//! Call-counting capability wrapper
//!
//! [`CountingCapability`] forwards every call to an inner backend while
//! counting it per operation and remembering which handles were freed. Any
//! call that names a freed handle panics. It also counts the calls made on
//! any handle since the most recent successful `free`, so a search that must
//! end by releasing its scratch matrix can be checked to make no call after
//! that release.

use hashbrown::HashSet;
use matsquare_core::{MatrixCapability, MatrixHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Snapshot of per-operation call counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    pub create: u64,
    pub free: u64,
    pub get: u64,
    pub set: u64,
    pub rows: u64,
    pub cols: u64,
}

impl CallCounts {
    /// Total number of capability calls
    pub fn total(&self) -> u64 {
        self.create + self.free + self.get + self.set + self.rows + self.cols
    }

    /// Handles created and not yet freed
    pub fn outstanding(&self) -> u64 {
        self.create.saturating_sub(self.free)
    }
}

#[derive(Default)]
struct Counters {
    create: AtomicU64,
    free: AtomicU64,
    get: AtomicU64,
    set: AtomicU64,
    rows: AtomicU64,
    cols: AtomicU64,
    since_free: AtomicU64,
}

/// Capability decorator that counts calls and polices freed handles
pub struct CountingCapability<C> {
    inner: C,
    counters: Counters,
    freed: Mutex<HashSet<MatrixHandle>>,
}

impl<C: MatrixCapability> CountingCapability<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            counters: Counters::default(),
            freed: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Calls of any kind made since the last successful `free` (or `reset`)
    pub fn calls_since_last_free(&self) -> u64 {
        self.counters.since_free.load(Ordering::Relaxed)
    }

    pub fn counts(&self) -> CallCounts {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        CallCounts {
            create: load(&self.counters.create),
            free: load(&self.counters.free),
            get: load(&self.counters.get),
            set: load(&self.counters.set),
            rows: load(&self.counters.rows),
            cols: load(&self.counters.cols),
        }
    }

    /// Zero all counters; freed-handle tracking is kept
    pub fn reset(&self) {
        for counter in [
            &self.counters.create,
            &self.counters.free,
            &self.counters.get,
            &self.counters.set,
            &self.counters.rows,
            &self.counters.cols,
            &self.counters.since_free,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn record(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
        self.counters.since_free.fetch_add(1, Ordering::Relaxed);
    }

    #[track_caller]
    fn ensure_live(&self, handle: MatrixHandle, op: &str) {
        let freed = self.freed.lock().unwrap_or_else(PoisonError::into_inner);
        assert!(
            !freed.contains(&handle),
            "capability call `{op}` on freed handle {handle}"
        );
    }
}

impl<C: MatrixCapability> MatrixCapability for CountingCapability<C> {
    type Error = C::Error;

    fn create(&self, rows: usize, cols: usize) -> Result<MatrixHandle, C::Error> {
        self.record(&self.counters.create);
        let handle = self.inner.create(rows, cols)?;
        // backends may recycle tokens
        self.freed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        Ok(handle)
    }

    fn free(&self, handle: MatrixHandle) -> Result<(), C::Error> {
        self.record(&self.counters.free);
        self.ensure_live(handle, "free");
        self.inner.free(handle)?;
        self.counters.since_free.store(0, Ordering::Relaxed);
        self.freed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle);
        Ok(())
    }

    fn get(&self, handle: MatrixHandle, row: usize, col: usize) -> Result<f64, C::Error> {
        self.record(&self.counters.get);
        self.ensure_live(handle, "get");
        self.inner.get(handle, row, col)
    }

    fn set(
        &self,
        handle: MatrixHandle,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), C::Error> {
        self.record(&self.counters.set);
        self.ensure_live(handle, "set");
        self.inner.set(handle, row, col, value)
    }

    fn rows(&self, handle: MatrixHandle) -> Result<usize, C::Error> {
        self.record(&self.counters.rows);
        self.ensure_live(handle, "rows");
        self.inner.rows(handle)
    }

    fn cols(&self, handle: MatrixHandle) -> Result<usize, C::Error> {
        self.record(&self.counters.cols);
        self.ensure_live(handle, "cols");
        self.inner.cols(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirectBackend;

    #[test]
    fn test_counts_each_operation() {
        let counting = CountingCapability::new(DirectBackend::new());
        let handle = counting.create(2, 2).unwrap();
        counting.set(handle, 0, 0, 1.0).unwrap();
        counting.get(handle, 0, 0).unwrap();
        counting.get(handle, 1, 1).unwrap();
        counting.dimensions(handle).unwrap();
        counting.free(handle).unwrap();

        let counts = counting.counts();
        assert_eq!(
            counts,
            CallCounts {
                create: 1,
                free: 1,
                get: 2,
                set: 1,
                rows: 1,
                cols: 1,
            }
        );
        assert_eq!(counts.total(), 7);
        assert_eq!(counts.outstanding(), 0);

        counting.reset();
        assert_eq!(counting.counts().total(), 0);
    }

    #[test]
    fn test_calls_since_last_free() {
        let counting = CountingCapability::new(DirectBackend::new());
        let kept = counting.create(2, 2).unwrap();
        let released = counting.create(1, 1).unwrap();
        assert_eq!(counting.calls_since_last_free(), 2);

        counting.free(released).unwrap();
        assert_eq!(counting.calls_since_last_free(), 0);

        // calls on other live handles still count
        counting.get(kept, 0, 0).unwrap();
        counting.rows(kept).unwrap();
        assert_eq!(counting.calls_since_last_free(), 2);

        counting.reset();
        assert_eq!(counting.calls_since_last_free(), 0);
        counting.free(kept).unwrap();
    }

    #[test]
    #[should_panic(expected = "on freed handle")]
    fn test_call_after_free_detected() {
        let counting = CountingCapability::new(DirectBackend::new());
        let handle = counting.create(1, 1).unwrap();
        counting.free(handle).unwrap();
        let _ = counting.set(handle, 0, 0, 1.0);
    }
}
