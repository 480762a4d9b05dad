//! Caller side of the boundary
//!
//! [`BoundaryBackend`] implements [`MatrixCapability`] by turning every call
//! into a crossing through a table of `extern "C"` functions. It knows
//! nothing about the storage behind a handle; dimensions are asked for
//! through the same table like everything else.

use super::abi;
use crate::config::BackendConfig;
use crate::error::{BridgeError, Result};
use matsquare_core::{
    dimension_from_abi, index_to_abi, Axis, MatrixCapability, MatrixError, MatrixHandle,
    PackagedResult, SearchResult, Status,
};
use std::ffi::c_char;
use tracing::{debug, warn};

/// `extern "C"` entry points a [`BoundaryBackend`] crosses through
#[derive(Debug, Clone, Copy)]
pub struct BoundaryVTable {
    pub create: unsafe extern "C" fn(u64, i64, i64, *mut u64) -> i32,
    pub free: unsafe extern "C" fn(u64, u64) -> i32,
    pub get: unsafe extern "C" fn(u64, u64, i64, i64, *mut f64) -> i32,
    pub set: unsafe extern "C" fn(u64, u64, i64, i64, f64) -> i32,
    pub size: unsafe extern "C" fn(u64, u64, i32, *mut i64) -> i32,
    pub search: unsafe extern "C" fn(u64, u64, *mut PackagedResult) -> i32,
    pub teardown: unsafe extern "C" fn(u64) -> i32,
    pub last_error_length: unsafe extern "C" fn() -> usize,
    pub last_error_message: unsafe extern "C" fn(*mut c_char, usize) -> usize,
}

impl BoundaryVTable {
    /// Entry points exported by this crate's [`abi`] module
    pub fn native() -> Self {
        Self {
            create: abi::msq_create,
            free: abi::msq_free,
            get: abi::msq_get,
            set: abi::msq_set,
            size: abi::msq_size,
            search: abi::msq_search,
            teardown: abi::msq_runtime_teardown,
            last_error_length: abi::msq_last_error_length,
            last_error_message: abi::msq_last_error_message,
        }
    }
}

impl Default for BoundaryVTable {
    fn default() -> Self {
        Self::native()
    }
}

/// Matrix backend whose storage sits behind a foreign-function boundary
pub struct BoundaryBackend {
    context: u64,
    vtable: BoundaryVTable,
    owns_context: bool,
}

impl BoundaryBackend {
    /// Bring up a fresh execution context and attach to it
    ///
    /// The context is torn down when the backend is dropped.
    pub fn bootstrap(config: BackendConfig) -> Result<Self> {
        let context = match config.max_cells {
            Some(limit) => abi::msq_runtime_init_with_limit(limit),
            None => abi::msq_runtime_init(),
        };
        if context == 0 {
            return Err(BridgeError::RuntimeInit);
        }
        debug!(context, "boundary backend bootstrapped");
        Ok(Self {
            context,
            vtable: BoundaryVTable::native(),
            owns_context: true,
        })
    }

    /// Attach to a context brought up elsewhere; it is left running on drop
    pub fn attach(context: u64, vtable: BoundaryVTable) -> Self {
        Self {
            context,
            vtable,
            owns_context: false,
        }
    }

    /// Context token carried by every crossing
    pub fn context(&self) -> u64 {
        self.context
    }

    /// Run the search on the far side and unpack the returned layout
    ///
    /// Only two values cross: the handle token going in and the packaged
    /// result coming back.
    pub fn search_remote(&self, handle: MatrixHandle) -> Result<SearchResult> {
        let mut packed = PackagedResult::default();
        // SAFETY: `packed` is a live, writable PackagedResult
        let code = unsafe { (self.vtable.search)(self.context, handle.into_raw(), &mut packed) };
        self.check("msq_search", code, None)
            .map_err(|err| self.with_scratch_dimensions(err, handle))?;
        Ok(packed.into())
    }

    /// The far side only reports that the scratch matrix did not fit; it has
    /// the dimensions of the input, which are still readable after the failure
    fn with_scratch_dimensions(&self, err: BridgeError, handle: MatrixHandle) -> BridgeError {
        match err {
            BridgeError::Boundary {
                call,
                error: MatrixError::AllocationFailed { .. },
                message,
            } => match self.dimensions(handle) {
                Ok((rows, cols)) => BridgeError::Boundary {
                    call,
                    error: MatrixError::AllocationFailed { rows, cols },
                    message,
                },
                Err(lookup) => lookup,
            },
            other => other,
        }
    }

    fn check(&self, call: &'static str, code: i32, dims: Option<(usize, usize)>) -> Result<()> {
        let status = Status::from_code(code).ok_or(BridgeError::UnknownStatus { call, code })?;
        let error = match status {
            Status::Ok => return Ok(()),
            Status::AllocationFailed => {
                let (rows, cols) = dims.unwrap_or_default();
                MatrixError::AllocationFailed { rows, cols }
            }
            Status::InvalidToken => MatrixError::InvalidToken,
            Status::ContextMismatch => MatrixError::ContextMismatch,
            Status::UnknownContext => MatrixError::UnknownContext,
            Status::NullOutPointer => MatrixError::NullOutPointer,
            Status::InsufficientBuffer => MatrixError::InsufficientBuffer,
        };
        let message = self.last_error();
        warn!(call, context = self.context, %error, %message, "boundary crossing failed");
        Err(BridgeError::Boundary {
            call,
            error,
            message,
        })
    }

    fn last_error(&self) -> String {
        // SAFETY: both calls only touch thread-local state on the far side
        let len = unsafe { (self.vtable.last_error_length)() };
        let mut buffer = vec![0 as c_char; len + 1];
        // SAFETY: buffer is valid for `buffer.len()` writes
        let copied = unsafe { (self.vtable.last_error_message)(buffer.as_mut_ptr(), buffer.len()) };
        let bytes: Vec<u8> = buffer[..copied].iter().map(|&c| c as u8).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn size(&self, handle: MatrixHandle, axis: Axis) -> Result<usize> {
        let mut out = 0i64;
        // SAFETY: `out` is a live, writable i64
        let code = unsafe {
            (self.vtable.size)(self.context, handle.into_raw(), axis.selector(), &mut out)
        };
        self.check("msq_size", code, None)?;
        Ok(dimension_from_abi(out))
    }
}

impl Drop for BoundaryBackend {
    fn drop(&mut self) {
        if self.owns_context {
            // SAFETY: teardown takes only the context token
            let code = unsafe { (self.vtable.teardown)(self.context) };
            if code != Status::Ok.code() {
                warn!(context = self.context, code, "failed to tear down boundary context");
            }
        }
    }
}

impl std::fmt::Debug for BoundaryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryBackend")
            .field("context", &self.context)
            .field("owns_context", &self.owns_context)
            .finish_non_exhaustive()
    }
}

impl MatrixCapability for BoundaryBackend {
    type Error = BridgeError;

    fn create(&self, rows: usize, cols: usize) -> Result<MatrixHandle> {
        let mut out = 0u64;
        // SAFETY: `out` is a live, writable u64
        let code = unsafe {
            (self.vtable.create)(self.context, index_to_abi(rows), index_to_abi(cols), &mut out)
        };
        self.check("msq_create", code, Some((rows, cols)))?;
        MatrixHandle::from_raw(out).ok_or(BridgeError::Matrix(MatrixError::InvalidToken))
    }

    fn free(&self, handle: MatrixHandle) -> Result<()> {
        // SAFETY: primitive arguments only
        let code = unsafe { (self.vtable.free)(self.context, handle.into_raw()) };
        self.check("msq_free", code, None)
    }

    fn get(&self, handle: MatrixHandle, row: usize, col: usize) -> Result<f64> {
        let mut out = 0.0;
        // SAFETY: `out` is a live, writable f64
        let code = unsafe {
            (self.vtable.get)(
                self.context,
                handle.into_raw(),
                index_to_abi(row),
                index_to_abi(col),
                &mut out,
            )
        };
        self.check("msq_get", code, None)?;
        Ok(out)
    }

    fn set(&self, handle: MatrixHandle, row: usize, col: usize, value: f64) -> Result<()> {
        // SAFETY: primitive arguments only
        let code = unsafe {
            (self.vtable.set)(
                self.context,
                handle.into_raw(),
                index_to_abi(row),
                index_to_abi(col),
                value,
            )
        };
        self.check("msq_set", code, None)
    }

    fn rows(&self, handle: MatrixHandle) -> Result<usize> {
        self.size(handle, Axis::Rows)
    }

    fn cols(&self, handle: MatrixHandle) -> Result<usize> {
        self.size(handle, Axis::Cols)
    }
}
