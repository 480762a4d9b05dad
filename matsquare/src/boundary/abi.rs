//! C-ABI entry points
//!
//! Only primitive scalars cross this boundary: context tokens and handle
//! tokens as `u64`, indices and dimensions as `i64`, cell values as `f64`.
//! The one composite exception is [`PackagedResult`], written through an
//! out-pointer by [`msq_search`].
//!
//! Every fallible entry point returns a [`Status`] code. On failure a message
//! is kept per thread and can be read with [`msq_last_error_message`].
//! Contract violations (negative dimensions or indices, out-of-range indices,
//! freed handles, unknown axis selectors) panic, which aborts the process at
//! an `extern "C"` frame.

use super::isolate;
use crate::config::BackendConfig;
use crate::search::find_biggest_square;
use matsquare_core::{
    dimension_from_abi, index_from_abi, index_to_abi, Axis, MatrixCapability, MatrixError,
    PackagedResult, PodPackager, ResultPackager, Status,
};
use std::cell::RefCell;
use std::ffi::{c_char, CString};
use std::ptr;
use tracing::warn;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: String) {
    let message = CString::new(message)
        .unwrap_or_else(|_| CString::from(c"<error message contained null byte>"));
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

fn report(call: &'static str, result: Result<(), MatrixError>) -> i32 {
    match result {
        Ok(()) => {
            clear_last_error();
            Status::Ok.code()
        }
        Err(error) => {
            warn!(call, %error, "boundary call failed");
            set_last_error(format!("{call}: {error}"));
            error.status().code()
        }
    }
}

fn require_out<T>(out: *mut T) -> Result<*mut T, MatrixError> {
    if out.is_null() {
        Err(MatrixError::NullOutPointer)
    } else {
        Ok(out)
    }
}

/// Bring up an execution context without an allocation ceiling
///
/// Must be called before any other entry point. Returns the context token,
/// or `0` if no further context can be created.
#[no_mangle]
pub extern "C" fn msq_runtime_init() -> u64 {
    spawn_context("msq_runtime_init", BackendConfig::unlimited())
}

/// Bring up an execution context holding at most `max_cells` live cells
///
/// Every value is a real ceiling; `max_cells == 0` admits only empty
/// matrices. Use [`msq_runtime_init`] for an unlimited context.
#[no_mangle]
pub extern "C" fn msq_runtime_init_with_limit(max_cells: u64) -> u64 {
    spawn_context(
        "msq_runtime_init_with_limit",
        BackendConfig::with_max_cells(max_cells),
    )
}

fn spawn_context(call: &'static str, config: BackendConfig) -> u64 {
    match isolate::spawn(config) {
        Some(context) => {
            clear_last_error();
            context
        }
        None => {
            set_last_error(format!("{call}: context ids exhausted"));
            0
        }
    }
}

/// Tear down an execution context and all storage it still holds
#[no_mangle]
pub extern "C" fn msq_runtime_teardown(context: u64) -> i32 {
    report("msq_runtime_teardown", isolate::teardown(context))
}

/// Allocate a `rows x cols` matrix and write its handle token to `out`
///
/// # Safety
///
/// `out` must be null or valid for a `u64` write.
#[no_mangle]
pub unsafe extern "C" fn msq_create(context: u64, rows: i64, cols: i64, out: *mut u64) -> i32 {
    let result = (|| -> Result<(), MatrixError> {
        let out = require_out(out)?;
        let isolate = isolate::lookup(context)?;
        let handle = isolate.create(dimension_from_abi(rows), dimension_from_abi(cols))?;
        // SAFETY: non-null checked above, validity is the caller's contract
        unsafe { out.write(handle.into_raw()) };
        Ok(())
    })();
    report("msq_create", result)
}

/// Release a matrix
#[no_mangle]
pub extern "C" fn msq_free(context: u64, handle: u64) -> i32 {
    let result = (|| -> Result<(), MatrixError> {
        let isolate = isolate::lookup(context)?;
        let handle = isolate.handle_from_token(handle)?;
        isolate.free(handle)
    })();
    report("msq_free", result)
}

/// Read one cell into `out`
///
/// # Safety
///
/// `out` must be null or valid for an `f64` write.
#[no_mangle]
pub unsafe extern "C" fn msq_get(
    context: u64,
    handle: u64,
    row: i64,
    col: i64,
    out: *mut f64,
) -> i32 {
    let result = (|| -> Result<(), MatrixError> {
        let out = require_out(out)?;
        let isolate = isolate::lookup(context)?;
        let handle = isolate.handle_from_token(handle)?;
        let value = isolate.get(handle, index_from_abi(row), index_from_abi(col))?;
        // SAFETY: non-null checked above, validity is the caller's contract
        unsafe { out.write(value) };
        Ok(())
    })();
    report("msq_get", result)
}

/// Write one cell
#[no_mangle]
pub extern "C" fn msq_set(context: u64, handle: u64, row: i64, col: i64, value: f64) -> i32 {
    let result = (|| -> Result<(), MatrixError> {
        let isolate = isolate::lookup(context)?;
        let handle = isolate.handle_from_token(handle)?;
        isolate.set(handle, index_from_abi(row), index_from_abi(col), value)
    })();
    report("msq_set", result)
}

/// Write the size along `axis` (1 = rows, 2 = columns) to `out`
///
/// # Safety
///
/// `out` must be null or valid for an `i64` write.
#[no_mangle]
pub unsafe extern "C" fn msq_size(context: u64, handle: u64, axis: i32, out: *mut i64) -> i32 {
    let Some(axis) = Axis::from_selector(axis) else {
        panic!("unsupported axis selector {axis}");
    };
    let result = (|| -> Result<(), MatrixError> {
        let out = require_out(out)?;
        let isolate = isolate::lookup(context)?;
        let handle = isolate.handle_from_token(handle)?;
        let size = isolate.dim(handle, axis)?;
        // SAFETY: non-null checked above, validity is the caller's contract
        unsafe { out.write(index_to_abi(size)) };
        Ok(())
    })();
    report("msq_size", result)
}

/// Run the biggest square search next to the storage and write the packaged
/// result to `out`
///
/// Nothing is written on failure.
///
/// # Safety
///
/// `out` must be null or valid for a [`PackagedResult`] write.
#[no_mangle]
pub unsafe extern "C" fn msq_search(context: u64, handle: u64, out: *mut PackagedResult) -> i32 {
    let result = (|| -> Result<(), MatrixError> {
        let out = require_out(out)?;
        let isolate = isolate::lookup(context)?;
        let handle = isolate.handle_from_token(handle)?;
        let found = find_biggest_square(&*isolate, handle)?;
        // SAFETY: non-null checked above, validity is the caller's contract
        unsafe { out.write(PodPackager.package(found)) };
        Ok(())
    })();
    report("msq_search", result)
}

/// Length in bytes of the calling thread's last error message, without the
/// trailing null terminator; `0` if there is none
#[no_mangle]
pub extern "C" fn msq_last_error_length() -> usize {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(0, |message| message.as_bytes().len()))
}

/// Copy the calling thread's last error message into `buffer`
///
/// Copies at most `capacity - 1` bytes plus a null terminator and returns the
/// number of message bytes copied.
///
/// # Safety
///
/// `buffer` must be null or valid for `capacity` byte writes.
#[no_mangle]
pub unsafe extern "C" fn msq_last_error_message(buffer: *mut c_char, capacity: usize) -> usize {
    if buffer.is_null() || capacity == 0 {
        return 0;
    }
    LAST_ERROR.with(|slot| match slot.borrow().as_ref() {
        Some(message) => {
            let bytes = message.as_bytes();
            let to_copy = bytes.len().min(capacity - 1);
            // SAFETY: buffer holds `capacity` bytes and `to_copy < capacity`
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), buffer, to_copy);
                *buffer.add(to_copy) = 0;
            }
            to_copy
        }
        None => 0,
    })
}
