//! C ABI
//!
//! Every object crosses the boundary as an opaque pointer to the Rust type
//! (`ResourceHandle`, `DeviceArray`, `DeviceArrayView`, `Graph`, result sets,
//! `ErrorReport`). Conventions shared by all entry points:
//!
//! - Fallible calls return a [`StatusCode`] and, on failure, store a new
//!   [`ErrorReport`] in `*error` (released with `trueno_error_free`). On
//!   success `*error` is set to null.
//! - Outputs are written through `*_out` pointers only on success.
//! - `*_free` functions take the address of the caller's pointer, release the
//!   object and null the pointer. Freeing a null pointer, or freeing twice
//!   through the same slot, does nothing.
//! - Panics never unwind into the caller; they surface as `UNKNOWN_ERROR`.
//!
//! Type tags are passed as `int`: `INT32 = 0`, `INT64 = 1`, `FLOAT32 = 2`,
//! `FLOAT64 = 3`, `SIZE_T = 4`.

pub mod algorithms;
pub mod array;
pub mod error;
pub mod graph;
pub mod resource;
pub mod results;

use crate::error::{Error, ErrorReport, Result, StatusCode};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

/// Run `body`, translating its outcome into a status and an error report
///
/// # Safety
///
/// `error` must be null or valid for writes.
unsafe fn ffi_call(error: *mut *mut ErrorReport, body: impl FnOnce() -> Result<()>) -> StatusCode {
    if !error.is_null() {
        unsafe { *error = ptr::null_mut() };
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(Error::Unknown(panic_message(payload.as_ref()))));

    match outcome {
        Ok(()) => StatusCode::Success,
        Err(err) => {
            let status = err.status();
            tracing::error!(%status, "{err}");
            if !error.is_null() {
                unsafe { *error = Box::into_raw(Box::new(ErrorReport::from(&err))) };
            }
            status
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    format!("panic in graph engine: {detail}")
}

/// Borrow a required input object
///
/// # Safety
///
/// `ptr` must be null or point to a live `T`.
unsafe fn arg<'a, T>(ptr: *const T, name: &str) -> Result<&'a T> {
    unsafe { ptr.as_ref() }.ok_or_else(|| Error::invalid(format!("{name} is null")))
}

/// Hand ownership of `value` to the caller through `out`
///
/// # Safety
///
/// `out` must be null or valid for writes.
unsafe fn give<T>(out: *mut *mut T, name: &str, value: T) -> Result<()> {
    if out.is_null() {
        return Err(Error::invalid(format!("{name} is null")));
    }
    unsafe { *out = Box::into_raw(Box::new(value)) };
    Ok(())
}

/// Check an output slot before doing any work
fn check_out<T>(out: *mut *mut T, name: &str) -> Result<()> {
    if out.is_null() {
        Err(Error::invalid(format!("{name} is null")))
    } else {
        Ok(())
    }
}

/// Box a value for a getter that returns a new object
fn boxed<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

/// Release the object in `*slot` and null the slot
///
/// # Safety
///
/// `slot` must be null or valid for reads and writes, and `*slot` must be null
/// or a pointer previously handed out by this library for a `T`.
unsafe fn release<T>(slot: *mut *mut T) {
    if slot.is_null() {
        return;
    }
    let object = unsafe { *slot };
    if object.is_null() {
        return;
    }
    let _ = panic::catch_unwind(AssertUnwindSafe(|| drop(unsafe { Box::from_raw(object) })));
    unsafe { *slot = ptr::null_mut() };
}
