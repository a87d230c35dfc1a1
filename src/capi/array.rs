//! Type-erased device arrays and views

use super::{arg, boxed, check_out, ffi_call, give, release};
use crate::device::{DeviceArray, DeviceArrayView, TypeTag};
use crate::error::{Error, ErrorReport, Result, StatusCode};
use crate::resource::ResourceHandle;
use std::ffi::c_int;
use std::ptr;

/// Allocate a zeroed array of `n_elems` elements of type `dtype`
///
/// # Safety
///
/// `handle` must be null or a live handle; `array_out` must be valid for
/// writes; `error` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn trueno_type_erased_device_array_create(
    handle: *const ResourceHandle,
    n_elems: usize,
    dtype: c_int,
    array_out: *mut *mut DeviceArray,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            check_out(array_out, "array_out")?;
            let handle = arg(handle, "handle")?;
            let array = DeviceArray::create(handle, n_elems, TypeTag::try_from(dtype)?)?;
            give(array_out, "array_out", array)
        })
    }
}

/// Destroy an array and null `*array`; views of it expire
///
/// # Safety
///
/// `array` must be null or point to a pointer that is null or was returned by
/// [`trueno_type_erased_device_array_create`].
#[no_mangle]
pub unsafe extern "C" fn trueno_type_erased_device_array_free(array: *mut *mut DeviceArray) {
    unsafe { release(array) };
}

/// New writable view of a whole array (null for a null array)
///
/// # Safety
///
/// `array` must be null or a live array.
#[no_mangle]
pub unsafe extern "C" fn trueno_type_erased_device_array_view(
    array: *const DeviceArray,
) -> *mut DeviceArrayView {
    unsafe { array.as_ref() }.map_or(ptr::null_mut(), |a| boxed(a.view()))
}

/// Destroy a view and null `*view`; the array is unaffected
///
/// # Safety
///
/// `view` must be null or point to a pointer that is null or was returned by
/// this library as a view.
#[no_mangle]
pub unsafe extern "C" fn trueno_type_erased_device_array_view_free(
    view: *mut *mut DeviceArrayView,
) {
    unsafe { release(view) };
}

/// Number of elements in a view (0 for null)
///
/// # Safety
///
/// `view` must be null or a live view.
#[no_mangle]
pub unsafe extern "C" fn trueno_type_erased_device_array_view_size(
    view: *const DeviceArrayView,
) -> usize {
    unsafe { view.as_ref() }.map_or(0, DeviceArrayView::len)
}

/// Type tag of a view (-1 for null)
///
/// # Safety
///
/// `view` must be null or a live view.
#[no_mangle]
pub unsafe extern "C" fn trueno_type_erased_device_array_view_type(
    view: *const DeviceArrayView,
) -> c_int {
    unsafe { view.as_ref() }.map_or(-1, |v| v.type_tag() as c_int)
}

/// Copy `view_size × sizeof(type)` bytes from `host` into the view
///
/// # Safety
///
/// `handle` and `dst` must be null or live objects; `host` must be null or
/// valid for reads of the view's byte size; `error` must be null or valid for
/// writes.
#[no_mangle]
pub unsafe extern "C" fn trueno_type_erased_device_array_view_copy_from_host(
    handle: *const ResourceHandle,
    dst: *const DeviceArrayView,
    host: *const u8,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            let handle = arg(handle, "handle")?;
            let dst = arg(dst, "dst")?;
            let bytes = host_slice(host, dst.size_in_bytes())?;
            dst.copy_from_host(handle, bytes)
        })
    }
}

/// Copy the view's contents into `host`
///
/// # Safety
///
/// `handle` and `src` must be null or live objects; `host` must be null or
/// valid for writes of the view's byte size; `error` must be null or valid
/// for writes.
#[no_mangle]
pub unsafe extern "C" fn trueno_type_erased_device_array_view_copy_to_host(
    handle: *const ResourceHandle,
    host: *mut u8,
    src: *const DeviceArrayView,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            let handle = arg(handle, "handle")?;
            let src = arg(src, "src")?;
            let bytes = host_slice_mut(host, src.size_in_bytes())?;
            src.copy_to_host(handle, bytes)
        })
    }
}

/// # Safety
///
/// `host` must be null or valid for reads of `len` bytes.
unsafe fn host_slice<'a>(host: *const u8, len: usize) -> Result<&'a [u8]> {
    match (host.is_null(), len) {
        (_, 0) => Ok(&[]),
        (true, _) => Err(Error::invalid("host buffer is null")),
        (false, _) => Ok(unsafe { std::slice::from_raw_parts(host, len) }),
    }
}

/// # Safety
///
/// `host` must be null or valid for writes of `len` bytes.
unsafe fn host_slice_mut<'a>(host: *mut u8, len: usize) -> Result<&'a mut [u8]> {
    match (host.is_null(), len) {
        (_, 0) => Ok(&mut []),
        (true, _) => Err(Error::invalid("host buffer is null")),
        (false, _) => Ok(unsafe { std::slice::from_raw_parts_mut(host, len) }),
    }
}
