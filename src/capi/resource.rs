//! Resource handle lifecycle

use super::{check_out, ffi_call, give, release};
use crate::config::HandleConfig;
use crate::error::{ErrorReport, StatusCode};
use crate::resource::ResourceHandle;

/// Create a resource handle on the host backend with default settings
///
/// # Safety
///
/// `handle_out` must be valid for writes; `error` must be null or valid for
/// writes.
#[no_mangle]
pub unsafe extern "C" fn trueno_create_resource_handle(
    handle_out: *mut *mut ResourceHandle,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            check_out(handle_out, "handle_out")?;
            give(handle_out, "handle_out", ResourceHandle::new()?)
        })
    }
}

/// Create a resource handle with a memory budget and random seed
///
/// `memory_limit = 0` means unlimited. With `use_gpu` the handle allocates
/// from a wgpu device; builds without the `gpu` feature reject it with
/// `INVALID_INPUT`.
///
/// # Safety
///
/// Same as [`trueno_create_resource_handle`]
#[no_mangle]
pub unsafe extern "C" fn trueno_create_resource_handle_with_config(
    use_gpu: bool,
    memory_limit: usize,
    seed: u64,
    handle_out: *mut *mut ResourceHandle,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            check_out(handle_out, "handle_out")?;
            let mut config = if use_gpu {
                gpu_config()?
            } else {
                HandleConfig::default()
            };
            if memory_limit > 0 {
                config = config.with_memory_limit(memory_limit);
            }
            config = config.with_seed(seed);
            give(handle_out, "handle_out", ResourceHandle::with_config(config)?)
        })
    }
}

#[cfg(feature = "gpu")]
fn gpu_config() -> crate::Result<HandleConfig> {
    Ok(HandleConfig::gpu())
}

#[cfg(not(feature = "gpu"))]
fn gpu_config() -> crate::Result<HandleConfig> {
    Err(crate::Error::invalid(
        "library built without the gpu feature",
    ))
}

/// Destroy a resource handle and null `*handle`
///
/// # Safety
///
/// `handle` must be null or point to a pointer that is null or was returned by
/// a `trueno_create_resource_handle*` function.
#[no_mangle]
pub unsafe extern "C" fn trueno_free_resource_handle(handle: *mut *mut ResourceHandle) {
    unsafe { release(handle) };
}
