//! Result accessors
//!
//! View getters return a new read-only view owned by the caller (free it with
//! `trueno_type_erased_device_array_view_free`), or null for a null result.
//! Views expire when their result is freed.

use super::{boxed, release};
use crate::device::DeviceArrayView;
use crate::results::{CentralityResult, EdgeCentralityResult, WalkResult};
use std::ptr;

/// # Safety
///
/// `result` must be null or a live `T`.
unsafe fn view_of<T>(
    result: *const T,
    get: impl FnOnce(&T) -> DeviceArrayView,
) -> *mut DeviceArrayView {
    unsafe { result.as_ref() }.map_or(ptr::null_mut(), |r| boxed(get(r)))
}

/// Maximum vertices per walk (0 for null)
///
/// # Safety
///
/// `result` must be null or a live walk result.
#[no_mangle]
pub unsafe extern "C" fn trueno_random_walk_result_get_max_path_length(
    result: *const WalkResult,
) -> usize {
    unsafe { result.as_ref() }.map_or(0, WalkResult::max_path_length)
}

/// Visited vertices
///
/// # Safety
///
/// `result` must be null or a live walk result.
#[no_mangle]
pub unsafe extern "C" fn trueno_random_walk_result_get_paths(
    result: *const WalkResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, WalkResult::paths) }
}

/// Traversed edge weights
///
/// # Safety
///
/// `result` must be null or a live walk result.
#[no_mangle]
pub unsafe extern "C" fn trueno_random_walk_result_get_weights(
    result: *const WalkResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, WalkResult::weights) }
}

/// Vertex count of each walk (`SIZE_T`)
///
/// # Safety
///
/// `result` must be null or a live walk result.
#[no_mangle]
pub unsafe extern "C" fn trueno_random_walk_result_get_path_sizes(
    result: *const WalkResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, WalkResult::path_sizes) }
}

/// Destroy a walk result and null `*result`
///
/// # Safety
///
/// `result` must be null or point to a pointer that is null or was returned
/// by a node2vec entry point.
#[no_mangle]
pub unsafe extern "C" fn trueno_random_walk_result_free(result: *mut *mut WalkResult) {
    unsafe { release(result) };
}

/// Vertex ids
///
/// # Safety
///
/// `result` must be null or a live centrality result.
#[no_mangle]
pub unsafe extern "C" fn trueno_centrality_result_get_vertices(
    result: *const CentralityResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, CentralityResult::vertices) }
}

/// Per-vertex scores
///
/// # Safety
///
/// `result` must be null or a live centrality result.
#[no_mangle]
pub unsafe extern "C" fn trueno_centrality_result_get_values(
    result: *const CentralityResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, CentralityResult::values) }
}

/// Iterations performed (0 for null)
///
/// # Safety
///
/// `result` must be null or a live centrality result.
#[no_mangle]
pub unsafe extern "C" fn trueno_centrality_result_get_num_iterations(
    result: *const CentralityResult,
) -> usize {
    unsafe { result.as_ref() }.map_or(0, CentralityResult::num_iterations)
}

/// Whether the algorithm converged (false for null)
///
/// # Safety
///
/// `result` must be null or a live centrality result.
#[no_mangle]
pub unsafe extern "C" fn trueno_centrality_result_converged(
    result: *const CentralityResult,
) -> bool {
    unsafe { result.as_ref() }.is_some_and(CentralityResult::converged)
}

/// Destroy a centrality result and null `*result`
///
/// # Safety
///
/// `result` must be null or point to a pointer that is null or was returned
/// by a vertex centrality entry point.
#[no_mangle]
pub unsafe extern "C" fn trueno_centrality_result_free(result: *mut *mut CentralityResult) {
    unsafe { release(result) };
}

/// Edge sources
///
/// # Safety
///
/// `result` must be null or a live edge centrality result.
#[no_mangle]
pub unsafe extern "C" fn trueno_edge_centrality_result_get_src_vertices(
    result: *const EdgeCentralityResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, EdgeCentralityResult::src_vertices) }
}

/// Edge destinations
///
/// # Safety
///
/// `result` must be null or a live edge centrality result.
#[no_mangle]
pub unsafe extern "C" fn trueno_edge_centrality_result_get_dst_vertices(
    result: *const EdgeCentralityResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, EdgeCentralityResult::dst_vertices) }
}

/// Edge ids (`SIZE_T`)
///
/// # Safety
///
/// `result` must be null or a live edge centrality result.
#[no_mangle]
pub unsafe extern "C" fn trueno_edge_centrality_result_get_edge_ids(
    result: *const EdgeCentralityResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, EdgeCentralityResult::edge_ids) }
}

/// Per-edge scores
///
/// # Safety
///
/// `result` must be null or a live edge centrality result.
#[no_mangle]
pub unsafe extern "C" fn trueno_edge_centrality_result_get_values(
    result: *const EdgeCentralityResult,
) -> *mut DeviceArrayView {
    unsafe { view_of(result, EdgeCentralityResult::values) }
}

/// Destroy an edge centrality result and null `*result`
///
/// # Safety
///
/// `result` must be null or point to a pointer that is null or was returned
/// by [`trueno_edge_betweenness_centrality`].
///
/// [`trueno_edge_betweenness_centrality`]: super::algorithms::trueno_edge_betweenness_centrality
#[no_mangle]
pub unsafe extern "C" fn trueno_edge_centrality_result_free(
    result: *mut *mut EdgeCentralityResult,
) {
    unsafe { release(result) };
}
