//! Algorithm entry points

use super::{arg, check_out, ffi_call, give};
use crate::algorithms::{self, Node2VecParams};
use crate::device::DeviceArrayView;
use crate::error::{ErrorReport, StatusCode};
use crate::graph::Graph;
use crate::resource::ResourceHandle;
use crate::results::{CentralityResult, EdgeCentralityResult, WalkResult};

/// node2vec random walks, one per seed
///
/// # Safety
///
/// Object pointers must be null or live objects of their type; `result_out`
/// must be valid for writes; `error` must be null or valid for writes.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn trueno_node2vec(
    handle: *const ResourceHandle,
    graph: *const Graph,
    seeds: *const DeviceArrayView,
    max_depth: usize,
    unbiased: bool,
    p: f64,
    q: f64,
    result_out: *mut *mut WalkResult,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    let params = Node2VecParams::new(max_depth, p, q).with_unbiased(unbiased);
    unsafe { trueno_node2vec_with_params(handle, graph, seeds, &params, result_out, error) }
}

/// node2vec random walks with explicit parameters (including packed output)
///
/// # Safety
///
/// Same as [`trueno_node2vec`]; `params` must be null or valid for reads.
#[no_mangle]
pub unsafe extern "C" fn trueno_node2vec_with_params(
    handle: *const ResourceHandle,
    graph: *const Graph,
    seeds: *const DeviceArrayView,
    params: *const Node2VecParams,
    result_out: *mut *mut WalkResult,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            check_out(result_out, "result_out")?;
            let result = algorithms::node2vec_with_params(
                arg(handle, "handle")?,
                arg(graph, "graph")?,
                arg(seeds, "seeds")?,
                arg(params, "params")?,
            )?;
            give(result_out, "result_out", result)
        })
    }
}

/// Weighted `PageRank`
///
/// # Safety
///
/// Same as [`trueno_node2vec`]
#[no_mangle]
pub unsafe extern "C" fn trueno_pagerank(
    handle: *const ResourceHandle,
    graph: *const Graph,
    alpha: f64,
    epsilon: f64,
    max_iterations: usize,
    result_out: *mut *mut CentralityResult,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            check_out(result_out, "result_out")?;
            let result = algorithms::pagerank(
                arg(handle, "handle")?,
                arg(graph, "graph")?,
                alpha,
                epsilon,
                max_iterations,
            )?;
            give(result_out, "result_out", result)
        })
    }
}

/// Eigenvector centrality
///
/// # Safety
///
/// Same as [`trueno_node2vec`]
#[no_mangle]
pub unsafe extern "C" fn trueno_eigenvector_centrality(
    handle: *const ResourceHandle,
    graph: *const Graph,
    epsilon: f64,
    max_iterations: usize,
    result_out: *mut *mut CentralityResult,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            check_out(result_out, "result_out")?;
            let result = algorithms::eigenvector_centrality(
                arg(handle, "handle")?,
                arg(graph, "graph")?,
                epsilon,
                max_iterations,
            )?;
            give(result_out, "result_out", result)
        })
    }
}

/// Edge betweenness centrality
///
/// # Safety
///
/// Same as [`trueno_node2vec`]
#[no_mangle]
pub unsafe extern "C" fn trueno_edge_betweenness_centrality(
    handle: *const ResourceHandle,
    graph: *const Graph,
    normalized: bool,
    result_out: *mut *mut EdgeCentralityResult,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            check_out(result_out, "result_out")?;
            let result = algorithms::edge_betweenness_centrality(
                arg(handle, "handle")?,
                arg(graph, "graph")?,
                normalized,
            )?;
            give(result_out, "result_out", result)
        })
    }
}
