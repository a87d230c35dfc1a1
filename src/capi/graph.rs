//! Graph construction

use super::{arg, check_out, ffi_call, give, release};
use crate::device::DeviceArrayView;
use crate::error::{ErrorReport, StatusCode};
use crate::graph::{Graph, GraphProperties};
use crate::resource::ResourceHandle;

/// Build a single-GPU graph from edge-list views
///
/// `weights` may be null (all weights 1.0, `FLOAT32`). `properties` may be
/// null (not symmetric, not a multigraph). On failure `*graph_out` is left
/// untouched and no device memory is retained.
///
/// # Safety
///
/// Object pointers must be null or live objects of their type; `graph_out`
/// must be valid for writes; `error` must be null or valid for writes.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn trueno_sg_graph_create(
    handle: *const ResourceHandle,
    properties: *const GraphProperties,
    src: *const DeviceArrayView,
    dst: *const DeviceArrayView,
    weights: *const DeviceArrayView,
    num_edges: usize,
    store_transposed: bool,
    do_expensive_check: bool,
    graph_out: *mut *mut Graph,
    error: *mut *mut ErrorReport,
) -> StatusCode {
    unsafe {
        ffi_call(error, || {
            check_out(graph_out, "graph_out")?;
            let handle = arg(handle, "handle")?;
            let properties = properties.as_ref().copied().unwrap_or_default();
            let graph = Graph::create(
                handle,
                &properties,
                arg(src, "src")?,
                arg(dst, "dst")?,
                weights.as_ref(),
                num_edges,
                store_transposed,
                do_expensive_check,
            )?;
            give(graph_out, "graph_out", graph)
        })
    }
}

/// Destroy a graph and null `*graph`
///
/// # Safety
///
/// `graph` must be null or point to a pointer that is null or was returned by
/// [`trueno_sg_graph_create`].
#[no_mangle]
pub unsafe extern "C" fn trueno_graph_free(graph: *mut *mut Graph) {
    unsafe { release(graph) };
}

/// Number of vertices of a graph (0 for null)
///
/// # Safety
///
/// `graph` must be null or a live graph.
#[no_mangle]
pub unsafe extern "C" fn trueno_graph_num_vertices(graph: *const Graph) -> usize {
    unsafe { graph.as_ref() }.map_or(0, Graph::num_vertices)
}

/// Number of edges of a graph (0 for null)
///
/// # Safety
///
/// `graph` must be null or a live graph.
#[no_mangle]
pub unsafe extern "C" fn trueno_graph_num_edges(graph: *const Graph) -> usize {
    unsafe { graph.as_ref() }.map_or(0, Graph::num_edges)
}
