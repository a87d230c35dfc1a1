//! C ABI conformance tests
//!
//! Drives the library only through `trueno_*` functions, the way a foreign
//! caller would: create a handle, stage host arrays through device arrays,
//! build a graph, run an algorithm and copy the results back.

use std::ffi::{c_int, CStr};
use std::ptr;
use trueno_graph_capi::capi::algorithms::*;
use trueno_graph_capi::capi::array::*;
use trueno_graph_capi::capi::error::*;
use trueno_graph_capi::capi::graph::*;
use trueno_graph_capi::capi::resource::*;
use trueno_graph_capi::capi::results::*;
use trueno_graph_capi::{
    DeviceArray, DeviceArrayView, ErrorReport, Graph, GraphProperties, Node2VecParams,
    ResourceHandle, StatusCode, TypeTag,
};

const INT32: c_int = TypeTag::Int32 as c_int;
const FLOAT32: c_int = TypeTag::Float32 as c_int;
const SIZE_T: c_int = TypeTag::SizeT as c_int;

// ============================================================================
// HELPERS
// ============================================================================

/// Panic with the report's message if `status` is not `SUCCESS`
fn check(status: StatusCode, error: &mut *mut ErrorReport, what: &str) {
    if status != StatusCode::Success {
        let message = unsafe { CStr::from_ptr(trueno_error_message(*error)) }
            .to_string_lossy()
            .into_owned();
        unsafe { trueno_error_free(error) };
        panic!("{what} failed with {status}: {message}");
    }
}

/// Host array staged on the device: the owning array plus a view of it
struct Staged {
    array: *mut DeviceArray,
    view: *mut DeviceArrayView,
}

impl Staged {
    fn new<T: Copy>(handle: *mut ResourceHandle, dtype: c_int, data: &[T]) -> Self {
        let mut array = ptr::null_mut();
        let mut error = ptr::null_mut();
        unsafe {
            let status = trueno_type_erased_device_array_create(
                handle,
                data.len(),
                dtype,
                &mut array,
                &mut error,
            );
            check(status, &mut error, "array create");

            let view = trueno_type_erased_device_array_view(array);
            let status = trueno_type_erased_device_array_view_copy_from_host(
                handle,
                view,
                data.as_ptr().cast(),
                &mut error,
            );
            check(status, &mut error, "copy_from_host");
            Self { array, view }
        }
    }

    fn free(mut self) {
        unsafe {
            trueno_type_erased_device_array_view_free(&mut self.view);
            trueno_type_erased_device_array_free(&mut self.array);
        }
    }
}

/// Copy a view into a new host vector and free the view
fn download<T: Copy + Default>(
    handle: *mut ResourceHandle,
    mut view: *mut DeviceArrayView,
) -> Vec<T> {
    let mut error = ptr::null_mut();
    unsafe {
        let len = trueno_type_erased_device_array_view_size(view);
        let mut host = vec![T::default(); len];
        let status = trueno_type_erased_device_array_view_copy_to_host(
            handle,
            host.as_mut_ptr().cast(),
            view,
            &mut error,
        );
        check(status, &mut error, "copy_to_host");
        trueno_type_erased_device_array_view_free(&mut view);
        host
    }
}

fn create_handle() -> *mut ResourceHandle {
    let mut handle = ptr::null_mut();
    let mut error = ptr::null_mut();
    let status = unsafe { trueno_create_resource_handle(&mut handle, &mut error) };
    check(status, &mut error, "create handle");
    handle
}

fn create_graph(
    handle: *mut ResourceHandle,
    src: &[i32],
    dst: &[i32],
    weights: &[f32],
    store_transposed: bool,
) -> *mut Graph {
    let src = Staged::new(handle, INT32, src);
    let dst = Staged::new(handle, INT32, dst);
    let wgt = Staged::new(handle, FLOAT32, weights);

    let properties = GraphProperties::default();
    let mut graph = ptr::null_mut();
    let mut error = ptr::null_mut();
    let status = unsafe {
        trueno_sg_graph_create(
            handle,
            &properties,
            src.view,
            dst.view,
            wgt.view,
            weights.len(),
            store_transposed,
            true,
            &mut graph,
            &mut error,
        )
    };
    check(status, &mut error, "graph create");

    // The graph keeps its own copy of the edges
    src.free();
    dst.free();
    wgt.free();
    graph
}

/// The 8-edge reference graph
///
/// ```text
/// 2 → 0 → 1 → 3 → 5
/// 2 → 1 → 4 → 5
/// 2 → 3
/// ```
const SRC: [i32; 8] = [0, 1, 1, 2, 2, 2, 3, 4];
const DST: [i32; 8] = [1, 3, 4, 0, 1, 3, 5, 5];
const WGT: [f32; 8] = [0.1, 2.1, 1.1, 5.1, 3.1, 4.1, 7.2, 3.2];
const NUM_VERTICES: usize = 6;

/// Dense weight lookup built straight from the edge list
fn dense_weights() -> [[f32; NUM_VERTICES]; NUM_VERTICES] {
    let mut matrix = [[0.0; NUM_VERTICES]; NUM_VERTICES];
    for ((&s, &d), &w) in SRC.iter().zip(&DST).zip(&WGT) {
        matrix[s as usize][d as usize] = w;
    }
    matrix
}

// ============================================================================
// NODE2VEC
// ============================================================================

fn run_node2vec(seeds: &[i32], max_depth: usize, p: f64, q: f64) -> (Vec<i32>, Vec<f32>, usize) {
    let handle = create_handle();
    let graph = create_graph(handle, &SRC, &DST, &WGT, false);
    let seeds = Staged::new(handle, INT32, seeds);

    let mut result = ptr::null_mut();
    let mut error = ptr::null_mut();
    unsafe {
        let status = trueno_node2vec(
            handle,
            graph,
            seeds.view,
            max_depth,
            false,
            p,
            q,
            &mut result,
            &mut error,
        );
        check(status, &mut error, "node2vec");

        let max_path_length = trueno_random_walk_result_get_max_path_length(result);
        let paths = download::<i32>(handle, trueno_random_walk_result_get_paths(result));
        let weights = download::<f32>(handle, trueno_random_walk_result_get_weights(result));

        let mut result = result;
        let mut graph = graph;
        let mut handle = handle;
        trueno_random_walk_result_free(&mut result);
        seeds.free();
        trueno_graph_free(&mut graph);
        trueno_free_resource_handle(&mut handle);

        (paths, weights, max_path_length)
    }
}

#[test]
fn test_node2vec_weights_match_graph() {
    let (paths, weights, max_path_length) = run_node2vec(&[0, 0], 4, 0.8, 0.5);
    let matrix = dense_weights();

    assert_eq!(max_path_length, 4);
    assert_eq!(paths.len(), 2 * max_path_length);
    assert_eq!(weights.len(), 2 * (max_path_length - 1));

    for walk in 0..2 {
        let path = &paths[walk * max_path_length..(walk + 1) * max_path_length];
        let steps = &weights[walk * (max_path_length - 1)..(walk + 1) * (max_path_length - 1)];
        assert_eq!(path[0], 0, "walk {walk} must start at its seed");

        for (i, &w) in steps.iter().enumerate() {
            let (from, to) = (path[i], path[i + 1]);
            if to == i32::MAX {
                // Past a dead end: sentinel vertices, zero weights
                assert_eq!(w, 0.0);
                continue;
            }
            let expected = matrix[from as usize][to as usize];
            assert!(expected > 0.0, "walk {walk} step {i}: {from} -> {to} is not an edge");
            assert_eq!(w, expected, "walk {walk} step {i}: {from} -> {to}");
        }
    }
}

#[test]
fn test_node2vec_reference_walk_shape() {
    // From 0 every walk is 0 → 1 → {3, 4} → 5
    let (paths, weights, _) = run_node2vec(&[0, 0], 4, 0.8, 0.5);
    for walk in paths.chunks(4) {
        assert_eq!(walk[0], 0);
        assert_eq!(walk[1], 1);
        assert!(walk[2] == 3 || walk[2] == 4);
        assert_eq!(walk[3], 5);
    }
    assert!(weights.iter().all(|&w| w > 0.0));
}

#[test]
fn test_node2vec_dead_end_padding() {
    // 5 has no out-edges
    let (paths, weights, _) = run_node2vec(&[5, 3], 4, 1.0, 1.0);
    assert_eq!(paths, vec![5, i32::MAX, i32::MAX, i32::MAX, 3, 5, i32::MAX, i32::MAX]);
    assert_eq!(weights, vec![0.0, 0.0, 0.0, 7.2, 0.0, 0.0]);
}

#[test]
fn test_node2vec_compressed_with_path_sizes() {
    let handle = create_handle();
    let mut graph = create_graph(handle, &SRC, &DST, &WGT, false);
    let seeds = Staged::new(handle, INT32, &[5_i32, 3, 0]);
    let params = Node2VecParams::new(4, 1.0, 1.0).with_compress_result(true);

    let mut result = ptr::null_mut();
    let mut error = ptr::null_mut();
    unsafe {
        let status = trueno_node2vec_with_params(
            handle,
            graph,
            seeds.view,
            &params,
            &mut result,
            &mut error,
        );
        check(status, &mut error, "node2vec_with_params");

        let sizes_view = trueno_random_walk_result_get_path_sizes(result);
        assert_eq!(trueno_type_erased_device_array_view_type(sizes_view), SIZE_T);
        let sizes = download::<u64>(handle, sizes_view);
        let paths = download::<i32>(handle, trueno_random_walk_result_get_paths(result));
        let weights = download::<f32>(handle, trueno_random_walk_result_get_weights(result));

        assert_eq!(sizes, vec![1, 2, 4]);
        assert_eq!(paths.len(), 7);
        assert_eq!(&paths[..3], &[5, 3, 5]);
        // One weight per step: 0 + 1 + 3
        assert_eq!(weights.len(), 4);
        assert_eq!(weights[0], 7.2);

        trueno_random_walk_result_free(&mut result);
        seeds.free();
        trueno_graph_free(&mut graph);
        let mut handle = handle;
        trueno_free_resource_handle(&mut handle);
    }
}

#[test]
fn test_node2vec_invalid_parameters() {
    let handle = create_handle();
    let mut graph = create_graph(handle, &SRC, &DST, &WGT, false);
    let seeds = Staged::new(handle, INT32, &[0_i32]);
    let bad_seeds = Staged::new(handle, INT32, &[42_i32]);

    let cases = [
        (seeds.view, 0, 1.0, 1.0),
        (seeds.view, 4, 0.0, 1.0),
        (seeds.view, 4, 1.0, -0.5),
        (bad_seeds.view, 4, 1.0, 1.0),
    ];
    for (seed_view, max_depth, p, q) in cases {
        let mut result = ptr::null_mut();
        let mut error = ptr::null_mut();
        let status = unsafe {
            trueno_node2vec(
                handle,
                graph,
                seed_view,
                max_depth,
                false,
                p,
                q,
                &mut result,
                &mut error,
            )
        };
        assert_eq!(status, StatusCode::InvalidInput);
        assert!(result.is_null());
        assert_eq!(unsafe { trueno_error_code(error) }, StatusCode::InvalidInput);
        unsafe { trueno_error_free(&mut error) };
    }

    seeds.free();
    bad_seeds.free();
    unsafe {
        trueno_graph_free(&mut graph);
        let mut handle = handle;
        trueno_free_resource_handle(&mut handle);
    }
}

#[test]
fn test_node2vec_oversized_walks_are_allocation_errors() {
    let mut handle = ptr::null_mut();
    let mut error = ptr::null_mut();
    let status = unsafe {
        trueno_create_resource_handle_with_config(false, 1 << 26, 7, &mut handle, &mut error)
    };
    check(status, &mut error, "create handle");
    let mut graph = create_graph(handle, &SRC, &DST, &WGT, false);
    let seeds = Staged::new(handle, INT32, &[0_i32, 2]);

    // Overflowing and merely enormous output sizes both come back as a status
    for max_depth in [usize::MAX, 1 << 42] {
        let mut result = ptr::null_mut();
        let mut error = ptr::null_mut();
        let status = unsafe {
            trueno_node2vec(
                handle,
                graph,
                seeds.view,
                max_depth,
                false,
                1.0,
                1.0,
                &mut result,
                &mut error,
            )
        };
        assert_eq!(status, StatusCode::AllocationError, "max_depth = {max_depth}");
        assert!(result.is_null());
        assert_eq!(unsafe { trueno_error_code(error) }, StatusCode::AllocationError);
        unsafe { trueno_error_free(&mut error) };
    }

    seeds.free();
    unsafe {
        trueno_graph_free(&mut graph);
        trueno_free_resource_handle(&mut handle);
    }
}

// ============================================================================
// GRAPH CONSTRUCTION
// ============================================================================

#[test]
fn test_mismatched_lengths_produce_no_graph() {
    let mut handle = create_handle();
    let src = Staged::new(handle, INT32, &SRC);
    let dst = Staged::new(handle, INT32, &DST[..7]);
    let wgt = Staged::new(handle, FLOAT32, &WGT);

    let mut graph = ptr::null_mut();
    let mut error = ptr::null_mut();
    let status = unsafe {
        trueno_sg_graph_create(
            handle,
            ptr::null(),
            src.view,
            dst.view,
            wgt.view,
            8,
            false,
            false,
            &mut graph,
            &mut error,
        )
    };

    assert_eq!(status, StatusCode::InvalidInput);
    assert!(graph.is_null());
    assert!(!error.is_null());
    let message = unsafe { CStr::from_ptr(trueno_error_message(error)) };
    assert!(message.to_string_lossy().contains("num_edges"));

    unsafe {
        trueno_error_free(&mut error);
        assert!(error.is_null());
        // Freeing the null graph slot is harmless
        trueno_graph_free(&mut graph);
    }
    src.free();
    dst.free();
    wgt.free();
    unsafe { trueno_free_resource_handle(&mut handle) };
}

#[test]
fn test_out_of_budget_vertex_ids_produce_no_graph() {
    let mut handle = ptr::null_mut();
    let mut error = ptr::null_mut();
    let status = unsafe {
        trueno_create_resource_handle_with_config(false, 1 << 26, 7, &mut handle, &mut error)
    };
    check(status, &mut error, "create handle");

    let cases = [
        (i32::MAX - 1, StatusCode::AllocationError),
        (i32::MAX, StatusCode::InvalidInput),
    ];
    for (id, expected) in cases {
        let src = Staged::new(handle, INT32, &[0_i32]);
        let dst = Staged::new(handle, INT32, &[id]);
        let wgt = Staged::new(handle, FLOAT32, &[1.0_f32]);
        let in_use = unsafe { &*handle }.bytes_in_use();

        let mut graph = ptr::null_mut();
        let mut error = ptr::null_mut();
        let status = unsafe {
            trueno_sg_graph_create(
                handle,
                ptr::null(),
                src.view,
                dst.view,
                wgt.view,
                1,
                false,
                false,
                &mut graph,
                &mut error,
            )
        };

        assert_eq!(status, expected, "vertex id {id}");
        assert!(graph.is_null());
        assert_eq!(unsafe { &*handle }.bytes_in_use(), in_use);
        unsafe { trueno_error_free(&mut error) };
        src.free();
        dst.free();
        wgt.free();
    }
    unsafe { trueno_free_resource_handle(&mut handle) };
}

#[test]
fn test_double_free_is_noop() {
    let mut handle = create_handle();
    let mut graph = create_graph(handle, &SRC, &DST, &WGT, true);
    assert_eq!(unsafe { trueno_graph_num_vertices(graph) }, NUM_VERTICES);
    assert_eq!(unsafe { trueno_graph_num_edges(graph) }, 8);

    unsafe {
        trueno_graph_free(&mut graph);
        assert!(graph.is_null());
        trueno_graph_free(&mut graph);
        trueno_free_resource_handle(&mut handle);
        trueno_free_resource_handle(&mut handle);
        trueno_graph_free(ptr::null_mut());
    }
}

#[test]
fn test_result_views_expire_with_result() {
    let mut handle = create_handle();
    let mut graph = create_graph(handle, &SRC, &DST, &WGT, false);

    let mut result = ptr::null_mut();
    let mut error = ptr::null_mut();
    unsafe {
        let status = trueno_pagerank(handle, graph, 0.85, 1e-6, 100, &mut result, &mut error);
        check(status, &mut error, "pagerank");

        let mut values = trueno_centrality_result_get_values(result);
        trueno_centrality_result_free(&mut result);

        let mut host = [0.0_f32; NUM_VERTICES];
        let status = trueno_type_erased_device_array_view_copy_to_host(
            handle,
            host.as_mut_ptr().cast(),
            values,
            &mut error,
        );
        assert_eq!(status, StatusCode::InvalidInput);
        trueno_error_free(&mut error);

        trueno_type_erased_device_array_view_free(&mut values);
        trueno_graph_free(&mut graph);
        trueno_free_resource_handle(&mut handle);
    }
}

// ============================================================================
// CENTRALITY
// ============================================================================

#[test]
fn test_pagerank_result() {
    let mut handle = create_handle();
    let mut graph = create_graph(handle, &SRC, &DST, &WGT, false);

    let mut result = ptr::null_mut();
    let mut error = ptr::null_mut();
    unsafe {
        let status = trueno_pagerank(handle, graph, 0.85, 1e-6, 100, &mut result, &mut error);
        check(status, &mut error, "pagerank");

        assert!(trueno_centrality_result_converged(result));
        assert!(trueno_centrality_result_get_num_iterations(result) > 0);

        let vertices = download::<i32>(handle, trueno_centrality_result_get_vertices(result));
        let values = download::<f32>(handle, trueno_centrality_result_get_values(result));
        assert_eq!(vertices, vec![0, 1, 2, 3, 4, 5]);
        assert!((values.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        // 5 collects from 3 and 4
        let top = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(v, _)| v);
        assert_eq!(top, Some(5));

        trueno_centrality_result_free(&mut result);
        trueno_graph_free(&mut graph);
        trueno_free_resource_handle(&mut handle);
    }
}

#[test]
fn test_pagerank_invalid_alpha() {
    let mut handle = create_handle();
    let mut graph = create_graph(handle, &SRC, &DST, &WGT, false);

    let mut result = ptr::null_mut();
    let mut error = ptr::null_mut();
    unsafe {
        let status = trueno_pagerank(handle, graph, 1.5, 1e-6, 100, &mut result, &mut error);
        assert_eq!(status, StatusCode::InvalidInput);
        assert!(result.is_null());
        trueno_error_free(&mut error);
        trueno_graph_free(&mut graph);
        trueno_free_resource_handle(&mut handle);
    }
}

#[test]
fn test_eigenvector_centrality_from_transposed_storage() {
    let mut handle = create_handle();
    // Undirected triangle 0 - 1 - 2 plus pendant 3 on vertex 0
    let src = [0, 1, 1, 2, 2, 0, 0, 3];
    let dst = [1, 0, 2, 1, 0, 2, 3, 0];
    let mut graph = create_graph(handle, &src, &dst, &[1.0; 8], true);

    let mut result = ptr::null_mut();
    let mut error = ptr::null_mut();
    unsafe {
        let status =
            trueno_eigenvector_centrality(handle, graph, 1e-6, 500, &mut result, &mut error);
        check(status, &mut error, "eigenvector_centrality");
        assert!(trueno_centrality_result_converged(result));

        let values = download::<f32>(handle, trueno_centrality_result_get_values(result));
        assert!(values[0] > values[1]);
        assert!((values[1] - values[2]).abs() < 1e-4);
        assert!(values[3] < values[1]);

        trueno_centrality_result_free(&mut result);
        trueno_graph_free(&mut graph);
        trueno_free_resource_handle(&mut handle);
    }
}

#[test]
fn test_edge_betweenness_result() {
    let mut handle = create_handle();
    // Path 0 → 1 → 2, edges given out of order
    let mut graph = create_graph(handle, &[1, 0], &[2, 1], &[1.0, 1.0], false);

    let mut result = ptr::null_mut();
    let mut error = ptr::null_mut();
    unsafe {
        let status =
            trueno_edge_betweenness_centrality(handle, graph, false, &mut result, &mut error);
        check(status, &mut error, "edge_betweenness_centrality");

        let src = download::<i32>(handle, trueno_edge_centrality_result_get_src_vertices(result));
        let dst = download::<i32>(handle, trueno_edge_centrality_result_get_dst_vertices(result));
        let ids = download::<u64>(handle, trueno_edge_centrality_result_get_edge_ids(result));
        let values = download::<f32>(handle, trueno_edge_centrality_result_get_values(result));

        assert_eq!(src, vec![1, 0]);
        assert_eq!(dst, vec![2, 1]);
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(values, vec![2.0, 2.0]);

        trueno_edge_centrality_result_free(&mut result);
        trueno_edge_centrality_result_free(&mut result);
        trueno_graph_free(&mut graph);
        trueno_free_resource_handle(&mut handle);
    }
}
