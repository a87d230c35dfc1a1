//! Edge betweenness centrality
//!
//! Based on Brandes (2001) "A Faster Algorithm for Betweenness Centrality".
//! Shortest paths are unweighted (hop count). Parallel edges are distinct
//! paths and each receives its own share.

use crate::device::{DeviceArray, HostData};
use crate::error::Result;
use crate::graph::{Graph, Orientation};
use crate::resource::ResourceHandle;
use crate::results::{EdgeCentralityResult, ResultSet};
use crate::storage::CsrGraph;
use rayon::prelude::*;
use std::collections::VecDeque;
use tracing::info;

/// Betweenness of every edge, indexed by edge id
///
/// Scores count ordered `(s, t)` pairs. With `normalized` they are divided
/// by `n(n − 1)`.
///
/// # Example
///
/// ```
/// use trueno_graph_capi::algorithms::edge_betweenness_scores;
/// use trueno_graph_capi::storage::CsrGraph;
///
/// // Path 0 → 1 → 2
/// let graph = CsrGraph::from_edge_list(3, &[(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
/// let scores = edge_betweenness_scores(&graph, false, false);
/// assert_eq!(scores, vec![2.0, 2.0]); // (0,1),(0,2) and (0,2),(1,2)
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn edge_betweenness_scores(graph: &CsrGraph, normalized: bool, parallel: bool) -> Vec<f64> {
    let n = graph.num_nodes();
    let m = graph.num_edges();

    let mut scores = if parallel {
        (0..n)
            .into_par_iter()
            .fold(
                || vec![0.0; m],
                |mut acc, source| {
                    accumulate(graph, source, &mut acc);
                    acc
                },
            )
            .reduce(
                || vec![0.0; m],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    a
                },
            )
    } else {
        let mut acc = vec![0.0; m];
        for source in 0..n {
            accumulate(graph, source, &mut acc);
        }
        acc
    };

    if normalized && n > 1 {
        let scale = (n * (n - 1)) as f64;
        for s in &mut scores {
            *s /= scale;
        }
    }
    scores
}

/// Single-source BFS plus dependency accumulation into `scores`
#[allow(clippy::cast_precision_loss)]
fn accumulate(graph: &CsrGraph, source: usize, scores: &mut [f64]) {
    let n = graph.num_nodes();
    let mut distance = vec![usize::MAX; n];
    let mut sigma = vec![0.0_f64; n];
    // (predecessor, edge id) for each shortest-path edge into a vertex
    let mut preds: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::new();

    distance[source] = 0;
    sigma[source] = 1.0;
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        order.push(v);
        let (targets, _) = graph.outgoing(v);
        for (&w, &id) in targets.iter().zip(graph.outgoing_edge_ids(v)) {
            if distance[w] == usize::MAX {
                distance[w] = distance[v] + 1;
                queue.push_back(w);
            }
            if distance[w] == distance[v] + 1 {
                sigma[w] += sigma[v];
                preds[w].push((v, id));
            }
        }
    }

    let mut delta = vec![0.0_f64; n];
    for &w in order.iter().rev() {
        for &(v, id) in &preds[w] {
            let share = sigma[v] / sigma[w] * (1.0 + delta[w]);
            scores[id] += share;
            delta[v] += share;
        }
    }
}

/// Edge betweenness of a device graph
///
/// One row per input edge, ordered by edge id (the edge's position in the
/// arrays passed to [`Graph::create`]).
///
/// # Errors
///
/// Returns `Allocation` if the result does not fit in device memory
pub fn edge_betweenness_centrality(
    handle: &ResourceHandle,
    graph: &Graph,
    normalized: bool,
) -> Result<EdgeCentralityResult> {
    let _op = handle.begin();
    let csr = graph.load_csr(handle, Orientation::Outgoing)?;
    let scores = edge_betweenness_scores(&csr, normalized, handle.config().parallel);

    // Reorder endpoints from CSR slots to edge ids
    let m = csr.num_edges();
    let mut src = vec![0_i64; m];
    let mut dst = vec![0_i64; m];
    for (s, d, _, id) in csr.edges() {
        src[id] = i64::try_from(s).unwrap_or(i64::MAX);
        dst[id] = i64::try_from(d).unwrap_or(i64::MAX);
    }
    let ids: Vec<u64> = (0..m as u64).collect();

    let result = ResultSet::new(
        [
            DeviceArray::from_host_data(handle, &HostData::vertices(graph.vertex_type(), src)?)?,
            DeviceArray::from_host_data(handle, &HostData::vertices(graph.vertex_type(), dst)?)?,
            DeviceArray::from_host(handle, &ids)?,
            DeviceArray::from_host_data(handle, &HostData::weights(graph.weight_type(), scores)?)?,
        ],
        (),
    );
    info!(num_edges = m, normalized, "edge betweenness complete");
    Ok(result)
}
