//! Eigenvector centrality by power iteration
//!
//! A vertex is central when central vertices point at it. Each sweep computes
//! `x' = x + Aᵀx` over the weighted in-edges and normalizes to unit L2 length;
//! adding `x` shifts the spectrum so bipartite graphs still converge.

use super::{centrality_result, check_power_params, PowerIteration};
use crate::error::Result;
use crate::graph::{Graph, Orientation};
use crate::resource::ResourceHandle;
use crate::results::CentralityResult;
use crate::storage::CsrGraph;
use tracing::{info, warn};

/// Compute eigenvector centrality on a host graph of **in-edges**
///
/// `incoming.outgoing(v)` must list the sources of edges into `v` (a CSC, as
/// returned by [`CsrGraph::transpose`]). Converges when the L1 change of a
/// sweep is below `n × epsilon`.
///
/// # Errors
///
/// Returns `InvalidInput` if `epsilon` is not positive or `max_iterations` is 0
#[allow(clippy::cast_precision_loss)]
pub fn eigenvector_scores(
    incoming: &CsrGraph,
    epsilon: f64,
    max_iterations: usize,
) -> Result<PowerIteration> {
    check_power_params(epsilon, max_iterations)?;

    let n = incoming.num_nodes();
    if n == 0 {
        return Ok(PowerIteration::empty());
    }

    let tolerance = n as f64 * epsilon;
    let mut x = vec![1.0 / n as f64; n];
    let mut next = vec![0.0; n];
    let mut run = PowerIteration::default();

    for iteration in 0..max_iterations {
        for (v, slot) in next.iter_mut().enumerate() {
            let (sources, weights) = incoming.outgoing(v);
            *slot = x[v]
                + sources
                    .iter()
                    .zip(weights)
                    .map(|(&u, &w)| w * x[u])
                    .sum::<f64>();
        }

        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut next {
                *v /= norm;
            }
        }

        let diff: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut x, &mut next);
        run.num_iterations = iteration + 1;

        if diff < tolerance {
            run.converged = true;
            break;
        }
    }

    run.scores = x;
    Ok(run)
}

/// Eigenvector centrality of every vertex of a device graph
///
/// Uses in-edges; a graph stored with `store_transposed = true` avoids a
/// transpose on download.
///
/// # Errors
///
/// See [`eigenvector_scores`]; also `Allocation` if the result does not fit
pub fn eigenvector_centrality(
    handle: &ResourceHandle,
    graph: &Graph,
    epsilon: f64,
    max_iterations: usize,
) -> Result<CentralityResult> {
    let _op = handle.begin();
    check_power_params(epsilon, max_iterations)?;
    let incoming = graph.load_csr(handle, Orientation::Incoming)?;
    let run = eigenvector_scores(&incoming, epsilon, max_iterations)?;

    if run.converged {
        info!(iterations = run.num_iterations, "eigenvector centrality converged");
    } else {
        warn!(max_iterations, "eigenvector centrality did not converge");
    }
    centrality_result(handle, graph, run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(n: usize, edges: &[(usize, usize, f64)]) -> CsrGraph {
        CsrGraph::from_edge_list(n, edges).unwrap().transpose().unwrap()
    }

    #[test]
    fn test_symmetric_cycle_is_uniform() {
        let graph = incoming(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)]);
        let run = eigenvector_scores(&graph, 1e-9, 100).unwrap();
        assert!(run.converged);
        for score in &run.scores {
            assert!((score - 0.5).abs() < 1e-6, "score = {score}");
        }
    }

    #[test]
    fn test_unit_length() {
        let graph = incoming(3, &[(0, 1, 1.0), (1, 0, 1.0), (1, 2, 2.0), (2, 1, 2.0)]);
        let run = eigenvector_scores(&graph, 1e-9, 500).unwrap();
        let norm: f64 = run.scores.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        // Vertex 1 is the hub of the path 0 - 1 - 2
        assert!(run.scores[1] > run.scores[0]);
        assert!(run.scores[1] > run.scores[2]);
    }

    #[test]
    fn test_star_hub_dominates() {
        // Undirected star around 0
        let mut edges = Vec::new();
        for leaf in 1..6 {
            edges.push((0, leaf, 1.0));
            edges.push((leaf, 0, 1.0));
        }
        let run = eigenvector_scores(&incoming(6, &edges), 1e-9, 500).unwrap();
        assert!(run.converged);
        for leaf in 1..6 {
            assert!(run.scores[0] > run.scores[leaf]);
        }
    }

    #[test]
    fn test_iteration_limit() {
        let graph = incoming(3, &[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 5.0)]);
        let run = eigenvector_scores(&graph, 1e-15, 2).unwrap();
        assert_eq!(run.num_iterations, 2);
        assert!(!run.converged);
    }

    #[test]
    fn test_invalid_params() {
        let graph = incoming(2, &[(0, 1, 1.0)]);
        assert!(eigenvector_scores(&graph, -1.0, 10).is_err());
        assert!(eigenvector_scores(&graph, 1e-6, 0).is_err());
    }
}
