//! Weighted `PageRank` by power iteration
//!
//! Based on Page et al. (1999) "The `PageRank` Citation Ranking: Bringing Order to the Web"

use super::{centrality_result, check_power_params, PowerIteration};
use crate::error::{Error, Result};
use crate::graph::{Graph, Orientation};
use crate::resource::ResourceHandle;
use crate::results::CentralityResult;
use crate::storage::CsrGraph;
use tracing::{info, warn};

/// Damping factor for `PageRank` (Google standard)
pub const DEFAULT_ALPHA: f64 = 0.85;

/// Compute `PageRank` scores on a host CSR
///
/// # Algorithm
///
/// `PageRank` formula:
/// ```text
/// PR(u) = (1-α)/N + α * Σ(PR(v) * w(v,u) / W(v)) + α * D/N
/// ```
///
/// Where:
/// - α = damping factor
/// - N = total number of nodes
/// - v = nodes with edges to u, W(v) = total out-weight of v
/// - D = rank held by dangling nodes (no positive out-weight)
///
/// Iteration stops when the L1 change drops below `epsilon` or after
/// `max_iterations` sweeps.
///
/// # Errors
///
/// Returns `InvalidInput` if `alpha ∉ (0, 1)`, `epsilon` is not positive,
/// `max_iterations` is 0, or a weight is negative
///
/// # Example
///
/// ```
/// use trueno_graph_capi::algorithms::pagerank_scores;
/// use trueno_graph_capi::storage::CsrGraph;
///
/// let graph = CsrGraph::from_edge_list(3, &[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0)]).unwrap();
///
/// let run = pagerank_scores(&graph, 0.85, 1e-6, 100).unwrap();
/// assert_eq!(run.scores.len(), 3);
/// assert!((run.scores.iter().sum::<f64>() - 1.0).abs() < 1e-9); // Sum = 1.0
/// assert!(run.converged);
/// ```
#[allow(clippy::cast_precision_loss)] // Graphs >2^52 nodes unlikely
pub fn pagerank_scores(
    graph: &CsrGraph,
    alpha: f64,
    epsilon: f64,
    max_iterations: usize,
) -> Result<PowerIteration> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(Error::invalid(format!("alpha must be in (0, 1), got {alpha}")));
    }
    check_power_params(epsilon, max_iterations)?;
    let (_, _, edge_weights, _) = graph.csr_components();
    if edge_weights.iter().any(|w| !(*w >= 0.0)) {
        return Err(Error::invalid("PageRank needs non-negative weights"));
    }

    let n = graph.num_nodes();
    if n == 0 {
        return Ok(PowerIteration::empty());
    }

    let teleport = (1.0 - alpha) / n as f64;

    // Initialize: uniform distribution
    let mut ranks = vec![1.0 / n as f64; n];
    let mut new_ranks = vec![0.0; n];

    // Out-weight for normalization (0 marks a dangling node)
    let out_weights: Vec<f64> = (0..n).map(|node| graph.out_weight_sum(node)).collect();

    let mut run = PowerIteration::default();
    for iteration in 0..max_iterations {
        // Dangling rank is spread over all nodes
        let dangling: f64 = (0..n)
            .filter(|&node| out_weights[node] <= 0.0)
            .map(|node| ranks[node])
            .sum();
        new_ranks.fill(teleport + alpha * dangling / n as f64);

        // Distribute rank from each node to its neighbors
        for node in 0..n {
            if out_weights[node] <= 0.0 {
                continue;
            }
            let share = alpha * ranks[node] / out_weights[node];
            let (targets, weights) = graph.outgoing(node);
            for (&target, &w) in targets.iter().zip(weights) {
                new_ranks[target] += share * w;
            }
        }

        // Check convergence (L1 norm)
        let diff: f64 = new_ranks
            .iter()
            .zip(&ranks)
            .map(|(a, b)| (a - b).abs())
            .sum();

        // Swap buffers
        std::mem::swap(&mut ranks, &mut new_ranks);
        run.num_iterations = iteration + 1;

        if diff < epsilon {
            run.converged = true;
            break;
        }
    }

    run.scores = ranks;
    Ok(run)
}

/// `PageRank` of every vertex of a device graph
///
/// Values are returned in the graph's weight type.
///
/// # Errors
///
/// See [`pagerank_scores`]; also `Allocation` if the result does not fit
pub fn pagerank(
    handle: &ResourceHandle,
    graph: &Graph,
    alpha: f64,
    epsilon: f64,
    max_iterations: usize,
) -> Result<CentralityResult> {
    let _op = handle.begin();
    let csr = graph.load_csr(handle, Orientation::Outgoing)?;
    let run = pagerank_scores(&csr, alpha, epsilon, max_iterations)?;

    if run.converged {
        info!(iterations = run.num_iterations, "PageRank converged");
    } else {
        warn!(max_iterations, "PageRank did not converge");
    }
    centrality_result(handle, graph, run)
}
