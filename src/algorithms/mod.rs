//! Graph algorithms (node2vec walks, `PageRank`, eigenvector and edge betweenness centrality)
//!
//! Each algorithm has a host kernel over a [`CsrGraph`](crate::storage::CsrGraph)
//! and a device entry point that downloads the graph, runs the kernel and
//! uploads the result.

pub mod betweenness;
pub mod eigenvector;
pub mod node2vec;
pub mod pagerank;

pub use betweenness::{edge_betweenness_centrality, edge_betweenness_scores};
pub use eigenvector::{eigenvector_centrality, eigenvector_scores};
pub use node2vec::{node2vec, node2vec_with_params, random_walks, Node2VecParams, Walk};
pub use pagerank::{pagerank, pagerank_scores, DEFAULT_ALPHA};

use crate::device::{DeviceArray, HostData};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::resource::ResourceHandle;
use crate::results::{CentralityMetadata, CentralityResult};

/// Outcome of a power-iteration kernel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PowerIteration {
    /// Score per vertex
    pub scores: Vec<f64>,
    /// Sweeps performed
    pub num_iterations: usize,
    /// Whether the tolerance was reached
    pub converged: bool,
}

impl PowerIteration {
    /// Result for a graph without vertices
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            scores: Vec::new(),
            num_iterations: 0,
            converged: true,
        }
    }
}

fn check_power_params(epsilon: f64, max_iterations: usize) -> Result<()> {
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(Error::invalid(format!(
            "epsilon must be finite and positive, got {epsilon}"
        )));
    }
    if max_iterations == 0 {
        return Err(Error::invalid("max_iterations must be at least 1"));
    }
    Ok(())
}

/// Upload `(vertex ids, scores)` in the graph's vertex and weight types
fn centrality_result(
    handle: &ResourceHandle,
    graph: &Graph,
    run: PowerIteration,
) -> Result<CentralityResult> {
    let n = i64::try_from(graph.num_vertices())
        .map_err(|_| Error::invalid("vertex count overflows INT64"))?;
    let vertices = HostData::vertices(graph.vertex_type(), 0..n)?;
    let values = HostData::weights(graph.weight_type(), run.scores)?;

    Ok(CentralityResult::new(
        [
            DeviceArray::from_host_data(handle, &vertices)?,
            DeviceArray::from_host_data(handle, &values)?,
        ],
        CentralityMetadata {
            num_iterations: run.num_iterations,
            converged: run.converged,
        },
    ))
}
