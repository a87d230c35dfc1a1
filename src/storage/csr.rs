//! CSR (Compressed Sparse Row) adjacency used by the algorithm engine
//!
//! Based on `GraphBLAST` (Yang et al., ACM `ToMS` 2022) for GPU-optimized sparse matrix operations.
//!
//! # CSR Format
//!
//! ```text
//! Edges (input order): 0 → 2 (w=0.5), 0 → 1 (w=1.0), 1 → 2 (w=2.0)
//!
//! CSR:
//!   row_offsets:  [0, 2, 3, 3]     // Node 0: slots [0..2), Node 1: [2..3), Node 2: [3..3)
//!   col_indices:  [1, 2, 2]        // targets, sorted within each row
//!   edge_weights: [1.0, 0.5, 2.0]
//!   edge_ids:     [1, 0, 2]        // position of each edge in the input list
//! ```
//!
//! The same layout holds a CSC when built from transposed edges.

use crate::device::memory::host_buffer;
use crate::error::{Error, Result};

/// Immutable CSR graph with per-slot weights and input edge ids
///
/// # Example
///
/// ```
/// use trueno_graph_capi::storage::CsrGraph;
///
/// let graph = CsrGraph::from_edge_list(3, &[(0, 1, 1.0), (0, 2, 1.0)]).unwrap();
/// let (targets, weights) = graph.outgoing(0);
/// assert_eq!(targets, &[1, 2]);
/// assert_eq!(weights, &[1.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CsrGraph {
    /// node i's edges occupy slots `row_offsets[i]..row_offsets[i + 1]`
    /// Length: `num_nodes` + 1
    row_offsets: Vec<usize>,

    /// Edge targets
    /// Length: `num_edges`
    col_indices: Vec<usize>,

    /// Edge weights
    /// Length: `num_edges`
    edge_weights: Vec<f64>,

    /// Input position of each edge
    /// Length: `num_edges`
    edge_ids: Vec<usize>,

    /// Number of nodes
    num_nodes: usize,
}

impl CsrGraph {
    /// Create new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            row_offsets: vec![0],
            col_indices: Vec::new(),
            edge_weights: Vec::new(),
            edge_ids: Vec::new(),
            num_nodes: 0,
        }
    }

    /// Create graph from edge list
    ///
    /// # Arguments
    ///
    /// * `num_nodes` - Number of vertices; every endpoint must be below it
    /// * `edges` - List of (source, target, weight) tuples; the index of each
    ///   tuple becomes its edge id
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if an endpoint is out of range and `Allocation`
    /// if `num_nodes` is too large to index
    pub fn from_edge_list(num_nodes: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        if let Some(&(src, dst, _)) = edges
            .iter()
            .find(|(src, dst, _)| *src >= num_nodes || *dst >= num_nodes)
        {
            return Err(Error::invalid(format!(
                "edge {src} -> {dst} out of range for {num_nodes} vertices"
            )));
        }

        // Counting pass: out-degree per node, then prefix sums
        let mut row_offsets = zeroed_offsets(num_nodes)?;
        for &(src, _, _) in edges {
            row_offsets[src + 1] += 1;
        }
        for i in 0..num_nodes {
            row_offsets[i + 1] += row_offsets[i];
        }

        // Scatter pass (stable: edge ids ascend within each row)
        let mut cursor = row_offsets.clone();
        let mut slots = vec![(0_usize, 0.0_f64, 0_usize); edges.len()];
        for (id, &(src, dst, weight)) in edges.iter().enumerate() {
            slots[cursor[src]] = (dst, weight, id);
            cursor[src] += 1;
        }

        // Sort each row by target so membership tests can binary search
        for node in 0..num_nodes {
            slots[row_offsets[node]..row_offsets[node + 1]]
                .sort_by_key(|&(dst, _, id)| (dst, id));
        }

        Ok(Self {
            col_indices: slots.iter().map(|s| s.0).collect(),
            edge_weights: slots.iter().map(|s| s.1).collect(),
            edge_ids: slots.iter().map(|s| s.2).collect(),
            row_offsets,
            num_nodes,
        })
    }

    /// Rebuild a graph from downloaded CSR components
    ///
    /// # Errors
    ///
    /// Returns error if the components are inconsistent
    pub fn from_parts(
        row_offsets: Vec<usize>,
        col_indices: Vec<usize>,
        edge_weights: Vec<f64>,
        edge_ids: Vec<usize>,
    ) -> Result<Self> {
        let num_nodes = row_offsets
            .len()
            .checked_sub(1)
            .ok_or_else(|| Error::Unknown("CSR row offsets are empty".into()))?;
        let num_edges = col_indices.len();

        let consistent = row_offsets[0] == 0
            && row_offsets[num_nodes] == num_edges
            && row_offsets.windows(2).all(|w| w[0] <= w[1])
            && edge_weights.len() == num_edges
            && edge_ids.len() == num_edges
            && col_indices.iter().all(|&c| c < num_nodes);
        if !consistent {
            return Err(Error::Unknown("CSR components are inconsistent".into()));
        }

        Ok(Self {
            row_offsets,
            col_indices,
            edge_weights,
            edge_ids,
            num_nodes,
        })
    }

    /// Graph with every edge reversed (CSR ↔ CSC); edge ids are preserved
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the offsets cannot be allocated
    pub fn transpose(&self) -> Result<Self> {
        let mut row_offsets = zeroed_offsets(self.num_nodes)?;
        for &dst in &self.col_indices {
            row_offsets[dst + 1] += 1;
        }
        for i in 0..self.num_nodes {
            row_offsets[i + 1] += row_offsets[i];
        }

        let mut cursor = row_offsets.clone();
        let mut slots = vec![(0_usize, 0.0_f64, 0_usize); self.col_indices.len()];
        for (src, dst, weight, id) in self.edges() {
            slots[cursor[dst]] = (src, weight, id);
            cursor[dst] += 1;
        }
        for node in 0..self.num_nodes {
            slots[row_offsets[node]..row_offsets[node + 1]]
                .sort_by_key(|&(src, _, id)| (src, id));
        }

        Ok(Self {
            col_indices: slots.iter().map(|s| s.0).collect(),
            edge_weights: slots.iter().map(|s| s.1).collect(),
            edge_ids: slots.iter().map(|s| s.2).collect(),
            row_offsets,
            num_nodes: self.num_nodes,
        })
    }

    /// Targets and weights of a node's edges (empty for unknown nodes)
    #[must_use]
    pub fn outgoing(&self, node: usize) -> (&[usize], &[f64]) {
        let range = self.row(node);
        (&self.col_indices[range.clone()], &self.edge_weights[range])
    }

    /// Input edge ids of a node's edges, aligned with [`outgoing`](Self::outgoing)
    #[must_use]
    pub fn outgoing_edge_ids(&self, node: usize) -> &[usize] {
        &self.edge_ids[self.row(node)]
    }

    /// Number of edges leaving `node`
    #[must_use]
    pub fn out_degree(&self, node: usize) -> usize {
        self.row(node).len()
    }

    /// Sum of the weights of edges leaving `node`
    #[must_use]
    pub fn out_weight_sum(&self, node: usize) -> f64 {
        self.outgoing(node).1.iter().sum()
    }

    /// Whether at least one edge `src → dst` exists
    #[must_use]
    pub fn has_edge(&self, src: usize, dst: usize) -> bool {
        self.outgoing(src).0.binary_search(&dst).is_ok()
    }

    /// Weight of the first `src → dst` edge, if any
    #[must_use]
    pub fn edge_weight(&self, src: usize, dst: usize) -> Option<f64> {
        let (targets, weights) = self.outgoing(src);
        let first = targets.partition_point(|&t| t < dst);
        (targets.get(first) == Some(&dst)).then(|| weights[first])
    }

    /// Iterate `(src, dst, weight, edge_id)` in CSR order
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64, usize)> + '_ {
        (0..self.num_nodes).flat_map(move |src| {
            self.row(src).map(move |slot| {
                (
                    src,
                    self.col_indices[slot],
                    self.edge_weights[slot],
                    self.edge_ids[slot],
                )
            })
        })
    }

    /// Get number of nodes
    #[must_use]
    pub const fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Get number of edges
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.col_indices.len()
    }

    /// Get CSR components `(row_offsets, col_indices, edge_weights, edge_ids)`
    #[must_use]
    pub fn csr_components(&self) -> (&[usize], &[usize], &[f64], &[usize]) {
        (
            &self.row_offsets,
            &self.col_indices,
            &self.edge_weights,
            &self.edge_ids,
        )
    }

    fn row(&self, node: usize) -> std::ops::Range<usize> {
        if node >= self.num_nodes {
            return 0..0;
        }
        self.row_offsets[node]..self.row_offsets[node + 1]
    }
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// `num_nodes + 1` zeroed row offsets
fn zeroed_offsets(num_nodes: usize) -> Result<Vec<usize>> {
    let len = num_nodes
        .checked_add(1)
        .ok_or_else(|| Error::Allocation(format!("{num_nodes} vertices overflow usize")))?;
    let mut offsets = host_buffer(len)?;
    offsets.resize(len, 0);
    Ok(offsets)
}
