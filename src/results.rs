//! Algorithm result containers
//!
//! Every algorithm returns a [`ResultSet`]: a fixed number of owned device
//! arrays plus plain metadata. Accessors hand out read-only views, so reading
//! a result never recomputes or copies anything. Destroying the result expires
//! every view obtained from it.

use crate::device::{DeviceArray, DeviceArrayView};

/// `N` owned device arrays with metadata `M`
#[derive(Debug)]
pub struct ResultSet<const N: usize, M> {
    arrays: [DeviceArray; N],
    metadata: M,
}

impl<const N: usize, M> ResultSet<N, M> {
    pub(crate) const fn new(arrays: [DeviceArray; N], metadata: M) -> Self {
        Self { arrays, metadata }
    }

    /// Read-only view of the `index`-th array, if it exists
    #[must_use]
    pub fn view(&self, index: usize) -> Option<DeviceArrayView> {
        self.arrays.get(index).map(|a| a.view().read_only())
    }

    /// Metadata recorded by the producing algorithm
    #[must_use]
    pub const fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Device bytes held by this result
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.arrays.iter().map(DeviceArray::size_in_bytes).sum()
    }

    /// Release the result's device arrays
    pub fn destroy(self) {
        drop(self);
    }

    fn array(&self, index: usize) -> DeviceArrayView {
        self.arrays[index].view().read_only()
    }
}

/// Metadata of a [`WalkResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkMetadata {
    /// Upper bound on vertices per walk (the requested `max_depth`)
    pub max_path_length: usize,
    /// Paths and weights are packed without padding
    pub compressed: bool,
}

/// Random walk output: paths, weights and per-walk sizes
///
/// Uncompressed layout for `n` seeds and `max_path_length = L`:
/// - `paths`: `n × L` vertex ids, unused slots hold the vertex type's maximum
/// - `weights`: `n × (L − 1)` edge weights, unused slots hold 0
/// - `path_sizes`: `n` vertex counts (`SIZE_T`)
///
/// Compressed results concatenate the used prefixes of each walk instead.
pub type WalkResult = ResultSet<3, WalkMetadata>;

impl WalkResult {
    /// Visited vertex ids
    #[must_use]
    pub fn paths(&self) -> DeviceArrayView {
        self.array(0)
    }

    /// Weights of traversed edges
    #[must_use]
    pub fn weights(&self) -> DeviceArrayView {
        self.array(1)
    }

    /// Number of vertices in each walk
    #[must_use]
    pub fn path_sizes(&self) -> DeviceArrayView {
        self.array(2)
    }

    /// Maximum vertices per walk
    #[must_use]
    pub const fn max_path_length(&self) -> usize {
        self.metadata.max_path_length
    }

    /// Whether paths and weights are packed
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.metadata.compressed
    }
}

/// Metadata of a [`CentralityResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentralityMetadata {
    /// Iterations performed
    pub num_iterations: usize,
    /// Whether the tolerance was reached within the iteration limit
    pub converged: bool,
}

/// Per-vertex scores
pub type CentralityResult = ResultSet<2, CentralityMetadata>;

impl CentralityResult {
    /// Vertex ids, in the graph's vertex type
    #[must_use]
    pub fn vertices(&self) -> DeviceArrayView {
        self.array(0)
    }

    /// Score of each vertex, in the graph's weight type
    #[must_use]
    pub fn values(&self) -> DeviceArrayView {
        self.array(1)
    }

    /// Iterations performed
    #[must_use]
    pub const fn num_iterations(&self) -> usize {
        self.metadata.num_iterations
    }

    /// Whether the algorithm converged
    #[must_use]
    pub const fn converged(&self) -> bool {
        self.metadata.converged
    }
}

/// Per-edge scores
pub type EdgeCentralityResult = ResultSet<4, ()>;

impl EdgeCentralityResult {
    /// Source of each edge
    #[must_use]
    pub fn src_vertices(&self) -> DeviceArrayView {
        self.array(0)
    }

    /// Destination of each edge
    #[must_use]
    pub fn dst_vertices(&self) -> DeviceArrayView {
        self.array(1)
    }

    /// Input position of each edge (`SIZE_T`)
    #[must_use]
    pub fn edge_ids(&self) -> DeviceArrayView {
        self.array(2)
    }

    /// Score of each edge
    #[must_use]
    pub fn values(&self) -> DeviceArrayView {
        self.array(3)
    }
}
