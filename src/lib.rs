//! trueno-graph-capi: C-callable graph algorithms over device-resident graphs
//!
//! # Overview
//!
//! A foreign caller creates a [`ResourceHandle`], moves edge lists into
//! [`DeviceArray`]s, builds an immutable [`Graph`] in device memory and runs
//! node2vec random walks or centrality algorithms on it. Results stay in
//! device memory until the caller copies them out through read-only views.
//!
//! # Quick Start
//!
//! ```
//! use trueno_graph_capi::{node2vec, DeviceArray, Graph, GraphProperties, ResourceHandle};
//!
//! # fn main() -> trueno_graph_capi::Result<()> {
//! let handle = ResourceHandle::new()?;
//!
//! // Edge list: 0 → 1 → 2 → 0
//! let src = DeviceArray::from_host(&handle, &[0_i32, 1, 2])?;
//! let dst = DeviceArray::from_host(&handle, &[1_i32, 2, 0])?;
//! let wgt = DeviceArray::from_host(&handle, &[0.5_f32, 1.0, 2.0])?;
//!
//! let graph = Graph::create(
//!     &handle,
//!     &GraphProperties::default(),
//!     &src.view(),
//!     &dst.view(),
//!     Some(&wgt.view()),
//!     3,
//!     false,
//!     true,
//! )?;
//!
//! let seeds = DeviceArray::from_host(&handle, &[0_i32])?;
//! let walks = node2vec(&handle, &graph, &seeds.view(), 3, false, 1.0, 1.0)?;
//! assert_eq!(walks.paths().to_host_vec::<i32>(&handle)?, vec![0, 1, 2]);
//! assert_eq!(walks.weights().to_host_vec::<f32>(&handle)?, vec![0.5, 1.0]);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Device**: type-erased arrays with a per-handle memory budget, on a host
//!   arena or (feature `gpu`) wgpu storage buffers
//! - **Storage**: CSR (Compressed Sparse Row) adjacency for algorithm kernels
//! - **Algorithms**: node2vec, `PageRank`, eigenvector and edge betweenness centrality
//! - **C ABI**: `trueno_*` functions in [`capi`] with status codes and error reports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithms;
pub mod capi;
pub mod config;
pub mod device;
pub mod error;
pub mod graph;
pub mod resource;
pub mod results;
pub mod storage;

// GPU device memory (optional)
#[cfg(feature = "gpu")]
pub mod gpu;

// Re-export core types
pub use algorithms::{
    edge_betweenness_centrality, eigenvector_centrality, node2vec, node2vec_with_params, pagerank,
    Node2VecParams,
};
pub use config::{BackendKind, HandleConfig};
pub use device::{DeviceArray, DeviceArrayView, DeviceScalar, HostData, TypeTag};
pub use error::{Error, ErrorReport, Result, StatusCode};
pub use graph::{Graph, GraphProperties, Orientation};
pub use resource::ResourceHandle;
pub use results::{
    CentralityMetadata, CentralityResult, EdgeCentralityResult, ResultSet, WalkMetadata,
    WalkResult,
};

#[cfg(feature = "gpu")]
pub use gpu::{GpuDevice, GpuDeviceError};
