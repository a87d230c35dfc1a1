//! Graph storage layer
//!
//! Host-side CSR representation used by the algorithm engine. Graphs live on
//! the device between calls and are downloaded into a [`CsrGraph`] when an
//! algorithm runs.

pub mod csr;

pub use csr::CsrGraph;
