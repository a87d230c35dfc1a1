//! Device-resident graph construction
//!
//! [`Graph::create`] reads the caller's edge-list views, validates them, builds
//! a compressed adjacency on the host and uploads it into four device arrays
//! owned by the graph. The caller's input arrays are not retained.
//!
//! # Layout
//!
//! ```text
//! offsets   SIZE_T          num_vertices + 1
//! indices   vertex type     num_edges        (targets, or sources when transposed)
//! weights   weight type     num_edges
//! edge_ids  SIZE_T          num_edges        (position in the input arrays)
//! ```

use crate::device::{DeviceArray, DeviceArrayView, HostData, TypeTag};
use crate::error::{Error, Result};
use crate::resource::ResourceHandle;
use crate::storage::CsrGraph;
use std::collections::HashSet;
use tracing::{info, warn};

/// Structural properties declared by the caller
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphProperties {
    /// Every edge `u → v` has a matching `v → u`
    pub is_symmetric: bool,
    /// Parallel edges between the same pair are allowed
    pub is_multigraph: bool,
}

/// Which edges of a vertex an algorithm walks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Out-edges (CSR)
    Outgoing,
    /// In-edges (CSC)
    Incoming,
}

/// Immutable weighted directed graph in device memory
///
/// # Example
///
/// ```
/// use trueno_graph_capi::{DeviceArray, Graph, GraphProperties, ResourceHandle};
///
/// let handle = ResourceHandle::new().unwrap();
/// let src = DeviceArray::from_host(&handle, &[0_i32, 1]).unwrap();
/// let dst = DeviceArray::from_host(&handle, &[1_i32, 2]).unwrap();
///
/// let graph = Graph::create(
///     &handle,
///     &GraphProperties::default(),
///     &src.view(),
///     &dst.view(),
///     None,
///     2,
///     false,
///     true,
/// )
/// .unwrap();
/// assert_eq!(graph.num_vertices(), 3);
/// ```
#[derive(Debug)]
pub struct Graph {
    properties: GraphProperties,
    num_vertices: usize,
    num_edges: usize,
    vertex_type: TypeTag,
    weight_type: TypeTag,
    transposed: bool,
    offsets: DeviceArray,
    indices: DeviceArray,
    weights: DeviceArray,
    edge_ids: DeviceArray,
}

impl Graph {
    /// Build a graph from edge-list views
    ///
    /// `weights` may be omitted, in which case every edge has weight 1.0 and
    /// the weight type is `FLOAT32`. With `store_transposed` the in-edges of
    /// each vertex are stored instead of its out-edges. `do_expensive_check`
    /// additionally verifies the declared [`GraphProperties`] and that all
    /// weights are finite.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if view lengths differ from `num_edges`, the
    /// vertex or weight tags are unsupported, an id is negative or equals the
    /// vertex type's maximum, or the expensive check fails. Returns
    /// `Allocation` if the device arrays cannot be allocated; nothing is
    /// retained in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        handle: &ResourceHandle,
        properties: &GraphProperties,
        src: &DeviceArrayView,
        dst: &DeviceArrayView,
        weights: Option<&DeviceArrayView>,
        num_edges: usize,
        store_transposed: bool,
        do_expensive_check: bool,
    ) -> Result<Self> {
        let _op = handle.begin();

        check_len("src", src, num_edges)?;
        check_len("dst", dst, num_edges)?;
        if let Some(w) = weights {
            check_len("weights", w, num_edges)?;
        }

        let vertex_type = src.type_tag();
        if !vertex_type.is_vertex_type() {
            return Err(Error::invalid(format!(
                "vertex ids must be INT32 or INT64, found {vertex_type}"
            )));
        }
        if dst.type_tag() != vertex_type {
            return Err(Error::invalid(format!(
                "src is {vertex_type} but dst is {}",
                dst.type_tag()
            )));
        }
        let weight_type = weights.map_or(TypeTag::Float32, DeviceArrayView::type_tag);
        if !weight_type.is_weight_type() {
            return Err(Error::invalid(format!(
                "weights must be FLOAT32 or FLOAT64, found {weight_type}"
            )));
        }

        let sources = to_vertex_ids("src", src.to_host_data(handle)?)?;
        let targets = to_vertex_ids("dst", dst.to_host_data(handle)?)?;
        let values = match weights {
            Some(w) => w.to_host_data(handle)?.into_f64()?,
            None => vec![1.0; num_edges],
        };

        let num_vertices = sources
            .iter()
            .chain(&targets)
            .max()
            .map_or(0, |&max| max + 1);

        let edges: Vec<(usize, usize, f64)> = sources
            .into_iter()
            .zip(targets)
            .zip(values)
            .map(|((s, d), w)| (s, d, w))
            .collect();

        if do_expensive_check {
            expensive_check(properties, &edges)?;
        }

        // Hold the device footprint before building so oversized graphs fail fast
        let budget = handle.memory_pool().reserve(storage_bytes(
            num_vertices,
            num_edges,
            vertex_type,
            weight_type,
        )?)?;
        let mut csr = CsrGraph::from_edge_list(num_vertices, &edges)?;
        if store_transposed {
            csr = csr.transpose()?;
        }
        drop(budget);

        let graph = Self::upload(handle, &csr, vertex_type, weight_type)
            .map(|(offsets, indices, weights, edge_ids)| Self {
                properties: *properties,
                num_vertices,
                num_edges,
                vertex_type,
                weight_type,
                transposed: store_transposed,
                offsets,
                indices,
                weights,
                edge_ids,
            })?;

        info!(
            num_vertices,
            num_edges,
            %vertex_type,
            %weight_type,
            store_transposed,
            "graph created"
        );
        Ok(graph)
    }

    fn upload(
        handle: &ResourceHandle,
        csr: &CsrGraph,
        vertex_type: TypeTag,
        weight_type: TypeTag,
    ) -> Result<(DeviceArray, DeviceArray, DeviceArray, DeviceArray)> {
        let (row_offsets, col_indices, edge_weights, edge_ids) = csr.csr_components();

        let offsets = DeviceArray::from_host(handle, &to_u64(row_offsets))?;
        let indices = DeviceArray::from_host_data(
            handle,
            &HostData::vertices(vertex_type, col_indices.iter().map(|&v| to_i64(v)))?,
        )?;
        let weights = DeviceArray::from_host_data(
            handle,
            &HostData::weights(weight_type, edge_weights.iter().copied())?,
        )?;
        let edge_ids = DeviceArray::from_host(handle, &to_u64(edge_ids))?;

        Ok((offsets, indices, weights, edge_ids))
    }

    /// Download the adjacency in the requested orientation
    ///
    /// Transposes on the host when the stored orientation differs.
    ///
    /// # Errors
    ///
    /// Returns an error if a copy fails or the stored arrays are inconsistent
    pub fn load_csr(&self, handle: &ResourceHandle, orientation: Orientation) -> Result<CsrGraph> {
        let _op = handle.begin();

        let offsets = self.offsets.view().to_host_vec::<u64>(handle)?;
        let indices = self.indices.view().to_host_data(handle)?.into_i64()?;
        let weights = self.weights.view().to_host_data(handle)?.into_f64()?;
        let edge_ids = self.edge_ids.view().to_host_vec::<u64>(handle)?;

        let csr = CsrGraph::from_parts(
            offsets.into_iter().map(from_u64).collect::<Result<_>>()?,
            indices
                .into_iter()
                .map(|v| {
                    usize::try_from(v)
                        .map_err(|_| Error::Unknown(format!("stored vertex id {v} is negative")))
                })
                .collect::<Result<_>>()?,
            weights,
            edge_ids.into_iter().map(from_u64).collect::<Result<_>>()?,
        )?;

        if self.stored_orientation() == orientation {
            Ok(csr)
        } else {
            warn!(
                stored = ?self.stored_orientation(),
                requested = ?orientation,
                num_edges = self.num_edges,
                "transposing graph storage"
            );
            csr.transpose()
        }
    }

    /// Orientation of the device-resident adjacency
    #[must_use]
    pub const fn stored_orientation(&self) -> Orientation {
        if self.transposed {
            Orientation::Incoming
        } else {
            Orientation::Outgoing
        }
    }

    /// Declared properties
    #[must_use]
    pub const fn properties(&self) -> &GraphProperties {
        &self.properties
    }

    /// Number of vertices (largest id + 1)
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of edges
    #[must_use]
    pub const fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Integer type of vertex ids
    #[must_use]
    pub const fn vertex_type(&self) -> TypeTag {
        self.vertex_type
    }

    /// Float type of edge weights
    #[must_use]
    pub const fn weight_type(&self) -> TypeTag {
        self.weight_type
    }

    /// Whether in-edges are stored instead of out-edges
    #[must_use]
    pub const fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Device bytes held by this graph
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.offsets.size_in_bytes()
            + self.indices.size_in_bytes()
            + self.weights.size_in_bytes()
            + self.edge_ids.size_in_bytes()
    }

    /// Release the graph's device arrays
    pub fn destroy(self) {
        drop(self);
    }
}

fn check_len(name: &str, view: &DeviceArrayView, num_edges: usize) -> Result<()> {
    if view.len() == num_edges {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "{name} has {} elements, expected num_edges = {num_edges}",
            view.len()
        )))
    }
}

/// Non-negative vertex ids below the type's maximum, which marks padding in walk paths
fn to_vertex_ids(name: &str, data: HostData) -> Result<Vec<usize>> {
    let reserved = match data.tag() {
        TypeTag::Int32 => i64::from(i32::MAX),
        _ => i64::MAX,
    };
    data.into_i64()?
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            if id == reserved {
                return Err(Error::invalid(format!(
                    "{name}[{i}] = {id} is reserved as the path padding value"
                )));
            }
            usize::try_from(id)
                .map_err(|_| Error::invalid(format!("{name}[{i}] = {id} is a negative vertex id")))
        })
        .collect()
}

/// Device bytes taken by a graph's four arrays
fn storage_bytes(
    num_vertices: usize,
    num_edges: usize,
    vertex_type: TypeTag,
    weight_type: TypeTag,
) -> Result<usize> {
    let per_edge = vertex_type.size_of() + weight_type.size_of() + TypeTag::SizeT.size_of();
    num_vertices
        .checked_add(1)
        .and_then(|n| n.checked_mul(TypeTag::SizeT.size_of()))
        .zip(num_edges.checked_mul(per_edge))
        .and_then(|(offsets, edges)| offsets.checked_add(edges))
        .ok_or_else(|| {
            Error::Allocation(format!(
                "graph of {num_vertices} vertices and {num_edges} edges overflows usize"
            ))
        })
}

fn expensive_check(properties: &GraphProperties, edges: &[(usize, usize, f64)]) -> Result<()> {
    if let Some(i) = edges.iter().position(|e| !e.2.is_finite()) {
        return Err(Error::invalid(format!(
            "weight of edge {i} is not finite ({})",
            edges[i].2
        )));
    }

    let mut pairs = HashSet::with_capacity(edges.len());
    for (i, &(src, dst, _)) in edges.iter().enumerate() {
        if !pairs.insert((src, dst)) && !properties.is_multigraph {
            return Err(Error::invalid(format!(
                "duplicate edge {src} -> {dst} at position {i} \
                 in a graph not declared as a multigraph"
            )));
        }
    }

    if properties.is_symmetric {
        if let Some(&(src, dst)) = pairs.iter().find(|&&(s, d)| !pairs.contains(&(d, s))) {
            return Err(Error::invalid(format!(
                "graph declared symmetric but edge {src} -> {dst} has no reverse"
            )));
        }
    }
    Ok(())
}

fn to_u64(values: &[usize]) -> Vec<u64> {
    values.iter().map(|&v| v as u64).collect()
}

#[allow(clippy::cast_possible_wrap)]
const fn to_i64(value: usize) -> i64 {
    value as i64
}

fn from_u64(value: u64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::Unknown(format!("stored offset {value} overflows usize")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandleConfig;

    fn handle() -> ResourceHandle {
        ResourceHandle::with_config(HandleConfig::minimal()).unwrap()
    }

    fn build(
        handle: &ResourceHandle,
        src: &[i64],
        dst: &[i64],
        weights: Option<&[f64]>,
        properties: GraphProperties,
        transposed: bool,
    ) -> Result<Graph> {
        let s = DeviceArray::from_host(handle, src)?;
        let d = DeviceArray::from_host(handle, dst)?;
        let w = weights.map(|w| DeviceArray::from_host(handle, w)).transpose()?;
        Graph::create(
            handle,
            &properties,
            &s.view(),
            &d.view(),
            w.as_ref().map(DeviceArray::view).as_ref(),
            src.len(),
            transposed,
            true,
        )
    }

    #[test]
    fn test_create_and_load() {
        let handle = handle();
        let graph = build(
            &handle,
            &[0, 0, 1],
            &[1, 2, 2],
            Some(&[0.5, 1.5, 2.5]),
            GraphProperties::default(),
            false,
        )
        .unwrap();

        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.num_edges(), 3);
        assert_eq!(graph.vertex_type(), TypeTag::Int64);
        assert_eq!(graph.weight_type(), TypeTag::Float64);

        let csr = graph.load_csr(&handle, Orientation::Outgoing).unwrap();
        assert_eq!(csr.outgoing(0), (&[1, 2][..], &[0.5, 1.5][..]));
        assert_eq!(csr.edge_weight(1, 2), Some(2.5));
    }

    #[test]
    fn test_default_weights_are_float32_ones() {
        let handle = handle();
        let graph = build(&handle, &[0], &[1], None, GraphProperties::default(), false).unwrap();
        assert_eq!(graph.weight_type(), TypeTag::Float32);
        let csr = graph.load_csr(&handle, Orientation::Outgoing).unwrap();
        assert_eq!(csr.edge_weight(0, 1), Some(1.0));
    }

    #[test]
    fn test_transposed_storage_roundtrip() {
        let handle = handle();
        let graph = build(
            &handle,
            &[0, 1],
            &[1, 2],
            Some(&[3.0, 4.0]),
            GraphProperties::default(),
            true,
        )
        .unwrap();
        assert_eq!(graph.stored_orientation(), Orientation::Incoming);

        let incoming = graph.load_csr(&handle, Orientation::Incoming).unwrap();
        assert_eq!(incoming.outgoing(2), (&[1][..], &[4.0][..]));

        let outgoing = graph.load_csr(&handle, Orientation::Outgoing).unwrap();
        assert_eq!(outgoing.outgoing(0), (&[1][..], &[3.0][..]));
    }

    #[test]
    fn test_huge_vertex_id_is_allocation_error() {
        let handle = handle();
        let in_use = handle.bytes_in_use();
        for id in [1_i64 << 42, i64::MAX - 1] {
            let err = build(&handle, &[0], &[id], None, GraphProperties::default(), true)
                .unwrap_err();
            assert!(matches!(err, Error::Allocation(_)), "id {id}: {err}");
            assert_eq!(handle.bytes_in_use(), in_use);
        }
    }

    #[test]
    fn test_type_maximum_vertex_id_rejected() {
        let handle = handle();
        let err = build(&handle, &[i64::MAX], &[0], None, GraphProperties::default(), false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let s = DeviceArray::from_host(&handle, &[0_i32]).unwrap();
        let d = DeviceArray::from_host(&handle, &[i32::MAX]).unwrap();
        let err = Graph::create(
            &handle,
            &GraphProperties::default(),
            &s.view(),
            &d.view(),
            None,
            1,
            false,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{err}");
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_length_mismatch() {
        let handle = handle();
        let s = DeviceArray::from_host(&handle, &[0_i32, 1, 2]).unwrap();
        let d = DeviceArray::from_host(&handle, &[1_i32, 2]).unwrap();
        let err = Graph::create(
            &handle,
            &GraphProperties::default(),
            &s.view(),
            &d.view(),
            None,
            3,
            false,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_mixed_vertex_types() {
        let handle = handle();
        let s = DeviceArray::from_host(&handle, &[0_i32]).unwrap();
        let d = DeviceArray::from_host(&handle, &[1_i64]).unwrap();
        assert!(Graph::create(
            &handle,
            &GraphProperties::default(),
            &s.view(),
            &d.view(),
            None,
            1,
            false,
            false,
        )
        .is_err());
    }

    #[test]
    fn test_float_vertex_ids_rejected() {
        let handle = handle();
        let s = DeviceArray::from_host(&handle, &[0.0_f32]).unwrap();
        assert!(Graph::create(
            &handle,
            &GraphProperties::default(),
            &s.view(),
            &s.view(),
            None,
            1,
            false,
            false,
        )
        .is_err());
    }

    #[test]
    fn test_negative_vertex_id() {
        let handle = handle();
        let err = build(&handle, &[0, -1], &[1, 0], None, GraphProperties::default(), false)
            .unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_duplicate_edges_need_multigraph() {
        let handle = handle();
        let simple = GraphProperties::default();
        assert!(build(&handle, &[0, 0], &[1, 1], None, simple, false).is_err());

        let multi = GraphProperties {
            is_multigraph: true,
            ..GraphProperties::default()
        };
        let graph = build(&handle, &[0, 0], &[1, 1], None, multi, false).unwrap();
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn test_symmetric_declaration_checked() {
        let handle = handle();
        let symmetric = GraphProperties {
            is_symmetric: true,
            ..GraphProperties::default()
        };
        assert!(build(&handle, &[0], &[1], None, symmetric, false).is_err());
        assert!(build(&handle, &[0, 1], &[1, 0], None, symmetric, false).is_ok());
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let handle = handle();
        let err = build(
            &handle,
            &[0],
            &[1],
            Some(&[f64::NAN]),
            GraphProperties::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_graph_outlives_inputs_and_releases_budget() {
        let handle = handle();
        let graph = build(&handle, &[0, 1], &[1, 0], None, GraphProperties::default(), false)
            .unwrap();
        // Only the graph's own arrays remain allocated
        assert_eq!(handle.bytes_in_use(), graph.size_in_bytes());
        graph.destroy();
        assert_eq!(handle.bytes_in_use(), 0);
    }

    #[test]
    fn test_empty_graph() {
        let handle = handle();
        let graph = build(&handle, &[], &[], None, GraphProperties::default(), false).unwrap();
        assert_eq!(graph.num_vertices(), 0);
        let csr = graph.load_csr(&handle, Orientation::Outgoing).unwrap();
        assert_eq!(csr.num_edges(), 0);
    }
}
