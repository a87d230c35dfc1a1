//! node2vec biased second-order random walks
//!
//! Based on Grover & Leskovec (2016) "node2vec: Scalable Feature Learning for Networks".
//!
//! # Transition rule
//!
//! The first step from a seed picks an out-edge with probability proportional
//! to its weight. Every later step from `current`, having arrived from
//! `previous`, scales the weight of each candidate edge `current → t` by
//!
//! ```text
//! bias(t) = 1/p   if t == previous            (return)
//!           1     if previous → t is an edge   (stay close)
//!           1/q   otherwise                    (explore)
//! ```
//!
//! A walk stops early when `current` has no out-edge of positive weight.
//! The weight recorded for a step is the structural weight of the traversed
//! edge, never the biased one.

use crate::device::memory::host_buffer;
use crate::device::{DeviceArray, DeviceArrayView, HostData, TypeTag};
use crate::error::{Error, Result};
use crate::graph::{Graph, Orientation};
use crate::resource::ResourceHandle;
use crate::results::{WalkMetadata, WalkResult};
use crate::storage::CsrGraph;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

/// Initial capacity of a walk's buffers; longer walks grow on demand
const WALK_CAPACITY: usize = 64;

/// Walk parameters
///
/// # Example
///
/// ```
/// use trueno_graph_capi::Node2VecParams;
///
/// let params = Node2VecParams::new(4, 0.8, 0.5).with_compress_result(true);
/// assert!(params.validate().is_ok());
/// assert!(Node2VecParams::new(0, 1.0, 1.0).validate().is_err());
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node2VecParams {
    /// Maximum vertices per walk, seed included
    pub max_depth: usize,
    /// Ignore `p` and `q` (plain weighted walk)
    pub unbiased: bool,
    /// Return parameter
    pub p: f64,
    /// In-out parameter
    pub q: f64,
    /// Pack walks without padding
    pub compress_result: bool,
}

impl Node2VecParams {
    /// Biased walk parameters with padded output
    #[must_use]
    pub const fn new(max_depth: usize, p: f64, q: f64) -> Self {
        Self {
            max_depth,
            unbiased: false,
            p,
            q,
            compress_result: false,
        }
    }

    /// Plain weighted walk
    #[must_use]
    pub const fn unbiased(max_depth: usize) -> Self {
        Self {
            max_depth,
            unbiased: true,
            p: 1.0,
            q: 1.0,
            compress_result: false,
        }
    }

    /// Set whether `p` and `q` are ignored
    #[must_use]
    pub const fn with_unbiased(mut self, unbiased: bool) -> Self {
        self.unbiased = unbiased;
        self
    }

    /// Set whether output is packed
    #[must_use]
    pub const fn with_compress_result(mut self, compress: bool) -> Self {
        self.compress_result = compress;
        self
    }

    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `max_depth` is 0, or (for biased walks) `p` or
    /// `q` is not a finite positive number
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::invalid("max_depth must be at least 1"));
        }
        if !self.unbiased {
            for (name, value) in [("p", self.p), ("q", self.q)] {
                if !(value.is_finite() && value > 0.0) {
                    return Err(Error::invalid(format!(
                        "{name} must be finite and positive, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// `(1/p, 1/q)`, or `(1, 1)` for unbiased walks
    fn inverse_bias(&self) -> (f64, f64) {
        if self.unbiased {
            (1.0, 1.0)
        } else {
            (1.0 / self.p, 1.0 / self.q)
        }
    }
}

/// One host-side walk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Walk {
    /// Visited vertices, seed first
    pub vertices: Vec<usize>,
    /// Weight of each traversed edge (`vertices.len() - 1` entries)
    pub weights: Vec<f64>,
}

/// Position of a walk: where it is and where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WalkState {
    previous: Option<usize>,
    current: usize,
}

impl WalkState {
    const fn start(seed: usize) -> Self {
        Self {
            previous: None,
            current: seed,
        }
    }

    const fn advance(self, next: usize) -> Self {
        Self {
            previous: Some(self.current),
            current: next,
        }
    }
}

/// Run one walk per seed on a host CSR
///
/// Walk `i` draws from its own ChaCha stream derived from `(seed, i)`, so the
/// output does not depend on `parallel`.
///
/// # Errors
///
/// Returns `InvalidInput` for invalid parameters, out-of-range seeds, or
/// negative or non-finite edge weights
pub fn random_walks(
    graph: &CsrGraph,
    seeds: &[usize],
    params: &Node2VecParams,
    seed: u64,
    parallel: bool,
) -> Result<Vec<Walk>> {
    params.validate()?;
    if let Some(bad) = seeds.iter().find(|&&s| s >= graph.num_nodes()) {
        return Err(Error::invalid(format!(
            "seed vertex {bad} out of range for {} vertices",
            graph.num_nodes()
        )));
    }
    let (_, _, weights, _) = graph.csr_components();
    if let Some(bad) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
        return Err(Error::invalid(format!(
            "random walks need non-negative finite weights, found {bad}"
        )));
    }

    let run = |(index, &start): (usize, &usize)| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(index as u64);
        walk(graph, start, params, &mut rng)
    };

    Ok(if parallel {
        seeds.par_iter().enumerate().map(run).collect()
    } else {
        seeds.iter().enumerate().map(run).collect()
    })
}

fn walk(graph: &CsrGraph, start: usize, params: &Node2VecParams, rng: &mut impl Rng) -> Walk {
    let mut state = WalkState::start(start);
    let mut out = Walk {
        vertices: Vec::with_capacity(params.max_depth.min(WALK_CAPACITY)),
        weights: Vec::with_capacity(params.max_depth.min(WALK_CAPACITY)),
    };
    out.vertices.push(start);

    while out.vertices.len() < params.max_depth {
        let Some((next, weight)) = step(graph, state, params, &mut *rng) else {
            break;
        };
        out.vertices.push(next);
        out.weights.push(weight);
        state = state.advance(next);
    }
    out
}

/// Sample the next edge; `None` at a dead end
fn step(
    graph: &CsrGraph,
    state: WalkState,
    params: &Node2VecParams,
    rng: &mut impl Rng,
) -> Option<(usize, f64)> {
    let (targets, weights) = graph.outgoing(state.current);
    let (inv_p, inv_q) = params.inverse_bias();

    let bias = |t: usize| match state.previous {
        None => 1.0,
        Some(prev) if t == prev => inv_p,
        Some(prev) if graph.has_edge(prev, t) => 1.0,
        Some(_) => inv_q,
    };
    let mass = |slot: usize| weights[slot] * bias(targets[slot]);

    let total: f64 = (0..targets.len()).map(mass).sum();
    if total <= 0.0 {
        return None;
    }

    // Inverse CDF over edge slots, so parallel edges keep their own weights
    let mut remaining = rng.random::<f64>() * total;
    let mut last_positive = None;
    for slot in 0..targets.len() {
        let m = mass(slot);
        if m <= 0.0 {
            continue;
        }
        if remaining < m {
            return Some((targets[slot], weights[slot]));
        }
        remaining -= m;
        last_positive = Some(slot);
    }
    last_positive.map(|slot| (targets[slot], weights[slot]))
}

/// node2vec walks from each seed
///
/// Paths are padded to `max_depth` with the vertex type's maximum value and
/// weights with 0. See [`node2vec_with_params`] for packed output.
///
/// # Errors
///
/// Returns `InvalidInput` for invalid parameters, seeds of the wrong type or
/// out of range, or negative graph weights; `Allocation` when the result does
/// not fit in device memory
///
/// # Example
///
/// ```
/// use trueno_graph_capi::{node2vec, DeviceArray, Graph, GraphProperties, ResourceHandle};
///
/// let handle = ResourceHandle::new().unwrap();
/// let src = DeviceArray::from_host(&handle, &[0_i32, 1, 2]).unwrap();
/// let dst = DeviceArray::from_host(&handle, &[1_i32, 2, 0]).unwrap();
/// let graph = Graph::create(
///     &handle, &GraphProperties::default(), &src.view(), &dst.view(), None, 3, false, false,
/// ).unwrap();
///
/// let seeds = DeviceArray::from_host(&handle, &[0_i32]).unwrap();
/// let walks = node2vec(&handle, &graph, &seeds.view(), 4, false, 1.0, 1.0).unwrap();
/// let paths = walks.paths().to_host_vec::<i32>(&handle).unwrap();
/// assert_eq!(paths, vec![0, 1, 2, 0]);
/// ```
pub fn node2vec(
    handle: &ResourceHandle,
    graph: &Graph,
    seeds: &DeviceArrayView,
    max_depth: usize,
    unbiased: bool,
    p: f64,
    q: f64,
) -> Result<WalkResult> {
    let params = Node2VecParams::new(max_depth, p, q).with_unbiased(unbiased);
    node2vec_with_params(handle, graph, seeds, &params)
}

/// node2vec walks with explicit parameters
///
/// With `compress_result` the used prefix of each walk is concatenated and
/// `path_sizes` delimits them.
///
/// # Errors
///
/// Same as [`node2vec`]
pub fn node2vec_with_params(
    handle: &ResourceHandle,
    graph: &Graph,
    seeds: &DeviceArrayView,
    params: &Node2VecParams,
) -> Result<WalkResult> {
    let _op = handle.begin();
    params.validate()?;

    if seeds.type_tag() != graph.vertex_type() {
        return Err(Error::invalid(format!(
            "seeds are {} but the graph's vertex ids are {}",
            seeds.type_tag(),
            graph.vertex_type()
        )));
    }
    let seeds = seeds
        .to_host_data(handle)?
        .into_i64()?
        .into_iter()
        .map(|s| {
            usize::try_from(s).map_err(|_| Error::invalid(format!("seed vertex {s} is negative")))
        })
        .collect::<Result<Vec<_>>>()?;

    // Fail before walking when the result cannot be held
    let shape = OutputShape::new(seeds.len(), params, graph)?;
    let budget = handle.memory_pool().reserve(shape.device_bytes)?;
    let path_slots = host_buffer(shape.path_len)?;
    let weight_slots = host_buffer(shape.weight_len)?;

    let csr = graph.load_csr(handle, Orientation::Outgoing)?;
    let base_seed = handle.next_seed();
    debug!(num_seeds = seeds.len(), base_seed, ?params, "sampling walks");
    let walks = random_walks(&csr, &seeds, params, base_seed, handle.config().parallel)?;

    drop(budget);
    let result = pack(handle, graph, &walks, params, path_slots, weight_slots)?;
    info!(
        num_walks = walks.len(),
        max_path_length = params.max_depth,
        compressed = params.compress_result,
        "node2vec complete"
    );
    Ok(result)
}

/// Padded result sizes, checked for overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputShape {
    path_len: usize,
    weight_len: usize,
    device_bytes: usize,
}

impl OutputShape {
    fn new(num_walks: usize, params: &Node2VecParams, graph: &Graph) -> Result<Self> {
        let depth = params.max_depth;
        let overflow = || {
            Error::Allocation(format!(
                "{num_walks} walks of up to {depth} vertices overflow usize"
            ))
        };

        let path_len = num_walks.checked_mul(depth).ok_or_else(overflow)?;
        let weight_len = num_walks.checked_mul(depth - 1).ok_or_else(overflow)?;
        let device_bytes = [
            path_len.checked_mul(graph.vertex_type().size_of()),
            weight_len.checked_mul(graph.weight_type().size_of()),
            num_walks.checked_mul(TypeTag::SizeT.size_of()),
        ]
        .into_iter()
        .try_fold(0_usize, |total, bytes| total.checked_add(bytes?))
        .ok_or_else(overflow)?;

        Ok(Self {
            path_len,
            weight_len,
            device_bytes,
        })
    }
}

fn pack(
    handle: &ResourceHandle,
    graph: &Graph,
    walks: &[Walk],
    params: &Node2VecParams,
    mut path_slots: Vec<Option<usize>>,
    mut weight_slots: Vec<f64>,
) -> Result<WalkResult> {
    let depth = params.max_depth;
    for w in walks {
        path_slots.extend(w.vertices.iter().copied().map(Some));
        weight_slots.extend_from_slice(&w.weights);
        if !params.compress_result {
            path_slots.resize(path_slots.len() + depth - w.vertices.len(), None);
            weight_slots.resize(weight_slots.len() + depth - 1 - w.weights.len(), 0.0);
        }
    }
    let sizes: Vec<u64> = walks.iter().map(|w| w.vertices.len() as u64).collect();

    let paths = DeviceArray::from_host_data(
        handle,
        &encode_path(graph.vertex_type(), &path_slots)?,
    )?;
    let weights = DeviceArray::from_host_data(
        handle,
        &HostData::weights(graph.weight_type(), weight_slots)?,
    )?;
    let path_sizes = DeviceArray::from_host(handle, &sizes)?;

    Ok(WalkResult::new(
        [paths, weights, path_sizes],
        WalkMetadata {
            max_path_length: depth,
            compressed: params.compress_result,
        },
    ))
}

/// Vertex ids with `None` mapped to the type's maximum value
fn encode_path(tag: TypeTag, slots: &[Option<usize>]) -> Result<HostData> {
    fn convert<T: TryFrom<usize> + Copy>(slots: &[Option<usize>], sentinel: T) -> Result<Vec<T>> {
        slots
            .iter()
            .map(|slot| match slot {
                Some(v) => T::try_from(*v)
                    .map_err(|_| Error::invalid(format!("vertex {v} overflows the vertex type"))),
                None => Ok(sentinel),
            })
            .collect()
    }
    match tag {
        TypeTag::Int32 => convert(slots, i32::MAX).map(HostData::Int32),
        TypeTag::Int64 => convert(slots, i64::MAX).map(HostData::Int64),
        other => Err(Error::invalid(format!("{other} is not a vertex id type"))),
    }
}
