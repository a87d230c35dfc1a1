//! Resource handle configuration
//!
//! Plain struct with presets and builder methods. There is no file or
//! environment loading; callers construct a config in code.

/// Default base seed for random algorithms
pub const DEFAULT_SEED: u64 = 42;

/// Which device backend a handle allocates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Device memory emulated in a separate host arena (always available)
    #[default]
    Host,
    /// wgpu storage buffers (requires the `gpu` feature and an adapter)
    #[cfg(feature = "gpu")]
    Wgpu,
}

/// Configuration for a [`ResourceHandle`](crate::ResourceHandle)
///
/// # Example
///
/// ```
/// use trueno_graph_capi::HandleConfig;
///
/// let config = HandleConfig::default()
///     .with_memory_limit(64 * 1024 * 1024)
///     .with_seed(7);
/// assert_eq!(config.seed, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleConfig {
    /// Device backend
    pub backend: BackendKind,

    /// Device memory budget in bytes (`None` = limited only by the backend)
    pub memory_limit: Option<usize>,

    /// Base seed for random algorithms issued on this handle
    pub seed: u64,

    /// Run independent walks on the rayon pool
    pub parallel: bool,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Host,
            memory_limit: None,
            seed: DEFAULT_SEED,
            parallel: true,
        }
    }
}

impl HandleConfig {
    /// Small single-threaded configuration for tests (64 MB budget)
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            backend: BackendKind::Host,
            memory_limit: Some(64 * 1024 * 1024),
            seed: DEFAULT_SEED,
            parallel: false,
        }
    }

    /// wgpu-backed configuration
    #[cfg(feature = "gpu")]
    #[must_use]
    pub fn gpu() -> Self {
        Self {
            backend: BackendKind::Wgpu,
            ..Self::default()
        }
    }

    /// Set the device memory budget
    #[must_use]
    pub const fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Set the base seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable parallel walk execution
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
