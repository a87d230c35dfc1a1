//! Resource handle: the device execution context
//!
//! A [`ResourceHandle`] owns the backend and the memory budget. Every other
//! operation borrows one for its duration. Operations on one handle are
//! totally ordered; issuing them from two threads at once is a caller error
//! that debug builds catch with an assertion.

use crate::config::{BackendKind, HandleConfig};
use crate::device::memory::MemoryPool;
use crate::device::storage::Backend;
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::ThreadId;
use tracing::info;

#[cfg(feature = "gpu")]
static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-scoped handle to the accelerator context
///
/// # Example
///
/// ```
/// use trueno_graph_capi::{ResourceHandle, HandleConfig};
///
/// let handle = ResourceHandle::with_config(HandleConfig::minimal()).unwrap();
/// assert_eq!(handle.bytes_in_use(), 0);
/// handle.destroy();
/// ```
#[derive(Debug)]
pub struct ResourceHandle {
    config: HandleConfig,
    backend: Backend,
    pool: Arc<MemoryPool>,
    /// Identifies the device arrays were allocated on (0 = shared host arena)
    device_id: u64,
    rng_calls: AtomicU64,
    /// Thread currently inside an operation, and nesting depth
    in_flight: Mutex<(Option<ThreadId>, usize)>,
}

impl ResourceHandle {
    /// Create a handle with the default configuration
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the backend cannot be opened
    pub fn new() -> Result<Self> {
        Self::with_config(HandleConfig::default())
    }

    /// Create a handle from an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the backend cannot be opened
    pub fn with_config(config: HandleConfig) -> Result<Self> {
        let backend = Backend::open(config.backend)?;
        let device_id = match backend.kind() {
            BackendKind::Host => 0,
            #[cfg(feature = "gpu")]
            BackendKind::Wgpu => NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed),
        };
        info!(
            backend = ?config.backend,
            memory_limit = ?config.memory_limit,
            "resource handle created"
        );

        Ok(Self {
            pool: Arc::new(MemoryPool::new(config.memory_limit)),
            config,
            backend,
            device_id,
            rng_calls: AtomicU64::new(0),
            in_flight: Mutex::new((None, 0)),
        })
    }

    /// Configuration this handle was created with
    #[must_use]
    pub const fn config(&self) -> &HandleConfig {
        &self.config
    }

    /// Device bytes currently held by live arrays
    #[must_use]
    pub fn bytes_in_use(&self) -> usize {
        self.pool.in_use()
    }

    /// Memory budget shared by this handle's allocations
    #[must_use]
    pub fn memory_pool(&self) -> &Arc<MemoryPool> {
        &self.pool
    }

    /// Release the handle
    ///
    /// Arrays, graphs and results created from it keep their storage; they
    /// only need a live handle for further operations.
    pub fn destroy(self) {
        drop(self);
    }

    pub(crate) const fn backend(&self) -> &Backend {
        &self.backend
    }

    pub(crate) const fn device_id(&self) -> u64 {
        self.device_id
    }

    /// Seed for the next random algorithm call
    pub(crate) fn next_seed(&self) -> u64 {
        let call = self.rng_calls.fetch_add(1, Ordering::Relaxed);
        self.config.seed.wrapping_add(call)
    }

    /// Mark the start of an operation; ends when the guard drops
    ///
    /// Re-entrant on the same thread. In debug builds a second thread entering
    /// while an operation is in flight trips an assertion.
    pub(crate) fn begin(&self) -> OperationGuard<'_> {
        if cfg!(debug_assertions) {
            let me = std::thread::current().id();
            let contended = {
                let mut state = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                match state.0 {
                    Some(owner) if owner != me => true,
                    _ => {
                        *state = (Some(me), state.1 + 1);
                        false
                    }
                }
            };
            // Asserted after the lock is released
            debug_assert!(!contended, "ResourceHandle used concurrently from two threads");
        }
        OperationGuard { handle: self }
    }
}

/// Scope of one operation on a handle
#[derive(Debug)]
pub(crate) struct OperationGuard<'a> {
    handle: &'a ResourceHandle,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        if cfg!(debug_assertions) {
            let mut state = self
                .handle
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.1 = state.1.saturating_sub(1);
            if state.1 == 0 {
                state.0 = None;
            }
        }
    }
}
