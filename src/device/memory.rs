//! Device memory accounting
//!
//! Every device allocation reserves its size against the owning handle's
//! [`MemoryPool`]. The reservation is returned when the allocation is dropped,
//! so a failed or destroyed allocation never leaks budget.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Byte budget shared by all allocations of one resource handle
#[derive(Debug)]
pub struct MemoryPool {
    /// Maximum bytes in use at once (`None` = unlimited)
    limit: Option<usize>,

    /// Bytes currently reserved
    in_use: AtomicUsize,

    /// High-water mark
    peak: AtomicUsize,
}

impl MemoryPool {
    /// Create a pool with an optional byte limit
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Configured limit
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes currently reserved
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Highest number of bytes reserved at once
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Bytes still available under the limit
    #[must_use]
    pub fn available(&self) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(self.in_use()))
    }

    /// Check if `bytes` more would fit under the limit
    #[must_use]
    pub fn fits(&self, bytes: usize) -> bool {
        self.available().map_or(true, |available| bytes <= available)
    }

    /// Reserve `bytes` against the budget
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the reservation would exceed the limit
    pub fn reserve(self: &Arc<Self>, bytes: usize) -> Result<Reservation> {
        let mut current = self.in_use.load(Ordering::Acquire);
        loop {
            let next = current
                .checked_add(bytes)
                .ok_or_else(|| Error::Allocation(format!("{bytes} bytes overflows usize")))?;
            if let Some(limit) = self.limit {
                if next > limit {
                    return Err(Error::Allocation(format!(
                        "{bytes} bytes requested, {} of {limit} bytes available",
                        limit.saturating_sub(current)
                    )));
                }
            }
            match self.in_use.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.peak.fetch_max(next, Ordering::AcqRel);
                    debug!(bytes, in_use = next, "device memory reserved");
                    return Ok(Reservation {
                        pool: Arc::clone(self),
                        bytes,
                    });
                }
                Err(observed) => current = observed,
            }
        }
    }
}

/// Bytes held against a [`MemoryPool`]; released on drop
#[derive(Debug)]
pub struct Reservation {
    pool: Arc<MemoryPool>,
    bytes: usize,
}

impl Reservation {
    /// Reserved size in bytes
    #[must_use]
    pub const fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.pool.in_use.fetch_sub(self.bytes, Ordering::AcqRel);
        debug!(bytes = self.bytes, "device memory released");
    }
}

/// Empty host vector with room for `len` elements
///
/// Host staging buffers sized from caller input go through here, so an
/// impossible size becomes an `Allocation` error instead of an abort.
pub(crate) fn host_buffer<T>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|e| Error::Allocation(format!("host buffer of {len} elements: {e}")))?;
    Ok(buf)
}
