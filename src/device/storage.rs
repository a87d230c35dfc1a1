//! Device backends and raw buffer storage
//!
//! A [`Backend`] allocates [`DeviceStorage`] and moves bytes between host slices
//! and device storage. Every transfer is complete when the call returns.

use crate::config::BackendKind;
use crate::error::{Error, Result};
use std::sync::RwLock;
use tracing::debug;

#[cfg(feature = "gpu")]
use crate::gpu::GpuDevice;

/// Execution context owned by a resource handle
#[derive(Debug)]
pub(crate) enum Backend {
    /// Host arena standing in for device memory
    Host,
    /// wgpu device and queue
    #[cfg(feature = "gpu")]
    Wgpu(GpuDevice),
}

/// Raw bytes of one device allocation
#[derive(Debug)]
pub(crate) enum DeviceStorage {
    Host(RwLock<Vec<u8>>),
    #[cfg(feature = "gpu")]
    Wgpu(wgpu::Buffer),
}

impl Backend {
    /// Open the backend selected by `kind`
    pub(crate) fn open(kind: BackendKind) -> Result<Self> {
        match kind {
            BackendKind::Host => Ok(Self::Host),
            #[cfg(feature = "gpu")]
            BackendKind::Wgpu => GpuDevice::open()
                .map(Self::Wgpu)
                .map_err(|e| Error::Allocation(e.to_string())),
        }
    }

    pub(crate) const fn kind(&self) -> BackendKind {
        match self {
            Self::Host => BackendKind::Host,
            #[cfg(feature = "gpu")]
            Self::Wgpu(_) => BackendKind::Wgpu,
        }
    }

    /// Allocate `bytes` of zeroed storage
    pub(crate) fn allocate(&self, bytes: usize) -> Result<DeviceStorage> {
        match self {
            Self::Host => {
                let mut buf = Vec::new();
                buf.try_reserve_exact(bytes)
                    .map_err(|e| Error::Allocation(format!("{bytes} bytes: {e}")))?;
                buf.resize(bytes, 0);
                Ok(DeviceStorage::Host(RwLock::new(buf)))
            }
            #[cfg(feature = "gpu")]
            Self::Wgpu(device) => crate::gpu::buffer::create_storage(device, bytes)
                .map(DeviceStorage::Wgpu),
        }
    }

    /// Copy `data` into `storage` starting at byte `offset`
    pub(crate) fn write(&self, storage: &DeviceStorage, offset: usize, data: &[u8]) -> Result<()> {
        debug!(offset, bytes = data.len(), "host -> device copy");
        match (self, storage) {
            (Self::Host, DeviceStorage::Host(buf)) => {
                let mut buf = buf
                    .write()
                    .map_err(|_| Error::Unknown("device buffer lock poisoned".into()))?;
                let end = checked_end(offset, data.len(), buf.len())?;
                buf[offset..end].copy_from_slice(data);
                Ok(())
            }
            #[cfg(feature = "gpu")]
            (Self::Wgpu(device), DeviceStorage::Wgpu(buffer)) => {
                crate::gpu::buffer::write(device, buffer, offset, data)
            }
            #[cfg(feature = "gpu")]
            _ => Err(backend_mismatch()),
        }
    }

    /// Copy bytes starting at `offset` of `storage` into `out`
    pub(crate) fn read(
        &self,
        storage: &DeviceStorage,
        offset: usize,
        out: &mut [u8],
    ) -> Result<()> {
        debug!(offset, bytes = out.len(), "device -> host copy");
        match (self, storage) {
            (Self::Host, DeviceStorage::Host(buf)) => {
                let buf = buf
                    .read()
                    .map_err(|_| Error::Unknown("device buffer lock poisoned".into()))?;
                let end = checked_end(offset, out.len(), buf.len())?;
                out.copy_from_slice(&buf[offset..end]);
                Ok(())
            }
            #[cfg(feature = "gpu")]
            (Self::Wgpu(device), DeviceStorage::Wgpu(buffer)) => {
                crate::gpu::buffer::read(device, buffer, offset, out)
            }
            #[cfg(feature = "gpu")]
            _ => Err(backend_mismatch()),
        }
    }
}

fn checked_end(offset: usize, len: usize, capacity: usize) -> Result<usize> {
    offset
        .checked_add(len)
        .filter(|&end| end <= capacity)
        .ok_or_else(|| {
            Error::invalid(format!(
                "byte range {offset}+{len} exceeds buffer of {capacity} bytes"
            ))
        })
}

#[cfg(feature = "gpu")]
fn backend_mismatch() -> Error {
    Error::invalid("array storage does not belong to this handle's backend")
}
