//! GPU device initialization and management
//!
//! Handles wgpu device creation, adapter selection, and GPU resource lifecycle.
//! The device carries a current-thread tokio runtime so the synchronous
//! handle API can drive wgpu's async entry points to completion.

use thiserror::Error;

/// GPU device initialization errors
#[derive(Debug, Error)]
pub enum GpuDeviceError {
    /// No compatible GPU adapter found
    #[error("No compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device
    #[error("Failed to request GPU device: {0}")]
    DeviceRequest(String),

    /// Failed to start the runtime that drives wgpu futures
    #[error("Failed to start GPU runtime: {0}")]
    Runtime(String),
}

/// GPU device wrapper backing a resource handle
#[derive(Debug)]
pub struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: wgpu::Adapter,
    runtime: tokio::runtime::Runtime,
}

impl GpuDevice {
    /// Check if GPU is available without keeping a device
    ///
    /// This is useful for tests to skip gracefully when GPU is not available.
    #[must_use]
    pub fn is_gpu_available() -> bool {
        Self::open().is_ok()
    }

    /// Initialize a GPU device with default settings, blocking until ready
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Returns `GpuDeviceError` if:
    /// - The runtime cannot be started
    /// - No compatible GPU adapter found
    /// - Device request fails
    pub fn open() -> Result<Self, GpuDeviceError> {
        Self::open_with_backend(wgpu::Backends::all())
    }

    /// Initialize a GPU device with a specific backend, blocking until ready
    ///
    /// # Errors
    ///
    /// Returns `GpuDeviceError` if device initialization fails
    pub fn open_with_backend(backends: wgpu::Backends) -> Result<Self, GpuDeviceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| GpuDeviceError::Runtime(e.to_string()))?;

        let (device, queue, adapter) = runtime.block_on(request_device(backends))?;

        Ok(Self {
            device,
            queue,
            adapter,
            runtime,
        })
    }

    /// Get adapter info (GPU name, backend, etc.)
    #[must_use]
    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Largest buffer this device can allocate
    #[must_use]
    pub fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    /// Get device reference
    #[must_use]
    pub const fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Get queue reference
    #[must_use]
    pub const fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Drive a future to completion on the device's runtime
    pub(crate) fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

async fn request_device(
    backends: wgpu::Backends,
) -> Result<(wgpu::Device, wgpu::Queue, wgpu::Adapter), GpuDeviceError> {
    // Create wgpu instance
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    });

    // Request adapter (GPU)
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuDeviceError::NoAdapter)?;

    // Request device and queue
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("trueno-graph-capi GPU device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await
        .map_err(|e| GpuDeviceError::DeviceRequest(e.to_string()))?;

    Ok((device, queue, adapter))
}
