//! wgpu-backed device memory
//!
//! # Architecture
//!
//! - `device`: GPU device initialization and management
//! - `buffer`: storage buffer allocation and synchronous host transfers
//!
//! # Feature Flag
//!
//! This module is only available with the `gpu` feature flag:
//! ```bash
//! cargo build --features gpu
//! ```

pub(crate) mod buffer;
mod device;

pub use device::{GpuDevice, GpuDeviceError};
