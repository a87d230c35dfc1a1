//! Device memory layer
//!
//! - `types`: element type tags and typed host data
//! - `memory`: per-handle byte budget
//! - `storage`: host-emulated and wgpu backends
//! - `array`: owning arrays and non-owning views

pub mod array;
pub mod memory;
pub(crate) mod storage;
pub mod types;

pub use array::{DeviceArray, DeviceArrayView};
pub use memory::{MemoryPool, Reservation};
pub use types::{DeviceScalar, HostData, TypeTag};
