//! GPU buffer allocation and host transfers
//!
//! Uploads go through `Queue::write_buffer`; downloads copy into a mapped
//! staging buffer. Both wait for the device before returning.

use super::GpuDevice;
use crate::error::{Error, Result};
use anyhow::Context;

/// Usage flags for every array buffer
const ARRAY_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
    .union(wgpu::BufferUsages::COPY_DST)
    .union(wgpu::BufferUsages::COPY_SRC);

/// Create a zero-initialized storage buffer of `bytes`
pub(crate) fn create_storage(device: &GpuDevice, bytes: usize) -> Result<wgpu::Buffer> {
    let size = bytes as u64;
    if size > device.max_buffer_size() {
        return Err(Error::Allocation(format!(
            "{bytes} bytes exceeds the device buffer limit of {}",
            device.max_buffer_size()
        )));
    }

    // wgpu zero-initializes buffers that are not mapped at creation
    Ok(device.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("device array"),
        size: size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
        usage: ARRAY_USAGE,
        mapped_at_creation: false,
    }))
}

/// Write `data` at `offset`, waiting for the queue to drain
pub(crate) fn write(
    device: &GpuDevice,
    buffer: &wgpu::Buffer,
    offset: usize,
    data: &[u8],
) -> Result<()> {
    check_range(buffer, offset, data.len())?;
    if data.is_empty() {
        return Ok(());
    }

    device.queue().write_buffer(buffer, offset as u64, data);
    device.queue().submit(std::iter::empty());
    device.device().poll(wgpu::Maintain::Wait);
    Ok(())
}

/// Read `out.len()` bytes starting at `offset`
pub(crate) fn read(
    device: &GpuDevice,
    buffer: &wgpu::Buffer,
    offset: usize,
    out: &mut [u8],
) -> Result<()> {
    check_range(buffer, offset, out.len())?;
    if out.is_empty() {
        return Ok(());
    }

    device
        .block_on(read_range(device, buffer, offset as u64, out))
        .map_err(Error::from)
}

/// Helper: copy a buffer range through a staging buffer
async fn read_range(
    device: &GpuDevice,
    buffer: &wgpu::Buffer,
    offset: u64,
    out: &mut [u8],
) -> anyhow::Result<()> {
    let size = out.len() as u64;
    let staging_buffer = device.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("Array Staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    encoder.copy_buffer_to_buffer(buffer, offset, &staging_buffer, 0, size);
    device.queue().submit(Some(encoder.finish()));

    let buffer_slice = staging_buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();

    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device.device().poll(wgpu::Maintain::Wait);
    rx.receive()
        .await
        .context("Failed to receive map result")?
        .context("Buffer mapping failed")?;

    let data = buffer_slice.get_mapped_range();
    out.copy_from_slice(&data);
    drop(data);
    staging_buffer.unmap();

    Ok(())
}

fn check_range(buffer: &wgpu::Buffer, offset: usize, len: usize) -> Result<()> {
    let end = offset as u64 + len as u64;
    if end > buffer.size() {
        return Err(Error::invalid(format!(
            "byte range {offset}+{len} exceeds buffer of {} bytes",
            buffer.size()
        )));
    }
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    if offset as u64 % align != 0 || len as u64 % align != 0 {
        return Err(Error::invalid(format!(
            "byte range {offset}+{len} is not {align}-byte aligned"
        )));
    }
    Ok(())
}
