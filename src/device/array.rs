//! Type-erased device arrays and views
//!
//! A [`DeviceArray`] is the single owner of its device buffer. A
//! [`DeviceArrayView`] refers to all or part of that buffer without owning
//! it: once the array is destroyed every view of it is expired, and any copy
//! through an expired view fails with `InvalidInput`.
//!
//! The copy operations on [`DeviceArrayView`] are the only way bytes move
//! between host and device. They are synchronous.

use super::memory::Reservation;
use super::storage::DeviceStorage;
use super::types::{DeviceScalar, HostData, TypeTag};
use crate::error::{Error, Result};
use crate::resource::ResourceHandle;
use std::sync::{Arc, Weak};
use tracing::debug;

/// One device allocation
#[derive(Debug)]
pub(crate) struct Allocation {
    storage: DeviceStorage,
    len: usize,
    tag: TypeTag,
    device_id: u64,
    _reservation: Reservation,
}

/// Owning, typed, fixed-length device buffer
///
/// # Example
///
/// ```
/// use trueno_graph_capi::{DeviceArray, ResourceHandle, TypeTag};
///
/// let handle = ResourceHandle::new().unwrap();
/// let array = DeviceArray::create(&handle, 3, TypeTag::Int32).unwrap();
/// let view = array.view();
/// view.copy_from_host_typed(&handle, &[1_i32, 2, 3]).unwrap();
/// assert_eq!(view.to_host_vec::<i32>(&handle).unwrap(), vec![1, 2, 3]);
/// ```
#[derive(Debug)]
pub struct DeviceArray {
    inner: Arc<Allocation>,
}

impl DeviceArray {
    /// Allocate `len` zeroed elements of type `tag`
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the size overflows, the handle's budget is
    /// exhausted or the backend cannot allocate
    pub fn create(handle: &ResourceHandle, len: usize, tag: TypeTag) -> Result<Self> {
        let _op = handle.begin();
        let bytes = len
            .checked_mul(tag.size_of())
            .ok_or_else(|| Error::Allocation(format!("{len} {tag} elements overflows usize")))?;

        // Budget first: a failed backend allocation drops the reservation
        let reservation = handle.memory_pool().reserve(bytes)?;
        let storage = handle.backend().allocate(bytes)?;
        debug!(len, %tag, bytes, "device array created");

        Ok(Self {
            inner: Arc::new(Allocation {
                storage,
                len,
                tag,
                device_id: handle.device_id(),
                _reservation: reservation,
            }),
        })
    }

    /// Allocate an array and fill it from a typed host slice
    ///
    /// # Errors
    ///
    /// Same as [`DeviceArray::create`]
    pub fn from_host<T: DeviceScalar>(handle: &ResourceHandle, data: &[T]) -> Result<Self> {
        let array = Self::create(handle, data.len(), T::TAG)?;
        array.view().copy_from_host(handle, bytemuck::cast_slice(data))?;
        Ok(array)
    }

    /// Allocate an array and fill it from tagged host data
    ///
    /// # Errors
    ///
    /// Same as [`DeviceArray::create`]
    pub fn from_host_data(handle: &ResourceHandle, data: &HostData) -> Result<Self> {
        let array = Self::create(handle, data.len(), data.tag())?;
        array.view().copy_from_host(handle, data.as_bytes())?;
        Ok(array)
    }

    /// Writable view of the whole array
    #[must_use]
    pub fn view(&self) -> DeviceArrayView {
        DeviceArrayView {
            allocation: Arc::downgrade(&self.inner),
            offset: 0,
            len: self.inner.len,
            tag: self.inner.tag,
            read_only: false,
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// True for a zero-length array
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Element type
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        self.inner.tag
    }

    /// Size in bytes
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.len * self.inner.tag.size_of()
    }

    /// Release the device buffer; all views of it expire
    pub fn destroy(self) {
        drop(self);
    }
}

/// Non-owning reference to a range of a [`DeviceArray`]
#[derive(Debug, Clone)]
pub struct DeviceArrayView {
    allocation: Weak<Allocation>,
    offset: usize,
    len: usize,
    tag: TypeTag,
    read_only: bool,
}

impl DeviceArrayView {
    /// Number of elements in the view
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length view
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element type
    #[must_use]
    pub const fn type_tag(&self) -> TypeTag {
        self.tag
    }

    /// Whether writes through this view are rejected
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether the array behind this view has been destroyed
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.allocation.strong_count() == 0
    }

    /// Same range, with writes rejected
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Sub-range of `len` elements starting at element `offset`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the range is outside this view
    pub fn slice(&self, offset: usize, len: usize) -> Result<Self> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(Self {
                allocation: self.allocation.clone(),
                offset: self.offset + offset,
                len,
                tag: self.tag,
                read_only: self.read_only,
            }),
            _ => Err(Error::invalid(format!(
                "slice {offset}+{len} out of range for view of length {}",
                self.len
            ))),
        }
    }

    /// Size in bytes of the viewed range
    #[must_use]
    pub const fn size_in_bytes(&self) -> usize {
        self.len * self.tag.size_of()
    }

    /// Copy `host` into the viewed range
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the view is read-only or expired, `host` is not
    /// exactly the view's byte size, or the array lives on another device
    pub fn copy_from_host(&self, handle: &ResourceHandle, host: &[u8]) -> Result<()> {
        let _op = handle.begin();
        if self.read_only {
            return Err(Error::invalid("cannot copy into a read-only view"));
        }
        self.check_host_len(host.len())?;
        let allocation = self.resolve(handle)?;
        handle
            .backend()
            .write(&allocation.storage, self.byte_offset(), host)
    }

    /// Copy the viewed range into `host`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the view is expired, `host` is not exactly the
    /// view's byte size, or the array lives on another device
    pub fn copy_to_host(&self, handle: &ResourceHandle, host: &mut [u8]) -> Result<()> {
        let _op = handle.begin();
        self.check_host_len(host.len())?;
        let allocation = self.resolve(handle)?;
        handle
            .backend()
            .read(&allocation.storage, self.byte_offset(), host)
    }

    /// Typed [`copy_from_host`](Self::copy_from_host)
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `T` does not match the view's type tag
    pub fn copy_from_host_typed<T: DeviceScalar>(
        &self,
        handle: &ResourceHandle,
        host: &[T],
    ) -> Result<()> {
        self.check_tag(T::TAG)?;
        self.copy_from_host(handle, bytemuck::cast_slice(host))
    }

    /// Typed [`copy_to_host`](Self::copy_to_host)
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `T` does not match the view's type tag
    pub fn copy_to_host_typed<T: DeviceScalar>(
        &self,
        handle: &ResourceHandle,
        host: &mut [T],
    ) -> Result<()> {
        self.check_tag(T::TAG)?;
        self.copy_to_host(handle, bytemuck::cast_slice_mut(host))
    }

    /// Download the viewed range into a new vector
    ///
    /// # Errors
    ///
    /// Same as [`copy_to_host_typed`](Self::copy_to_host_typed)
    pub fn to_host_vec<T: DeviceScalar>(&self, handle: &ResourceHandle) -> Result<Vec<T>> {
        let mut host = vec![<T as bytemuck::Zeroable>::zeroed(); self.len];
        self.copy_to_host_typed(handle, &mut host)?;
        Ok(host)
    }

    /// Download the viewed range as tagged host data
    ///
    /// # Errors
    ///
    /// Same as [`copy_to_host`](Self::copy_to_host)
    pub fn to_host_data(&self, handle: &ResourceHandle) -> Result<HostData> {
        let mut bytes = vec![0_u8; self.size_in_bytes()];
        self.copy_to_host(handle, &mut bytes)?;
        HostData::from_bytes(self.tag, &bytes)
    }

    fn byte_offset(&self) -> usize {
        self.offset * self.tag.size_of()
    }

    fn check_tag(&self, expected: TypeTag) -> Result<()> {
        if self.tag == expected {
            Ok(())
        } else {
            Err(Error::invalid(format!(
                "view holds {} elements, host buffer holds {expected}",
                self.tag
            )))
        }
    }

    fn check_host_len(&self, host_bytes: usize) -> Result<()> {
        if host_bytes == self.size_in_bytes() {
            Ok(())
        } else {
            Err(Error::invalid(format!(
                "host buffer is {host_bytes} bytes, view of {} {} elements needs {}",
                self.len,
                self.tag,
                self.size_in_bytes()
            )))
        }
    }

    fn resolve(&self, handle: &ResourceHandle) -> Result<Arc<Allocation>> {
        let allocation = self
            .allocation
            .upgrade()
            .ok_or_else(|| Error::invalid("view refers to a destroyed device array"))?;
        if allocation.device_id != handle.device_id() {
            return Err(Error::invalid(
                "device array was allocated on a different device",
            ));
        }
        Ok(allocation)
    }
}
