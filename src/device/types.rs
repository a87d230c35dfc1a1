//! Element type tags and host-side typed data
//!
//! The element type of a device buffer is erased behind [`TypeTag`] at the API
//! boundary. Each entry point resolves the tag once into a [`HostData`]
//! variant (or a [`DeviceScalar`] type) and works with concrete types from
//! there on.

use crate::error::{Error, Result};
use std::fmt;

/// Element type of a type-erased device array
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `i32`
    Int32 = 0,
    /// `i64`
    Int64 = 1,
    /// `f32`
    Float32 = 2,
    /// `f64`
    Float64 = 3,
    /// `u64` (sizes, offsets, edge ids)
    SizeT = 4,
}

impl TypeTag {
    /// Size of one element in bytes
    #[must_use]
    pub const fn size_of(self) -> usize {
        match self {
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 | Self::SizeT => 8,
        }
    }

    /// Whether this tag can hold vertex ids
    #[must_use]
    pub const fn is_vertex_type(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// Whether this tag can hold edge weights
    #[must_use]
    pub const fn is_weight_type(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Upper-case name used in diagnostics
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Float32 => "FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::SizeT => "SIZE_T",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for TypeTag {
    type Error = Error;

    fn try_from(raw: i32) -> Result<Self> {
        match raw {
            0 => Ok(Self::Int32),
            1 => Ok(Self::Int64),
            2 => Ok(Self::Float32),
            3 => Ok(Self::Float64),
            4 => Ok(Self::SizeT),
            other => Err(Error::invalid(format!("unknown type tag {other}"))),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for u64 {}
}

/// Scalar types that may live in a device array
///
/// Sealed: the set of element types is closed and matches [`TypeTag`].
pub trait DeviceScalar: bytemuck::Pod + Send + Sync + fmt::Debug + sealed::Sealed {
    /// Tag describing this type
    const TAG: TypeTag;
}

impl DeviceScalar for i32 {
    const TAG: TypeTag = TypeTag::Int32;
}
impl DeviceScalar for i64 {
    const TAG: TypeTag = TypeTag::Int64;
}
impl DeviceScalar for f32 {
    const TAG: TypeTag = TypeTag::Float32;
}
impl DeviceScalar for f64 {
    const TAG: TypeTag = TypeTag::Float64;
}
impl DeviceScalar for u64 {
    const TAG: TypeTag = TypeTag::SizeT;
}

/// Typed host copy of a device array
#[derive(Debug, Clone, PartialEq)]
pub enum HostData {
    /// `INT32` elements
    Int32(Vec<i32>),
    /// `INT64` elements
    Int64(Vec<i64>),
    /// `FLOAT32` elements
    Float32(Vec<f32>),
    /// `FLOAT64` elements
    Float64(Vec<f64>),
    /// `SIZE_T` elements
    SizeT(Vec<u64>),
}

impl HostData {
    /// Decode raw bytes of the given type
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `bytes` is not a whole number of elements
    pub fn from_bytes(tag: TypeTag, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % tag.size_of() != 0 {
            return Err(Error::invalid(format!(
                "{} bytes is not a whole number of {tag} elements",
                bytes.len()
            )));
        }
        Ok(match tag {
            TypeTag::Int32 => Self::Int32(decode(bytes)),
            TypeTag::Int64 => Self::Int64(decode(bytes)),
            TypeTag::Float32 => Self::Float32(decode(bytes)),
            TypeTag::Float64 => Self::Float64(decode(bytes)),
            TypeTag::SizeT => Self::SizeT(decode(bytes)),
        })
    }

    /// Encode vertex ids with the requested integer tag
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `tag` is not a vertex type or an id does not fit
    pub fn vertices(tag: TypeTag, ids: impl IntoIterator<Item = i64>) -> Result<Self> {
        match tag {
            TypeTag::Int32 => ids
                .into_iter()
                .map(|id| {
                    i32::try_from(id)
                        .map_err(|_| Error::invalid(format!("vertex id {id} overflows INT32")))
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Int32),
            TypeTag::Int64 => Ok(Self::Int64(ids.into_iter().collect())),
            other => Err(Error::invalid(format!("{other} is not a vertex id type"))),
        }
    }

    /// Encode floating-point values with the requested float tag
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `tag` is not a weight type
    #[allow(clippy::cast_possible_truncation)]
    pub fn weights(tag: TypeTag, values: impl IntoIterator<Item = f64>) -> Result<Self> {
        match tag {
            TypeTag::Float32 => Ok(Self::Float32(values.into_iter().map(|v| v as f32).collect())),
            TypeTag::Float64 => Ok(Self::Float64(values.into_iter().collect())),
            other => Err(Error::invalid(format!("{other} is not a weight type"))),
        }
    }

    /// Tag of the contained elements
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        match self {
            Self::Int32(_) => TypeTag::Int32,
            Self::Int64(_) => TypeTag::Int64,
            Self::Float32(_) => TypeTag::Float32,
            Self::Float64(_) => TypeTag::Float64,
            Self::SizeT(_) => TypeTag::SizeT,
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::SizeT(v) => v.len(),
        }
    }

    /// True when there are no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw little-endian (native) bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Int32(v) => bytemuck::cast_slice(v),
            Self::Int64(v) => bytemuck::cast_slice(v),
            Self::Float32(v) => bytemuck::cast_slice(v),
            Self::Float64(v) => bytemuck::cast_slice(v),
            Self::SizeT(v) => bytemuck::cast_slice(v),
        }
    }

    /// Widen integer elements to `i64`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for float data or `SIZE_T` values above `i64::MAX`
    pub fn into_i64(self) -> Result<Vec<i64>> {
        match self {
            Self::Int32(v) => Ok(v.into_iter().map(i64::from).collect()),
            Self::Int64(v) => Ok(v),
            Self::SizeT(v) => v
                .into_iter()
                .map(|x| i64::try_from(x).map_err(|_| Error::invalid("SIZE_T value overflows")))
                .collect(),
            other => Err(Error::invalid(format!(
                "expected integer data, found {}",
                other.tag()
            ))),
        }
    }

    /// Widen float elements to `f64`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for integer data
    pub fn into_f64(self) -> Result<Vec<f64>> {
        match self {
            Self::Float32(v) => Ok(v.into_iter().map(f64::from).collect()),
            Self::Float64(v) => Ok(v),
            other => Err(Error::invalid(format!(
                "expected floating-point data, found {}",
                other.tag()
            ))),
        }
    }
}

/// Copy bytes into typed elements; the source need not be aligned
pub(crate) fn decode<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}
