use std::sync::Arc;

use arrow::array::{
    Array as _, ArrayRef, BooleanArray, Float16Array, Float32Array, Float64Array, Int8Array,
    Int16Array, Int32Array, Int64Array, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use half::f16;

use crate::{SerializationError, SerializationResult};

/// The primitive type of every scalar stored in a [`FlatBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F16,
    F32,
    F64,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl ElementType {
    /// All numeric types, i.e. everything but [`Self::Bool`].
    pub const NUMERIC: [Self; 11] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::F16,
        Self::F32,
        Self::F64,
    ];

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32 | Self::F64)
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        !self.is_float() && self != Self::Bool
    }

    #[inline]
    pub fn is_signed_integer(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Size of a single element, in bytes. Booleans count as one byte.
    #[inline]
    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// The inclusive range of representable values, for integer types.
    pub fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            Self::U8 => Some((0, u8::MAX.into())),
            Self::U16 => Some((0, u16::MAX.into())),
            Self::U32 => Some((0, u32::MAX.into())),
            Self::U64 => Some((0, u64::MAX.into())),
            Self::I8 => Some((i8::MIN.into(), i8::MAX.into())),
            Self::I16 => Some((i16::MIN.into(), i16::MAX.into())),
            Self::I32 => Some((i32::MIN.into(), i32::MAX.into())),
            Self::I64 => Some((i64::MIN.into(), i64::MAX.into())),
            Self::Bool | Self::F16 | Self::F32 | Self::F64 => None,
        }
    }

    pub fn arrow_datatype(self) -> DataType {
        match self {
            Self::Bool => DataType::Boolean,
            Self::U8 => DataType::UInt8,
            Self::U16 => DataType::UInt16,
            Self::U32 => DataType::UInt32,
            Self::U64 => DataType::UInt64,
            Self::I8 => DataType::Int8,
            Self::I16 => DataType::Int16,
            Self::I32 => DataType::Int32,
            Self::I64 => DataType::Int64,
            Self::F16 => DataType::Float16,
            Self::F32 => DataType::Float32,
            Self::F64 => DataType::Float64,
        }
    }

    pub fn from_arrow_datatype(datatype: &DataType) -> Option<Self> {
        Some(match datatype {
            DataType::Boolean => Self::Bool,
            DataType::UInt8 => Self::U8,
            DataType::UInt16 => Self::U16,
            DataType::UInt32 => Self::U32,
            DataType::UInt64 => Self::U64,
            DataType::Int8 => Self::I8,
            DataType::Int16 => Self::I16,
            DataType::Int32 => Self::I32,
            DataType::Int64 => Self::I64,
            DataType::Float16 => Self::F16,
            DataType::Float32 => Self::F32,
            DataType::Float64 => Self::F64,
            _ => return None,
        })
    }

    /// The smallest type that can hold values of both `self` and `other`.
    ///
    /// Used when a nested input mixes element types, e.g. `[[1, 2], [0.5, 1.5]]`.
    pub fn promote(self, other: Self) -> Self {
        use ElementType::{Bool, F64, I64};

        if self == other {
            return self;
        }

        match (self, other) {
            (Bool, other) | (other, Bool) => other,
            (a, b) if a.is_float() && b.is_float() => a.max_by_size(b),
            (a, b) if a.is_float() || b.is_float() => F64,
            (a, b) if a.is_signed_integer() == b.is_signed_integer() => a.max_by_size(b),
            _ => I64,
        }
    }

    fn max_by_size(self, other: Self) -> Self {
        if other.size_in_bytes() > self.size_in_bytes() {
            other
        } else {
            self
        }
    }
}

// ---

/// Maps a native Rust scalar type to its [`ElementType`].
pub trait NativeElement: Copy + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    fn into_flat_buffer(values: Vec<Self>) -> FlatBuffer;
}

/// A contiguous, typed buffer of scalars.
///
/// This is the "flat values" part of canonical component data: a `(rows × arity)` matrix stored
/// in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub enum FlatBuffer {
    Bool(Vec<bool>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F16(Vec<f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! impl_native_element {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl NativeElement for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                #[inline]
                fn into_flat_buffer(values: Vec<Self>) -> FlatBuffer {
                    FlatBuffer::$variant(values)
                }
            }

            impl From<Vec<$ty>> for FlatBuffer {
                #[inline]
                fn from(values: Vec<$ty>) -> Self {
                    Self::$variant(values)
                }
            }
        )+
    };
}

impl_native_element!(
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f16 => F16,
    f32 => F32,
    f64 => F64,
);

/// Runs `$body` with `$values` bound to the inner `Vec` of any variant.
macro_rules! with_values {
    ($buffer:expr, $values:ident => $body:expr) => {
        match $buffer {
            FlatBuffer::Bool($values) => $body,
            FlatBuffer::U8($values) => $body,
            FlatBuffer::U16($values) => $body,
            FlatBuffer::U32($values) => $body,
            FlatBuffer::U64($values) => $body,
            FlatBuffer::I8($values) => $body,
            FlatBuffer::I16($values) => $body,
            FlatBuffer::I32($values) => $body,
            FlatBuffer::I64($values) => $body,
            FlatBuffer::F16($values) => $body,
            FlatBuffer::F32($values) => $body,
            FlatBuffer::F64($values) => $body,
        }
    };
}

impl FlatBuffer {
    /// An empty buffer of the given type.
    pub fn empty(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Bool => Self::Bool(Vec::new()),
            ElementType::U8 => Self::U8(Vec::new()),
            ElementType::U16 => Self::U16(Vec::new()),
            ElementType::U32 => Self::U32(Vec::new()),
            ElementType::U64 => Self::U64(Vec::new()),
            ElementType::I8 => Self::I8(Vec::new()),
            ElementType::I16 => Self::I16(Vec::new()),
            ElementType::I32 => Self::I32(Vec::new()),
            ElementType::I64 => Self::I64(Vec::new()),
            ElementType::F16 => Self::F16(Vec::new()),
            ElementType::F32 => Self::F32(Vec::new()),
            ElementType::F64 => Self::F64(Vec::new()),
        }
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Bool(_) => ElementType::Bool,
            Self::U8(_) => ElementType::U8,
            Self::U16(_) => ElementType::U16,
            Self::U32(_) => ElementType::U32,
            Self::U64(_) => ElementType::U64,
            Self::I8(_) => ElementType::I8,
            Self::I16(_) => ElementType::I16,
            Self::I32(_) => ElementType::I32,
            Self::I64(_) => ElementType::I64,
            Self::F16(_) => ElementType::F16,
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        with_values!(self, values => values.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every value widened to `f64`. Booleans become `0.0`/`1.0`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::Bool(values) => values.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect(),
            Self::U8(values) => values.iter().map(|&v| v.into()).collect(),
            Self::U16(values) => values.iter().map(|&v| v.into()).collect(),
            Self::U32(values) => values.iter().map(|&v| v.into()).collect(),
            Self::U64(values) => values.iter().map(|&v| v as f64).collect(),
            Self::I8(values) => values.iter().map(|&v| v.into()).collect(),
            Self::I16(values) => values.iter().map(|&v| v.into()).collect(),
            Self::I32(values) => values.iter().map(|&v| v.into()).collect(),
            Self::I64(values) => values.iter().map(|&v| v as f64).collect(),
            Self::F16(values) => values.iter().map(|v| v.to_f64()).collect(),
            Self::F32(values) => values.iter().map(|&v| v.into()).collect(),
            Self::F64(values) => values.clone(),
        }
    }

    /// Every value widened to `i128`, or `None` for floating point buffers.
    fn to_i128_vec(&self) -> Option<Vec<i128>> {
        Some(match self {
            Self::Bool(values) => values.iter().map(|&v| i128::from(v)).collect(),
            Self::U8(values) => values.iter().map(|&v| v.into()).collect(),
            Self::U16(values) => values.iter().map(|&v| v.into()).collect(),
            Self::U32(values) => values.iter().map(|&v| v.into()).collect(),
            Self::U64(values) => values.iter().map(|&v| v.into()).collect(),
            Self::I8(values) => values.iter().map(|&v| v.into()).collect(),
            Self::I16(values) => values.iter().map(|&v| v.into()).collect(),
            Self::I32(values) => values.iter().map(|&v| v.into()).collect(),
            Self::I64(values) => values.iter().map(|&v| v.into()).collect(),
            Self::F16(_) | Self::F32(_) | Self::F64(_) => return None,
        })
    }

    /// Converts to `target`, refusing anything that would silently change a value.
    ///
    /// * integer → integer: every value must fit, otherwise [`SerializationError::Range`].
    /// * integer → float: every value must be exactly representable, otherwise
    ///   [`SerializationError::Range`] (e.g. `16_777_217` has no `f32`).
    /// * float → float: narrowing rounds to nearest, but a finite value that overflows to
    ///   infinity is a [`SerializationError::Range`].
    /// * float → integer: only if every value is integral, otherwise
    ///   [`SerializationError::UnsupportedDtype`].
    /// * anything ↔ bool: only bool → bool.
    pub fn cast_to(self, target: ElementType) -> SerializationResult<Self> {
        let source = self.element_type();
        if source == target {
            return Ok(self);
        }

        if source == ElementType::Bool || target == ElementType::Bool {
            return Err(SerializationError::cast(source, target));
        }

        if target.is_float() {
            return self.cast_to_float(target);
        }

        let integers = match self.to_i128_vec() {
            Some(integers) => integers,
            None => {
                let floats = self.to_f64_vec();
                if floats.iter().any(|v| !v.is_finite() || v.fract() != 0.0) {
                    return Err(SerializationError::cast(source, target));
                }
                floats.iter().map(|&v| v as i128).collect()
            }
        };

        Self::from_i128s(target, &integers)
    }

    fn cast_to_float(self, target: ElementType) -> SerializationResult<Self> {
        let floats = self.to_f64_vec();
        let narrowed = Self::from_f64s(target, &floats);
        let stored = narrowed.to_f64_vec();

        if let Some(integers) = self.to_i128_vec() {
            let inexact = integers
                .iter()
                .zip(&stored)
                .find(|&(&v, &s)| !s.is_finite() || s as i128 != v);
            if let Some((&v, _)) = inexact {
                return Err(SerializationError::range(
                    v as f64,
                    format!("integers exactly representable as {target}"),
                ));
            }
        } else {
            let overflowed = floats
                .iter()
                .zip(&stored)
                .find(|&(v, s)| v.is_finite() && !s.is_finite());
            if let Some((&v, _)) = overflowed {
                return Err(SerializationError::range(v, format!("the finite range of {target}")));
            }
        }

        Ok(narrowed)
    }

    fn from_f64s(target: ElementType, values: &[f64]) -> Self {
        match target {
            ElementType::F16 => Self::F16(values.iter().map(|&v| f16::from_f64(v)).collect()),
            ElementType::F32 => Self::F32(values.iter().map(|&v| v as f32).collect()),
            _ => Self::F64(values.to_vec()),
        }
    }

    fn from_i128s(target: ElementType, values: &[i128]) -> SerializationResult<Self> {
        fn convert<T: TryFrom<i128>>(
            target: ElementType,
            values: &[i128],
        ) -> SerializationResult<Vec<T>> {
            values
                .iter()
                .map(|&v| {
                    T::try_from(v).map_err(|_err| {
                        let (min, max) = target.integer_range().unwrap_or_default();
                        SerializationError::range(v as f64, format!("[{min}, {max}] for {target}"))
                    })
                })
                .collect()
        }

        Ok(match target {
            ElementType::U8 => Self::U8(convert(target, values)?),
            ElementType::U16 => Self::U16(convert(target, values)?),
            ElementType::U32 => Self::U32(convert(target, values)?),
            ElementType::U64 => Self::U64(convert(target, values)?),
            ElementType::I8 => Self::I8(convert(target, values)?),
            ElementType::I16 => Self::I16(convert(target, values)?),
            ElementType::I32 => Self::I32(convert(target, values)?),
            ElementType::I64 => Self::I64(convert(target, values)?),
            ElementType::Bool | ElementType::F16 | ElementType::F32 | ElementType::F64 => {
                return Err(SerializationError::cast(ElementType::I64, target));
            }
        })
    }

    /// Concatenates buffers, promoting them to a common element type first.
    pub fn concat(parts: Vec<Self>) -> SerializationResult<Self> {
        let Some(element_type) = parts
            .iter()
            .map(|part| part.element_type())
            .reduce(ElementType::promote)
        else {
            return Ok(Self::empty(ElementType::F64));
        };

        let mut out = Self::empty(element_type);
        for part in parts {
            out.extend(part.cast_to(element_type)?);
        }
        Ok(out)
    }

    fn extend(&mut self, other: Self) {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.extend(b),
            (Self::U8(a), Self::U8(b)) => a.extend(b),
            (Self::U16(a), Self::U16(b)) => a.extend(b),
            (Self::U32(a), Self::U32(b)) => a.extend(b),
            (Self::U64(a), Self::U64(b)) => a.extend(b),
            (Self::I8(a), Self::I8(b)) => a.extend(b),
            (Self::I16(a), Self::I16(b)) => a.extend(b),
            (Self::I32(a), Self::I32(b)) => a.extend(b),
            (Self::I64(a), Self::I64(b)) => a.extend(b),
            (Self::F16(a), Self::F16(b)) => a.extend(b),
            (Self::F32(a), Self::F32(b)) => a.extend(b),
            (Self::F64(a), Self::F64(b)) => a.extend(b),
            (a, b) => {
                re_log::error!(
                    "Cannot extend {} buffer with {} values",
                    a.element_type(),
                    b.element_type()
                );
            }
        }
    }

    /// The raw little-endian bytes of this buffer. Booleans are stored as one byte each.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Self::Bool(values) => values.iter().map(|&v| u8::from(v)).collect(),
            Self::U8(values) => values.clone(),
            Self::U16(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::U32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::U64(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::I8(values) => bytemuck::cast_slice(values).to_vec(),
            Self::I16(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::I32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::I64(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::F16(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::F32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Self::F64(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    /// A copy of the values in `start..start + len`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, start: usize, len: usize) -> Self {
        match self {
            Self::Bool(v) => Self::Bool(v[start..start + len].to_vec()),
            Self::U8(v) => Self::U8(v[start..start + len].to_vec()),
            Self::U16(v) => Self::U16(v[start..start + len].to_vec()),
            Self::U32(v) => Self::U32(v[start..start + len].to_vec()),
            Self::U64(v) => Self::U64(v[start..start + len].to_vec()),
            Self::I8(v) => Self::I8(v[start..start + len].to_vec()),
            Self::I16(v) => Self::I16(v[start..start + len].to_vec()),
            Self::I32(v) => Self::I32(v[start..start + len].to_vec()),
            Self::I64(v) => Self::I64(v[start..start + len].to_vec()),
            Self::F16(v) => Self::F16(v[start..start + len].to_vec()),
            Self::F32(v) => Self::F32(v[start..start + len].to_vec()),
            Self::F64(v) => Self::F64(v[start..start + len].to_vec()),
        }
    }

    /// The values as a flat, non-nullable Arrow array.
    pub fn to_arrow(&self) -> ArrayRef {
        match self {
            Self::Bool(v) => Arc::new(BooleanArray::from(v.clone())),
            Self::U8(v) => Arc::new(UInt8Array::from(v.clone())),
            Self::U16(v) => Arc::new(UInt16Array::from(v.clone())),
            Self::U32(v) => Arc::new(UInt32Array::from(v.clone())),
            Self::U64(v) => Arc::new(UInt64Array::from(v.clone())),
            Self::I8(v) => Arc::new(Int8Array::from(v.clone())),
            Self::I16(v) => Arc::new(Int16Array::from(v.clone())),
            Self::I32(v) => Arc::new(Int32Array::from(v.clone())),
            Self::I64(v) => Arc::new(Int64Array::from(v.clone())),
            Self::F16(v) => Arc::new(Float16Array::from(v.clone())),
            Self::F32(v) => Arc::new(Float32Array::from(v.clone())),
            Self::F64(v) => Arc::new(Float64Array::from(v.clone())),
        }
    }

    /// Reads back a flat Arrow array of primitives. Nulls are not supported.
    pub fn from_arrow(array: &dyn arrow::array::Array) -> SerializationResult<Self> {
        use arrow::array::AsArray as _;
        use arrow::datatypes as dt;

        if array.null_count() > 0 {
            return Err(SerializationError::unsupported_dtype(
                "nullable array",
                "dense, non-null values",
            ));
        }

        Ok(match array.data_type() {
            DataType::Boolean => Self::Bool(array.as_boolean().iter().flatten().collect()),
            DataType::UInt8 => Self::U8(array.as_primitive::<dt::UInt8Type>().values().to_vec()),
            DataType::UInt16 => Self::U16(array.as_primitive::<dt::UInt16Type>().values().to_vec()),
            DataType::UInt32 => Self::U32(array.as_primitive::<dt::UInt32Type>().values().to_vec()),
            DataType::UInt64 => Self::U64(array.as_primitive::<dt::UInt64Type>().values().to_vec()),
            DataType::Int8 => Self::I8(array.as_primitive::<dt::Int8Type>().values().to_vec()),
            DataType::Int16 => Self::I16(array.as_primitive::<dt::Int16Type>().values().to_vec()),
            DataType::Int32 => Self::I32(array.as_primitive::<dt::Int32Type>().values().to_vec()),
            DataType::Int64 => Self::I64(array.as_primitive::<dt::Int64Type>().values().to_vec()),
            DataType::Float16 => {
                Self::F16(array.as_primitive::<dt::Float16Type>().values().to_vec())
            }
            DataType::Float32 => {
                Self::F32(array.as_primitive::<dt::Float32Type>().values().to_vec())
            }
            DataType::Float64 => {
                Self::F64(array.as_primitive::<dt::Float64Type>().values().to_vec())
            }
            datatype => {
                return Err(SerializationError::unsupported_dtype(
                    datatype,
                    "a primitive arrow datatype",
                ));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion() {
        use ElementType::{Bool, F16, F32, F64, I8, I64, U8, U16};

        assert_eq!(U8.promote(U16), U16);
        assert_eq!(U8.promote(I8), I64);
        assert_eq!(I8.promote(F32), F64);
        assert_eq!(F16.promote(F32), F32);
        assert_eq!(Bool.promote(U8), U8);
        assert_eq!(I64.promote(I64), I64);
    }

    #[test]
    fn lossless_casts() -> anyhow::Result<()> {
        let ints = FlatBuffer::I64(vec![0, 7, 255]);
        assert_eq!(ints.clone().cast_to(ElementType::U8)?, FlatBuffer::U8(vec![0, 7, 255]));
        assert_eq!(
            ints.cast_to(ElementType::F32)?,
            FlatBuffer::F32(vec![0.0, 7.0, 255.0])
        );

        let integral_floats = FlatBuffer::F64(vec![1.0, 2.0]);
        assert_eq!(
            integral_floats.cast_to(ElementType::U16)?,
            FlatBuffer::U16(vec![1, 2])
        );

        Ok(())
    }

    #[test]
    fn lossy_casts_are_refused() {
        let err = FlatBuffer::I32(vec![0, 300]).cast_to(ElementType::U8).unwrap_err();
        assert!(err.is_range_error(), "{err}");

        let err = FlatBuffer::I8(vec![-1]).cast_to(ElementType::U64).unwrap_err();
        assert!(err.is_range_error(), "{err}");

        let err = FlatBuffer::F32(vec![0.5]).cast_to(ElementType::U8).unwrap_err();
        assert!(err.is_unsupported_dtype(), "{err}");

        let err = FlatBuffer::Bool(vec![true]).cast_to(ElementType::F32).unwrap_err();
        assert!(err.is_unsupported_dtype(), "{err}");
    }

    #[test]
    fn integer_to_float_must_be_exact() -> anyhow::Result<()> {
        // 2^24 + 1 is the first integer an f32 cannot hold.
        let err = FlatBuffer::I64(vec![1, 16_777_217])
            .cast_to(ElementType::F32)
            .unwrap_err();
        assert!(err.is_range_error(), "{err}");

        let err = FlatBuffer::U64(vec![u64::MAX])
            .cast_to(ElementType::F64)
            .unwrap_err();
        assert!(err.is_range_error(), "{err}");

        let err = FlatBuffer::U32(vec![70_000])
            .cast_to(ElementType::F16)
            .unwrap_err();
        assert!(err.is_range_error(), "{err}");

        assert_eq!(
            FlatBuffer::I64(vec![-3, 16_777_216]).cast_to(ElementType::F32)?,
            FlatBuffer::F32(vec![-3.0, 16_777_216.0])
        );
        Ok(())
    }

    #[test]
    fn float_narrowing_overflow() -> anyhow::Result<()> {
        let err = FlatBuffer::F64(vec![0.0, 1e300])
            .cast_to(ElementType::F32)
            .unwrap_err();
        assert!(err.is_range_error(), "{err}");

        let err = FlatBuffer::F32(vec![70_000.0])
            .cast_to(ElementType::F16)
            .unwrap_err();
        assert!(err.is_range_error(), "{err}");

        // Rounding to the nearest value is fine, and so are non-finite values that already were.
        assert_eq!(
            FlatBuffer::F64(vec![0.1, f64::INFINITY]).cast_to(ElementType::F32)?,
            FlatBuffer::F32(vec![0.1, f32::INFINITY])
        );
        Ok(())
    }

    #[test]
    fn concat_promotes() -> anyhow::Result<()> {
        let buffer = FlatBuffer::concat(vec![
            FlatBuffer::U8(vec![1, 2]),
            FlatBuffer::F32(vec![0.5]),
        ])?;
        assert_eq!(buffer, FlatBuffer::F64(vec![1.0, 2.0, 0.5]));
        Ok(())
    }

    #[test]
    fn arrow_roundtrip() -> anyhow::Result<()> {
        let buffer = FlatBuffer::F16(vec![f16::from_f32(0.5), f16::from_f32(2.0)]);
        let array = buffer.to_arrow();
        assert_eq!(array.data_type(), &DataType::Float16);
        assert_eq!(FlatBuffer::from_arrow(&array)?, buffer);
        Ok(())
    }

    #[test]
    fn le_bytes() {
        assert_eq!(FlatBuffer::U16(vec![0x0102]).to_le_bytes(), vec![0x02, 0x01]);
        assert_eq!(FlatBuffer::I8(vec![-1]).to_le_bytes(), vec![0xff]);
    }
}
