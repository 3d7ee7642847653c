use std::sync::Arc;

use arrow::array::{Array as _, ArrayRef, ListArray, StructArray, UInt64Array};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, Fields};
use re_types_core::{
    ElementType, FlatBuffer, RawValue, SerializationError, SerializationResult, VariantSet,
    VariantTag, VariantValue, encode_variants,
};

/// The flat, typed values of a tensor. Any numeric type, but not booleans.
#[derive(Clone, PartialEq)]
pub struct TensorBuffer(FlatBuffer);

impl std::fmt::Debug for TensorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({} bytes)", Self::variant_name(self.dtype()), self.size_in_bytes())
    }
}

impl TensorBuffer {
    pub fn new(buffer: FlatBuffer) -> SerializationResult<Self> {
        if Self::tag_of(buffer.element_type()).is_none() {
            return Err(SerializationError::unsupported_dtype(
                buffer.element_type(),
                "a numeric tensor element type",
            ));
        }
        Ok(Self(buffer))
    }

    #[inline]
    pub fn dtype(&self) -> ElementType {
        self.0.element_type()
    }

    #[inline]
    pub fn num_elements(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.num_elements() * self.dtype().size_in_bytes()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_flat_buffer(&self) -> &FlatBuffer {
        &self.0
    }

    fn tag_of(element_type: ElementType) -> Option<VariantTag> {
        Some(match element_type {
            ElementType::U8 => 1,
            ElementType::U16 => 2,
            ElementType::U32 => 3,
            ElementType::U64 => 4,
            ElementType::I8 => 5,
            ElementType::I16 => 6,
            ElementType::I32 => 7,
            ElementType::I64 => 8,
            ElementType::F16 => 9,
            ElementType::F32 => 10,
            ElementType::F64 => 11,
            ElementType::Bool => return None,
        })
    }

    fn variant_name(element_type: ElementType) -> String {
        element_type.name().to_uppercase()
    }

    fn payload_datatype(element_type: ElementType) -> DataType {
        DataType::List(Arc::new(Field::new("item", element_type.arrow_datatype(), false)))
    }

    /// One `List<T>` variant per numeric element type.
    pub fn variant_set() -> VariantSet {
        VariantSet::new(ElementType::NUMERIC.into_iter().filter_map(|element_type| {
            let tag = Self::tag_of(element_type)?;
            let field = Field::new(
                Self::variant_name(element_type),
                Self::payload_datatype(element_type),
                false,
            );
            Some((tag, field))
        }))
    }
}

impl VariantValue for TensorBuffer {
    #[inline]
    fn tag(&self) -> VariantTag {
        Self::tag_of(self.dtype()).unwrap_or_default()
    }

    fn payload(&self) -> SerializationResult<ArrayRef> {
        let values = self.0.to_arrow();
        let field = Arc::new(Field::new("item", values.data_type().clone(), false));
        let offsets = OffsetBuffer::from_lengths([values.len()]);
        Ok(Arc::new(ListArray::try_new(field, offsets, values, None)?))
    }
}

// ---

/// An N-D array of numbers: a shape and a row-major buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorData {
    pub shape: Vec<u64>,
    pub buffer: TensorBuffer,
}

impl TensorData {
    /// Fails if the buffer doesn't hold exactly as many elements as the shape implies.
    pub fn new(shape: impl Into<Vec<u64>>, buffer: TensorBuffer) -> SerializationResult<Self> {
        let shape = shape.into();
        let expected: u64 = shape.iter().product();
        if expected != buffer.num_elements() as u64 {
            return Err(SerializationError::shape(
                1,
                shape.iter().map(|&dim| dim as usize).collect::<Vec<_>>(),
                buffer.num_elements(),
                format!("tensor shape implies {expected} element(s)"),
            ));
        }
        Ok(Self { shape, buffer })
    }

    /// Any [`RawValue`]: its shape becomes the tensor shape, its element type the buffer type.
    pub fn from_raw(value: impl Into<RawValue>) -> SerializationResult<Self> {
        let (shape, buffer) = value.into().into_shaped()?;
        let shape = if shape.is_empty() { vec![1] } else { shape };
        Self::new(
            shape.into_iter().map(|dim| dim as u64).collect::<Vec<_>>(),
            TensorBuffer::new(buffer)?,
        )
    }

    #[inline]
    pub fn dtype(&self) -> ElementType {
        self.buffer.dtype()
    }

    /// The struct fields a tensor is stored as: `shape: List<u64>` and `buffer: union`.
    pub fn arrow_fields() -> Vec<Field> {
        vec![
            Field::new(
                "shape",
                DataType::List(Arc::new(Field::new("item", DataType::UInt64, false))),
                false,
            ),
            Field::new("buffer", TensorBuffer::variant_set().arrow_datatype(), false),
        ]
    }

    /// Serializes any number of tensors, one row each.
    pub fn to_arrow(tensors: &[Self]) -> SerializationResult<ArrayRef> {
        let dims: Vec<u64> = tensors.iter().flat_map(|t| t.shape.iter().copied()).collect();
        let shape = ListArray::try_new(
            Arc::new(Field::new("item", DataType::UInt64, false)),
            OffsetBuffer::from_lengths(tensors.iter().map(|t| t.shape.len())),
            Arc::new(UInt64Array::from(dims)),
            None,
        )?;

        let buffer = encode_variants(
            tensors.iter().map(|t| &t.buffer),
            &TensorBuffer::variant_set(),
        )?;

        let array = StructArray::try_new(
            Fields::from(Self::arrow_fields()),
            vec![Arc::new(shape) as ArrayRef, Arc::new(buffer) as ArrayRef],
            None,
        )?;
        Ok(Arc::new(array))
    }
}
