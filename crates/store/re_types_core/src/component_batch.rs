use std::sync::Arc;

use arrow::array::{
    Array as _, ArrayRef, BinaryArray, FixedSizeListArray, ListArray, NullArray, StringArray,
};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field};

use crate::{
    ArchetypeName, ComponentDescriptor, ComponentRegistry, ComponentSchema, ElementType,
    FlatBuffer, NormalizeOptions, Normalized, PartitionLengthError, RawValue, ResultExt as _,
    SerializationError, SerializationResult, ValueDomain,
};

/// The Arrow datatype of a single fixed-arity numeric instance.
pub(crate) fn instance_datatype(element_type: ElementType, arity: usize) -> DataType {
    if arity == 1 {
        element_type.arrow_datatype()
    } else {
        DataType::FixedSizeList(
            Arc::new(Field::new("item", element_type.arrow_datatype(), false)),
            i32::try_from(arity).unwrap_or(i32::MAX),
        )
    }
}

/// The canonical, serialized data of a single component: one Arrow array whose elements are the
/// instances, tagged with the [`ComponentDescriptor`] that gives them meaning.
///
/// Numeric components are stored as flat primitives when their arity is 1, and as a
/// `FixedSizeList` of primitives otherwise.
#[derive(Debug, Clone)]
pub struct ComponentBatch {
    pub descriptor: ComponentDescriptor,
    pub array: ArrayRef,
}

impl PartialEq for ComponentBatch {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        let Self { descriptor, array } = self;

        // Descriptor first!
        *descriptor == other.descriptor && **array == *other.array
    }
}

impl ComponentBatch {
    #[inline]
    pub fn new(descriptor: ComponentDescriptor, array: ArrayRef) -> Self {
        Self { descriptor, array }
    }

    /// The marker batch that identifies an archetype within a bundle.
    pub fn indicator(archetype: impl Into<ArchetypeName>) -> Self {
        Self::new(
            ComponentDescriptor::indicator(archetype),
            Arc::new(NullArray::new(1)),
        )
    }

    /// Wraps already-normalized numeric data.
    pub fn from_normalized(
        descriptor: ComponentDescriptor,
        normalized: Normalized,
    ) -> SerializationResult<Self> {
        let Normalized {
            buffer,
            num_rows,
            arity,
        } = normalized;

        let values = buffer.to_arrow();
        let array: ArrayRef = if arity == 1 {
            values
        } else {
            let field = Arc::new(Field::new("item", values.data_type().clone(), false));
            let size = i32::try_from(arity).map_err(|_err| {
                SerializationError::shape(
                    arity,
                    vec![num_rows, arity],
                    buffer.len(),
                    "arity too large",
                )
            })?;
            Arc::new(FixedSizeListArray::try_new(field, size, values, None)?)
        };

        debug_assert_eq!(array.len(), num_rows);

        Ok(Self::new(descriptor, array))
    }

    /// Normalizes and stores `value` according to `schema`.
    ///
    /// Color schemas go through [`crate::normalize_colors`], raw numeric schemas are
    /// normalized to the schema's arity and then losslessly cast to its element type.
    pub fn from_raw_with_schema(
        descriptor: ComponentDescriptor,
        value: impl Into<RawValue>,
        schema: &ComponentSchema,
        options: NormalizeOptions,
    ) -> SerializationResult<Self> {
        let ComponentSchema::Numeric {
            element_type,
            arity,
            domain,
        } = schema
        else {
            return Err(SerializationError::unsupported_dtype(
                "numeric input",
                format!("{schema} for {descriptor}"),
            ))
            .with_context(descriptor.to_string());
        };

        let normalized = match domain {
            ValueDomain::Color => crate::normalize_colors_with(value, options),
            ValueDomain::Raw => crate::normalize_with(value, *arity, options)
                .and_then(|normalized| normalized.cast_to(*element_type)),
        };

        normalized
            .and_then(|normalized| Self::from_normalized(descriptor.clone(), normalized))
            .with_context(descriptor.to_string())
    }

    /// Normalizes `value` into rows of `arity`, keeping its element type.
    ///
    /// This is how custom components without a registered schema are stored.
    pub fn from_raw(
        descriptor: ComponentDescriptor,
        value: impl Into<RawValue>,
        arity: usize,
    ) -> SerializationResult<Self> {
        crate::normalize(value, arity)
            .and_then(|normalized| Self::from_normalized(descriptor.clone(), normalized))
            .with_context(descriptor.to_string())
    }

    /// Stores `value` using the schema registered for the descriptor's component type, if any.
    ///
    /// Without a schema, the arity is inferred from the innermost dimension of the input.
    pub fn serialize(
        descriptor: ComponentDescriptor,
        value: impl Into<RawValue>,
    ) -> SerializationResult<Self> {
        let value = value.into();
        match ComponentRegistry::global().resolve(&descriptor, false)? {
            Some(schema) => {
                Self::from_raw_with_schema(descriptor, value, &schema, NormalizeOptions::default())
            }
            None => {
                let (shape, buffer) = value.into_shaped().with_context(descriptor.to_string())?;
                let arity = if shape.len() >= 2 {
                    shape.last().copied().unwrap_or(1).max(1)
                } else {
                    1
                };
                Self::from_raw(descriptor, RawValue::NdArray { shape, buffer }, arity)
            }
        }
    }

    /// One UTF-8 string per instance.
    pub fn from_strings<S: AsRef<str>>(
        descriptor: ComponentDescriptor,
        strings: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(descriptor, Arc::new(StringArray::from_iter_values(strings)))
    }

    /// One opaque byte blob per instance.
    pub fn from_blobs<B: AsRef<[u8]>>(
        descriptor: ComponentDescriptor,
        blobs: impl IntoIterator<Item = B>,
    ) -> Self {
        Self::new(descriptor, Arc::new(BinaryArray::from_iter_values(blobs)))
    }

    #[inline]
    pub fn with_descriptor_override(self, descriptor: ComponentDescriptor) -> Self {
        Self { descriptor, ..self }
    }

    /// Unconditionally sets the descriptor's archetype to the given one.
    #[inline]
    pub fn with_archetype(mut self, archetype: impl Into<ArchetypeName>) -> Self {
        self.descriptor = self.descriptor.with_archetype(archetype);
        self
    }

    /// Sets the descriptor's archetype to the given one iff it's not already set.
    #[inline]
    pub fn or_with_archetype(mut self, archetype: impl FnOnce() -> ArchetypeName) -> Self {
        self.descriptor = self.descriptor.or_with_archetype(archetype);
        self
    }

    /// See [`ComponentDescriptor::with_builtin_archetype`].
    #[inline]
    pub fn with_builtin_archetype(mut self, archetype: impl Into<ArchetypeName>) -> Self {
        self.descriptor = self.descriptor.with_builtin_archetype(archetype);
        self
    }

    /// Number of instances (rows) in this batch.
    #[inline]
    pub fn num_instances(&self) -> usize {
        self.array.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Number of scalars per instance: the `FixedSizeList` size, 1 for everything else.
    #[inline]
    pub fn arity(&self) -> usize {
        match self.array.data_type() {
            DataType::FixedSizeList(_, size) => usize::try_from(*size).unwrap_or_default(),
            _ => 1,
        }
    }

    /// The primitive values, without any `FixedSizeList` wrapping.
    pub fn flat_values(&self) -> ArrayRef {
        match self.array.as_any().downcast_ref::<FixedSizeListArray>() {
            Some(list) => list.values().slice(0, list.len() * self.arity()),
            None => self.array.clone(),
        }
    }

    /// The element type of the primitive values, if this is a numeric component.
    #[inline]
    pub fn element_type(&self) -> Option<ElementType> {
        ElementType::from_arrow_datatype(self.flat_values().data_type())
    }

    /// The primitive values as a [`FlatBuffer`].
    #[inline]
    pub fn to_flat_buffer(&self) -> SerializationResult<FlatBuffer> {
        FlatBuffer::from_arrow(&self.flat_values())
    }

    /// Partitions the batch into a [`ComponentColumn`] whose row `i` holds `lengths[i]` instances.
    ///
    /// The lengths must sum up to [`Self::num_instances`].
    pub fn partitioned(
        self,
        lengths: impl IntoIterator<Item = usize>,
    ) -> SerializationResult<ComponentColumn> {
        let lengths: Vec<usize> = lengths.into_iter().collect();

        let total: usize = lengths.iter().sum();
        if total != self.num_instances() {
            return Err(PartitionLengthError {
                column: self.descriptor.to_string(),
                reason: format!(
                    "{} partition(s) summing up to {total}, but the batch holds {} instance(s)",
                    lengths.len(),
                    self.num_instances()
                ),
            }
            .into());
        }

        let Self { descriptor, array } = self;

        let field = Arc::new(Field::new("item", array.data_type().clone(), true));
        let offsets = OffsetBuffer::from_lengths(lengths);
        let list_array = ListArray::try_new(field, offsets, array, None)?;

        Ok(ComponentColumn {
            descriptor,
            list_array,
        })
    }

    /// Partitions the batch into rows of exactly one instance each.
    #[inline]
    pub fn column_of_unit_batches(self) -> SerializationResult<ComponentColumn> {
        let len = self.num_instances();
        self.partitioned(std::iter::repeat_n(1, len))
    }
}

// ---

/// A [`ComponentBatch`] that has been split into rows, each holding zero or more instances.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentColumn {
    pub descriptor: ComponentDescriptor,

    /// One list per row.
    pub list_array: ListArray,
}

impl ComponentColumn {
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.list_array.len()
    }

    /// The number of instances in each row.
    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.list_array.offsets().lengths()
    }

    /// The instances of row `index`.
    #[inline]
    pub fn row(&self, index: usize) -> ArrayRef {
        self.list_array.value(index)
    }

    /// The instances of row `index`, as a standalone batch.
    #[inline]
    pub fn row_batch(&self, index: usize) -> ComponentBatch {
        ComponentBatch::new(self.descriptor.clone(), self.row(index))
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{AsArray as _, Float32Array};
    use arrow::datatypes::Float32Type;

    use super::*;

    fn positions() -> ComponentBatch {
        let normalized = crate::normalize(vec![[1.0_f32, 0.0, 1.0], [0.5, 0.5, 2.0]], 3).unwrap();
        ComponentBatch::from_normalized(ComponentDescriptor::new("positions"), normalized).unwrap()
    }

    #[test]
    fn fixed_size_layout() {
        let batch = positions();
        assert_eq!(batch.num_instances(), 2);
        assert_eq!(batch.arity(), 3);
        assert_eq!(batch.element_type(), Some(ElementType::F32));
        assert_eq!(
            batch.flat_values().as_primitive::<Float32Type>().values().to_vec(),
            vec![1.0, 0.0, 1.0, 0.5, 0.5, 2.0]
        );
    }

    #[test]
    fn unit_batches() -> anyhow::Result<()> {
        let column = positions().column_of_unit_batches()?;
        assert_eq!(column.num_rows(), 2);
        assert_eq!(column.lengths().collect::<Vec<_>>(), vec![1, 1]);

        let second = column.row_batch(1);
        assert_eq!(second.arity(), 3);
        assert_eq!(second.to_flat_buffer()?, FlatBuffer::F32(vec![0.5, 0.5, 2.0]));
        Ok(())
    }

    #[test]
    fn partitioned() -> anyhow::Result<()> {
        let batch = ComponentBatch::new(
            ComponentDescriptor::new("scalars"),
            Arc::new(Float32Array::from(vec![1.0, 2.0, 3.0, 4.0])),
        );

        let column = batch.clone().partitioned([3, 0, 1])?;
        assert_eq!(column.lengths().collect::<Vec<_>>(), vec![3, 0, 1]);
        assert!(column.row(1).is_empty());

        let err = batch.partitioned([2, 1]).unwrap_err();
        assert!(matches!(err, SerializationError::PartitionLength(_)), "{err}");
        Ok(())
    }

    #[test]
    fn schema_driven() -> anyhow::Result<()> {
        let schema = ComponentSchema::numeric(ElementType::U16, 1);
        let descr = ComponentDescriptor::new("class_ids");

        let batch = ComponentBatch::from_raw_with_schema(
            descr.clone(),
            vec![1_i64, 2, 3],
            &schema,
            NormalizeOptions::default(),
        )?;
        assert_eq!(batch.element_type(), Some(ElementType::U16));
        schema.validate(&batch)?;

        let err = ComponentBatch::from_raw_with_schema(
            descr,
            vec![-1_i64],
            &schema,
            NormalizeOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_range_error(), "{err}");
        assert_eq!(err.location(), vec!["class_ids"]);
        Ok(())
    }

    #[test]
    fn colors_via_schema() -> anyhow::Result<()> {
        let batch = ComponentBatch::from_raw_with_schema(
            ComponentDescriptor::new("colors"),
            [1.0_f32, 0.5, 0.0],
            &ComponentSchema::color(),
            NormalizeOptions::default(),
        )?;
        assert_eq!(batch.to_flat_buffer()?, FlatBuffer::U8(vec![255, 128, 0, 255]));
        Ok(())
    }

    #[test]
    fn strings_and_blobs() {
        let labels = ComponentBatch::from_strings(ComponentDescriptor::new("labels"), ["a", "b"]);
        assert_eq!(labels.num_instances(), 2);
        assert_eq!(labels.array.data_type(), &DataType::Utf8);

        let blobs =
            ComponentBatch::from_blobs(ComponentDescriptor::new("blob"), [vec![1_u8, 2, 3]]);
        assert_eq!(blobs.num_instances(), 1);
        assert_eq!(blobs.arity(), 1);
        assert_eq!(blobs.element_type(), None);
    }
}
