//! Tagged-union encoding for components whose storage depends on a format choice.
//!
//! A component like a 2D rectangle can be described in several ways (min + size, center + size,
//! two corners), and a tensor buffer can hold any of several numeric types. Each choice is a
//! variant, identified by a small integer tag. Values are stored in a dense Arrow union: every
//! row carries exactly one variant's payload, and the other variants hold nothing for that row.

use std::sync::Arc;

use arrow::array::{Array as _, ArrayRef, UnionArray, new_empty_array};
use arrow::buffer::ScalarBuffer;
use arrow::datatypes::{DataType, Field, FieldRef, UnionFields, UnionMode};
use itertools::Itertools as _;

use crate::{SerializationError, SerializationResult};

/// Identifies a variant within a [`VariantSet`].
pub type VariantTag = i8;

/// The closed set of variants a union-typed component supports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantSet {
    fields: UnionFields,
}

impl VariantSet {
    /// The tags must be unique.
    pub fn new(variants: impl IntoIterator<Item = (VariantTag, Field)>) -> Self {
        let (tags, fields): (Vec<VariantTag>, Vec<Field>) = variants.into_iter().unzip();
        Self {
            fields: UnionFields::new(tags, fields),
        }
    }

    #[inline]
    pub fn union_fields(&self) -> &UnionFields {
        &self.fields
    }

    #[inline]
    pub fn arrow_datatype(&self) -> DataType {
        DataType::Union(self.fields.clone(), UnionMode::Dense)
    }

    #[inline]
    pub fn contains(&self, tag: VariantTag) -> bool {
        self.field(tag).is_some()
    }

    pub fn field(&self, tag: VariantTag) -> Option<&FieldRef> {
        self.fields
            .iter()
            .find_map(|(t, field)| (t == tag).then_some(field))
    }

    /// The name of the variant with the given tag.
    #[inline]
    pub fn name(&self, tag: VariantTag) -> Option<&str> {
        self.field(tag).map(|field| field.name().as_str())
    }

    pub fn tags(&self) -> impl Iterator<Item = VariantTag> + '_ {
        self.fields.iter().map(|(tag, _)| tag)
    }

    fn describe(&self) -> String {
        let names = self
            .fields
            .iter()
            .map(|(tag, field)| format!("{}={tag}", field.name()))
            .join(", ");
        format!("one of [{names}]")
    }
}

/// A value that serializes as exactly one variant of a [`VariantSet`].
pub trait VariantValue {
    /// The tag of the variant this value picks.
    fn tag(&self) -> VariantTag;

    /// The single-row payload for that variant.
    fn payload(&self) -> SerializationResult<ArrayRef>;
}

/// Encodes a single value: returns its tag and its one-row payload.
///
/// Fails if the value picks a variant that isn't part of `set`, or if the payload doesn't have
/// the datatype `set` declares for it.
pub fn encode_variant<V: VariantValue + ?Sized>(
    value: &V,
    set: &VariantSet,
) -> SerializationResult<(VariantTag, ArrayRef)> {
    let tag = value.tag();
    let Some(field) = set.field(tag) else {
        return Err(SerializationError::unsupported_dtype(
            format!("variant {tag}"),
            set.describe(),
        ));
    };

    let payload = value.payload()?;
    if payload.len() != 1 {
        return Err(SerializationError::shape(
            1,
            vec![payload.len()],
            payload.len(),
            format!("the payload of variant {:?} must be a single row", field.name()),
        ));
    }
    if payload.data_type() != field.data_type() {
        return Err(SerializationError::unsupported_dtype(
            payload.data_type(),
            format!("{} for variant {:?}", field.data_type(), field.name()),
        ));
    }

    Ok((tag, payload))
}

/// Encodes many values into a dense union array, one row per value.
pub fn encode_variants<'a, V: VariantValue + ?Sized + 'a>(
    values: impl IntoIterator<Item = &'a V>,
    set: &VariantSet,
) -> SerializationResult<UnionArray> {
    let fields: Vec<(VariantTag, FieldRef)> =
        set.fields.iter().map(|(tag, field)| (tag, field.clone())).collect();

    let mut type_ids: Vec<VariantTag> = Vec::new();
    let mut offsets: Vec<i32> = Vec::new();
    let mut payloads: Vec<Vec<ArrayRef>> = vec![Vec::new(); fields.len()];

    for value in values {
        let (tag, payload) = encode_variant(value, set)?;
        let Some(child) = fields.iter().position(|(t, _)| *t == tag) else {
            continue; // unreachable: `encode_variant` checked membership
        };
        let offset = i32::try_from(payloads[child].len()).map_err(|_err| {
            SerializationError::shape(1, vec![payloads[child].len()], 0, "too many rows")
        })?;

        type_ids.push(tag);
        offsets.push(offset);
        payloads[child].push(payload);
    }

    let children = fields
        .iter()
        .zip(payloads)
        .map(|((_, field), payloads)| -> SerializationResult<ArrayRef> {
            if payloads.is_empty() {
                Ok(new_empty_array(field.data_type()))
            } else {
                let payloads: Vec<&dyn arrow::array::Array> =
                    payloads.iter().map(|payload| payload.as_ref()).collect();
                Ok(arrow::compute::concat(&payloads)?)
            }
        })
        .collect::<SerializationResult<Vec<_>>>()?;

    Ok(UnionArray::try_new(
        set.fields.clone(),
        ScalarBuffer::from(type_ids),
        Some(ScalarBuffer::from(offsets)),
        children,
    )?)
}

/// Reads back the tag and the payload of row `index` of a dense union.
pub fn decode_variant(array: &UnionArray, index: usize) -> (VariantTag, ArrayRef) {
    let tag = array.type_id(index);
    let offset = array.value_offset(index);
    (tag, array.child(tag).slice(offset, 1))
}

/// Wraps a single-row payload into an [`ArrayRef`]. Convenience for [`VariantValue`] impls.
#[inline]
pub fn single_row(array: impl arrow::array::Array + 'static) -> ArrayRef {
    Arc::new(array)
}

#[cfg(test)]
mod tests {
    use arrow::array::{AsArray as _, Float32Array, Int64Array};
    use arrow::datatypes::{Float32Type, Int64Type};

    use super::*;

    enum Reading {
        Celsius(f32),
        Raw(i64),
    }

    impl VariantValue for Reading {
        fn tag(&self) -> VariantTag {
            match self {
                Self::Celsius(_) => 1,
                Self::Raw(_) => 2,
            }
        }

        fn payload(&self) -> SerializationResult<ArrayRef> {
            Ok(match self {
                Self::Celsius(v) => single_row(Float32Array::from(vec![*v])),
                Self::Raw(v) => single_row(Int64Array::from(vec![*v])),
            })
        }
    }

    fn set() -> VariantSet {
        VariantSet::new([
            (1, Field::new("celsius", DataType::Float32, false)),
            (2, Field::new("raw", DataType::Int64, false)),
        ])
    }

    #[test]
    fn siblings_stay_empty() -> anyhow::Result<()> {
        let union = encode_variants(&[Reading::Celsius(21.5), Reading::Celsius(22.0)], &set())?;

        assert_eq!(union.len(), 2);
        assert_eq!(union.child(1).len(), 2);
        assert_eq!(union.child(2).len(), 0);
        Ok(())
    }

    #[test]
    fn mixed_variants() -> anyhow::Result<()> {
        let union = encode_variants(
            &[Reading::Raw(7), Reading::Celsius(21.5), Reading::Raw(9)],
            &set(),
        )?;

        let (tag, payload) = decode_variant(&union, 0);
        assert_eq!(tag, 2);
        assert_eq!(payload.as_primitive::<Int64Type>().value(0), 7);

        let (tag, payload) = decode_variant(&union, 1);
        assert_eq!(tag, 1);
        assert_eq!(payload.as_primitive::<Float32Type>().value(0), 21.5);

        let (tag, payload) = decode_variant(&union, 2);
        assert_eq!(tag, 2);
        assert_eq!(payload.as_primitive::<Int64Type>().value(0), 9);
        Ok(())
    }

    #[test]
    fn unknown_variant() {
        let set = VariantSet::new([(1, Field::new("celsius", DataType::Float32, false))]);
        let err = encode_variant(&Reading::Raw(7), &set).unwrap_err();
        assert!(err.is_unsupported_dtype(), "{err}");
    }
}
