//! Utilities to log an arbitrary, user-defined archetype.

use arrow::array::ArrayRef;
use indexmap::IndexMap;
use re_types_core::{
    ArchetypeName, AsComponents, ComponentBatch, ComponentDescriptor, ComponentIdentifier,
    ComponentType, RawValue, SerializationResult,
};

use crate::Component;

#[derive(Clone, Debug, PartialEq)]
enum PendingField {
    Serialized(ComponentBatch),
    Raw {
        descriptor: ComponentDescriptor,
        value: RawValue,

        /// `None` lets the registered schema (or the input's shape) decide.
        arity: Option<usize>,
    },
}

impl PendingField {
    fn serialize(&self) -> SerializationResult<ComponentBatch> {
        match self {
            Self::Serialized(batch) => Ok(batch.clone()),
            Self::Raw {
                descriptor,
                value,
                arity: None,
            } => {
                crate::register_builtin_components();
                ComponentBatch::serialize(descriptor.clone(), value.clone())
            }
            Self::Raw {
                descriptor,
                value,
                arity: Some(arity),
            } => ComponentBatch::from_raw(descriptor.clone(), value.clone(), *arity),
        }
    }
}

/// A helper for logging a dynamically defined archetype.
///
/// Every field gets a descriptor owned by the given archetype, so fields of the same name on
/// different archetypes never collide.
#[derive(Clone, Debug)]
pub struct DynamicArchetype {
    archetype_name: ArchetypeName,
    fields: IndexMap<ComponentIdentifier, PendingField>,
}

impl DynamicArchetype {
    /// Specifies an archetype name for this dynamically generated archetype.
    #[inline]
    pub fn new(archetype_name: impl Into<ArchetypeName>) -> Self {
        Self {
            archetype_name: archetype_name.into(),
            fields: IndexMap::default(),
        }
    }

    fn descriptor(&self, field: &str) -> ComponentDescriptor {
        ComponentDescriptor::new(field).with_builtin_archetype(self.archetype_name.clone())
    }

    fn insert(mut self, field: &str, pending: PendingField) -> Self {
        let component = ComponentIdentifier::new(field);
        self.fields.shift_remove(&component);
        self.fields.insert(component, pending);
        self
    }

    /// Adds a field of arbitrary, already serialized data.
    ///
    /// In many cases, it might be more convenient to use [`Self::with_component`] instead.
    #[inline]
    pub fn with_component_from_data(self, field: impl AsRef<str>, array: ArrayRef) -> Self {
        let field = field.as_ref();
        let batch = ComponentBatch::new(self.descriptor(field), array);
        self.insert(field, PendingField::Serialized(batch))
    }

    /// Adds a field holding a built-in [`Component`].
    #[inline]
    pub fn with_component<C: Component>(
        self,
        field: impl AsRef<str>,
        value: impl Into<RawValue>,
    ) -> Self {
        self.with_component_override(field, C::component_type(), value)
    }

    /// Adds a field of any component type.
    ///
    /// The value is stored according to the schema registered for `component_type`, if any.
    pub fn with_component_override(
        self,
        field: impl AsRef<str>,
        component_type: impl Into<ComponentType>,
        value: impl Into<RawValue>,
    ) -> Self {
        let field = field.as_ref();
        let descriptor = self.descriptor(field).with_component_type(component_type);
        self.insert(
            field,
            PendingField::Raw {
                descriptor,
                value: value.into(),
                arity: None,
            },
        )
    }

    /// Adds a field of untyped numeric data, split into rows of `arity` values.
    pub fn with_custom_component(
        self,
        field: impl AsRef<str>,
        value: impl Into<RawValue>,
        arity: usize,
    ) -> Self {
        let field = field.as_ref();
        let descriptor = self.descriptor(field);
        self.insert(
            field,
            PendingField::Raw {
                descriptor,
                value: value.into(),
                arity: Some(arity),
            },
        )
    }

    /// Adds a field of strings, one per instance.
    pub fn with_strings(
        self,
        field: impl AsRef<str>,
        strings: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        let field = field.as_ref();
        let batch = ComponentBatch::from_strings(self.descriptor(field), strings);
        self.insert(field, PendingField::Serialized(batch))
    }
}

impl AsComponents for DynamicArchetype {
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        self.fields.values().map(PendingField::serialize).collect()
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use re_types_core::{ElementType, FlatBuffer};

    use super::*;
    use crate::components;

    #[test]
    fn with_archetype() -> anyhow::Result<()> {
        let values = DynamicArchetype::new("MyExample")
            .with_component::<components::Scalar>("confidence", [1.2_f64, 3.4, 5.6])
            .with_component_override("homepage", "user.url", vec![1_u8, 2])
            .with_component_from_data(
                "description",
                std::sync::Arc::new(arrow::array::StringArray::from(vec!["Bla bla bla…"])),
            );

        let actual = values
            .as_component_batches()?
            .into_iter()
            .map(|batch| batch.descriptor)
            .collect::<BTreeSet<_>>();

        similar_asserts::assert_eq!(
            actual,
            [
                ComponentDescriptor::new("confidence")
                    .with_builtin_archetype("MyExample")
                    .with_component_type(components::Scalar::NAME),
                ComponentDescriptor::new("homepage")
                    .with_component_type("user.url")
                    .with_builtin_archetype("MyExample"),
                ComponentDescriptor::new("description").with_builtin_archetype("MyExample"),
            ]
            .into_iter()
            .collect()
        );
        Ok(())
    }

    #[test]
    fn custom_components_keep_their_dtype() -> anyhow::Result<()> {
        let batches = DynamicArchetype::new("user.Sensor")
            .with_custom_component("confidence", vec![[1_i16, 2], [3, 4], [5, 6]], 2)
            .with_strings("notes", ["a", "b", "c"])
            .as_component_batches()?;

        assert_eq!(batches[0].num_instances(), 3);
        assert_eq!(batches[0].arity(), 2);
        assert_eq!(batches[0].element_type(), Some(ElementType::I16));
        assert_eq!(batches[1].num_instances(), 3);
        Ok(())
    }

    #[test]
    fn last_field_wins() -> anyhow::Result<()> {
        let batches = DynamicArchetype::new("MyExample")
            .with_custom_component("a", vec![1.0_f32], 1)
            .with_custom_component("b", vec![2.0_f32], 1)
            .with_custom_component("a", vec![3.0_f32], 1)
            .as_component_batches()?;

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].descriptor.component.as_str(), "a");
        assert_eq!(batches[1].to_flat_buffer()?, FlatBuffer::F32(vec![3.0]));
        Ok(())
    }

    #[test]
    fn schema_errors_surface() {
        let err = DynamicArchetype::new("MyExample")
            .with_component::<components::ClassId>("ids", vec![-1_i32])
            .as_component_batches()
            .unwrap_err();
        assert!(err.is_range_error(), "{err}");
    }
}
