//! Built-in archetypes.
//!
//! Archetypes hold on to the raw user input and only normalize it when asked for their
//! component batches, so that every error surfaces from the logging call that sent them.

mod boxes2d;
mod image;
mod points2d;
mod points3d;
mod scalars;
mod tensor;

pub use self::boxes2d::{Boxes2D, RectsInput};
pub use self::image::Image;
pub use self::points2d::Points2D;
pub use self::points3d::Points3D;
pub use self::scalars::Scalars;
pub use self::tensor::{Tensor, TensorInput};

use re_types_core::{
    ArchetypeName, ComponentBatch, ComponentDescriptor, RawValue, SerializationResult,
};

use crate::Component;

/// A built-in archetype: a named set of components, plus the indicator that marks it.
pub trait Archetype {
    /// The fully-qualified name, e.g. `rerun.archetypes.Points3D`.
    const NAME: &'static str;

    #[inline]
    fn name() -> ArchetypeName {
        ArchetypeName::new(Self::NAME)
    }

    /// The descriptor of the field `component` of this archetype, holding `C`s.
    #[inline]
    fn descriptor<C: Component>(component: &str) -> ComponentDescriptor {
        ComponentDescriptor::new(component)
            .with_archetype(Self::NAME)
            .with_component_type(C::NAME)
    }

    #[inline]
    fn indicator_batch() -> ComponentBatch {
        ComponentBatch::indicator(Self::NAME)
    }
}

/// Serializes one optional archetype field according to its registered schema.
pub(crate) fn serialize_field(
    descriptor: ComponentDescriptor,
    value: Option<&RawValue>,
) -> SerializationResult<Option<ComponentBatch>> {
    crate::register_builtin_components();

    value
        .map(|value| ComponentBatch::serialize(descriptor, value.clone()))
        .transpose()
}

/// Labels are stored as-is, one string per instance.
pub(crate) fn serialize_strings(
    descriptor: ComponentDescriptor,
    strings: Option<&Vec<String>>,
) -> Option<ComponentBatch> {
    strings.map(|strings| ComponentBatch::from_strings(descriptor, strings))
}
