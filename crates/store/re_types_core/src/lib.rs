//! The core types and traits of the columnar logging SDK.
//!
//! User data goes through three stages before it leaves the process:
//! 1. Loose input ([`RawValue`]) is normalized into canonical `(rows × arity)` form ([`normalize`],
//!    [`normalize_colors`]).
//! 2. Canonical data is wrapped in a [`ComponentBatch`], tagged with a [`ComponentDescriptor`].
//! 3. Batches from one or more [`AsComponents`] are grouped into an [`ArchetypeBundle`].
//!
//! Tagged unions (e.g. rectangle formats, tensor dtypes) are encoded with [`encode_variants`].

mod archetype_bundle;
mod color;
mod component_batch;
mod component_descriptor;
mod element_type;
mod names;
mod normalize;
mod registry;
mod result;
mod variant;

pub use self::archetype_bundle::{ArchetypeBundle, BundleBuilder};
pub use self::color::{
    COLOR_ARITY, Rgba32, gamma_u8_from_float, normalize_colors, normalize_colors_with,
};
pub use self::component_batch::{ComponentBatch, ComponentColumn};
pub use self::component_descriptor::{
    ComponentDescriptor, FIELD_METADATA_KEY_ARCHETYPE, FIELD_METADATA_KEY_COMPONENT,
    FIELD_METADATA_KEY_COMPONENT_TYPE,
};
pub use self::element_type::{ElementType, FlatBuffer, NativeElement};
pub use self::names::{
    ArchetypeName, BUILTIN_NAMESPACE, ComponentIdentifier, ComponentType, EntityPath,
};
pub use self::normalize::{NormalizeOptions, Normalized, RawValue, normalize, normalize_with};
pub use self::registry::{ComponentRegistry, ComponentSchema, ValueDomain};
pub use self::result::{
    PartitionLengthError, ResultExt, SerializationError, SerializationResult,
};
pub use self::variant::{
    VariantSet, VariantTag, VariantValue, decode_variant, encode_variant, encode_variants,
    single_row,
};

pub mod external {
    pub use arrow;
    pub use half;
}

// ---

/// Describes the interface for interpreting an object as a bundle of component batches.
///
/// Archetypes implement this to expose their fields, but anything can: a single
/// [`ComponentBatch`], a `Vec` of them, or a list of other [`AsComponents`] whose batches are
/// merged in order.
///
/// Serialization is fallible, and errors must name the offending component.
pub trait AsComponents {
    /// Exposes the object's contents as a set of [`ComponentBatch`]es.
    ///
    /// This is the main mechanism for easily extending builtin archetypes or even writing
    /// fully custom ones.
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>>;

    /// The marker batch identifying the archetype this object represents, if any.
    #[inline]
    fn indicator(&self) -> Option<ComponentBatch> {
        None
    }
}

impl AsComponents for ComponentBatch {
    #[inline]
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        Ok(vec![self.clone()])
    }
}

impl AsComponents for [ComponentBatch] {
    #[inline]
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        Ok(self.to_vec())
    }
}

impl AsComponents for Vec<ComponentBatch> {
    #[inline]
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        Ok(self.clone())
    }
}

impl<const N: usize> AsComponents for [ComponentBatch; N] {
    #[inline]
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        Ok(self.to_vec())
    }
}

fn merge_as_components<'a, T: AsComponents + ?Sized + 'a>(
    all: impl IntoIterator<Item = &'a T>,
) -> SerializationResult<Vec<ComponentBatch>> {
    let mut batches = Vec::new();
    for as_components in all {
        batches.extend(as_components.as_component_batches()?);
        batches.extend(as_components.indicator());
    }
    Ok(batches)
}

impl AsComponents for [&dyn AsComponents] {
    #[inline]
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        merge_as_components(self.iter().copied())
    }
}

impl AsComponents for Vec<&dyn AsComponents> {
    #[inline]
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        merge_as_components(self.iter().copied())
    }
}

impl<const N: usize> AsComponents for [&dyn AsComponents; N] {
    #[inline]
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        merge_as_components(self.iter().copied())
    }
}

impl AsComponents for Vec<Box<dyn AsComponents>> {
    #[inline]
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        merge_as_components(self.iter().map(|as_components| &**as_components))
    }
}
