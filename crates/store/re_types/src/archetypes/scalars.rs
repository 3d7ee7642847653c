use re_types_core::{
    AsComponents, ComponentBatch, ComponentDescriptor, RawValue, SerializationResult,
};

use super::{Archetype, serialize_field};
use crate::components::Scalar;

/// One or more double-precision values, e.g. to be plotted over time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scalars {
    pub scalars: Option<RawValue>,
}

impl Archetype for Scalars {
    const NAME: &'static str = "rerun.archetypes.Scalars";
}

impl Scalars {
    #[inline]
    pub fn descriptor_scalars() -> ComponentDescriptor {
        Self::descriptor::<Scalar>("scalars")
    }

    #[inline]
    pub fn new(scalars: impl Into<RawValue>) -> Self {
        Self {
            scalars: Some(scalars.into()),
        }
    }

    /// Constructor for a single scalar.
    #[inline]
    pub fn one(value: f64) -> Self {
        Self::new(value)
    }

    #[inline]
    pub fn update_fields() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_scalars(mut self, scalars: impl Into<RawValue>) -> Self {
        self.scalars = Some(scalars.into());
        self
    }
}

impl AsComponents for Scalars {
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        Ok(serialize_field(Self::descriptor_scalars(), self.scalars.as_ref())?
            .into_iter()
            .collect())
    }

    #[inline]
    fn indicator(&self) -> Option<ComponentBatch> {
        Some(Self::indicator_batch())
    }
}

#[cfg(test)]
mod tests {
    use re_types_core::FlatBuffer;

    use super::*;

    #[test]
    fn every_element_is_a_row() -> anyhow::Result<()> {
        let batches = Scalars::new(vec![1_u8, 2, 3]).as_component_batches()?;
        assert_eq!(batches[0].num_instances(), 3);
        assert_eq!(batches[0].to_flat_buffer()?, FlatBuffer::F64(vec![1.0, 2.0, 3.0]));

        let batches = Scalars::one(42.0).as_component_batches()?;
        assert_eq!(batches[0].num_instances(), 1);
        Ok(())
    }

    #[test]
    fn empty_update() -> anyhow::Result<()> {
        assert!(Scalars::update_fields().as_component_batches()?.is_empty());
        Ok(())
    }
}
