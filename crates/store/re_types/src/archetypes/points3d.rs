use re_types_core::{
    AsComponents, ComponentBatch, ComponentDescriptor, RawValue, SerializationResult,
};

use super::{Archetype, serialize_field, serialize_strings};
use crate::components::{ClassId, Color, Position3D, Radius, Text};

/// A 3D point cloud with optional colors, radii, labels and class ids.
///
/// Every field but the positions may be a single value, which then applies to all points.
///
/// ```
/// # use re_types::archetypes::Points3D;
/// let points = Points3D::new(vec![[1.0_f32, 0.0, 1.0], [0.5, 0.5, 2.0]])
///     .with_radii(0.1_f32)
///     .with_colors([255_u8, 0, 0]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Points3D {
    pub positions: Option<RawValue>,
    pub radii: Option<RawValue>,
    pub colors: Option<RawValue>,
    pub labels: Option<Vec<String>>,
    pub class_ids: Option<RawValue>,
}

impl Archetype for Points3D {
    const NAME: &'static str = "rerun.archetypes.Points3D";
}

impl Points3D {
    #[inline]
    pub fn descriptor_positions() -> ComponentDescriptor {
        Self::descriptor::<Position3D>("positions")
    }

    #[inline]
    pub fn descriptor_radii() -> ComponentDescriptor {
        Self::descriptor::<Radius>("radii")
    }

    #[inline]
    pub fn descriptor_colors() -> ComponentDescriptor {
        Self::descriptor::<Color>("colors")
    }

    #[inline]
    pub fn descriptor_labels() -> ComponentDescriptor {
        Self::descriptor::<Text>("labels")
    }

    #[inline]
    pub fn descriptor_class_ids() -> ComponentDescriptor {
        Self::descriptor::<ClassId>("class_ids")
    }

    /// Any number of `[x, y, z]` positions.
    #[inline]
    pub fn new(positions: impl Into<RawValue>) -> Self {
        Self {
            positions: Some(positions.into()),
            ..Default::default()
        }
    }

    /// An empty update: only the fields set with `with_*` will be sent.
    #[inline]
    pub fn update_fields() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_positions(mut self, positions: impl Into<RawValue>) -> Self {
        self.positions = Some(positions.into());
        self
    }

    #[inline]
    pub fn with_radii(mut self, radii: impl Into<RawValue>) -> Self {
        self.radii = Some(radii.into());
        self
    }

    #[inline]
    pub fn with_colors(mut self, colors: impl Into<RawValue>) -> Self {
        self.colors = Some(colors.into());
        self
    }

    #[inline]
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    pub fn with_class_ids(mut self, class_ids: impl Into<RawValue>) -> Self {
        self.class_ids = Some(class_ids.into());
        self
    }
}

impl AsComponents for Points3D {
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        Ok([
            serialize_field(Self::descriptor_positions(), self.positions.as_ref())?,
            serialize_field(Self::descriptor_radii(), self.radii.as_ref())?,
            serialize_field(Self::descriptor_colors(), self.colors.as_ref())?,
            serialize_strings(Self::descriptor_labels(), self.labels.as_ref()),
            serialize_field(Self::descriptor_class_ids(), self.class_ids.as_ref())?,
        ]
        .into_iter()
        .flatten()
        .collect())
    }

    #[inline]
    fn indicator(&self) -> Option<ComponentBatch> {
        Some(Self::indicator_batch())
    }
}

#[cfg(test)]
mod tests {
    use re_types_core::{ArchetypeBundle, ElementType, FlatBuffer};

    use super::*;

    #[test]
    fn canonical_storage() -> anyhow::Result<()> {
        let points = Points3D::new(vec![[1_i32, 0, 1], [2, 2, 2]])
            .with_radii(0.5_f64)
            .with_colors(vec![[1.0_f32, 0.5, 0.0], [0.0, 0.0, 1.0]])
            .with_labels(["a", "b"])
            .with_class_ids(vec![1_i64, 2]);

        let batches = points.as_component_batches()?;
        assert_eq!(batches.len(), 5);

        let positions = &batches[0];
        assert_eq!(positions.descriptor, Points3D::descriptor_positions());
        assert_eq!(positions.num_instances(), 2);
        assert_eq!(positions.arity(), 3);
        assert_eq!(positions.element_type(), Some(ElementType::F32));

        let radii = &batches[1];
        assert_eq!(radii.num_instances(), 1);
        assert_eq!(radii.to_flat_buffer()?, FlatBuffer::F32(vec![0.5]));

        let colors = &batches[2];
        assert_eq!(
            colors.to_flat_buffer()?,
            FlatBuffer::U8(vec![255, 128, 0, 255, 0, 0, 255, 255])
        );

        assert_eq!(batches[4].element_type(), Some(ElementType::U16));
        Ok(())
    }

    #[test]
    fn errors_name_the_field() {
        let err = Points3D::new(vec![1.0_f32, 2.0, 3.0, 4.0])
            .as_component_batches()
            .unwrap_err();
        assert!(err.is_shape_error(), "{err}");
        assert!(err.to_string().starts_with("Points3D:positions"), "{err}");

        let err = Points3D::new([0.0_f32, 0.0, 0.0])
            .with_colors([200.0_f32, 0.0, 0.0])
            .as_component_batches()
            .unwrap_err();
        assert!(err.is_range_error(), "{err}");
    }

    #[test]
    fn splat_and_mismatch() -> anyhow::Result<()> {
        let splat = Points3D::new(vec![[0.0_f32; 3]; 3]).with_radii(vec![0.5_f32]);
        let bundle = ArchetypeBundle::from_as_components("points", &splat)?;
        assert_eq!(bundle.num_instances(), 3);
        assert_eq!(bundle.indicators().len(), 1);

        let mismatch = Points3D::new(vec![[0.0_f32; 3]; 3]).with_radii(vec![0.5_f32, 0.5]);
        let err = ArchetypeBundle::from_as_components("points", &mismatch).unwrap_err();
        assert!(err.is_row_count_mismatch(), "{err}");
        assert!(err.to_string().contains("Points3D:positions=3"), "{err}");
        assert!(err.to_string().contains("Points3D:radii=2"), "{err}");
        Ok(())
    }
}
