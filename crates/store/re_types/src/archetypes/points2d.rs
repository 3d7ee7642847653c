use re_types_core::{
    AsComponents, ComponentBatch, ComponentDescriptor, RawValue, SerializationResult,
};

use super::{Archetype, serialize_field, serialize_strings};
use crate::components::{ClassId, Color, Position2D, Radius, Text};

/// A 2D point cloud with optional colors, radii, labels and class ids.
///
/// Every field but the positions may be a single value, which then applies to all points.
///
/// ```
/// # use re_types::archetypes::Points2D;
/// let points = Points2D::new(vec![[1.0_f32, 0.0], [0.5, 0.5]])
///     .with_radii(0.1_f32)
///     .with_colors([255_u8, 0, 0]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Points2D {
    pub positions: Option<RawValue>,
    pub radii: Option<RawValue>,
    pub colors: Option<RawValue>,
    pub labels: Option<Vec<String>>,
    pub class_ids: Option<RawValue>,
}

impl Archetype for Points2D {
    const NAME: &'static str = "rerun.archetypes.Points2D";
}

impl Points2D {
    #[inline]
    pub fn descriptor_positions() -> ComponentDescriptor {
        Self::descriptor::<Position2D>("positions")
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

    /// Any number of `[x, y]` positions.
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

impl AsComponents for Points2D {
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
    use super::*;

    #[test]
    fn shares_field_names_with_points3d() -> anyhow::Result<()> {
        let batches = Points2D::new([[0.0_f32, 1.0], [2.0, 3.0]]).as_component_batches()?;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].arity(), 2);

        // Same field name, different archetype: different columns.
        assert_ne!(
            Points2D::descriptor_positions(),
            crate::archetypes::Points3D::descriptor_positions()
        );
        assert_eq!(
            Points2D::descriptor_positions().column_name(),
            "Points2D:positions"
        );
        Ok(())
    }
}
