use std::sync::Arc;

use re_types_core::{
    AsComponents, ComponentBatch, ComponentDescriptor, ElementType, RawValue, ResultExt as _,
    SerializationResult, encode_variants, normalize,
};

use super::{Archetype, serialize_field, serialize_strings};
use crate::components::{ClassId, Color, Rect2D, Text};
use crate::datatypes::{self, Rect2DFormat};

/// How the rectangles of a [`Boxes2D`] were given.
#[derive(Clone, Debug, PartialEq)]
pub enum RectsInput {
    /// Already constructed rectangles, each in its own format.
    Rects(Vec<datatypes::Rect2D>),

    /// Rows of 4 numbers, all in the same format.
    Array { format: Rect2DFormat, value: RawValue },
}

impl RectsInput {
    fn to_rects(&self) -> SerializationResult<Vec<datatypes::Rect2D>> {
        match self {
            Self::Rects(rects) => Ok(rects.clone()),
            Self::Array { format, value } => {
                let normalized = normalize(value.clone(), 4)?.cast_to(ElementType::F32)?;
                Ok(normalized
                    .buffer
                    .to_f64_vec()
                    .chunks_exact(4)
                    .map(|row| {
                        datatypes::Rect2D::new(
                            *format,
                            [row[0] as f32, row[1] as f32, row[2] as f32, row[3] as f32],
                        )
                    })
                    .collect())
            }
        }
    }
}

/// 2D axis-aligned boxes, each given in any of the [`Rect2DFormat`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Boxes2D {
    pub rects: Option<RectsInput>,
    pub colors: Option<RawValue>,
    pub labels: Option<Vec<String>>,
    pub class_ids: Option<RawValue>,
}

impl Archetype for Boxes2D {
    const NAME: &'static str = "rerun.archetypes.Boxes2D";
}

impl Boxes2D {
    #[inline]
    pub fn descriptor_rects() -> ComponentDescriptor {
        Self::descriptor::<Rect2D>("rects")
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

    pub fn new(rects: impl IntoIterator<Item = impl Into<datatypes::Rect2D>>) -> Self {
        Self {
            rects: Some(RectsInput::Rects(rects.into_iter().map(Into::into).collect())),
            ..Default::default()
        }
    }

    /// Rows of `[a, b, c, d]`, interpreted according to `format`.
    pub fn from_array(format: Rect2DFormat, value: impl Into<RawValue>) -> Self {
        Self {
            rects: Some(RectsInput::Array {
                format,
                value: value.into(),
            }),
            ..Default::default()
        }
    }

    #[inline]
    pub fn update_fields() -> Self {
        Self::default()
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

    fn serialize_rects(&self) -> SerializationResult<Option<ComponentBatch>> {
        let Some(rects) = &self.rects else {
            return Ok(None);
        };

        let descriptor = Self::descriptor_rects();
        let union = rects
            .to_rects()
            .and_then(|rects| encode_variants(&rects, &datatypes::Rect2D::variant_set()))
            .with_context(descriptor.to_string())?;

        Ok(Some(ComponentBatch::new(descriptor, Arc::new(union))))
    }
}

impl AsComponents for Boxes2D {
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        Ok([
            self.serialize_rects()?,
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
    use arrow::array::{Array as _, UnionArray};
    use re_types_core::ComponentRegistry;

    use super::*;
    use crate::Component as _;

    #[test]
    fn mixed_formats() -> anyhow::Result<()> {
        let boxes = Boxes2D::new([
            datatypes::Rect2D::from_min_size([0.0, 0.0], [2.0, 2.0]),
            datatypes::Rect2D::from_corners([1.0, 1.0], [3.0, 4.0]),
        ])
        .with_colors([0_u8, 255, 0]);

        let batches = boxes.as_component_batches()?;
        let rects = &batches[0];
        assert_eq!(rects.num_instances(), 2);

        let union = rects
            .array
            .as_any()
            .downcast_ref::<UnionArray>()
            .ok_or_else(|| anyhow::anyhow!("not a union"))?;
        assert_eq!(union.child(Rect2DFormat::XYWH.tag()).len(), 1);
        assert_eq!(union.child(Rect2DFormat::XYXY.tag()).len(), 1);
        assert_eq!(union.child(Rect2DFormat::XCYCWH.tag()).len(), 0);

        crate::register_builtin_components();
        let schema = ComponentRegistry::global()
            .lookup(&Rect2D::component_type())
            .ok_or_else(|| anyhow::anyhow!("Rect2D not registered"))?;
        schema.validate(rects)?;
        Ok(())
    }

    #[test]
    fn from_array() -> anyhow::Result<()> {
        let boxes = Boxes2D::from_array(Rect2DFormat::XCYCWH, vec![[5_i32, 5, 2, 4], [0, 0, 1, 1]]);
        let Some(RectsInput::Array { .. }) = &boxes.rects else {
            anyhow::bail!("expected array input");
        };
        let rects = boxes.rects.as_ref().map(RectsInput::to_rects).transpose()?;
        assert_eq!(
            rects.and_then(|rects| rects.first().copied()).map(|rect| rect.min_size()),
            Some(([4.0, 3.0], [2.0, 4.0]))
        );

        let err = Boxes2D::from_array(Rect2DFormat::XYXY, vec![1.0_f32, 2.0, 3.0])
            .as_component_batches()
            .unwrap_err();
        assert!(err.is_shape_error(), "{err}");
        assert_eq!(err.location(), vec!["Boxes2D:rects"]);
        Ok(())
    }
}
