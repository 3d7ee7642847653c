use std::sync::Arc;

use arrow::array::{ArrayRef, FixedSizeListArray, Float32Array};
use arrow::datatypes::{DataType, Field};
use re_types_core::{SerializationResult, VariantSet, VariantTag, VariantValue};

/// The ways a [`Rect2D`] can be described, and the variant tag each one is stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rect2DFormat {
    /// `[x_min, y_min, width, height]`
    XYWH = 1,

    /// `[x_center, y_center, width, height]`
    XCYCWH = 2,

    /// `[x_min, y_min, x_max, y_max]`
    XYXY = 3,
}

impl Rect2DFormat {
    pub const ALL: [Self; 3] = [Self::XYWH, Self::XCYCWH, Self::XYXY];

    #[inline]
    pub fn tag(self) -> VariantTag {
        self as VariantTag
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Self::XYWH => "XYWH",
            Self::XCYCWH => "XCYCWH",
            Self::XYXY => "XYXY",
        }
    }
}

/// An axis-aligned 2D rectangle, stored in whichever format it was given in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect2D {
    pub format: Rect2DFormat,
    pub values: [f32; 4],
}

impl Rect2D {
    #[inline]
    pub fn new(format: Rect2DFormat, values: [f32; 4]) -> Self {
        Self { format, values }
    }

    #[inline]
    pub fn from_min_size([x, y]: [f32; 2], [w, h]: [f32; 2]) -> Self {
        Self::new(Rect2DFormat::XYWH, [x, y, w, h])
    }

    #[inline]
    pub fn from_center_size([cx, cy]: [f32; 2], [w, h]: [f32; 2]) -> Self {
        Self::new(Rect2DFormat::XCYCWH, [cx, cy, w, h])
    }

    #[inline]
    pub fn from_corners([x0, y0]: [f32; 2], [x1, y1]: [f32; 2]) -> Self {
        Self::new(Rect2DFormat::XYXY, [x0, y0, x1, y1])
    }

    /// `(min, size)`, whatever the format.
    pub fn min_size(&self) -> ([f32; 2], [f32; 2]) {
        let [a, b, c, d] = self.values;
        match self.format {
            Rect2DFormat::XYWH => ([a, b], [c, d]),
            Rect2DFormat::XCYCWH => ([a - c / 2.0, b - d / 2.0], [c, d]),
            Rect2DFormat::XYXY => ([a.min(c), b.min(d)], [(c - a).abs(), (d - b).abs()]),
        }
    }

    /// The variants a rectangle can be stored as: one `FixedSizeList<f32, 4>` per format.
    pub fn variant_set() -> VariantSet {
        VariantSet::new(Rect2DFormat::ALL.into_iter().map(|format| {
            (
                format.tag(),
                Field::new(format.name(), Self::payload_datatype(), false),
            )
        }))
    }

    fn payload_datatype() -> DataType {
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, false)), 4)
    }
}

impl VariantValue for Rect2D {
    #[inline]
    fn tag(&self) -> VariantTag {
        self.format.tag()
    }

    fn payload(&self) -> SerializationResult<ArrayRef> {
        let values = Arc::new(Float32Array::from(self.values.to_vec()));
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        Ok(Arc::new(FixedSizeListArray::try_new(field, 4, values, None)?))
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{Array as _, AsArray as _};
    use arrow::datatypes::Float32Type;
    use re_types_core::{decode_variant, encode_variants};

    use super::*;

    #[test]
    fn formats_are_kept() -> anyhow::Result<()> {
        let rects = [
            Rect2D::from_center_size([5.0, 5.0], [2.0, 4.0]),
            Rect2D::from_min_size([4.0, 3.0], [2.0, 4.0]),
        ];
        let union = encode_variants(&rects, &Rect2D::variant_set())?;

        assert_eq!(union.len(), 2);
        assert_eq!(union.child(Rect2DFormat::XCYCWH.tag()).len(), 1);
        assert_eq!(union.child(Rect2DFormat::XYWH.tag()).len(), 1);
        assert_eq!(union.child(Rect2DFormat::XYXY.tag()).len(), 0);

        let (tag, payload) = decode_variant(&union, 0);
        assert_eq!(tag, Rect2DFormat::XCYCWH.tag());
        let values = payload.as_fixed_size_list().value(0);
        assert_eq!(
            values.as_primitive::<Float32Type>().values().to_vec(),
            vec![5.0, 5.0, 2.0, 4.0]
        );
        Ok(())
    }

    #[test]
    fn min_size_agrees() {
        let expected = ([4.0, 3.0], [2.0, 4.0]);
        assert_eq!(Rect2D::from_center_size([5.0, 5.0], [2.0, 4.0]).min_size(), expected);
        assert_eq!(Rect2D::from_corners([6.0, 7.0], [4.0, 3.0]).min_size(), expected);
        assert_eq!(Rect2D::from_min_size([4.0, 3.0], [2.0, 4.0]).min_size(), expected);
    }
}
