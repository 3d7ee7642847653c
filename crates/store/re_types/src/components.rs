//! Built-in component types and their canonical storage.

use re_types_core::{ComponentSchema, ComponentType, ElementType};

use crate::datatypes;

/// A built-in component type: a name in the `rerun.components` namespace and a schema.
pub trait Component {
    /// The fully-qualified name, e.g. `rerun.components.Position3D`.
    const NAME: &'static str;

    fn schema() -> ComponentSchema;

    #[inline]
    fn component_type() -> ComponentType {
        ComponentType::new(Self::NAME)
    }
}

macro_rules! numeric_component {
    ($(#[$meta:meta])* $name:ident, $element_type:expr, $arity:expr) => {
        $(#[$meta])*
        pub struct $name;

        impl Component for $name {
            const NAME: &'static str = concat!("rerun.components.", stringify!($name));

            #[inline]
            fn schema() -> ComponentSchema {
                ComponentSchema::numeric($element_type, $arity)
            }
        }
    };
}

numeric_component!(
    /// A point in 3D space: `[x, y, z]` as `f32`.
    Position3D,
    ElementType::F32,
    3
);

numeric_component!(
    /// A point in 2D space: `[x, y]` as `f32`.
    Position2D,
    ElementType::F32,
    2
);

numeric_component!(
    /// The radius of something, e.g. a point.
    Radius,
    ElementType::F32,
    1
);

numeric_component!(
    /// A 16-bit class identifier, used to look up labels and colors.
    ClassId,
    ElementType::U16,
    1
);

numeric_component!(
    /// A double-precision scalar, e.g. for plotting.
    Scalar,
    ElementType::F64,
    1
);

/// An sRGBA color with unmultiplied alpha, stored as 4 `u8` channels.
pub struct Color;

impl Component for Color {
    const NAME: &'static str = "rerun.components.Color";

    #[inline]
    fn schema() -> ComponentSchema {
        ComponentSchema::color()
    }
}

/// A UTF-8 string.
pub struct Text;

impl Component for Text {
    const NAME: &'static str = "rerun.components.Text";

    #[inline]
    fn schema() -> ComponentSchema {
        ComponentSchema::Text
    }
}

/// An axis-aligned 2D rectangle, in one of several formats. See [`datatypes::Rect2D`].
pub struct Rect2D;

impl Component for Rect2D {
    const NAME: &'static str = "rerun.components.Rect2D";

    #[inline]
    fn schema() -> ComponentSchema {
        ComponentSchema::Union(datatypes::Rect2D::variant_set().union_fields().clone())
    }
}

/// An N-D array: shape plus a typed buffer. See [`datatypes::TensorData`].
pub struct TensorData;

impl Component for TensorData {
    const NAME: &'static str = "rerun.components.TensorData";

    #[inline]
    fn schema() -> ComponentSchema {
        ComponentSchema::Struct(datatypes::TensorData::arrow_fields())
    }
}

/// The raw little-endian bytes of an image.
pub struct ImageBuffer;

impl Component for ImageBuffer {
    const NAME: &'static str = "rerun.components.ImageBuffer";

    #[inline]
    fn schema() -> ComponentSchema {
        ComponentSchema::Blob
    }
}

/// How to interpret an [`ImageBuffer`]. See [`datatypes::ImageFormat`].
pub struct ImageFormat;

impl Component for ImageFormat {
    const NAME: &'static str = "rerun.components.ImageFormat";

    #[inline]
    fn schema() -> ComponentSchema {
        ComponentSchema::Struct(datatypes::ImageFormat::arrow_fields())
    }
}

/// Every built-in component, with its schema.
pub fn builtin_schemas() -> Vec<(&'static str, ComponentSchema)> {
    fn entry<C: Component>() -> (&'static str, ComponentSchema) {
        (C::NAME, C::schema())
    }

    vec![
        entry::<Position3D>(),
        entry::<Position2D>(),
        entry::<Radius>(),
        entry::<ClassId>(),
        entry::<Scalar>(),
        entry::<Color>(),
        entry::<Text>(),
        entry::<Rect2D>(),
        entry::<TensorData>(),
        entry::<ImageBuffer>(),
        entry::<ImageFormat>(),
    ]
}
