use std::sync::Arc;

use arrow::array::{ArrayRef, StructArray, UInt8Array, UInt32Array};
use arrow::datatypes::{DataType, Field, Fields};
use re_types_core::{ElementType, SerializationError, SerializationResult};

/// The numeric type of each channel of an image, and the discriminant it is stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelDatatype {
    U8 = 6,
    I8 = 7,
    U16 = 8,
    I16 = 9,
    U32 = 10,
    I32 = 11,
    U64 = 12,
    I64 = 13,
    F16 = 33,
    F32 = 34,
    F64 = 35,
}

impl ChannelDatatype {
    /// Images have no boolean channels.
    pub fn from_element_type(element_type: ElementType) -> SerializationResult<Self> {
        Ok(match element_type {
            ElementType::U8 => Self::U8,
            ElementType::I8 => Self::I8,
            ElementType::U16 => Self::U16,
            ElementType::I16 => Self::I16,
            ElementType::U32 => Self::U32,
            ElementType::I32 => Self::I32,
            ElementType::U64 => Self::U64,
            ElementType::I64 => Self::I64,
            ElementType::F16 => Self::F16,
            ElementType::F32 => Self::F32,
            ElementType::F64 => Self::F64,
            ElementType::Bool => {
                return Err(SerializationError::unsupported_dtype(
                    element_type,
                    "a numeric image channel type",
                ));
            }
        })
    }

    pub fn element_type(self) -> ElementType {
        match self {
            Self::U8 => ElementType::U8,
            Self::I8 => ElementType::I8,
            Self::U16 => ElementType::U16,
            Self::I16 => ElementType::I16,
            Self::U32 => ElementType::U32,
            Self::I32 => ElementType::I32,
            Self::U64 => ElementType::U64,
            Self::I64 => ElementType::I64,
            Self::F16 => ElementType::F16,
            Self::F32 => ElementType::F32,
            Self::F64 => ElementType::F64,
        }
    }

    #[inline]
    pub fn bytes(self) -> usize {
        self.element_type().size_in_bytes()
    }
}

/// How the channels of a pixel are to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorModel {
    /// Grayscale luminance.
    L = 1,
    RGB = 2,
    RGBA = 3,
}

impl ColorModel {
    #[inline]
    pub fn num_components(self) -> usize {
        match self {
            Self::L => 1,
            Self::RGB => 3,
            Self::RGBA => 4,
        }
    }

    /// The color model of an image with this many channels, if any.
    pub fn from_num_components(num_components: usize) -> Option<Self> {
        match num_components {
            1 => Some(Self::L),
            3 => Some(Self::RGB),
            4 => Some(Self::RGBA),
            _ => None,
        }
    }
}

/// Everything needed to interpret the raw bytes of an image buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageFormat {
    pub width: u32,
    pub height: u32,
    pub channel_datatype: ChannelDatatype,
    pub color_model: ColorModel,
}

impl ImageFormat {
    #[inline]
    pub fn new(
        [width, height]: [u32; 2],
        channel_datatype: ChannelDatatype,
        color_model: ColorModel,
    ) -> Self {
        Self {
            width,
            height,
            channel_datatype,
            color_model,
        }
    }

    pub fn num_bytes(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.color_model.num_components()
            * self.channel_datatype.bytes()
    }

    pub fn arrow_fields() -> Vec<Field> {
        vec![
            Field::new("width", DataType::UInt32, false),
            Field::new("height", DataType::UInt32, false),
            Field::new("channel_datatype", DataType::UInt8, false),
            Field::new("color_model", DataType::UInt8, false),
        ]
    }

    pub fn to_arrow(formats: &[Self]) -> SerializationResult<ArrayRef> {
        let array = StructArray::try_new(
            Fields::from(Self::arrow_fields()),
            vec![
                Arc::new(UInt32Array::from_iter_values(formats.iter().map(|f| f.width)))
                    as ArrayRef,
                Arc::new(UInt32Array::from_iter_values(formats.iter().map(|f| f.height))),
                Arc::new(UInt8Array::from_iter_values(
                    formats.iter().map(|f| f.channel_datatype as u8),
                )),
                Arc::new(UInt8Array::from_iter_values(
                    formats.iter().map(|f| f.color_model as u8),
                )),
            ],
            None,
        )?;
        Ok(Arc::new(array))
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{Array as _, AsArray as _};
    use arrow::datatypes::UInt8Type;

    use super::*;

    #[test]
    fn bool_channels_are_rejected() {
        let err = ChannelDatatype::from_element_type(ElementType::Bool).unwrap_err();
        assert!(err.is_unsupported_dtype(), "{err}");
    }

    #[test]
    fn struct_layout() -> anyhow::Result<()> {
        let format = ImageFormat::new([4, 2], ChannelDatatype::F16, ColorModel::RGB);
        assert_eq!(format.num_bytes(), 4 * 2 * 3 * 2);

        let array = ImageFormat::to_arrow(&[format])?;
        assert_eq!(array.len(), 1);

        let channel_datatype = array
            .as_struct()
            .column_by_name("channel_datatype")
            .ok_or_else(|| anyhow::anyhow!("missing column"))?
            .as_primitive::<UInt8Type>()
            .value(0);
        assert_eq!(channel_datatype, 33);
        Ok(())
    }
}
