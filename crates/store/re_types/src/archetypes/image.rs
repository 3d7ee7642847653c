use re_types_core::{
    AsComponents, ComponentBatch, ComponentDescriptor, RawValue, ResultExt as _,
    SerializationError, SerializationResult,
};

use super::Archetype;
use crate::components::{ImageBuffer, ImageFormat};
use crate::datatypes::{self, ChannelDatatype, ColorModel};

#[derive(Clone, Debug, PartialEq)]
enum ImageInput {
    Raw(RawValue),
    Bytes {
        bytes: Vec<u8>,
        format: datatypes::ImageFormat,
    },
}

/// A 2D image, stored as raw little-endian bytes plus the format needed to read them back.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    data: ImageInput,
}

impl Archetype for Image {
    const NAME: &'static str = "rerun.archetypes.Image";
}

impl Image {
    #[inline]
    pub fn descriptor_buffer() -> ComponentDescriptor {
        Self::descriptor::<ImageBuffer>("buffer")
    }

    #[inline]
    pub fn descriptor_format() -> ComponentDescriptor {
        Self::descriptor::<ImageFormat>("format")
    }

    /// An image of shape `[height, width]`, `[height, width, 1]`, `[height, width, 3]` or
    /// `[height, width, 4]`, of any numeric type.
    ///
    /// The values are stored as-is: their bytes are reinterpreted, never converted.
    #[inline]
    pub fn new(value: impl Into<RawValue>) -> Self {
        Self {
            data: ImageInput::Raw(value.into()),
        }
    }

    /// Bytes that are already laid out according to `format`.
    #[inline]
    pub fn from_raw_bytes(bytes: impl Into<Vec<u8>>, format: datatypes::ImageFormat) -> Self {
        Self {
            data: ImageInput::Bytes {
                bytes: bytes.into(),
                format,
            },
        }
    }

    fn bytes_and_format(&self) -> SerializationResult<(Vec<u8>, datatypes::ImageFormat)> {
        match &self.data {
            ImageInput::Raw(value) => {
                let (shape, buffer) = value.clone().into_shaped()?;

                let (height, width, num_channels) = match shape.as_slice() {
                    [height, width] => (*height, *width, 1),
                    [height, width, channels] => (*height, *width, *channels),
                    _ => (0, 0, 0),
                };
                let Some(color_model) = ColorModel::from_num_components(num_channels) else {
                    return Err(SerializationError::shape(
                        num_channels,
                        shape,
                        buffer.len(),
                        "expected an image of shape [h, w], [h, w, 1], [h, w, 3] or [h, w, 4]",
                    ));
                };

                let channel_datatype = ChannelDatatype::from_element_type(buffer.element_type())?;
                let format = datatypes::ImageFormat::new(
                    [dimension(width)?, dimension(height)?],
                    channel_datatype,
                    color_model,
                );
                Ok((buffer.to_le_bytes(), format))
            }

            ImageInput::Bytes { bytes, format } => {
                if bytes.len() != format.num_bytes() {
                    return Err(SerializationError::shape(
                        format.color_model.num_components(),
                        vec![format.height as usize, format.width as usize],
                        bytes.len(),
                        format!(
                            "a {}x{} {:?} {:?} image takes {} byte(s)",
                            format.width,
                            format.height,
                            format.color_model,
                            format.channel_datatype,
                            format.num_bytes()
                        ),
                    ));
                }
                Ok((bytes.clone(), *format))
            }
        }
    }
}

fn dimension(size: usize) -> SerializationResult<u32> {
    u32::try_from(size).map_err(|_err| {
        SerializationError::range(size as f64, "an image dimension that fits in 32 bits")
    })
}

impl AsComponents for Image {
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        let descriptor = Self::descriptor_buffer();
        let (bytes, format) = self.bytes_and_format().with_context(descriptor.to_string())?;

        let descriptor_format = Self::descriptor_format();
        let format = datatypes::ImageFormat::to_arrow(&[format])
            .with_context(descriptor_format.to_string())?;

        Ok(vec![
            ComponentBatch::from_blobs(descriptor, [bytes]),
            ComponentBatch::new(descriptor_format, format),
        ])
    }

    #[inline]
    fn indicator(&self) -> Option<ComponentBatch> {
        Some(Self::indicator_batch())
    }
}
