//! Structured values that don't map to plain fixed-arity numbers.

mod image_format;
mod rect2d;
mod tensor_data;

pub use self::image_format::{ChannelDatatype, ColorModel, ImageFormat};
pub use self::rect2d::{Rect2D, Rect2DFormat};
pub use self::tensor_data::{TensorBuffer, TensorData};
