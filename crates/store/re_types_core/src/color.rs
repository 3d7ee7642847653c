//! Color normalization: everything ends up as one `[r, g, b, a]` row of `u8`s per color.

use crate::{
    ElementType, FlatBuffer, NormalizeOptions, Normalized, RawValue, SerializationError,
    SerializationResult,
};

/// Number of channels in a canonical color.
pub const COLOR_ARITY: usize = 4;

/// Floats slightly outside of `[0, 1]` are clamped, anything further out is an error.
const FLOAT_TOLERANCE: f64 = 0.1;

/// An sRGB color with unmultiplied alpha, packed as `0xRRGGBBAA`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba32(pub u32);

impl Rgba32 {
    pub const WHITE: Self = Self::from_rgb(255, 255, 255);
    pub const BLACK: Self = Self::from_rgb(0, 0, 0);

    #[inline]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_unmultiplied_rgba(r, g, b, 255)
    }

    #[inline]
    pub const fn from_unmultiplied_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<[u8; 3]> for Rgba32 {
    #[inline]
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::from_rgb(r, g, b)
    }
}

impl From<[u8; 4]> for Rgba32 {
    #[inline]
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::from_unmultiplied_rgba(r, g, b, a)
    }
}

impl From<Rgba32> for RawValue {
    #[inline]
    fn from(color: Rgba32) -> Self {
        Self::Scalar(FlatBuffer::U32(vec![color.0]))
    }
}

impl From<Vec<Rgba32>> for RawValue {
    #[inline]
    fn from(colors: Vec<Rgba32>) -> Self {
        Self::Flat(FlatBuffer::U32(colors.into_iter().map(|c| c.0).collect()))
    }
}

/// Converts a gamma-encoded float in `[0, 1]` to a `u8`, rounding to nearest.
///
/// ```
/// # use re_types_core::gamma_u8_from_float;
/// assert_eq!(gamma_u8_from_float(1.0), Some(255));
/// assert_eq!(gamma_u8_from_float(0.5), Some(128));
/// assert_eq!(gamma_u8_from_float(1.05), Some(255));
/// assert_eq!(gamma_u8_from_float(200.0), None);
/// ```
#[inline]
pub fn gamma_u8_from_float(value: f64) -> Option<u8> {
    if !value.is_finite() || value < -FLOAT_TOLERANCE || 1.0 + FLOAT_TOLERANCE < value {
        return None;
    }
    Some((value.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Normalizes colors into rows of 4 `u8` RGBA channels.
///
/// See [`normalize_colors_with`].
#[inline]
pub fn normalize_colors(value: impl Into<RawValue>) -> SerializationResult<Normalized> {
    normalize_colors_with(value, NormalizeOptions::default())
}

/// Normalizes colors into rows of 4 `u8` RGBA channels.
///
/// Accepted inputs:
/// * RGB or RGBA records (e.g. `[[255, 0, 0], [0, 255, 0]]`), or a single RGB/RGBA color.
///   Missing alpha becomes 255.
/// * A flat sequence of several colors, which must be RGBA (a multiple of 4 values).
/// * Integer channels must be in `0..=255`.
/// * Float channels are gamma-encoded in `[0, 1]` and scaled by 255. Values that are obviously
///   meant to be `0..=255` are a [`SerializationError::Range`], not silently clamped.
/// * `u32`s (scalar or flat) are packed `0xRRGGBBAA` colors.
pub fn normalize_colors_with(
    value: impl Into<RawValue>,
    options: NormalizeOptions,
) -> SerializationResult<Normalized> {
    let (shape, buffer) = value.into().into_shaped()?;
    let num_elements = buffer.len();

    if let FlatBuffer::U32(packed) = &buffer {
        if shape.len() <= 1 {
            let buffer: Vec<u8> = packed.iter().flat_map(|&c| Rgba32(c).to_array()).collect();
            return finish(FlatBuffer::U8(buffer), COLOR_ARITY, options, &shape);
        }
    }

    let channels = match (shape.as_slice(), options.num_rows) {
        (_, Some(0)) if num_elements == 0 => COLOR_ARITY,
        (_, Some(num_rows)) if num_rows > 0 && num_elements % num_rows == 0 => {
            num_elements / num_rows
        }
        ([.., innermost], None) if shape.len() >= 2 => *innermost,
        ([len @ (3 | 4)], None) => *len,

        // A flat sequence of several colors can only be RGBA.
        ([len], None) if len % COLOR_ARITY == 0 => COLOR_ARITY,
        _ => 0,
    };

    if num_elements == 0 {
        return finish(FlatBuffer::U8(Vec::new()), COLOR_ARITY, options, &shape);
    }

    if channels != 3 && channels != 4 {
        return Err(SerializationError::shape(
            COLOR_ARITY,
            shape,
            num_elements,
            "colors must have 3 (RGB) or 4 (RGBA) channels",
        ));
    }

    let element_type = buffer.element_type();
    let rgba = if element_type.is_float() {
        buffer
            .to_f64_vec()
            .into_iter()
            .map(|v| {
                gamma_u8_from_float(v).ok_or_else(|| {
                    SerializationError::range(
                        v,
                        "[0.0, 1.0] for float colors (use integers for 0-255 colors)",
                    )
                })
            })
            .collect::<SerializationResult<Vec<u8>>>()?
    } else if element_type.is_integer() {
        match buffer.cast_to(ElementType::U8)? {
            FlatBuffer::U8(values) => values,
            other => {
                return Err(SerializationError::unsupported_dtype(
                    other.element_type(),
                    "integer or float color channels",
                ));
            }
        }
    } else {
        return Err(SerializationError::unsupported_dtype(
            element_type,
            "integer or float color channels",
        ));
    };

    let rgba = if channels == 3 {
        rgba.chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect()
    } else {
        rgba
    };

    finish(FlatBuffer::U8(rgba), COLOR_ARITY, options, &shape)
}

fn finish(
    buffer: FlatBuffer,
    arity: usize,
    options: NormalizeOptions,
    shape: &[usize],
) -> SerializationResult<Normalized> {
    let num_rows = buffer.len() / arity;
    if let Some(expected) = options.num_rows {
        if expected != num_rows {
            return Err(SerializationError::shape(
                arity,
                shape,
                buffer.len(),
                format!("expected {expected} color(s), got {num_rows}"),
            ));
        }
    }
    Ok(Normalized {
        buffer,
        num_rows,
        arity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_rgb() -> anyhow::Result<()> {
        let normalized = normalize_colors([1.0_f32, 0.5, 0.0])?;
        assert_eq!(normalized.num_rows, 1);
        assert_eq!(normalized.buffer, FlatBuffer::U8(vec![255, 128, 0, 255]));
        Ok(())
    }

    #[test]
    fn float_out_of_range() {
        let err = normalize_colors([200.0_f32, 0.0, 0.0]).unwrap_err();
        assert!(err.is_range_error(), "{err}");

        let err = normalize_colors([f32::NAN, 0.0, 0.0]).unwrap_err();
        assert!(err.is_range_error(), "{err}");
    }

    #[test]
    fn float_slightly_out_of_range_is_clamped() -> anyhow::Result<()> {
        let normalized = normalize_colors([1.02_f64, -0.01, 0.5, 1.0])?;
        assert_eq!(normalized.buffer, FlatBuffer::U8(vec![255, 0, 128, 255]));
        Ok(())
    }

    #[test]
    fn integer_records() -> anyhow::Result<()> {
        let normalized = normalize_colors(vec![[255_i32, 0, 0], [0, 255, 0]])?;
        assert_eq!(normalized.num_rows, 2);
        assert_eq!(
            normalized.buffer,
            FlatBuffer::U8(vec![255, 0, 0, 255, 0, 255, 0, 255])
        );

        let err = normalize_colors(vec![[256_i32, 0, 0]]).unwrap_err();
        assert!(err.is_range_error(), "{err}");
        Ok(())
    }

    #[test]
    fn packed() -> anyhow::Result<()> {
        let normalized = normalize_colors(vec![Rgba32::from_rgb(1, 2, 3), Rgba32::WHITE])?;
        assert_eq!(normalized.num_rows, 2);
        assert_eq!(
            normalized.buffer,
            FlatBuffer::U8(vec![1, 2, 3, 255, 255, 255, 255, 255])
        );
        Ok(())
    }

    #[test]
    fn wrong_channel_count() {
        let err = normalize_colors(vec![[1.0_f32, 0.0]]).unwrap_err();
        assert!(err.is_shape_error(), "{err}");

        // A flat sequence of 6 values needs an explicit row count.
        let err = normalize_colors(vec![0_u8; 6]).unwrap_err();
        assert!(err.is_shape_error(), "{err}");
    }

    #[test]
    fn flat_with_row_count() -> anyhow::Result<()> {
        let normalized = normalize_colors_with(
            vec![0_u8; 6],
            NormalizeOptions::default().with_num_rows(2),
        )?;
        assert_eq!(normalized.num_rows, 2);
        assert_eq!(normalized.buffer.len(), 8);
        Ok(())
    }

    #[test]
    fn flat_rgba_sequence() -> anyhow::Result<()> {
        let normalized = normalize_colors(vec![255_u8, 0, 0, 255, 0, 255, 0, 255])?;
        assert_eq!(normalized.num_rows, 2);
        assert_eq!(normalized.arity, COLOR_ARITY);
        assert_eq!(
            normalized.buffer,
            FlatBuffer::U8(vec![255, 0, 0, 255, 0, 255, 0, 255])
        );

        let normalized = normalize_colors(vec![1.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.5])?;
        assert_eq!(
            normalized.buffer,
            FlatBuffer::U8(vec![255, 0, 0, 255, 0, 0, 255, 128])
        );

        let err = normalize_colors(vec![0_u8; 10]).unwrap_err();
        assert!(err.is_shape_error(), "{err}");
        Ok(())
    }

    #[test]
    fn bool_is_unsupported() {
        let err = normalize_colors([true, false, true]).unwrap_err();
        assert!(err.is_unsupported_dtype(), "{err}");
    }
}
