//! Turning loose, user-provided numeric input into canonical `(rows × arity)` form.
//!
//! Users hand us scalars, flat sequences, sequences of fixed-size records, ragged nested lists
//! and N-D arrays. All of these are [`RawValue`]s, and [`normalize`] maps every one of them to a
//! [`Normalized`] buffer, or fails with a [`SerializationError`].

use half::f16;

use crate::{ElementType, FlatBuffer, NativeElement, SerializationError, SerializationResult};

/// Some loosely-shaped numeric input, as provided by the user.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// A single bare value. The buffer always holds exactly one element.
    Scalar(FlatBuffer),

    /// A flat sequence of values.
    Flat(FlatBuffer),

    /// A sequence of sequences, which may nest further.
    ///
    /// Every child must have the same shape, unless explicit partitions are used.
    Nested(Vec<Self>),

    /// A dense N-D array in row-major order.
    NdArray { shape: Vec<usize>, buffer: FlatBuffer },
}

impl RawValue {
    /// A dense N-D array.
    ///
    /// Fails if the number of elements doesn't match the shape.
    pub fn nd_array(
        shape: impl Into<Vec<usize>>,
        buffer: impl Into<FlatBuffer>,
    ) -> SerializationResult<Self> {
        let shape = shape.into();
        let buffer = buffer.into();

        let expected: usize = shape.iter().product();
        if expected != buffer.len() {
            return Err(SerializationError::shape(
                0,
                shape,
                buffer.len(),
                format!("shape implies {expected} element(s)"),
            ));
        }

        Ok(Self::NdArray { shape, buffer })
    }

    /// A single value.
    #[inline]
    pub fn scalar<T: NativeElement>(value: T) -> Self {
        Self::Scalar(T::into_flat_buffer(vec![value]))
    }

    /// The number of top-level items: 1 for a scalar, the length of the outermost dimension otherwise.
    pub fn num_items(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Flat(buffer) => buffer.len(),
            Self::Nested(children) => children.len(),
            Self::NdArray { shape, .. } => shape.first().copied().unwrap_or(1),
        }
    }

    /// The element type of the values, promoted across all children.
    ///
    /// `None` for an empty nested sequence, which has no type of its own.
    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            Self::Scalar(buffer) | Self::Flat(buffer) | Self::NdArray { buffer, .. } => {
                Some(buffer.element_type())
            }
            Self::Nested(children) => children
                .iter()
                .filter_map(Self::element_type)
                .reduce(ElementType::promote),
        }
    }

    /// Flattens the value into a shape and a contiguous row-major buffer.
    ///
    /// Scalars have an empty shape. Nested sequences must be rectangular.
    pub fn into_shaped(self) -> SerializationResult<(Vec<usize>, FlatBuffer)> {
        match self {
            Self::Scalar(buffer) => Ok((Vec::new(), buffer)),

            Self::Flat(buffer) => Ok((vec![buffer.len()], buffer)),

            Self::NdArray { shape, buffer } => {
                let expected: usize = shape.iter().product();
                if expected != buffer.len() {
                    return Err(SerializationError::shape(
                        0,
                        shape,
                        buffer.len(),
                        format!("shape implies {expected} element(s)"),
                    ));
                }
                Ok((shape, buffer))
            }

            Self::Nested(children) => {
                let num_children = children.len();

                let mut child_shape: Option<Vec<usize>> = None;
                let mut buffers = Vec::with_capacity(num_children);
                let mut lengths = Vec::with_capacity(num_children);
                let mut ragged = false;

                for child in children {
                    let (shape, buffer) = child.into_shaped()?;
                    lengths.push(buffer.len());
                    match &child_shape {
                        Some(expected) if expected != &shape => ragged = true,
                        Some(_) => {}
                        None => child_shape = Some(shape),
                    }
                    buffers.push(buffer);
                }

                let buffer = FlatBuffer::concat(buffers)?;

                if ragged {
                    return Err(SerializationError::shape(
                        0,
                        vec![num_children],
                        buffer.len(),
                        format!(
                            "ragged nested sequence with per-row lengths {lengths:?}; \
                             use explicit partitions to log variable-length rows"
                        ),
                    ));
                }

                let mut shape = vec![num_children];
                shape.extend(child_shape.unwrap_or_default());
                Ok((shape, buffer))
            }
        }
    }

    /// Flattens a possibly ragged nested sequence into its per-row lengths and concatenated values.
    ///
    /// This is how variable-length rows are expressed: `[[1, 2], [3]]` becomes lengths `[2, 1]`
    /// and values `[1, 2, 3]`. Anything that isn't a sequence of sequences is a single row.
    pub fn into_partitioned(self) -> SerializationResult<(Vec<usize>, FlatBuffer)> {
        match self {
            Self::Nested(children) => {
                let mut lengths = Vec::with_capacity(children.len());
                let mut buffers = Vec::with_capacity(children.len());
                for child in children {
                    let (_, buffer) = child.into_shaped()?;
                    lengths.push(buffer.len());
                    buffers.push(buffer);
                }
                Ok((lengths, FlatBuffer::concat(buffers)?))
            }
            other => {
                let (_, buffer) = other.into_shaped()?;
                Ok((vec![buffer.len()], buffer))
            }
        }
    }
}

impl From<FlatBuffer> for RawValue {
    #[inline]
    fn from(buffer: FlatBuffer) -> Self {
        Self::Flat(buffer)
    }
}

impl From<Vec<Self>> for RawValue {
    #[inline]
    fn from(children: Vec<Self>) -> Self {
        Self::Nested(children)
    }
}

macro_rules! impl_raw_value_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for RawValue {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::scalar(value)
                }
            }

            impl From<Vec<$ty>> for RawValue {
                #[inline]
                fn from(values: Vec<$ty>) -> Self {
                    Self::Flat(values.into())
                }
            }

            impl From<&[$ty]> for RawValue {
                #[inline]
                fn from(values: &[$ty]) -> Self {
                    Self::Flat(values.to_vec().into())
                }
            }

            impl<const N: usize> From<[$ty; N]> for RawValue {
                #[inline]
                fn from(values: [$ty; N]) -> Self {
                    Self::Flat(values.to_vec().into())
                }
            }

            impl<const N: usize> From<Vec<[$ty; N]>> for RawValue {
                fn from(records: Vec<[$ty; N]>) -> Self {
                    let num_records = records.len();
                    let values: Vec<$ty> = records.into_iter().flatten().collect();
                    Self::NdArray {
                        shape: vec![num_records, N],
                        buffer: values.into(),
                    }
                }
            }

            impl<const N: usize> From<&[[$ty; N]]> for RawValue {
                #[inline]
                fn from(records: &[[$ty; N]]) -> Self {
                    records.to_vec().into()
                }
            }

            impl<const N: usize, const M: usize> From<[[$ty; N]; M]> for RawValue {
                #[inline]
                fn from(records: [[$ty; N]; M]) -> Self {
                    records.to_vec().into()
                }
            }

            impl From<Vec<Vec<$ty>>> for RawValue {
                fn from(rows: Vec<Vec<$ty>>) -> Self {
                    Self::Nested(rows.into_iter().map(Self::from).collect())
                }
            }
        )+
    };
}

impl_raw_value_from!(bool, u8, u16, u32, u64, i8, i16, i32, i64, f16, f32, f64);

// ---

/// Options for [`normalize_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// The number of rows the caller expects.
    ///
    /// When set, this takes precedence over the row count inferred from the input's shape,
    /// which resolves inputs that could be read either way (e.g. 3 values at arity 3 being
    /// 1 row of 3 vs. 3 splatted scalars).
    pub num_rows: Option<usize>,
}

impl NormalizeOptions {
    #[inline]
    pub fn with_num_rows(mut self, num_rows: usize) -> Self {
        self.num_rows = Some(num_rows);
        self
    }
}

/// Canonical `(rows × arity)` numeric data.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    /// Row-major values, exactly `num_rows * arity` of them.
    pub buffer: FlatBuffer,

    pub num_rows: usize,

    /// Number of scalars per row. Always at least 1.
    pub arity: usize,
}

impl Normalized {
    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.buffer.element_type()
    }

    /// Losslessly converts the values to another element type.
    pub fn cast_to(self, element_type: ElementType) -> SerializationResult<Self> {
        let Self {
            buffer,
            num_rows,
            arity,
        } = self;
        Ok(Self {
            buffer: buffer.cast_to(element_type)?,
            num_rows,
            arity,
        })
    }

    /// The values of a single row.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not smaller than [`Self::num_rows`].
    pub fn row(&self, index: usize) -> FlatBuffer {
        self.buffer.slice(index * self.arity, self.arity)
    }
}

/// Normalizes `value` into rows of `arity` scalars each.
///
/// See [`normalize_with`].
#[inline]
pub fn normalize(value: impl Into<RawValue>, arity: usize) -> SerializationResult<Normalized> {
    normalize_with(value, arity, NormalizeOptions::default())
}

/// Normalizes `value` into rows of `arity` scalars each.
///
/// The element type is preserved: casting to a component's canonical type is a separate step
/// (see [`Normalized::cast_to`]).
///
/// * A scalar is a single row, and is only valid for `arity == 1`.
/// * A flat sequence of `k * arity` values is `k` rows.
/// * A nested sequence or N-D array must be rectangular. With `arity == 1` every element is a row,
///   otherwise the innermost dimension must equal `arity`.
/// * [`NormalizeOptions::num_rows`], when set, overrides the inferred row count but must still
///   account for every element.
///
/// ```
/// # use re_types_core::{normalize, FlatBuffer};
/// let normalized = normalize(vec![[1.0_f32, 0.0, 1.0], [0.5, 0.5, 2.0]], 3).unwrap();
/// assert_eq!(normalized.num_rows, 2);
/// assert_eq!(normalized.buffer, FlatBuffer::F32(vec![1.0, 0.0, 1.0, 0.5, 0.5, 2.0]));
/// ```
pub fn normalize_with(
    value: impl Into<RawValue>,
    arity: usize,
    options: NormalizeOptions,
) -> SerializationResult<Normalized> {
    let (shape, buffer) = value.into().into_shaped()?;
    let num_elements = buffer.len();

    if arity == 0 {
        return Err(SerializationError::shape(
            arity,
            shape,
            num_elements,
            "arity must be at least 1",
        ));
    }

    if num_elements % arity != 0 {
        return Err(SerializationError::shape(
            arity,
            shape,
            num_elements,
            format!("{num_elements} is not a multiple of {arity}"),
        ));
    }

    let num_rows = num_elements / arity;

    if let Some(expected) = options.num_rows {
        if expected != num_rows {
            return Err(SerializationError::shape(
                arity,
                shape,
                num_elements,
                format!("expected {expected} row(s), but the data holds {num_rows}"),
            ));
        }
    } else if shape.len() >= 2 && arity != 1 {
        let innermost = shape.last().copied().unwrap_or_default();
        if innermost != arity {
            return Err(SerializationError::shape(
                arity,
                shape,
                num_elements,
                format!("innermost dimension is {innermost}"),
            ));
        }
    }

    Ok(Normalized {
        buffer,
        num_rows,
        arity,
    })
}
