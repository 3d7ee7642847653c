use itertools::Itertools as _;

use crate::ElementType;

// ---

/// Why some input could not be turned into canonical component data.
///
/// Every variant names the offending input so that users can find the culprit in their code.
#[derive(thiserror::Error, Debug)]
pub enum SerializationError {
    #[error(
        "Cannot interpret {num_elements} element(s) with shape {shape:?} as rows of arity {arity}: {reason}"
    )]
    Shape {
        arity: usize,
        shape: Vec<usize>,
        num_elements: usize,
        reason: String,
    },

    #[error("Unsupported dtype {actual}: expected {expected}")]
    UnsupportedDtype { actual: String, expected: String },

    #[error("Value {value} is out of range: expected {expected}")]
    Range { value: f64, expected: String },

    #[error("Row count mismatch on entity {entity_path:?}: {}", format_lengths(.lengths))]
    RowCountMismatch {
        entity_path: String,
        lengths: Vec<(String, usize)>,
    },

    #[error(transparent)]
    PartitionLength(#[from] PartitionLengthError),

    #[error("Unknown built-in component {component_type:?} (on {descriptor})")]
    UnknownComponent {
        descriptor: String,
        component_type: String,
    },

    #[error(
        "Conflicting schemas registered for component {component_type:?}: {existing} vs. {new}"
    )]
    SchemaConflict {
        component_type: String,
        existing: String,
        new: String,
    },

    #[error("{location}: {err}")]
    Context {
        location: String,
        err: Box<SerializationError>,
    },

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

fn format_lengths(lengths: &[(String, usize)]) -> String {
    lengths
        .iter()
        .map(|(name, len)| format!("{name}={len}"))
        .join(", ")
}

/// The per-row lengths given for a component column don't fit its data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid partition for {column:?}: {reason}")]
pub struct PartitionLengthError {
    /// The column (component or timeline) whose partition is wrong.
    pub column: String,
    pub reason: String,
}

impl SerializationError {
    pub fn shape(
        arity: usize,
        shape: impl Into<Vec<usize>>,
        num_elements: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::Shape {
            arity,
            shape: shape.into(),
            num_elements,
            reason: reason.into(),
        }
    }

    pub fn unsupported_dtype(actual: impl std::fmt::Display, expected: impl Into<String>) -> Self {
        Self::UnsupportedDtype {
            actual: actual.to_string(),
            expected: expected.into(),
        }
    }

    pub fn range(value: f64, expected: impl Into<String>) -> Self {
        Self::Range {
            value,
            expected: expected.into(),
        }
    }

    pub(crate) fn cast(from: ElementType, to: ElementType) -> Self {
        Self::unsupported_dtype(from, format!("values that can be losslessly cast to {to}"))
    }

    /// Returns the underlying error, stripping away any [`Self::Context`].
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { err, .. } => err.root(),
            _ => self,
        }
    }

    /// The full context path of this error, outermost first.
    pub fn location(&self) -> Vec<&str> {
        let mut location = Vec::new();
        let mut err = self;
        while let Self::Context { location: loc, err: inner } = err {
            location.push(loc.as_str());
            err = inner;
        }
        location
    }

    pub fn is_shape_error(&self) -> bool {
        matches!(self.root(), Self::Shape { .. })
    }

    pub fn is_range_error(&self) -> bool {
        matches!(self.root(), Self::Range { .. })
    }

    pub fn is_unsupported_dtype(&self) -> bool {
        matches!(self.root(), Self::UnsupportedDtype { .. })
    }

    pub fn is_row_count_mismatch(&self) -> bool {
        matches!(self.root(), Self::RowCountMismatch { .. })
    }
}

pub type SerializationResult<T> = Result<T, SerializationError>;

/// Attach the name of the offending input to an error.
pub trait ResultExt<T> {
    fn with_context(self, location: impl AsRef<str>) -> Self;
}

impl<T> ResultExt<T> for SerializationResult<T> {
    #[inline]
    fn with_context(self, location: impl AsRef<str>) -> Self {
        self.map_err(|err| SerializationError::Context {
            location: location.as_ref().into(),
            err: Box::new(err),
        })
    }
}
