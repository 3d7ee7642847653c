use ahash::{HashMap, HashSet};
use itertools::Itertools as _;
use re_types_core::{
    ComponentBatch, ComponentColumn, ComponentIdentifier, EntityPath, PartitionLengthError,
    SerializationError,
};

use crate::{TimeColumn, TimePoint};

// ---

/// Errors that can occur when splitting bulk data into time-indexed rows, or when encoding it.
#[derive(thiserror::Error, Debug)]
pub enum ChunkError {
    #[error("Detected malformed column set: {reason}")]
    Malformed { reason: String },

    #[error(transparent)]
    PartitionLength(#[from] PartitionLengthError),

    #[error("Index columns must all have the same length, got: {}", format_lengths(.lengths))]
    IndexLengthMismatch { lengths: Vec<(String, usize)> },

    #[error("Serialization: {0}")]
    Serialization(SerializationError),

    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl From<SerializationError> for ChunkError {
    #[inline]
    fn from(err: SerializationError) -> Self {
        // Partition errors coming from the batches are ours to report.
        match err {
            SerializationError::PartitionLength(err) => Self::PartitionLength(err),
            err => Self::Serialization(err),
        }
    }
}

pub type ChunkResult<T> = Result<T, ChunkError>;

fn format_lengths(lengths: &[(String, usize)]) -> String {
    lengths
        .iter()
        .map(|(name, len)| format!("{name}={len}"))
        .join(", ")
}

// ---

/// Per-component row lengths for a bulk send.
///
/// Components without an entry get one instance per row.
pub type Partitions = HashMap<ComponentIdentifier, Vec<usize>>;

/// Bulk component data, split into rows and aligned with its index columns.
///
/// Row `i` of every column belongs to the time at row `i` of every index.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeIndexedColumnSet {
    pub entity_path: EntityPath,

    /// Empty for static data.
    pub indexes: Vec<TimeColumn>,

    pub columns: Vec<ComponentColumn>,

    pub num_rows: usize,
}

/// A single row of a [`TimeIndexedColumnSet`], as it would have been sent on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSetRow {
    pub timepoint: TimePoint,
    pub batches: Vec<ComponentBatch>,
}

impl TimeIndexedColumnSet {
    /// Static data applies outside of any timeline.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.indexes.is_empty()
    }

    /// The time of row `index` on every index column.
    pub fn timepoint(&self, index: usize) -> TimePoint {
        self.indexes
            .iter()
            .filter_map(|column| Some((column.name().clone(), column.cell(index)?)))
            .collect()
    }

    /// Row `index`: its time, and the cell of every column, in column order.
    ///
    /// Cells may be empty.
    pub fn row(&self, index: usize) -> ColumnSetRow {
        ColumnSetRow {
            timepoint: self.timepoint(index),
            batches: self
                .columns
                .iter()
                .map(|column| column.row_batch(index))
                .collect(),
        }
    }

    /// All rows, in index order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = ColumnSetRow> + '_ {
        (0..self.num_rows).map(|index| self.row(index))
    }
}

/// Splits bulk component batches into the rows of a [`TimeIndexedColumnSet`].
///
/// * All `indexes` must have the same length `R`, which is the number of rows.
/// * Without indexes the data is static. `R` is then given by the partitions, which must all
///   agree, or is 1 when there are none: every batch is sent whole as a single row.
/// * A component with an entry in `partitions` is split into `R` rows of the given lengths, which
///   must sum up to its number of instances. Any other component must hold exactly `R`
///   instances, one per row.
///
/// Values keep their order: concatenating all rows of a column gives back the original batch.
pub fn partition_for_columns(
    entity_path: impl Into<EntityPath>,
    indexes: Vec<TimeColumn>,
    batches: Vec<ComponentBatch>,
    partitions: &Partitions,
) -> ChunkResult<TimeIndexedColumnSet> {
    let entity_path = entity_path.into();

    let num_rows = num_rows_from_indexes(&indexes)?;
    let num_rows = match num_rows {
        Some(num_rows) => Some(num_rows),
        None => num_rows_from_partitions(partitions)?,
    };

    {
        let mut seen = HashSet::default();
        for batch in &batches {
            if !seen.insert(&batch.descriptor) {
                return Err(ChunkError::Malformed {
                    reason: format!(
                        "{entity_path}: {} was given more than once",
                        batch.descriptor
                    ),
                });
            }
        }
    }

    for component in partitions.keys() {
        if !batches
            .iter()
            .any(|batch| &batch.descriptor.component == component)
        {
            return Err(PartitionLengthError {
                column: component.to_string(),
                reason: "partition given for a component that isn't being sent".to_owned(),
            }
            .into());
        }
    }

    let columns = batches
        .into_iter()
        .map(|batch| {
            let lengths = match (partitions.get(&batch.descriptor.component), num_rows) {
                (Some(lengths), _) => lengths.clone(),

                // Static and unpartitioned: the whole batch is a single row.
                (None, None) => vec![batch.num_instances()],

                (None, Some(num_rows)) => {
                    if batch.num_instances() != num_rows {
                        return Err(PartitionLengthError {
                            column: batch.descriptor.to_string(),
                            reason: format!(
                                "expected one instance per row ({num_rows} rows), got {}",
                                batch.num_instances()
                            ),
                        }
                        .into());
                    }
                    vec![1; num_rows]
                }
            };

            let expected_rows = num_rows.unwrap_or(1);
            if lengths.len() != expected_rows {
                return Err(PartitionLengthError {
                    column: batch.descriptor.to_string(),
                    reason: format!(
                        "{} partition(s) given for {expected_rows} row(s)",
                        lengths.len()
                    ),
                }
                .into());
            }

            batch.partitioned(lengths).map_err(ChunkError::from)
        })
        .collect::<ChunkResult<Vec<_>>>()?;

    let num_rows = num_rows.unwrap_or(1);
    re_log::trace!(
        "{entity_path}: partitioned {} column(s) into {num_rows} row(s)",
        columns.len()
    );

    Ok(TimeIndexedColumnSet {
        entity_path,
        indexes,
        columns,
        num_rows,
    })
}

fn num_rows_from_indexes(indexes: &[TimeColumn]) -> ChunkResult<Option<usize>> {
    let Some(first) = indexes.first() else {
        return Ok(None);
    };

    if indexes.iter().map(TimeColumn::name).all_unique() {
        if indexes.iter().all(|index| index.num_rows() == first.num_rows()) {
            return Ok(Some(first.num_rows()));
        }
        Err(ChunkError::IndexLengthMismatch {
            lengths: indexes
                .iter()
                .map(|index| (index.name().to_string(), index.num_rows()))
                .collect(),
        })
    } else {
        Err(ChunkError::Malformed {
            reason: format!(
                "duplicate index columns: {}",
                indexes.iter().map(TimeColumn::name).join(", ")
            ),
        })
    }
}

/// Static sends take their row count from the partitions, if any.
fn num_rows_from_partitions(partitions: &Partitions) -> ChunkResult<Option<usize>> {
    let mut lengths = partitions.iter().sorted_by_key(|(component, _)| *component);

    let Some((_, first)) = lengths.next() else {
        return Ok(None);
    };

    for (component, partition) in lengths {
        if partition.len() != first.len() {
            return Err(PartitionLengthError {
                column: component.to_string(),
                reason: format!(
                    "static partitions must all have the same number of rows, got {} and {}",
                    first.len(),
                    partition.len()
                ),
            }
            .into());
        }
    }

    Ok(Some(first.len()))
}
