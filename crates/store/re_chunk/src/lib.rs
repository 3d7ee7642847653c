//! Timelines, time-indexed component columns, and the wire encoding of component batches.
//!
//! A bulk send is described by a set of index columns ([`TimeColumn`]) and a set of component
//! batches. [`partition_for_columns`] splits them into a [`TimeIndexedColumnSet`] whose rows are
//! exactly what the equivalent sequence of per-row sends would have produced.
//!
//! Every batch that leaves the SDK goes through [`wire::encode_batch`].

mod column_set;
mod time;
mod time_column;

pub mod wire;

pub use self::column_set::{
    ChunkError, ChunkResult, ColumnSetRow, Partitions, TimeIndexedColumnSet,
    partition_for_columns,
};
pub use self::time::{TimeCell, TimePoint, TimeType, Timeline, TimelineName};
pub use self::time_column::TimeColumn;
pub use self::wire::{WireBatch, WireSchemaInfo, decode_batch, encode_batch, encode_batches};

pub use re_types_core::{ComponentBatch, ComponentColumn, ComponentDescriptor, EntityPath};

pub mod external {
    pub use arrow;
    pub use re_types_core;
}
