//! The logging SDK.
//!
//! Log loosely-typed data (scalars, nested sequences, N-D arrays, strings) as strictly-typed,
//! self-describing component batches.
//!
//! Every call is normalized, validated and encoded synchronously: malformed input is reported at
//! the call site, with the entity path and component that caused it, and a failed call sends
//! nothing at all. See [`RecordingStream`] for the error policy.
//!
//! ```
//! use re_sdk::{RecordingStreamBuilder, TimeColumn, archetypes::Scalars};
//!
//! let (rec, storage) = RecordingStreamBuilder::new().strict(Some(true)).memory();
//!
//! // One row at a time…
//! for step in 0..3 {
//!     rec.set_time_sequence("step", step);
//!     rec.log("plot/sine", &Scalars::one((step as f64).sin()))?;
//! }
//!
//! // …or all at once.
//! rec.send_columns(
//!     "plot/cosine",
//!     [TimeColumn::new_sequence("step", 0..3)],
//!     &Scalars::new((0..3).map(|step| (step as f64).cos()).collect::<Vec<_>>()),
//! )?;
//!
//! assert_eq!(storage.num_rows(), 6);
//! # Ok::<(), re_sdk::RecordingStreamError>(())
//! ```

// ----------------
// Private modules:

mod log_sink;
mod recording_stream;
mod send_pipeline;
mod strict_mode;

// -------------
// Public items:

pub use self::recording_stream::{
    RecordingStream, RecordingStreamBuilder, RecordingStreamError, RecordingStreamResult,
};
pub use self::send_pipeline::{PipelineState, SendPipeline};
pub use self::strict_mode::{RERUN_STRICT_ENV_VAR, set_strict_mode, strict_mode};

pub use re_chunk::{
    ChunkError, Partitions, TimeCell, TimeColumn, TimePoint, TimeType, Timeline, TimelineName,
    WireBatch, WireSchemaInfo,
};
pub use re_types::{
    ArchetypeName, AsComponents, ComponentBatch, ComponentDescriptor, ComponentIdentifier,
    ComponentRegistry, ComponentType, DynamicArchetype, EntityPath, RawValue, SerializationError,
    archetypes, components, datatypes,
};

// ---------------
// Public modules:

/// Different destinations for the encoded data.
pub mod sink {
    pub use crate::log_sink::{LogSink, MemorySink, MemorySinkStorage, SubmittedRow};
}

/// Decoding what was sent, e.g. in a [`sink::LogSink`] implementation.
pub mod wire {
    pub use re_chunk::wire::*;
}

/// Re-exports of other crates.
pub mod external {
    pub use re_chunk;
    pub use re_chunk::external::arrow;
    pub use re_log;
    pub use re_types;
    pub use re_types_core;
}
