use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use ahash::HashMap;

use re_chunk::{ChunkError, EntityPath, Partitions, TimeCell, TimeColumn, TimePoint, TimelineName};
use re_types_core::{AsComponents, SerializationError};

use crate::send_pipeline::{PipelineState, SendPipeline};
use crate::sink::{LogSink, MemorySink, MemorySinkStorage};

// ---

/// Errors that can occur when logging to a [`RecordingStream`].
#[derive(thiserror::Error, Debug)]
pub enum RecordingStreamError {
    /// Error within the underlying serializer.
    #[error("Failed to serialize component data: {0}")]
    Serialization(#[from] SerializationError),

    /// Error while splitting bulk data into rows, or while encoding it.
    #[error("Failed to convert data to valid component columns: {0}")]
    Chunk(#[from] ChunkError),

    /// Any other error, tagged with the entity it was logged to.
    #[error("Failed to log to {entity_path:?}: {source}")]
    Pipeline {
        entity_path: EntityPath,
        source: Box<RecordingStreamError>,
    },

    /// A [`SendPipeline`] was driven out of order.
    #[error("Send pipeline is {actual}, expected {expected}")]
    InvalidState {
        expected: PipelineState,
        actual: PipelineState,
    },
}

impl RecordingStreamError {
    /// The entity the failed call was logging to, if known.
    pub fn entity_path(&self) -> Option<&EntityPath> {
        match self {
            Self::Pipeline { entity_path, .. } => Some(entity_path),
            _ => None,
        }
    }

    /// The underlying serialization error, if that's what this is.
    pub fn as_serialization_error(&self) -> Option<&SerializationError> {
        match self {
            Self::Serialization(err) | Self::Chunk(ChunkError::Serialization(err)) => Some(err),
            Self::Pipeline { source, .. } => source.as_serialization_error(),
            _ => None,
        }
    }

    /// The underlying column error, if that's what this is.
    pub fn as_chunk_error(&self) -> Option<&ChunkError> {
        match self {
            Self::Chunk(err) => Some(err),
            Self::Pipeline { source, .. } => source.as_chunk_error(),
            _ => None,
        }
    }
}

/// Results that can occur when logging to a [`RecordingStream`].
pub type RecordingStreamResult<T> = Result<T, RecordingStreamError>;

// ---

/// Construct a [`RecordingStream`].
///
/// ```
/// let (rec, storage) = re_sdk::RecordingStreamBuilder::new().strict(Some(true)).memory();
/// # let _ = (rec, storage);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingStreamBuilder {
    strict: Option<bool>,
    validate_known_components: bool,
    enabled: bool,
}

impl Default for RecordingStreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingStreamBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            strict: None,
            validate_known_components: false,
            enabled: true,
        }
    }

    /// Overrides the process-wide [`crate::strict_mode`] for this stream.
    ///
    /// `None` (the default) follows the process-wide setting, even as it changes.
    #[inline]
    pub fn strict(mut self, strict: Option<bool>) -> Self {
        self.strict = strict;
        self
    }

    /// Reject built-in component types (in the `rerun.` namespace) that aren't registered.
    ///
    /// Custom components are always allowed.
    #[inline]
    pub fn validate_known_components(mut self, validate: bool) -> Self {
        self.validate_known_components = validate;
        self
    }

    /// Set whether or not logging is enabled.
    ///
    /// A disabled stream drops everything without any checks.
    #[inline]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Creates a new [`RecordingStream`] that is pre-configured to send the data to a
    /// [`MemorySink`].
    ///
    /// ```
    /// # fn log_data(_: &re_sdk::RecordingStream) { }
    /// let (rec, storage) = re_sdk::RecordingStreamBuilder::new().memory();
    ///
    /// log_data(&rec);
    ///
    /// let rows = storage.take();
    /// ```
    pub fn memory(self) -> (RecordingStream, MemorySinkStorage) {
        let sink = MemorySink::default();
        let storage = sink.buffer();
        (self.with_sink(Box::new(sink)), storage)
    }

    /// Creates a new [`RecordingStream`] that sends its data to the given sink.
    pub fn with_sink(self, sink: Box<dyn LogSink>) -> RecordingStream {
        let Self {
            strict,
            validate_known_components,
            enabled,
        } = self;

        if enabled {
            RecordingStream {
                inner: Arc::new(Some(RecordingStreamInner {
                    id: RecordingId::new(),
                    strict,
                    validate_known_components,
                    tick: AtomicI64::new(0),
                    sink,
                })),
            }
        } else {
            re_log::debug!("Logging disabled - sink ignored");
            RecordingStream::disabled()
        }
    }
}

// ----------------------------------------------------------------------------

/// Identifies a [`RecordingStream`] and all its clones, for the thread-local clocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct RecordingId(u64);

impl RecordingId {
    fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A [`RecordingStream`] handles everything related to logging data.
///
/// You can construct a new [`RecordingStream`] using [`RecordingStreamBuilder`].
///
/// ## Errors
///
/// Every logging method runs the whole [`SendPipeline`] synchronously: malformed input fails at
/// the call site, and nothing of a failed call reaches the sink.
///
/// In strict mode the error is returned. Otherwise it is logged (with the entity path and the full
/// error chain), `Ok(())` is returned, and the call is a no-op: logging must never bring down the
/// application it instruments. The `try_*` variants always return their errors.
///
/// ## Multithreading and ordering
///
/// [`RecordingStream`] can be cheaply cloned and used freely across any number of threads.
///
/// All calls made by a given thread reach the sink in the order they were made.
/// There isn't any well defined global order across multiple threads.
#[derive(Clone)]
pub struct RecordingStream {
    inner: Arc<Option<RecordingStreamInner>>,
}

struct RecordingStreamInner {
    id: RecordingId,
    strict: Option<bool>,
    validate_known_components: bool,
    tick: AtomicI64,
    sink: Box<dyn LogSink>,
}

impl RecordingStreamInner {
    #[inline]
    fn pipeline(&self, pipeline: SendPipeline) -> SendPipeline {
        pipeline.with_validate_known_components(self.validate_known_components)
    }

    fn run(&self, pipeline: &mut SendPipeline) -> RecordingStreamResult<()> {
        pipeline.validate()?;
        pipeline.dispatch(self.sink.as_ref())?;
        Ok(())
    }
}

impl RecordingStream {
    /// A stream with default settings, sending its data to `sink`.
    #[must_use]
    #[inline]
    pub fn new(sink: Box<dyn LogSink>) -> Self {
        RecordingStreamBuilder::new().with_sink(sink)
    }

    /// Creates a new no-op [`RecordingStream`] that drops all logging messages.
    ///
    /// [`Self::is_enabled`] will return `false`.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(None),
        }
    }

    /// Passes a reference to the [`RecordingStreamInner`], if it exists.
    #[inline]
    fn with<F: FnOnce(&RecordingStreamInner) -> R, R>(&self, f: F) -> Option<R> {
        (*self.inner).as_ref().map(f)
    }

    /// Check if logging is enabled on this stream.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Are errors returned to the caller, rather than logged?
    pub fn is_strict(&self) -> bool {
        self.with(|inner| inner.strict)
            .flatten()
            .unwrap_or_else(crate::strict_mode)
    }

    /// Applies the strict mode policy to the result of a logging call.
    ///
    /// In non-strict mode the error is logged, and swallowed.
    pub fn handle_log_result(
        &self,
        result: RecordingStreamResult<()>,
    ) -> RecordingStreamResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) if self.is_strict() => Err(err),
            Err(err) => {
                re_log::error!("{}", re_log::format_error_chain(&err));
                Ok(())
            }
        }
    }
}

impl RecordingStream {
    /// Log data.
    ///
    /// This is the main entry point for logging data. It can be used to log anything that
    /// implements [`AsComponents`], such as any archetype or a plain [`re_chunk::ComponentBatch`].
    ///
    /// The data will be timestamped automatically based on the [`RecordingStream`]'s
    /// thread-local clock, see [`Self::set_time_sequence`] etc. It is also stamped with the
    /// `log_tick` and `log_time` timelines.
    ///
    /// See also: [`Self::log_static`] for logging static data.
    ///
    /// ```
    /// # use re_sdk::archetypes::Points3D;
    /// let (rec, storage) = re_sdk::RecordingStreamBuilder::new().memory();
    ///
    /// rec.set_time_sequence("frame", 42);
    /// rec.log("my/points", &Points3D::new(vec![[0.0_f32, 0.0, 0.0], [1.0, 1.0, 1.0]]))?;
    ///
    /// assert_eq!(storage.num_rows(), 1);
    /// # Ok::<(), re_sdk::RecordingStreamError>(())
    /// ```
    #[inline]
    pub fn log<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        as_components: &AS,
    ) -> RecordingStreamResult<()> {
        self.log_with_static(entity_path, false, as_components)
    }

    /// Log data that has no time associated with it.
    ///
    /// Static data exists on all timelines.
    ///
    /// See also [`Self::log`].
    #[inline]
    pub fn log_static<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        as_components: &AS,
    ) -> RecordingStreamResult<()> {
        self.log_with_static(entity_path, true, as_components)
    }

    /// Logs the contents of any [`AsComponents`].
    ///
    /// If `static_` is set to `true`, no time at all is attached to the data.
    /// Otherwise, the data will be timestamped automatically based on the [`RecordingStream`]'s
    /// thread-local clock.
    #[inline]
    pub fn log_with_static<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        static_: bool,
        as_components: &AS,
    ) -> RecordingStreamResult<()> {
        let result = self.try_log_with_static(entity_path, static_, as_components);
        self.handle_log_result(result)
    }

    /// Same as [`Self::log`], but always returns errors.
    #[inline]
    pub fn try_log<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        as_components: &AS,
    ) -> RecordingStreamResult<()> {
        self.try_log_with_static(entity_path, false, as_components)
    }

    /// Same as [`Self::log_static`], but always returns errors.
    #[inline]
    pub fn try_log_static<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        as_components: &AS,
    ) -> RecordingStreamResult<()> {
        self.try_log_with_static(entity_path, true, as_components)
    }

    /// Same as [`Self::log_with_static`], but always returns errors.
    pub fn try_log_with_static<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        static_: bool,
        as_components: &AS,
    ) -> RecordingStreamResult<()> {
        let f = move |inner: &RecordingStreamInner| {
            let timepoint = if static_ {
                TimePoint::new_static()
            } else {
                let tick = inner.tick.fetch_add(1, Ordering::Relaxed);
                ThreadInfo::thread_now(inner.id)
                    .with(LOG_TICK, TimeCell::from_sequence(tick))
            };

            let mut pipeline = inner.pipeline(SendPipeline::new_row(entity_path, timepoint));
            pipeline.add(as_components)?;
            inner.run(&mut pipeline)
        };

        // Silently drop the data when disabled.
        self.with(f).unwrap_or(Ok(()))
    }

    /// Lower-level logging API to provide data spanning multiple timepoints.
    ///
    /// Unlike the regular `log` API, which is row-oriented, this API lets you submit the data
    /// in a columnar form. All [`TimeColumn`]s must have the same length `R`, and every component
    /// batch must hold exactly `R` instances: instance `i` of every batch is logged at time `i`
    /// of every index, exactly as if it had been logged on its own.
    ///
    /// Without any index, the data is static and sent as a single row.
    ///
    /// Note that this API ignores any stateful time set on the stream, and doesn't add the
    /// `log_tick` and `log_time` timelines.
    ///
    /// See [`Self::send_columns_partitioned`] for more than one instance per row.
    #[inline]
    pub fn send_columns<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        indexes: impl IntoIterator<Item = TimeColumn>,
        as_components: &AS,
    ) -> RecordingStreamResult<()> {
        self.send_columns_partitioned(entity_path, indexes, as_components, Partitions::default())
    }

    /// Same as [`Self::send_columns`], with explicit per-row instance counts for some components.
    ///
    /// `partitions` maps a component name to the number of instances in each row: there must be
    /// one entry per row, and they must sum up to the number of instances of that component.
    /// Components without partitions get one instance per row.
    ///
    /// ```
    /// # use re_sdk::{Partitions, TimeColumn, archetypes::Points3D};
    /// let (rec, storage) = re_sdk::RecordingStreamBuilder::new().strict(Some(true)).memory();
    ///
    /// // Two points at frame 0, one at frame 1.
    /// let points = Points3D::new(vec![[0.0_f32, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]);
    /// let partitions = Partitions::from_iter([("positions".into(), vec![2, 1])]);
    /// rec.send_columns_partitioned(
    ///     "points",
    ///     [TimeColumn::new_sequence("frame", [0, 1])],
    ///     &points,
    ///     partitions,
    /// )?;
    ///
    /// assert_eq!(storage.num_rows(), 2);
    /// # Ok::<(), re_sdk::RecordingStreamError>(())
    /// ```
    pub fn send_columns_partitioned<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        indexes: impl IntoIterator<Item = TimeColumn>,
        as_components: &AS,
        partitions: Partitions,
    ) -> RecordingStreamResult<()> {
        let result =
            self.try_send_columns_partitioned(entity_path, indexes, as_components, partitions);
        self.handle_log_result(result)
    }

    /// Same as [`Self::send_columns`], but always returns errors.
    #[inline]
    pub fn try_send_columns<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        indexes: impl IntoIterator<Item = TimeColumn>,
        as_components: &AS,
    ) -> RecordingStreamResult<()> {
        self.try_send_columns_partitioned(
            entity_path,
            indexes,
            as_components,
            Partitions::default(),
        )
    }

    /// Same as [`Self::send_columns_partitioned`], but always returns errors.
    pub fn try_send_columns_partitioned<AS: ?Sized + AsComponents>(
        &self,
        entity_path: impl Into<EntityPath>,
        indexes: impl IntoIterator<Item = TimeColumn>,
        as_components: &AS,
        partitions: Partitions,
    ) -> RecordingStreamResult<()> {
        let f = move |inner: &RecordingStreamInner| {
            let mut pipeline =
                inner.pipeline(SendPipeline::new_columns(entity_path, indexes, partitions));
            pipeline.add(as_components)?;
            inner.run(&mut pipeline)
        };

        self.with(f).unwrap_or(Ok(()))
    }
}

impl fmt::Debug for RecordingStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner {
            Some(inner) => f
                .debug_struct("RecordingStream")
                .field("id", &inner.id)
                .field("strict", &self.is_strict())
                .field("validate_known_components", &inner.validate_known_components)
                .finish_non_exhaustive(),
            None => write!(f, "RecordingStream {{ disabled }}"),
        }
    }
}

// --- Stateful time ---

const LOG_TICK: &str = "log_tick";
const LOG_TIME: &str = "log_time";

/// Thread-local data.
#[derive(Default)]
struct ThreadInfo {
    /// The current time per-thread per-recording, which can be set by users.
    timepoints: HashMap<RecordingId, TimePoint>,
}

impl ThreadInfo {
    fn thread_now(rid: RecordingId) -> TimePoint {
        Self::with(|ti| ti.now(rid))
    }

    fn set_thread_time(rid: RecordingId, timeline: TimelineName, cell: TimeCell) {
        Self::with(|ti| ti.set_time(rid, timeline, cell));
    }

    fn unset_thread_time(rid: RecordingId, timeline: &TimelineName) {
        Self::with(|ti| ti.unset_time(rid, timeline));
    }

    fn reset_thread_time(rid: RecordingId) {
        Self::with(|ti| ti.reset_time(rid));
    }

    /// Get access to the thread-local [`ThreadInfo`].
    fn with<R>(f: impl FnOnce(&mut Self) -> R) -> R {
        use std::cell::RefCell;
        thread_local! {
            static THREAD_INFO: RefCell<Option<ThreadInfo>> = const { RefCell::new(None) };
        }

        THREAD_INFO.with(|thread_info| {
            let mut thread_info = thread_info.borrow_mut();
            let thread_info = thread_info.get_or_insert_with(Self::default);
            f(thread_info)
        })
    }

    fn now(&self, rid: RecordingId) -> TimePoint {
        let mut timepoint = self.timepoints.get(&rid).cloned().unwrap_or_default();
        timepoint.insert(LOG_TIME, timestamp_now());
        timepoint
    }

    fn set_time(&mut self, rid: RecordingId, timeline: TimelineName, cell: TimeCell) {
        self.timepoints
            .entry(rid)
            .or_default()
            .insert(timeline, cell);
    }

    fn unset_time(&mut self, rid: RecordingId, timeline: &TimelineName) {
        if let Some(timepoint) = self.timepoints.get_mut(&rid) {
            timepoint.remove(timeline);
        }
    }

    fn reset_time(&mut self, rid: RecordingId) {
        if let Some(timepoint) = self.timepoints.get_mut(&rid) {
            *timepoint = TimePoint::default();
        }
    }
}

fn timestamp_now() -> TimeCell {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |since_epoch| {
            i64::try_from(since_epoch.as_nanos()).unwrap_or(i64::MAX)
        });
    TimeCell::from_timestamp_nanos_since_epoch(nanos)
}

impl RecordingStream {
    /// Returns the current time of the recording on the current thread.
    pub fn now(&self) -> TimePoint {
        let f = move |inner: &RecordingStreamInner| ThreadInfo::thread_now(inner.id);
        if let Some(res) = self.with(f) {
            res
        } else {
            re_log::warn_once!("Recording disabled - call to now() ignored");
            TimePoint::default()
        }
    }

    /// Set the current time of the recording, for the current calling thread.
    ///
    /// Used for all subsequent logging performed from this same thread, until the next call
    /// to one of the index/time setting methods.
    ///
    /// There is no requirement of monotonicity. You can move the time backwards if you like.
    ///
    /// See also:
    /// - [`Self::set_time`]
    /// - [`Self::set_time_sequence`]
    /// - [`Self::set_duration_secs`]
    /// - [`Self::disable_timeline`]
    /// - [`Self::reset_time`]
    pub fn set_timepoint(&self, timepoint: impl Into<TimePoint>) {
        let f = move |inner: &RecordingStreamInner| {
            let timepoint = timepoint.into();
            for (timeline, cell) in timepoint.iter() {
                ThreadInfo::set_thread_time(inner.id, timeline.clone(), *cell);
            }
        };

        if self.with(f).is_none() {
            re_log::warn_once!("Recording disabled - call to set_timepoint() ignored");
        }
    }

    /// Set the current value of one of the timelines.
    ///
    /// Used for all subsequent logging performed from this same thread, until the next call
    /// to one of the index/time setting methods.
    ///
    /// See also:
    /// - [`Self::set_timepoint`]
    /// - [`Self::set_time_sequence`]
    /// - [`Self::set_duration_secs`]
    /// - [`Self::disable_timeline`]
    /// - [`Self::reset_time`]
    pub fn set_time(&self, timeline: impl Into<TimelineName>, cell: TimeCell) {
        let f = move |inner: &RecordingStreamInner| {
            ThreadInfo::set_thread_time(inner.id, timeline.into(), cell);
        };

        if self.with(f).is_none() {
            re_log::warn_once!("Recording disabled - call to set_time() ignored");
        }
    }

    /// Set the current time of the recording, for the current calling thread.
    ///
    /// Short for `set_time(timeline, TimeCell::from_sequence(sequence))`.
    ///
    /// For example: `rec.set_time_sequence("frame_nr", frame_nr)`.
    /// You can remove a timeline again using `rec.disable_timeline("frame_nr")`.
    #[inline]
    pub fn set_time_sequence(&self, timeline: impl Into<TimelineName>, sequence: impl Into<i64>) {
        self.set_time(timeline, TimeCell::from_sequence(sequence.into()));
    }

    /// Set the current time of the recording, for the current calling thread.
    ///
    /// Short for `set_time(timeline, TimeCell::from_duration_secs(secs))`.
    ///
    /// For example: `rec.set_duration_secs("time_since_start", time_offset)`.
    /// You can remove a timeline again using `rec.disable_timeline("time_since_start")`.
    #[inline]
    pub fn set_duration_secs(&self, timeline: impl Into<TimelineName>, secs: impl Into<f64>) {
        self.set_time(timeline, TimeCell::from_duration_secs(secs.into()));
    }

    /// Set a timestamp as seconds since Unix epoch (1970-01-01 00:00:00 UTC).
    ///
    /// Short for `set_time(timeline, TimeCell::from_timestamp_secs_since_epoch(secs))`.
    #[inline]
    pub fn set_timestamp_secs_since_epoch(
        &self,
        timeline: impl Into<TimelineName>,
        secs: impl Into<f64>,
    ) {
        self.set_time(
            timeline,
            TimeCell::from_timestamp_secs_since_epoch(secs.into()),
        );
    }

    /// Clears out the current time of the recording for the specified timeline, for the
    /// current calling thread.
    ///
    /// For example: `rec.disable_timeline("frame")`, `rec.disable_timeline("sim_time")`.
    pub fn disable_timeline(&self, timeline: impl Into<TimelineName>) {
        let f = move |inner: &RecordingStreamInner| {
            let timeline = timeline.into();
            ThreadInfo::unset_thread_time(inner.id, &timeline);
        };

        if self.with(f).is_none() {
            re_log::warn_once!("Recording disabled - call to disable_timeline() ignored");
        }
    }

    /// Clears out the current time of the recording, for the current calling thread.
    pub fn reset_time(&self) {
        let f = move |inner: &RecordingStreamInner| {
            ThreadInfo::reset_thread_time(inner.id);
        };

        if self.with(f).is_none() {
            re_log::warn_once!("Recording disabled - call to reset_time() ignored");
        }
    }
}

// ---

#[cfg(test)]
mod tests {
    use re_chunk::decode_batch;
    use re_types::archetypes::{Points3D, Scalars};

    use super::*;

    #[test]
    fn impl_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecordingStream>();
    }

    #[test]
    fn disabled() -> anyhow::Result<()> {
        let (rec, storage) = RecordingStreamBuilder::new().enabled(false).memory();
        assert!(!rec.is_enabled());

        rec.set_time_sequence("frame", 1);
        rec.try_log("points", &Points3D::new(vec![[1.0_f32, 2.0, 3.0]]))?;

        // Not even validated.
        rec.try_log("points", &Points3D::new(vec![1.0_f32, 2.0]))?;

        assert_eq!(storage.num_rows(), 0);
        assert!(rec.now().is_static());
        Ok(())
    }

    #[test]
    fn thread_local_time() -> anyhow::Result<()> {
        let (rec, storage) = RecordingStreamBuilder::new().strict(Some(true)).memory();

        rec.set_time_sequence("frame", 42);
        rec.set_duration_secs("sim_time", 1.5);
        rec.log("scalar", &Scalars::one(1.0))?;

        rec.disable_timeline("sim_time");
        rec.log("scalar", &Scalars::one(2.0))?;

        rec.reset_time();
        rec.log("scalar", &Scalars::one(3.0))?;

        // Another thread has its own clock.
        std::thread::scope(|scope| {
            scope.spawn(|| rec.log("scalar", &Scalars::one(4.0)));
        });

        let rows = storage.take();
        assert_eq!(rows.len(), 4);

        let frames: Vec<_> = rows
            .iter()
            .map(|row| row.timepoint.get("frame").map(|cell| cell.value))
            .collect();
        assert_eq!(frames, vec![Some(42), Some(42), None, None]);

        assert_eq!(
            rows[0].timepoint.get("sim_time"),
            Some(&TimeCell::from_duration_secs(1.5))
        );
        assert_eq!(rows[1].timepoint.get("sim_time"), None);

        // Temporal data always gets a tick and a wall-clock time.
        let ticks: Vec<_> = rows[..3]
            .iter()
            .map(|row| row.timepoint.get(LOG_TICK).map(|cell| cell.value))
            .collect();
        assert_eq!(ticks, vec![Some(0), Some(1), Some(2)]);
        assert!(rows.iter().all(|row| row.timepoint.get(LOG_TIME).is_some()));
        Ok(())
    }

    #[test]
    fn log_static() -> anyhow::Result<()> {
        let (rec, storage) = RecordingStreamBuilder::new().strict(Some(true)).memory();

        rec.set_time_sequence("frame", 42);
        rec.log_static("config", &Scalars::one(1.0))?;

        let rows = storage.take();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].timepoint.is_static());
        Ok(())
    }

    #[test]
    fn strict_mode_propagates() {
        let (rec, storage) = RecordingStreamBuilder::new().strict(Some(true)).memory();

        let err = rec
            .log("points", &Points3D::new(vec![1.0_f32, 2.0]))
            .unwrap_err();
        assert_eq!(err.entity_path(), Some(&EntityPath::from("points")));
        assert!(
            err.as_serialization_error()
                .is_some_and(SerializationError::is_shape_error),
            "{err}"
        );
        assert_eq!(storage.num_rows(), 0);
    }

    #[test]
    fn non_strict_mode_swallows() -> anyhow::Result<()> {
        let (rec, storage) = RecordingStreamBuilder::new().strict(Some(false)).memory();

        // Logged, not returned.
        rec.log("points", &Points3D::new(vec![1.0_f32, 2.0]))?;
        rec.send_columns(
            "plot",
            [TimeColumn::new_sequence("step", [0, 1, 2])],
            &Scalars::new(vec![1.0_f64, 2.0]),
        )?;
        assert_eq!(storage.num_rows(), 0);

        // But `try_*` always returns.
        assert!(rec.try_log("points", &Points3D::new(vec![1.0_f32, 2.0])).is_err());

        // The stream keeps working.
        rec.log("points", &Points3D::new(vec![1.0_f32, 2.0, 3.0]))?;
        assert_eq!(storage.num_rows(), 1);
        Ok(())
    }

    #[test]
    fn send_columns() -> anyhow::Result<()> {
        let (rec, storage) = RecordingStreamBuilder::new().strict(Some(true)).memory();

        // Stateful time is ignored.
        rec.set_time_sequence("frame", 42);
        rec.send_columns(
            "plot",
            [TimeColumn::new_duration_secs("time", [0.0, 1.0])],
            &Scalars::new(vec![1.0_f64, 2.0]),
        )?;

        let rows = storage.take();
        assert_eq!(rows.len(), 2);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.timepoint.len(), 1);
            assert_eq!(
                row.timepoint.get("time"),
                Some(&TimeCell::from_duration_secs(i as f64))
            );

            let (info, _) = decode_batch(&row.batches[0])?;
            assert_eq!(info.descriptor, Scalars::descriptor_scalars());
        }

        let err = rec
            .send_columns(
                "plot",
                [TimeColumn::new_duration_secs("time", [0.0, 1.0])],
                &Scalars::new(vec![1.0_f64, 2.0, 3.0]),
            )
            .unwrap_err();
        assert!(err.as_chunk_error().is_some(), "{err}");
        Ok(())
    }
}
