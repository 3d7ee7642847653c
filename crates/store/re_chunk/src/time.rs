use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, DurationNanosecondArray, Int64Array, TimestampNanosecondArray};
use arrow::buffer::ScalarBuffer;
use arrow::datatypes::{DataType, TimeUnit};
use itertools::Itertools as _;

re_types_core::declare_name!(
    /// The name of a timeline, e.g. `frame` or `log_time`.
    pub struct TimelineName;
);

/// The type of a [`TimeCell`] or [`Timeline`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeType {
    /// Used e.g. for frames in a film.
    Sequence,

    /// Duration measured in nanoseconds.
    DurationNs,

    /// Nanoseconds since unix epoch (1970-01-01 00:00:00 UTC).
    TimestampNs,
}

impl std::fmt::Display for TimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => f.write_str("sequence"),
            Self::DurationNs => f.write_str("duration"),
            Self::TimestampNs => f.write_str("timestamp"),
        }
    }
}

impl TimeType {
    /// Returns the appropriate arrow datatype to represent this timeline.
    #[inline]
    pub fn datatype(self) -> DataType {
        match self {
            Self::Sequence => DataType::Int64,
            Self::DurationNs => DataType::Duration(TimeUnit::Nanosecond),
            Self::TimestampNs => DataType::Timestamp(TimeUnit::Nanosecond, None),
        }
    }

    pub fn from_arrow_datatype(datatype: &DataType) -> Option<Self> {
        match datatype {
            DataType::Int64 => Some(Self::Sequence),
            DataType::Duration(TimeUnit::Nanosecond) => Some(Self::DurationNs),
            DataType::Timestamp(TimeUnit::Nanosecond, _) => Some(Self::TimestampNs),
            _ => None,
        }
    }

    /// Returns an array with the appropriate datatype.
    pub fn make_arrow_array(self, times: impl Into<ScalarBuffer<i64>>) -> ArrayRef {
        let times = times.into();
        match self {
            Self::Sequence => Arc::new(Int64Array::new(times, None)),
            Self::DurationNs => Arc::new(DurationNanosecondArray::new(times, None)),
            Self::TimestampNs => Arc::new(TimestampNanosecondArray::new(times, None)),
        }
    }
}

// ---

/// A named timeline of a given [`TimeType`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeline {
    name: TimelineName,
    typ: TimeType,
}

impl Timeline {
    #[inline]
    pub fn new(name: impl Into<TimelineName>, typ: TimeType) -> Self {
        Self {
            name: name.into(),
            typ,
        }
    }

    #[inline]
    pub fn new_sequence(name: impl Into<TimelineName>) -> Self {
        Self::new(name, TimeType::Sequence)
    }

    #[inline]
    pub fn new_duration(name: impl Into<TimelineName>) -> Self {
        Self::new(name, TimeType::DurationNs)
    }

    #[inline]
    pub fn new_timestamp(name: impl Into<TimelineName>) -> Self {
        Self::new(name, TimeType::TimestampNs)
    }

    #[inline]
    pub fn name(&self) -> &TimelineName {
        &self.name
    }

    #[inline]
    pub fn typ(&self) -> TimeType {
        self.typ
    }
}

// ---

/// A point on some timeline: a type and a value.
///
/// `i64::MIN` is reserved, and never a valid time.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeCell {
    pub typ: TimeType,
    pub value: i64,
}

impl TimeCell {
    /// The smallest legal time value.
    pub const MIN_VALUE: i64 = i64::MIN + 1;

    #[inline]
    pub fn new(typ: TimeType, value: i64) -> Self {
        Self {
            typ,
            value: value.max(Self::MIN_VALUE),
        }
    }

    #[inline]
    pub fn from_sequence(sequence: i64) -> Self {
        Self::new(TimeType::Sequence, sequence)
    }

    #[inline]
    pub fn from_duration_nanos(nanos: i64) -> Self {
        Self::new(TimeType::DurationNs, nanos)
    }

    #[inline]
    pub fn from_duration_secs(seconds: f64) -> Self {
        Self::new(TimeType::DurationNs, nanos_from_secs(seconds))
    }

    #[inline]
    pub fn from_timestamp_nanos_since_epoch(nanos: i64) -> Self {
        Self::new(TimeType::TimestampNs, nanos)
    }

    #[inline]
    pub fn from_timestamp_secs_since_epoch(seconds: f64) -> Self {
        Self::new(TimeType::TimestampNs, nanos_from_secs(seconds))
    }
}

impl std::fmt::Display for TimeCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.typ {
            TimeType::Sequence => write!(f, "#{}", self.value),
            TimeType::DurationNs | TimeType::TimestampNs => {
                write!(f, "{}s", self.value as f64 / 1e9)
            }
        }
    }
}

/// Rounds to the nearest nanosecond, saturating at the legal range.
pub(crate) fn nanos_from_secs(seconds: f64) -> i64 {
    let nanos = (1e9 * seconds).round();
    let clamped = (nanos as i64).max(TimeCell::MIN_VALUE);
    if clamped as f64 != nanos {
        re_log::warn_once!("Time value of {seconds}s is out of range. Clamped to {clamped}ns.");
    }
    clamped
}

// ---

/// A point in time on any number of timelines.
///
/// An empty [`TimePoint`] means "static": outside of any timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimePoint(BTreeMap<TimelineName, TimeCell>);

impl TimePoint {
    /// Static data, unaffected by time.
    #[inline]
    pub fn new_static() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, timeline: &str) -> Option<&TimeCell> {
        self.0.get(timeline)
    }

    #[inline]
    pub fn insert(
        &mut self,
        timeline: impl Into<TimelineName>,
        cell: TimeCell,
    ) -> Option<TimeCell> {
        self.0.insert(timeline.into(), cell)
    }

    #[inline]
    pub fn remove(&mut self, timeline: &str) -> Option<TimeCell> {
        self.0.remove(timeline)
    }

    #[must_use]
    #[inline]
    pub fn with(mut self, timeline: impl Into<TimelineName>, cell: TimeCell) -> Self {
        self.insert(timeline, cell);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&TimelineName, &TimeCell)> {
        self.0.iter()
    }

    #[inline]
    pub fn timeline_names(&self) -> impl ExactSizeIterator<Item = &TimelineName> {
        self.0.keys()
    }
}

impl<N: Into<TimelineName>> FromIterator<(N, TimeCell)> for TimePoint {
    #[inline]
    fn from_iter<T: IntoIterator<Item = (N, TimeCell)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(name, cell)| (name.into(), cell)).collect())
    }
}

impl<N: Into<TimelineName>, const LEN: usize> From<[(N, TimeCell); LEN]> for TimePoint {
    #[inline]
    fn from(timelines: [(N, TimeCell); LEN]) -> Self {
        timelines.into_iter().collect()
    }
}

impl std::fmt::Display for TimePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_static() {
            return f.write_str("<static>");
        }
        let cells = self.iter().map(|(name, cell)| format!("{name}={cell}")).join(", ");
        f.write_str(&cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_are_rounded() {
        assert_eq!(TimeCell::from_duration_secs(1.5).value, 1_500_000_000);
        assert_eq!(TimeCell::from_duration_secs(1e-10).value, 0);
        assert_eq!(TimeCell::from_duration_secs(f64::NEG_INFINITY).value, TimeCell::MIN_VALUE);
    }

    #[test]
    fn reserved_value_is_clamped() {
        assert_eq!(TimeCell::from_sequence(i64::MIN).value, TimeCell::MIN_VALUE);
    }

    #[test]
    fn timepoint() {
        let timepoint = TimePoint::from([
            ("frame", TimeCell::from_sequence(42)),
            ("time", TimeCell::from_duration_secs(1.0)),
        ]);
        assert!(!timepoint.is_static());
        assert_eq!(timepoint.to_string(), "frame=#42, time=1s");
        assert_eq!(TimePoint::new_static().to_string(), "<static>");
    }
}
