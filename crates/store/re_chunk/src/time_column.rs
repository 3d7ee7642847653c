use arrow::array::ArrayRef;
use arrow::buffer::ScalarBuffer;
use itertools::Itertools as _;

use crate::{TimeCell, TimeType, Timeline, TimelineName, time::nanos_from_secs};

/// One index column of a bulk send: a timeline, and one time value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeColumn {
    timeline: Timeline,
    times: ScalarBuffer<i64>,

    /// Are the times sorted in ascending order?
    ///
    /// Rows keep their order either way.
    is_sorted: bool,
}

impl TimeColumn {
    /// Creates a new [`TimeColumn`].
    ///
    /// Iff you know for sure whether the data is already appropriately sorted or not, specify `is_sorted`.
    /// When left unspecified (`None`), it will be computed in O(n) time.
    pub fn new(is_sorted: Option<bool>, timeline: Timeline, times: ScalarBuffer<i64>) -> Self {
        let is_sorted = is_sorted
            .unwrap_or_else(|| times.as_ref().windows(2).all(|times| times[0] <= times[1]));

        Self {
            timeline,
            times,
            is_sorted,
        }
    }

    /// Creates a new [`TimeColumn`] of sequence type.
    pub fn new_sequence(
        name: impl Into<TimelineName>,
        times: impl IntoIterator<Item = impl Into<i64>>,
    ) -> Self {
        let time_vec = times
            .into_iter()
            .map(|t| legal_time(t.into(), "new_sequence"))
            .collect_vec();

        Self::new(
            None,
            Timeline::new_sequence(name),
            ScalarBuffer::from(time_vec),
        )
    }

    /// Creates a new [`TimeColumn`] of duration type, in seconds.
    pub fn new_duration_secs(
        name: impl Into<TimelineName>,
        seconds: impl IntoIterator<Item = impl Into<f64>>,
    ) -> Self {
        let time_vec = seconds
            .into_iter()
            .map(|seconds| nanos_from_secs(seconds.into()))
            .collect_vec();

        Self::new(
            None,
            Timeline::new(name, TimeType::DurationNs),
            ScalarBuffer::from(time_vec),
        )
    }

    /// Creates a new [`TimeColumn`] of timestamp type, in seconds since unix epoch.
    pub fn new_timestamp_secs_since_epoch(
        name: impl Into<TimelineName>,
        seconds: impl IntoIterator<Item = impl Into<f64>>,
    ) -> Self {
        let time_vec = seconds
            .into_iter()
            .map(|seconds| nanos_from_secs(seconds.into()))
            .collect_vec();

        Self::new(
            None,
            Timeline::new(name, TimeType::TimestampNs),
            ScalarBuffer::from(time_vec),
        )
    }

    /// Creates a new [`TimeColumn`] measuring duration in nanoseconds.
    pub fn new_duration_nanos(
        name: impl Into<TimelineName>,
        nanos: impl IntoIterator<Item = impl Into<i64>>,
    ) -> Self {
        let time_vec = nanos
            .into_iter()
            .map(|nanos| legal_time(nanos.into(), "new_duration_nanos"))
            .collect_vec();

        Self::new(
            None,
            Timeline::new(name, TimeType::DurationNs),
            ScalarBuffer::from(time_vec),
        )
    }

    /// Creates a new [`TimeColumn`] of timestamps, as nanoseconds since unix epoch.
    pub fn new_timestamp_nanos_since_epoch(
        name: impl Into<TimelineName>,
        nanos: impl IntoIterator<Item = impl Into<i64>>,
    ) -> Self {
        let time_vec = nanos
            .into_iter()
            .map(|nanos| legal_time(nanos.into(), "new_timestamp_nanos_since_epoch"))
            .collect_vec();

        Self::new(
            None,
            Timeline::new(name, TimeType::TimestampNs),
            ScalarBuffer::from(time_vec),
        )
    }

    #[inline]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[inline]
    pub fn name(&self) -> &TimelineName {
        self.timeline.name()
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.is_sorted
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    #[inline]
    pub fn times_raw(&self) -> &[i64] {
        self.times.as_ref()
    }

    /// The times as an Arrow array of the timeline's datatype.
    #[inline]
    pub fn times_array(&self) -> ArrayRef {
        self.timeline.typ().make_arrow_array(self.times.clone())
    }

    /// The time of row `index`, if in bounds.
    #[inline]
    pub fn cell(&self, index: usize) -> Option<TimeCell> {
        self.times
            .get(index)
            .map(|&value| TimeCell::new(self.timeline.typ(), value))
    }
}

fn legal_time(value: i64, constructor: &str) -> i64 {
    if value < TimeCell::MIN_VALUE {
        re_log::error!(
            "TimeColumn::{constructor}() called with illegal value {value} - clamped to minimum legal value"
        );
        TimeCell::MIN_VALUE
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{Array as _, AsArray as _};
    use arrow::datatypes::DurationNanosecondType;

    use super::*;

    #[test]
    fn constructors() {
        let frames = TimeColumn::new_sequence("frame", [10, 11, 12]);
        assert_eq!(frames.num_rows(), 3);
        assert!(frames.is_sorted());
        assert_eq!(frames.cell(1), Some(TimeCell::from_sequence(11)));
        assert_eq!(frames.cell(3), None);

        let durations = TimeColumn::new_duration_secs("time", [2.0, 1.0]);
        assert!(!durations.is_sorted());
        assert_eq!(durations.times_raw(), &[2_000_000_000, 1_000_000_000]);

        let array = durations.times_array();
        assert_eq!(array.len(), 2);
        assert_eq!(
            array.as_primitive::<DurationNanosecondType>().value(1),
            1_000_000_000
        );
    }

    #[test]
    fn illegal_values_are_clamped() {
        let column = TimeColumn::new_timestamp_nanos_since_epoch("log_time", [i64::MIN, 0]);
        assert_eq!(column.times_raw(), &[TimeCell::MIN_VALUE, 0]);
    }
}
