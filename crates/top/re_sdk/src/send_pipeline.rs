use re_chunk::{
    ComponentBatch, EntityPath, Partitions, TimeColumn, TimePoint, WireBatch, encode_batches,
    partition_for_columns,
};
use re_types_core::{AsComponents, BundleBuilder, ComponentRegistry};

use crate::sink::LogSink;
use crate::{RecordingStreamError, RecordingStreamResult};

/// Where a [`SendPipeline`] is at.
///
/// `Building → Validated → Dispatched`, with no way back. A failed validation leaves the pipeline
/// in `Building`, and nothing gets dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Accumulating batches.
    Building,

    /// Every check passed and every batch is encoded, ready for the sink.
    Validated,

    /// Handed off to the sink.
    Dispatched,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Building => f.write_str("building"),
            Self::Validated => f.write_str("validated"),
            Self::Dispatched => f.write_str("dispatched"),
        }
    }
}

#[derive(Debug)]
enum SendKind {
    /// A single row at a single point in time.
    Row { timepoint: TimePoint },

    /// Bulk data, split into rows along the index columns.
    Columns {
        indexes: Vec<TimeColumn>,
        partitions: Partitions,
    },
}

/// One logging call on its way to a [`LogSink`].
///
/// All checks happen in [`Self::validate`], synchronously, before anything is sent:
/// * instance counts within a row (splats aside) must agree,
/// * partitions must fit the bulk data and the index columns,
/// * optionally, every built-in component type must be known.
///
/// ```
/// # use re_sdk::{SendPipeline, PipelineState, TimePoint, sink::MemorySink};
/// # use re_sdk::archetypes::Points3D;
/// let sink = MemorySink::default();
///
/// let mut pipeline = SendPipeline::new_row("points", TimePoint::new_static());
/// pipeline.add(&Points3D::new(vec![[1.0_f32, 0.0, 1.0]]))?;
/// pipeline.validate()?;
/// pipeline.dispatch(&sink)?;
///
/// assert_eq!(pipeline.state(), PipelineState::Dispatched);
/// assert_eq!(sink.buffer().num_rows(), 1);
/// # Ok::<(), re_sdk::RecordingStreamError>(())
/// ```
#[derive(Debug)]
pub struct SendPipeline {
    entity_path: EntityPath,
    kind: SendKind,
    batches: Vec<ComponentBatch>,
    validate_known_components: bool,
    state: PipelineState,

    /// Filled in by [`Self::validate`].
    encoded_rows: Vec<(TimePoint, Vec<WireBatch>)>,
}

impl SendPipeline {
    fn new(entity_path: EntityPath, kind: SendKind) -> Self {
        Self {
            entity_path,
            kind,
            batches: Vec::new(),
            validate_known_components: false,
            state: PipelineState::Building,
            encoded_rows: Vec::new(),
        }
    }

    /// Sends a single row. An empty `timepoint` means static data.
    pub fn new_row(entity_path: impl Into<EntityPath>, timepoint: TimePoint) -> Self {
        Self::new(entity_path.into(), SendKind::Row { timepoint })
    }

    /// Sends bulk data along `indexes`. No indexes means static data.
    ///
    /// See [`re_chunk::partition_for_columns`].
    pub fn new_columns(
        entity_path: impl Into<EntityPath>,
        indexes: impl IntoIterator<Item = TimeColumn>,
        partitions: Partitions,
    ) -> Self {
        Self::new(
            entity_path.into(),
            SendKind::Columns {
                indexes: indexes.into_iter().collect(),
                partitions,
            },
        )
    }

    /// Reject built-in component types that aren't registered.
    #[inline]
    pub fn with_validate_known_components(mut self, validate: bool) -> Self {
        self.validate_known_components = validate;
        self
    }

    #[inline]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    #[inline]
    pub fn entity_path(&self) -> &EntityPath {
        &self.entity_path
    }

    /// Adds the batches of `as_components`.
    ///
    /// Indicators only make sense for single rows, and are dropped from bulk sends.
    pub fn add<AS: ?Sized + AsComponents>(
        &mut self,
        as_components: &AS,
    ) -> RecordingStreamResult<&mut Self> {
        self.expect_state(PipelineState::Building)?;

        let batches = as_components
            .as_component_batches()
            .map_err(|err| self.wrap(err))?;
        self.batches.extend(batches);

        if matches!(self.kind, SendKind::Row { .. }) {
            self.batches.extend(as_components.indicator());
        }

        Ok(self)
    }

    pub fn add_batch(&mut self, batch: ComponentBatch) -> RecordingStreamResult<&mut Self> {
        self.expect_state(PipelineState::Building)?;
        self.batches.push(batch);
        Ok(self)
    }

    /// Runs every check and encodes every row.
    ///
    /// On failure, the pipeline stays in [`PipelineState::Building`].
    pub fn validate(&mut self) -> RecordingStreamResult<()> {
        self.expect_state(PipelineState::Building)?;

        self.encoded_rows = self.encode_rows().map_err(|err| self.wrap(err))?;
        self.state = PipelineState::Validated;

        Ok(())
    }

    /// Hands all rows to `sink`, returning how many were sent.
    pub fn dispatch(&mut self, sink: &dyn LogSink) -> RecordingStreamResult<usize> {
        self.expect_state(PipelineState::Validated)?;

        let rows = std::mem::take(&mut self.encoded_rows);
        let num_rows = rows.len();
        if rows.is_empty() {
            re_log::debug_once!("{}: nothing to send", self.entity_path);
        } else {
            sink.submit_rows(&self.entity_path, rows);
        }

        self.state = PipelineState::Dispatched;
        re_log::trace!("{}: dispatched {num_rows} row(s)", self.entity_path);

        Ok(num_rows)
    }

    fn encode_rows(&self) -> RecordingStreamResult<Vec<(TimePoint, Vec<WireBatch>)>> {
        if self.validate_known_components {
            re_types::register_builtin_components();
            let registry = ComponentRegistry::global();
            for batch in &self.batches {
                registry.resolve(&batch.descriptor, true)?;
            }
        }

        match &self.kind {
            SendKind::Row { timepoint } => {
                let mut builder = BundleBuilder::new(self.entity_path.clone());
                for batch in &self.batches {
                    builder.add_batch(batch.clone());
                }

                let batches = builder.build()?.into_batches();
                if batches.is_empty() {
                    return Ok(Vec::new());
                }

                Ok(vec![(timepoint.clone(), encode_batches(&batches)?)])
            }

            SendKind::Columns {
                indexes,
                partitions,
            } => {
                let set = partition_for_columns(
                    self.entity_path.clone(),
                    indexes.clone(),
                    self.batches.clone(),
                    partitions,
                )?;

                set.rows()
                    .map(|row| -> RecordingStreamResult<_> {
                        Ok((row.timepoint, encode_batches(&row.batches)?))
                    })
                    .collect()
            }
        }
    }

    fn expect_state(&self, expected: PipelineState) -> RecordingStreamResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.wrap(RecordingStreamError::InvalidState {
                expected,
                actual: self.state,
            }))
        }
    }

    fn wrap(&self, err: impl Into<RecordingStreamError>) -> RecordingStreamError {
        RecordingStreamError::Pipeline {
            entity_path: self.entity_path.clone(),
            source: Box::new(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use re_chunk::external::arrow::array::Array as _;
    use re_chunk::{TimeCell, decode_batch};
    use re_types::archetypes::{Points3D, Scalars};
    use re_types::{ComponentDescriptor, DynamicArchetype};

    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn state_machine() -> anyhow::Result<()> {
        let sink = MemorySink::default();
        let timepoint = TimePoint::from([("frame", TimeCell::from_sequence(1))]);

        let mut pipeline = SendPipeline::new_row("points", timepoint.clone());
        assert_eq!(pipeline.state(), PipelineState::Building);

        // Can't skip validation.
        let err = pipeline.dispatch(&sink).unwrap_err();
        assert!(err.to_string().contains("expected validated"), "{err}");

        pipeline.add(&Points3D::new(vec![[1.0_f32, 2.0, 3.0]]).with_radii(0.5_f32))?;
        pipeline.validate()?;
        assert_eq!(pipeline.state(), PipelineState::Validated);

        // No more data once validated.
        assert!(pipeline.add(&Scalars::one(1.0)).is_err());

        assert_eq!(pipeline.dispatch(&sink)?, 1);
        assert_eq!(pipeline.state(), PipelineState::Dispatched);
        assert!(pipeline.dispatch(&sink).is_err());

        let rows = sink.buffer().take();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timepoint, timepoint);

        let descriptors: Vec<_> = rows[0]
            .batches
            .iter()
            .map(|batch| batch.descriptor.to_string())
            .collect();
        similar_asserts::assert_eq!(
            descriptors,
            vec!["Points3D:positions", "Points3D:radii", "Points3D:Points3DIndicator"]
        );
        Ok(())
    }

    #[test]
    fn failed_validation_sends_nothing() {
        let sink = MemorySink::default();

        let mut pipeline = SendPipeline::new_row("points", TimePoint::new_static());
        let points = Points3D::new(vec![[1.0_f32, 2.0, 3.0], [4.0, 5.0, 6.0]])
            .with_radii(vec![1.0_f32, 2.0, 3.0]);
        pipeline.add(&points).unwrap();

        let err = pipeline.validate().unwrap_err();
        assert_eq!(pipeline.state(), PipelineState::Building);
        let msg = re_log::format_error_chain(&err);
        assert!(msg.contains("\"points\""), "{msg}");
        assert!(msg.contains("Points3D:positions=2, Points3D:radii=3"), "{msg}");

        assert!(pipeline.dispatch(&sink).is_err());
        assert_eq!(sink.buffer().num_rows(), 0);
    }

    #[test]
    fn bulk_rows_are_dispatched_in_order() -> anyhow::Result<()> {
        let sink = MemorySink::default();

        let mut pipeline = SendPipeline::new_columns(
            "plot",
            [TimeColumn::new_sequence("step", [0, 1, 2])],
            Partitions::default(),
        );
        pipeline.add(&Scalars::new(vec![1.0_f64, 2.0, 3.0]))?;
        pipeline.validate()?;
        assert_eq!(pipeline.dispatch(&sink)?, 3);

        let rows = sink.buffer().take();
        let steps: Vec<_> = rows
            .iter()
            .map(|row| row.timepoint.get("step").map(|cell| cell.value))
            .collect();
        assert_eq!(steps, vec![Some(0), Some(1), Some(2)]);

        // No indicator in bulk sends.
        assert!(rows.iter().all(|row| row.batches.len() == 1));

        let (info, array) = decode_batch(&rows[2].batches[0])?;
        assert_eq!(info.descriptor, Scalars::descriptor_scalars());
        assert_eq!(array.len(), 1);
        Ok(())
    }

    #[test]
    fn unknown_builtins_are_rejected_on_demand() -> anyhow::Result<()> {
        let bogus = ComponentBatch::from_strings(
            ComponentDescriptor::new("text").with_component_type("rerun.components.Bogus"),
            ["hi"],
        );

        let mut lenient = SendPipeline::new_row("log", TimePoint::new_static());
        lenient.add_batch(bogus.clone())?;
        lenient.validate()?;

        let mut strict = SendPipeline::new_row("log", TimePoint::new_static())
            .with_validate_known_components(true);
        strict.add_batch(bogus)?;
        let err = strict.validate().unwrap_err();
        assert!(err.to_string().contains("rerun.components.Bogus"), "{err}");

        // Custom components always pass.
        let custom = DynamicArchetype::new("user.Sensor")
            .with_custom_component("confidence", vec![0.5_f32, 0.7], 1);
        let mut strict = SendPipeline::new_row("log", TimePoint::new_static())
            .with_validate_known_components(true);
        strict.add(&custom)?;
        strict.validate()?;
        Ok(())
    }
}
