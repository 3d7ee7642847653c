//! Bulk sends must be indistinguishable from the equivalent sequence of per-row sends.

use re_chunk::{
    ComponentBatch, Partitions, TimeColumn, TimeCell, TimePoint, decode_batch, encode_batch,
    partition_for_columns,
};
use re_types::archetypes::{Points3D, Scalars};
use re_types::{AsComponents as _, FlatBuffer};

fn positions_batch(points: &Points3D) -> anyhow::Result<ComponentBatch> {
    points
        .as_component_batches()?
        .into_iter()
        .find(|batch| batch.descriptor == Points3D::descriptor_positions())
        .ok_or_else(|| anyhow::anyhow!("no positions"))
}

#[test]
fn bulk_positions_match_per_row_sends() -> anyhow::Result<()> {
    let bulk = positions_batch(&Points3D::new(vec![[1.0_f32, 0.0, 1.0], [0.5, 0.5, 2.0]]))?;

    let set = partition_for_columns(
        "points",
        vec![TimeColumn::new_sequence("frame", [10, 11])],
        vec![bulk.clone()],
        &Partitions::default(),
    )?;
    assert_eq!(set.num_rows, 2);

    let per_row = [
        (10, Points3D::new(vec![[1.0_f32, 0.0, 1.0]])),
        (11, Points3D::new(vec![[0.5_f32, 0.5, 2.0]])),
    ];

    for (row, (frame, points)) in set.rows().zip(per_row) {
        assert_eq!(
            row.timepoint,
            TimePoint::from([("frame", TimeCell::from_sequence(frame))])
        );

        let [from_bulk] = row.batches.as_slice() else {
            anyhow::bail!("expected a single column");
        };
        let from_row = positions_batch(&points)?;

        assert_eq!(from_bulk.num_instances(), 1);
        assert_eq!(from_bulk.arity(), 3);

        let (bulk_info, bulk_array) = decode_batch(&encode_batch(from_bulk)?)?;
        let (row_info, row_array) = decode_batch(&encode_batch(&from_row)?)?;
        similar_asserts::assert_eq!(bulk_info, row_info);
        assert_eq!(&bulk_array, &row_array);
    }

    // Nothing was lost or reordered on the way.
    let flattened = set
        .rows()
        .map(|row| row.batches[0].to_flat_buffer())
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        FlatBuffer::concat(flattened)?,
        FlatBuffer::F32(vec![1.0, 0.0, 1.0, 0.5, 0.5, 2.0])
    );
    assert_eq!(bulk.to_flat_buffer()?, FlatBuffer::F32(vec![1.0, 0.0, 1.0, 0.5, 0.5, 2.0]));

    Ok(())
}

#[test]
fn partitioned_scalars_on_two_timelines() -> anyhow::Result<()> {
    let [scalars] = Scalars::new(vec![1.0_f64, 2.0, 3.0, 4.0])
        .as_component_batches()?
        .try_into()
        .map_err(|_err| anyhow::anyhow!("expected a single batch"))?;

    let partitions = Partitions::from_iter([(scalars.descriptor.component.clone(), vec![1, 0, 3])]);
    let set = partition_for_columns(
        "plot",
        vec![
            TimeColumn::new_sequence("step", [0, 1, 2]),
            TimeColumn::new_duration_secs("time", [0.0, 0.5, 1.0]),
        ],
        vec![scalars],
        &partitions,
    )?;

    let rows: Vec<_> = set.rows().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].batches[0].num_instances(), 0);
    assert_eq!(rows[2].batches[0].to_flat_buffer()?, FlatBuffer::F64(vec![2.0, 3.0, 4.0]));
    assert_eq!(
        rows[1].timepoint.get("time"),
        Some(&TimeCell::from_duration_secs(0.5))
    );

    // Empty rows still encode.
    let (_, array) = decode_batch(&encode_batch(&rows[1].batches[0])?)?;
    assert_eq!(arrow::array::Array::len(array.as_ref()), 0);

    Ok(())
}
