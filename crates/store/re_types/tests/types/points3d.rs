use re_types::archetypes::Points3D;
use re_types::{Archetype as _, AsComponents as _, FlatBuffer};

#[test]
fn positions_scenario() {
    let points = Points3D::new(vec![[1.0_f32, 0.0, 1.0], [0.5, 0.5, 2.0]]);

    let batches = points.as_component_batches().unwrap();
    assert_eq!(batches.len(), 1);

    let positions = &batches[0];
    eprintln!("positions = {:#?}", positions.array);
    assert_eq!(positions.num_instances(), 2);
    assert_eq!(positions.arity(), 3);
    assert_eq!(
        positions.to_flat_buffer().unwrap(),
        FlatBuffer::F32(vec![1.0, 0.0, 1.0, 0.5, 0.5, 2.0])
    );

    similar_asserts::assert_eq!(points.indicator(), Some(Points3D::indicator_batch()));
}

#[test]
fn flat_input_is_chunked_by_arity() {
    let flat = Points3D::new(vec![1.0_f32, 0.0, 1.0, 0.5, 0.5, 2.0]);
    let nested = Points3D::new(vec![[1.0_f32, 0.0, 1.0], [0.5, 0.5, 2.0]]);

    similar_asserts::assert_eq!(
        flat.as_component_batches().unwrap(),
        nested.as_component_batches().unwrap()
    );
}

#[test]
fn update_fields_only_sends_what_is_set() {
    let batches = Points3D::update_fields()
        .with_colors(re_types::Rgba32::WHITE)
        .as_component_batches()
        .unwrap();

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].descriptor, Points3D::descriptor_colors());
    assert_eq!(
        batches[0].to_flat_buffer().unwrap(),
        FlatBuffer::U8(vec![255, 255, 255, 255])
    );
}
