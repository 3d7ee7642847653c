use re_types::archetypes::Points3D;
use re_types::{
    ArchetypeBundle, AsComponents, BundleBuilder, ComponentBatch, ComponentDescriptor,
    FlatBuffer, SerializationResult,
};

/// A user-defined archetype: built-in points plus a custom per-point confidence.
struct ConfidentPoints {
    points: Points3D,
    confidences: Vec<f32>,
}

impl AsComponents for ConfidentPoints {
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        let mut batches = self.points.as_component_batches()?;
        batches.extend(self.points.indicator());
        batches.push(ComponentBatch::from_raw(
            ComponentDescriptor::new("confidence").with_archetype("user.ConfidentPoints"),
            self.confidences.clone(),
            1,
        )?);
        Ok(batches)
    }

    fn indicator(&self) -> Option<ComponentBatch> {
        Some(ComponentBatch::indicator("user.ConfidentPoints"))
    }
}

#[test]
fn delegates_to_builtin() {
    let custom = ConfidentPoints {
        points: Points3D::new(vec![[0.0_f32; 3]; 2]).with_radii(0.1_f32),
        confidences: vec![0.2, 0.9],
    };

    let bundle = ArchetypeBundle::from_as_components("world/points", &custom).unwrap();
    let columns: Vec<_> = bundle
        .components()
        .iter()
        .map(|batch| batch.descriptor.column_name())
        .collect();
    similar_asserts::assert_eq!(
        columns,
        vec!["Points3D:positions", "Points3D:radii", "user.ConfidentPoints:confidence"]
    );
    assert_eq!(bundle.indicators().len(), 2);
    assert_eq!(bundle.num_instances(), 2);
}

#[test]
fn user_override_replaces_builtin() {
    let points = Points3D::new(vec![[0.0_f32; 3]; 2]).with_radii(0.1_f32);
    let override_radii =
        ComponentBatch::from_raw(Points3D::descriptor_radii(), vec![0.5_f32, 0.7], 1).unwrap();

    let mut builder = BundleBuilder::new("world/points");
    builder.add(&points).unwrap();
    builder.add(&override_radii).unwrap();
    let bundle = builder.build().unwrap();

    let radii: Vec<_> = bundle
        .components()
        .iter()
        .filter(|batch| batch.descriptor == Points3D::descriptor_radii())
        .collect();
    assert_eq!(radii.len(), 1);
    assert_eq!(
        radii[0].to_flat_buffer().unwrap(),
        FlatBuffer::F32(vec![0.5, 0.7])
    );
}

#[test]
fn same_name_different_archetype_coexist() {
    let points = Points3D::new([1.0_f32, 2.0, 3.0]);
    let loose = ComponentBatch::from_strings(ComponentDescriptor::new("positions"), ["loose"]);
    let batches: Vec<&dyn AsComponents> = vec![&points, &loose];

    let bundle = ArchetypeBundle::from_as_components("mixed", &batches).unwrap();
    assert_eq!(bundle.components().len(), 2);
}
