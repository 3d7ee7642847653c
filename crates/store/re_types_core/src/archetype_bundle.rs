use indexmap::IndexMap;

use crate::{
    AsComponents, ComponentBatch, ComponentDescriptor, EntityPath, ResultExt as _,
    SerializationError, SerializationResult,
};

/// Everything a single logging call sends to one entity: an ordered set of component batches,
/// plus the indicators of the archetypes they came from.
///
/// Invariants:
/// * No two batches share a [`ComponentDescriptor`].
/// * All non-indicator batches have the same number of instances, except for batches of length 1
///   (splats, which apply to every instance) and batches of length 0 (clears).
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeBundle {
    entity_path: EntityPath,
    components: Vec<ComponentBatch>,
    indicators: Vec<ComponentBatch>,
}

impl ArchetypeBundle {
    /// Builds a bundle out of a single [`AsComponents`].
    pub fn from_as_components(
        entity_path: impl Into<EntityPath>,
        as_components: &dyn AsComponents,
    ) -> SerializationResult<Self> {
        let mut builder = BundleBuilder::new(entity_path);
        builder.add(as_components)?;
        builder.build()
    }

    #[inline]
    pub fn entity_path(&self) -> &EntityPath {
        &self.entity_path
    }

    /// The component batches, in insertion order (indicators excluded).
    #[inline]
    pub fn components(&self) -> &[ComponentBatch] {
        &self.components
    }

    #[inline]
    pub fn indicators(&self) -> &[ComponentBatch] {
        &self.indicators
    }

    /// The first indicator, if any.
    #[inline]
    pub fn indicator(&self) -> Option<&ComponentBatch> {
        self.indicators.first()
    }

    #[inline]
    pub fn get(&self, descriptor: &ComponentDescriptor) -> Option<&ComponentBatch> {
        self.components
            .iter()
            .find(|batch| &batch.descriptor == descriptor)
    }

    /// Finds a batch by component name, ignoring archetype and type.
    #[inline]
    pub fn get_by_component(&self, component: &str) -> Option<&ComponentBatch> {
        self.components
            .iter()
            .find(|batch| batch.descriptor.component.as_str() == component)
    }

    /// The number of instances each component applies to.
    ///
    /// This is the length of the longest batch, or 1 if everything is a splat.
    pub fn num_instances(&self) -> usize {
        self.components
            .iter()
            .map(ComponentBatch::num_instances)
            .max()
            .unwrap_or(0)
    }

    /// Components and indicators, in that order.
    pub fn into_batches(self) -> Vec<ComponentBatch> {
        let Self {
            entity_path: _,
            mut components,
            indicators,
        } = self;
        components.extend(indicators);
        components
    }
}

// ---

/// Accumulates batches from any number of [`AsComponents`], then validates them into an
/// [`ArchetypeBundle`].
///
/// A batch whose descriptor has already been added replaces the earlier one, and takes its place
/// at the end of the order.
pub struct BundleBuilder {
    entity_path: EntityPath,
    components: IndexMap<ComponentDescriptor, ComponentBatch>,
    indicators: IndexMap<ComponentDescriptor, ComponentBatch>,
}

impl BundleBuilder {
    pub fn new(entity_path: impl Into<EntityPath>) -> Self {
        Self {
            entity_path: entity_path.into(),
            components: IndexMap::default(),
            indicators: IndexMap::default(),
        }
    }

    /// Adds all batches and the indicator of `as_components`.
    pub fn add(&mut self, as_components: &dyn AsComponents) -> SerializationResult<&mut Self> {
        let batches = as_components
            .as_component_batches()
            .with_context(self.entity_path.as_str())?;

        for batch in batches.into_iter().chain(as_components.indicator()) {
            self.add_batch(batch);
        }

        Ok(self)
    }

    /// Adds a single batch. Last write wins.
    pub fn add_batch(&mut self, batch: ComponentBatch) -> &mut Self {
        let map = if batch.descriptor.is_indicator_component() {
            &mut self.indicators
        } else {
            &mut self.components
        };

        if map.shift_remove(&batch.descriptor).is_some() {
            re_log::trace!(
                "{}: {} was given more than once, keeping the last one",
                self.entity_path,
                batch.descriptor
            );
        }
        map.insert(batch.descriptor.clone(), batch);

        self
    }

    /// Checks that all batches agree on the number of instances.
    pub fn build(self) -> SerializationResult<ArchetypeBundle> {
        let Self {
            entity_path,
            components,
            indicators,
        } = self;

        let components: Vec<ComponentBatch> = components.into_values().collect();
        check_instance_counts(&entity_path, &components)?;

        Ok(ArchetypeBundle {
            entity_path,
            components,
            indicators: indicators.into_values().collect(),
        })
    }
}

/// Every batch must hold either 1 instance (a splat) or the common instance count.
///
/// Empty batches are also accepted: they clear the component for this row.
fn check_instance_counts(
    entity_path: &EntityPath,
    components: &[ComponentBatch],
) -> SerializationResult<()> {
    let mut lengths = components
        .iter()
        .map(ComponentBatch::num_instances)
        .filter(|&len| len > 1);

    let Some(first) = lengths.next() else {
        return Ok(());
    };

    if lengths.all(|len| len == first) {
        return Ok(());
    }

    Err(SerializationError::RowCountMismatch {
        entity_path: entity_path.to_string(),
        lengths: components
            .iter()
            .map(|batch| (batch.descriptor.to_string(), batch.num_instances()))
            .collect(),
    })
}
