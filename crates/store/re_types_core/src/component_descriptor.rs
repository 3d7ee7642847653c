use std::collections::HashMap;

use arrow::datatypes::Field;

use crate::{ArchetypeName, ComponentIdentifier, ComponentType};

/// Arrow field metadata key holding [`ComponentDescriptor::component`].
pub const FIELD_METADATA_KEY_COMPONENT: &str = "rerun:component";

/// Arrow field metadata key holding [`ComponentDescriptor::archetype`].
pub const FIELD_METADATA_KEY_ARCHETYPE: &str = "rerun:archetype";

/// Arrow field metadata key holding [`ComponentDescriptor::component_type`].
pub const FIELD_METADATA_KEY_COMPONENT_TYPE: &str = "rerun:component_type";

/// A [`ComponentDescriptor`] fully describes the semantics of a column of data.
///
/// Every component batch is uniquely identified by its [`ComponentDescriptor`]: two batches
/// are "the same component" iff their descriptors are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentDescriptor {
    /// Optional name of the archetype associated with this data.
    ///
    /// `None` if the data wasn't logged through an archetype.
    ///
    /// Example: `rerun.archetypes.Points3D`.
    pub archetype: Option<ArchetypeName>,

    /// Name of the field within the archetype, or an arbitrary name for loose components.
    ///
    /// Example: `positions`.
    pub component: ComponentIdentifier,

    /// Optional semantic type of this data.
    ///
    /// Built-in types (`rerun.components.*`) have a schema in the [`crate::ComponentRegistry`].
    ///
    /// Example: `rerun.components.Position3D`.
    pub component_type: Option<ComponentType>,
}

impl std::fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.column_name())
    }
}

impl ComponentDescriptor {
    /// A descriptor with just a component name, no archetype and no semantic type.
    #[inline]
    pub fn new(component: impl Into<ComponentIdentifier>) -> Self {
        Self {
            archetype: None,
            component: component.into(),
            component_type: None,
        }
    }

    /// The marker descriptor that identifies `archetype` within a bundle.
    ///
    /// ```
    /// # use re_types_core::ComponentDescriptor;
    /// let descr = ComponentDescriptor::indicator("rerun.archetypes.Points3D");
    /// assert_eq!(descr.component.as_str(), "Points3DIndicator");
    /// assert!(descr.is_indicator_component());
    /// ```
    pub fn indicator(archetype: impl Into<ArchetypeName>) -> Self {
        let archetype = archetype.into();
        Self {
            component: format!("{}Indicator", archetype.short_name()).into(),
            archetype: Some(archetype),
            component_type: None,
        }
    }

    /// Is this an indicator component for an archetype?
    #[inline]
    pub fn is_indicator_component(&self) -> bool {
        self.component.ends_with("Indicator")
    }

    /// Used for column names etc.
    ///
    /// `Archetype:component` if the archetype is set, otherwise the component name.
    ///
    /// ```
    /// # use re_types_core::ComponentDescriptor;
    /// let descr = ComponentDescriptor::new("positions").with_archetype("rerun.archetypes.Points3D");
    /// assert_eq!(descr.column_name(), "Points3D:positions");
    /// assert_eq!(ComponentDescriptor::new("confidence").column_name(), "confidence");
    /// ```
    #[inline]
    pub fn column_name(&self) -> String {
        match &self.archetype {
            Some(archetype) => format!("{}:{}", archetype.short_name(), self.component),
            None => self.component.to_string(),
        }
    }

    /// Returns the fully-qualified name, e.g. `rerun.archetypes.Points3D:positions#rerun.components.Position3D`.
    pub fn full_name(&self) -> String {
        let Self {
            archetype,
            component,
            component_type,
        } = self;

        match (archetype, component_type) {
            (None, None) => component.to_string(),
            (Some(archetype), None) => format!("{archetype}:{component}"),
            (None, Some(component_type)) => format!("{component}#{component_type}"),
            (Some(archetype), Some(component_type)) => {
                format!("{archetype}:{component}#{component_type}")
            }
        }
    }

    /// Unconditionally sets [`Self::archetype`] to the given one.
    #[inline]
    pub fn with_archetype(mut self, archetype: impl Into<ArchetypeName>) -> Self {
        self.archetype = Some(archetype.into());
        self
    }

    /// Unconditionally sets [`Self::component_type`] to the given one.
    #[inline]
    pub fn with_component_type(mut self, component_type: impl Into<ComponentType>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    /// Sets [`Self::archetype`] to the given one iff it's not already set.
    #[inline]
    pub fn or_with_archetype(mut self, archetype: impl FnOnce() -> ArchetypeName) -> Self {
        if self.archetype.is_none() {
            self.archetype = Some(archetype());
        }
        self
    }

    /// Sets [`Self::component_type`] to the given one iff it's not already set.
    #[inline]
    pub fn or_with_component_type(
        mut self,
        component_type: impl FnOnce() -> ComponentType,
    ) -> Self {
        if self.component_type.is_none() {
            self.component_type = Some(component_type());
        }
        self
    }

    /// Re-tags this descriptor as belonging to a built-in archetype.
    ///
    /// The component name and semantic type are kept as-is, so that custom archetypes can reuse
    /// built-in component fields without the receiver losing their meaning.
    #[inline]
    pub fn with_builtin_archetype(self, archetype: impl Into<ArchetypeName>) -> Self {
        self.with_archetype(archetype)
    }

    /// Arrow field metadata describing this descriptor.
    pub fn to_field_metadata(&self) -> HashMap<String, String> {
        let Self {
            archetype,
            component,
            component_type,
        } = self;

        let mut metadata = HashMap::default();
        metadata.insert(FIELD_METADATA_KEY_COMPONENT.to_owned(), component.to_string());
        if let Some(archetype) = archetype {
            metadata.insert(FIELD_METADATA_KEY_ARCHETYPE.to_owned(), archetype.to_string());
        }
        if let Some(component_type) = component_type {
            metadata.insert(
                FIELD_METADATA_KEY_COMPONENT_TYPE.to_owned(),
                component_type.to_string(),
            );
        }
        metadata
    }

    /// Reconstructs a descriptor from an Arrow field.
    ///
    /// Falls back to the field name if the component metadata is missing.
    pub fn from_field(field: &Field) -> Self {
        let metadata = field.metadata();
        Self {
            archetype: metadata
                .get(FIELD_METADATA_KEY_ARCHETYPE)
                .map(|name| ArchetypeName::new(name)),
            component: metadata
                .get(FIELD_METADATA_KEY_COMPONENT)
                .map_or_else(|| field.name().as_str().into(), |name| name.into()),
            component_type: metadata
                .get(FIELD_METADATA_KEY_COMPONENT_TYPE)
                .map(|name| ComponentType::new(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::DataType;

    use super::*;

    #[test]
    fn builders() {
        let descr = ComponentDescriptor::new("colors")
            .or_with_archetype(|| "rerun.archetypes.Points3D".into())
            .or_with_component_type(|| "rerun.components.Color".into())
            .or_with_archetype(|| "my.Robot".into());

        assert_eq!(descr.archetype.as_deref(), Some("rerun.archetypes.Points3D"));
        assert_eq!(descr.component_type.as_deref(), Some("rerun.components.Color"));
        assert_eq!(
            descr.full_name(),
            "rerun.archetypes.Points3D:colors#rerun.components.Color"
        );
        assert_eq!(descr.to_string(), "Points3D:colors");
    }

    #[test]
    fn builtin_archetype_keeps_identity() {
        let descr = ComponentDescriptor::new("colors")
            .with_component_type("rerun.components.Color")
            .with_builtin_archetype("rerun.archetypes.Points3D");

        assert_eq!(descr.component.as_str(), "colors");
        assert_eq!(descr.component_type.as_deref(), Some("rerun.components.Color"));
        assert_eq!(descr.archetype.as_deref(), Some("rerun.archetypes.Points3D"));
    }

    #[test]
    fn field_metadata() {
        let descr = ComponentDescriptor::new("positions")
            .with_archetype("rerun.archetypes.Points3D")
            .with_component_type("rerun.components.Position3D");

        let field = Field::new(descr.column_name(), DataType::Float32, false)
            .with_metadata(descr.to_field_metadata());
        similar_asserts::assert_eq!(descr, ComponentDescriptor::from_field(&field));

        let bare = Field::new("confidence", DataType::Float32, false);
        similar_asserts::assert_eq!(
            ComponentDescriptor::new("confidence"),
            ComponentDescriptor::from_field(&bare)
        );
    }
}
