use std::sync::OnceLock;

use arrow::datatypes::{DataType, Field, UnionFields, UnionMode};
use itertools::Itertools as _;
use parking_lot::RwLock;

use crate::{
    ComponentBatch, ComponentDescriptor, ComponentType, ElementType, SerializationError,
    SerializationResult,
};

/// How the raw values of a numeric component are interpreted before storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueDomain {
    /// Values are stored as-is, after a lossless cast.
    Raw,

    /// Values are colors, see [`crate::normalize_colors`].
    Color,
}

/// The canonical storage of a component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentSchema {
    /// Fixed-arity numeric records.
    Numeric {
        element_type: ElementType,
        arity: usize,
        domain: ValueDomain,
    },

    /// One UTF-8 string per instance.
    Text,

    /// One opaque byte blob per instance.
    Blob,

    /// A dense tagged union, one variant per instance.
    Union(UnionFields),

    /// A struct of named, typed children.
    Struct(Vec<Field>),
}

impl std::fmt::Display for ComponentSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric {
                element_type,
                arity,
                domain,
            } => {
                write!(f, "{element_type}×{arity}")?;
                if *domain == ValueDomain::Color {
                    f.write_str(" (color)")?;
                }
                Ok(())
            }
            Self::Text => f.write_str("utf8"),
            Self::Blob => f.write_str("binary"),
            Self::Union(fields) => {
                let names = fields.iter().map(|(_, field)| field.name()).join(", ");
                write!(f, "union[{names}]")
            }
            Self::Struct(fields) => {
                let names = fields.iter().map(|field| field.name()).join(", ");
                write!(f, "struct[{names}]")
            }
        }
    }
}

impl ComponentSchema {
    #[inline]
    pub fn numeric(element_type: ElementType, arity: usize) -> Self {
        Self::Numeric {
            element_type,
            arity,
            domain: ValueDomain::Raw,
        }
    }

    /// Colors are always stored as 4 `u8` RGBA channels.
    #[inline]
    pub fn color() -> Self {
        Self::Numeric {
            element_type: ElementType::U8,
            arity: crate::COLOR_ARITY,
            domain: ValueDomain::Color,
        }
    }

    /// The Arrow datatype of a single instance.
    pub fn arrow_datatype(&self) -> DataType {
        match self {
            Self::Numeric {
                element_type,
                arity,
                ..
            } => crate::component_batch::instance_datatype(*element_type, *arity),
            Self::Text => DataType::Utf8,
            Self::Blob => DataType::Binary,
            Self::Union(fields) => DataType::Union(fields.clone(), UnionMode::Dense),
            Self::Struct(fields) => DataType::Struct(fields.clone().into()),
        }
    }

    /// Checks that a batch is stored the way this schema says it should be.
    pub fn validate(&self, batch: &ComponentBatch) -> SerializationResult<()> {
        let expected = self.arrow_datatype();
        let actual = batch.array.data_type();
        if actual == &expected || batch.descriptor.is_indicator_component() {
            Ok(())
        } else {
            Err(SerializationError::unsupported_dtype(
                actual,
                format!("{expected} for {}", batch.descriptor),
            ))
        }
    }
}

// ---

/// Process-wide registry mapping built-in component types to their canonical schema.
///
/// Registrations are first-wins: re-registering the exact same schema is a no-op, registering a
/// different one is a [`SerializationError::SchemaConflict`].
#[derive(Default)]
pub struct ComponentRegistry {
    schemas: RwLock<ahash::HashMap<ComponentType, ComponentSchema>>,
}

impl ComponentRegistry {
    /// The global registry.
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<ComponentRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::default)
    }

    pub fn register(
        &self,
        component_type: impl Into<ComponentType>,
        schema: ComponentSchema,
    ) -> SerializationResult<()> {
        let component_type = component_type.into();

        let mut schemas = self.schemas.write();
        match schemas.get(&component_type) {
            Some(existing) if existing == &schema => Ok(()),
            Some(existing) => {
                let err = SerializationError::SchemaConflict {
                    component_type: component_type.to_string(),
                    existing: existing.to_string(),
                    new: schema.to_string(),
                };
                re_log::error!("{err}");
                Err(err)
            }
            None => {
                re_log::trace!("Registered {component_type} as {schema}");
                schemas.insert(component_type, schema);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn lookup(&self, component_type: &ComponentType) -> Option<ComponentSchema> {
        self.schemas.read().get(component_type).cloned()
    }

    #[inline]
    pub fn contains(&self, component_type: &ComponentType) -> bool {
        self.schemas.read().contains_key(component_type)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up the schema for a descriptor.
    ///
    /// Returns `Ok(None)` for untyped and custom components, which are stored as given.
    /// With `validate` set, an unregistered built-in type is an [`SerializationError::UnknownComponent`].
    pub fn resolve(
        &self,
        descriptor: &ComponentDescriptor,
        validate: bool,
    ) -> SerializationResult<Option<ComponentSchema>> {
        let Some(component_type) = &descriptor.component_type else {
            return Ok(None);
        };

        match self.lookup(component_type) {
            Some(schema) => Ok(Some(schema)),
            None if validate && component_type.is_builtin() => {
                Err(SerializationError::UnknownComponent {
                    descriptor: descriptor.to_string(),
                    component_type: component_type.to_string(),
                })
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_wins() -> anyhow::Result<()> {
        let registry = ComponentRegistry::default();

        let radius = ComponentSchema::numeric(ElementType::F32, 1);
        registry.register("rerun.components.Radius", radius.clone())?;
        registry.register("rerun.components.Radius", radius)?;
        assert_eq!(registry.len(), 1);

        let err = registry
            .register("rerun.components.Radius", ComponentSchema::numeric(ElementType::F64, 1))
            .unwrap_err();
        assert!(matches!(err, SerializationError::SchemaConflict { .. }), "{err}");

        assert_eq!(
            registry.lookup(&"rerun.components.Radius".into()),
            Some(ComponentSchema::numeric(ElementType::F32, 1))
        );
        Ok(())
    }

    #[test]
    fn unknown_components() -> anyhow::Result<()> {
        let registry = ComponentRegistry::default();

        let untyped = ComponentDescriptor::new("confidence");
        assert_eq!(registry.resolve(&untyped, true)?, None);

        let custom = ComponentDescriptor::new("confidence").with_component_type("my.Confidence");
        assert_eq!(registry.resolve(&custom, true)?, None);

        let builtin =
            ComponentDescriptor::new("radii").with_component_type("rerun.components.Radius");
        assert_eq!(registry.resolve(&builtin, false)?, None);
        let err = registry.resolve(&builtin, true).unwrap_err();
        assert!(matches!(err, SerializationError::UnknownComponent { .. }), "{err}");
        Ok(())
    }

    #[test]
    fn concurrent_registration() {
        let registry = ComponentRegistry::default();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let registry = &registry;
                scope.spawn(move || {
                    for j in 0..16 {
                        registry
                            .register(
                                format!("my.Component{}", (i + j) % 4),
                                ComponentSchema::numeric(ElementType::F32, 3),
                            )
                            .ok();
                    }
                });
            }
        });

        assert_eq!(registry.len(), 4);
    }
}
