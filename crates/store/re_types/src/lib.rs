//! The built-in components and archetypes.
//!
//! Every built-in component type has a canonical schema (element type, arity, value domain),
//! which [`register_builtin_components`] installs into the global [`ComponentRegistry`].
//! Archetypes serialize their fields against those schemas.
//!
//! User-defined archetypes can be logged with [`DynamicArchetype`], or by implementing
//! [`AsComponents`] and delegating to the built-in archetypes.

pub mod archetypes;
pub mod components;
pub mod datatypes;

mod dynamic_archetype;

pub use self::archetypes::Archetype;
pub use self::components::Component;
pub use self::dynamic_archetype::DynamicArchetype;

pub use re_types_core::{
    ArchetypeBundle, ArchetypeName, AsComponents, BundleBuilder, ComponentBatch,
    ComponentColumn, ComponentDescriptor, ComponentIdentifier, ComponentRegistry,
    ComponentSchema, ComponentType, ElementType, EntityPath, FlatBuffer, NormalizeOptions,
    RawValue, Rgba32, SerializationError, SerializationResult,
};

/// Registers the schemas of all built-in components into [`ComponentRegistry::global`].
///
/// Idempotent, and cheap to call again.
pub fn register_builtin_components() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        let registry = ComponentRegistry::global();
        for (name, schema) in components::builtin_schemas() {
            // Conflicts are logged by the registry itself.
            registry.register(name, schema).ok();
        }
        re_log::debug!("Registered {} built-in components", registry.len());
    });
}
