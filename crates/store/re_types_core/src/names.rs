//! Cheaply clonable string newtypes used to name things.

/// Declares a cheaply clonable, `Arc<str>`-backed string newtype.
///
/// ```
/// re_types_core::declare_name!(
///     /// The name of a thing.
///     pub struct ThingName;
/// );
///
/// let name = ThingName::from("thing");
/// assert_eq!(name.as_str(), "thing");
/// ```
#[macro_export]
macro_rules! declare_name {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(::std::sync::Arc<str>);

        impl $name {
            #[inline]
            pub fn new(name: &str) -> Self {
                Self(name.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            #[inline]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl ::std::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl ::std::convert::AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::std::borrow::Borrow<str> for $name {
            #[inline]
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl ::std::convert::From<&str> for $name {
            #[inline]
            fn from(name: &str) -> Self {
                Self(name.into())
            }
        }

        impl ::std::convert::From<String> for $name {
            #[inline]
            fn from(name: String) -> Self {
                Self(name.into())
            }
        }

        impl ::std::convert::From<&String> for $name {
            #[inline]
            fn from(name: &String) -> Self {
                Self(name.as_str().into())
            }
        }

        impl ::std::convert::From<&$name> for $name {
            #[inline]
            fn from(name: &$name) -> Self {
                name.clone()
            }
        }
    };
}

declare_name!(
    /// The name of a component within an archetype, e.g. `positions` or `colors`.
    ///
    /// This is the field name, and the part of a [`crate::ComponentDescriptor`] that is always set.
    pub struct ComponentIdentifier;
);

declare_name!(
    /// The fully-qualified name of an archetype, e.g. `rerun.archetypes.Points3D`.
    pub struct ArchetypeName;
);

declare_name!(
    /// The fully-qualified semantic type of a component, e.g. `rerun.components.Position3D`.
    pub struct ComponentType;
);

declare_name!(
    /// The path of the entity that data is logged to, e.g. `world/points`.
    pub struct EntityPath;
);

/// The namespace reserved for built-in archetypes and components.
pub const BUILTIN_NAMESPACE: &str = "rerun.";

fn strip_builtin_prefix<'a>(full_name: &'a str, kinds: &[&str]) -> &'a str {
    for kind in kinds {
        if let Some(short) = full_name
            .strip_prefix(BUILTIN_NAMESPACE)
            .and_then(|rest| rest.strip_prefix(kind))
        {
            return short;
        }
    }
    full_name.strip_prefix(BUILTIN_NAMESPACE).unwrap_or(full_name)
}

impl ArchetypeName {
    /// Returns the unqualified name, e.g. `Points3D`.
    ///
    /// ```
    /// # use re_types_core::ArchetypeName;
    /// assert_eq!(ArchetypeName::from("rerun.archetypes.Points3D").short_name(), "Points3D");
    /// assert_eq!(ArchetypeName::from("my.Robot").short_name(), "my.Robot");
    /// ```
    #[inline]
    pub fn short_name(&self) -> &str {
        strip_builtin_prefix(self.as_str(), &["archetypes."])
    }

    /// Is this one of the built-in archetypes?
    #[inline]
    pub fn is_builtin(&self) -> bool {
        self.starts_with(BUILTIN_NAMESPACE)
    }
}

impl ComponentType {
    /// Returns the unqualified name, e.g. `Position3D`.
    ///
    /// ```
    /// # use re_types_core::ComponentType;
    /// assert_eq!(ComponentType::from("rerun.components.Position3D").short_name(), "Position3D");
    /// ```
    #[inline]
    pub fn short_name(&self) -> &str {
        strip_builtin_prefix(self.as_str(), &["components."])
    }

    /// Is this one of the built-in component types?
    ///
    /// Only built-in types are validated against the [`crate::ComponentRegistry`].
    #[inline]
    pub fn is_builtin(&self) -> bool {
        self.starts_with(BUILTIN_NAMESPACE)
    }
}

impl EntityPath {
    /// The root of the entity hierarchy.
    #[inline]
    pub fn root() -> Self {
        Self::new("/")
    }

    /// The path split into its non-empty parts.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.split('/').filter(|part| !part.is_empty())
    }
}
