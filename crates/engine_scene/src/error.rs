//! Scene and descriptor error types.

use crate::{ComponentId, EntityId};

/// Configuration errors raised while building component descriptors.
///
/// These surface at start-up from
/// [`DescriptorRegistry::descriptor`](crate::DescriptorRegistry::descriptor),
/// so a host with a broken schema fails before any scene is created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// A property was declared with an empty name.
    #[error("property name of component '{component}' is empty")]
    EmptyPropertyName { component: String },

    /// Two properties of one descriptor share a name.
    #[error("component '{component}' already has a property named '{property}'")]
    DuplicateProperty { component: String, property: String },

    /// Aliases were added for a type that is not registered.
    #[error("no descriptor registered for '{0}'")]
    UnknownDescriptor(String),
}

/// Errors raised by [`Scene`](crate::Scene) operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The parent already has a child with this name.
    #[error("entity '{parent}' already has a child named '{name}'")]
    DuplicateEntityName { parent: String, name: String },

    /// The entity already has a component of this type (alias aware).
    #[error("entity '{entity}' already has a component of type '{component}'")]
    DuplicateComponent { entity: String, component: String },

    /// The component is attached to another entity.
    #[error("{component} is already attached to entity '{entity}'")]
    ComponentAlreadyAttached { component: ComponentId, entity: String },

    /// Attaching the child would make an entity its own ancestor.
    #[error("adding '{child}' under '{parent}' would create a cycle")]
    CyclicHierarchy { parent: String, child: String },

    /// The entity is not a direct child of the given parent.
    #[error("'{child}' is not a child of '{parent}'")]
    NotAChild { parent: String, child: String },

    #[error("{0} does not exist")]
    EntityNotFound(EntityId),

    #[error("{0} does not exist")]
    ComponentIdNotFound(ComponentId),

    /// The entity has no component of the requested type.
    #[error("entity '{entity}' has no component of type '{component}'")]
    ComponentNotFound { entity: String, component: String },

    /// No descriptor is registered under this type name or alias.
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),

    /// A component has no descriptor, so its properties are unreachable.
    #[error("component type '{0}' has no registered descriptor")]
    MissingDescriptor(String),

    #[error("component type '{component}' has no property '{property}'")]
    UnknownProperty { component: String, property: String },

    /// A property was handed a value of the wrong kind.
    #[error("property '{property}' expects {expected}, got {found}")]
    PropertyValueMismatch {
        property: String,
        expected: String,
        found: &'static str,
    },

    /// A property accessor was handed a component of another type.
    #[error("property '{property}' belongs to component type '{expected}'")]
    ComponentTypeMismatch { property: String, expected: String },

    /// The component is checked out by a running hook.
    #[error("{0} is busy running a notification hook")]
    ComponentBusy(ComponentId),

    /// The component is not attached to an entity.
    #[error("{0} is not attached to an entity")]
    ComponentDetached(ComponentId),

    /// Merging two entities where one contains the other.
    #[error("'{this}' and '{other}' are in the same branch")]
    OverlappingBranches { this: String, other: String },

    #[error("entity names must not be empty")]
    EmptyName,

    /// The name would not resolve back to its entity through a path.
    #[error("invalid entity name '{0}'")]
    InvalidName(String),

    /// No free `_N` suffix was found within the configured suffix limit.
    #[error("no free child name for '{candidate}' under '{parent}'")]
    NameSpaceExhausted { parent: String, candidate: String },

    /// The path is malformed or does not lead anywhere.
    #[error("invalid entity path '{0}'")]
    InvalidPath(String),

    /// A serialized document does not have the expected shape.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
