//! Handle types and id allocation.
//!
//! Entities and components live in the [`Scene`](crate::Scene) arena and are
//! addressed by plain `u64` handles. Handles are never reused, so a holder of
//! a destroyed id observes "not found" instead of aliasing a newer object.

use serde::{Deserialize, Serialize};

/// Handle to an entity stored in a [`Scene`](crate::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Handle to a component stored in a [`Scene`](crate::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

impl ComponentId {
    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Handle returned when registering an [`EntityListener`](crate::EntityListener).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle to a pending reference request, see
/// [`Scene::on_component_added`](crate::Scene::on_component_added).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// Allocates monotonically increasing raw ids. Ids start at 1.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next_id: u64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self { next_id: 1 }
    }

    pub(crate) fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
