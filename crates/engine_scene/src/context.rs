//! Scene access handed to component hooks.

use crate::{Component, ComponentId, EntityId, Scene, SceneError};

/// What a running hook can see: the scene, its own id and its entity.
///
/// The hook's own component is checked out while the hook runs, so
/// [`Scene::component_ref`] and property access on [`Self::id`] report it
/// as missing or busy. Use `self` inside the hook instead.
pub struct ComponentContext<'a> {
    scene: &'a mut Scene,
    id: ComponentId,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(scene: &'a mut Scene, id: ComponentId) -> Self {
        Self { scene, id }
    }

    /// Id of the component whose hook is running.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Entity the component is currently attached to.
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        self.scene.component_entity(self.id)
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }

    /// Get or create a component of `type_name` on the owning entity.
    pub fn sibling(&mut self, type_name: &str) -> Result<ComponentId, SceneError> {
        let entity = self.entity().ok_or(SceneError::ComponentDetached(self.id))?;
        self.scene.component(entity, type_name)
    }

    /// Typed variant of [`Self::sibling`].
    pub fn sibling_typed<T: Component + Default>(&mut self) -> Result<ComponentId, SceneError> {
        let entity = self.entity().ok_or(SceneError::ComponentDetached(self.id))?;
        self.scene.component_typed::<T>(entity)
    }
}
