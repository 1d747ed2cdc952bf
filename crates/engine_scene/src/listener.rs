//! Entity listeners: observers registered on one entity.
//!
//! Listeners see the scene read-only. They are held as
//! `Rc<RefCell<dyn EntityListener>>`, so the registering code keeps its own
//! handle and can read whatever the listener collected.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::{ComponentId, EntityId, ListenerId, Scene, SceneError};

/// Shared handle to a registered listener.
pub type SharedListener = Rc<RefCell<dyn EntityListener>>;

/// Observer of structural changes on one entity and its branch.
#[allow(unused_variables)]
pub trait EntityListener {
    /// `entity` moved from `old` to `new`.
    fn parent_changed(&mut self, scene: &Scene, entity: EntityId, old: Option<EntityId>, new: Option<EntityId>) {}

    fn added_component(&mut self, scene: &Scene, component: ComponentId) {}

    fn removed_component(&mut self, scene: &Scene, component: ComponentId) {}

    /// A child entity was added to the observed entity.
    fn added_entity(&mut self, scene: &Scene, entity: EntityId) {}

    fn removed_entity(&mut self, scene: &Scene, entity: EntityId) {}

    /// An entity was added to the observed branch. Defaults to calling
    /// [`Self::added_component_to_branch`] for every component under it.
    fn added_entity_to_branch(&mut self, scene: &Scene, entity: EntityId) {
        for component in scene.branch_components(entity) {
            self.added_component_to_branch(scene, component);
        }
    }

    fn removed_entity_from_branch(&mut self, scene: &Scene, entity: EntityId) {
        for component in scene.branch_components(entity) {
            self.removed_component_from_branch(scene, component);
        }
    }

    /// A component was attached to the observed entity or below it.
    fn added_component_to_branch(&mut self, scene: &Scene, component: ComponentId) {}

    fn removed_component_from_branch(&mut self, scene: &Scene, component: ComponentId) {}
}

/// Flat, ordered list of the components under a root that carry a
/// capability tag. Stays current as the branch changes.
#[derive(Debug)]
pub struct BranchIndex {
    capability: String,
    members: Vec<ComponentId>,
    present: HashSet<ComponentId>,
}

impl BranchIndex {
    #[must_use]
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            members: Vec::new(),
            present: HashSet::new(),
        }
    }

    /// Index the branch under `root` and register for its changes.
    pub fn attach(
        scene: &mut Scene,
        root: EntityId,
        capability: impl Into<String>,
    ) -> Result<(Rc<RefCell<BranchIndex>>, ListenerId), SceneError> {
        let mut index = BranchIndex::new(capability);
        for component in scene.branch_components(root) {
            index.added_component_to_branch(scene, component);
        }
        let index = Rc::new(RefCell::new(index));
        let id = scene.add_entity_listener(root, index.clone())?;
        Ok((index, id))
    }

    #[must_use]
    pub fn capability(&self) -> &str {
        &self.capability
    }

    #[must_use]
    pub fn members(&self) -> &[ComponentId] {
        &self.members
    }

    #[must_use]
    pub fn contains(&self, component: ComponentId) -> bool {
        self.present.contains(&component)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl EntityListener for BranchIndex {
    fn added_component_to_branch(&mut self, scene: &Scene, component: ComponentId) {
        if scene.has_capability(component, &self.capability) && self.present.insert(component) {
            self.members.push(component);
        }
    }

    fn removed_component_from_branch(&mut self, _scene: &Scene, component: ComponentId) {
        if self.present.remove(&component) {
            self.members.retain(|c| *c != component);
        }
    }
}
