//! Parent/child structure: linking, naming, path creation and destruction.

use tracing::debug;

use crate::path::{self, EntityPath, PathBase, Segment};
use crate::{Component, ComponentContext, ComponentId, EntityId, EntityListener, Scene, SceneError};

/// Structural change propagated up the ancestor chain.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BranchEvent {
    EntityAdded(EntityId),
    EntityRemoved(EntityId),
    ComponentAdded(ComponentId),
    ComponentRemoved(ComponentId),
}

impl BranchEvent {
    fn to_component(self, component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
        match self {
            Self::EntityAdded(e) => component.added_entity_to_branch(ctx, e),
            Self::EntityRemoved(e) => component.removed_entity_from_branch(ctx, e),
            Self::ComponentAdded(c) => component.added_component_to_branch(ctx, c),
            Self::ComponentRemoved(c) => component.removed_component_from_branch(ctx, c),
        }
    }

    fn to_listener(self, listener: &mut dyn EntityListener, scene: &Scene) {
        match self {
            Self::EntityAdded(e) => listener.added_entity_to_branch(scene, e),
            Self::EntityRemoved(e) => listener.removed_entity_from_branch(scene, e),
            Self::ComponentAdded(c) => listener.added_component_to_branch(scene, c),
            Self::ComponentRemoved(c) => listener.removed_component_from_branch(scene, c),
        }
    }
}

/// Names must resolve back to their entity through [`Scene::entity_by_path`].
fn check_name(name: &str) -> Result<(), SceneError> {
    if name.is_empty() {
        return Err(SceneError::EmptyName);
    }
    if !path::is_valid_name(name) {
        return Err(SceneError::InvalidName(name.to_owned()));
    }
    Ok(())
}

impl Scene {
    /// Notify `level` and every ancestor of a branch change.
    ///
    /// At each level the components hear it first, then the levels above,
    /// then the level's listeners.
    pub(crate) fn notify_ascending(&mut self, level: EntityId, event: BranchEvent) {
        let components = self.components_of(level).to_vec();
        self.dispatch_each(components, move |c, ctx| event.to_component(c, ctx));
        if let Some(parent) = self.parent(level) {
            self.notify_ascending(parent, event);
        }
        self.notify_listeners(level, |l, scene| event.to_listener(l, scene));
    }

    fn notify_parent_changed(&mut self, entity: EntityId, old: Option<EntityId>, new: Option<EntityId>) {
        let components = self.components_of(entity).to_vec();
        self.dispatch_each(components, move |c, ctx| c.parent_changed(ctx, old, new));
        self.notify_listeners(entity, |l, scene| l.parent_changed(scene, entity, old, new));
    }

    /// Attach `child` under `parent`.
    ///
    /// A child that already has another parent is removed from it first.
    /// Fails when a sibling already uses the child's name or when `child`
    /// is `parent` or one of its ancestors.
    pub fn add_entity(&mut self, parent: EntityId, child: EntityId) -> Result<(), SceneError> {
        self.node(parent)?;
        let name = self.node(child)?.name.clone();
        check_name(&name)?;
        if self.is_in_branch(child, parent) {
            return Err(SceneError::CyclicHierarchy {
                parent: self.entity_path(parent),
                child: self.entity_path(child),
            });
        }
        match self.entity_by_name(parent, &name) {
            Some(existing) if existing == child => return Ok(()),
            Some(_) => {
                return Err(SceneError::DuplicateEntityName {
                    parent: self.entity_path(parent),
                    name,
                });
            }
            None => {}
        }
        if let Some(old_parent) = self.parent(child) {
            self.remove_entity(old_parent, child)?;
        }

        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);

        self.notify_parent_changed(child, None, Some(parent));
        let components = self.components_of(parent).to_vec();
        self.dispatch_each(components, move |c, ctx| c.added_entity(ctx, child));
        self.notify_ascending(parent, BranchEvent::EntityAdded(child));
        self.notify_listeners(parent, |l, scene| l.added_entity(scene, child));
        self.deliver_pending_in_branch(child);
        Ok(())
    }

    /// Attach `child` under `parent`, renaming it when its name is taken.
    pub fn add_entity_with_corrected_name(&mut self, parent: EntityId, child: EntityId) -> Result<(), SceneError> {
        if self.parent(child) == Some(parent) {
            return Ok(());
        }
        let name = self.node(child)?.name.clone();
        let free = self.make_child_name(parent, &name)?;
        if free != name {
            debug!(parent = %self.entity_path(parent), from = %name, to = %free, "renamed child to avoid a collision");
            self.node_mut(child)?.name = free;
        }
        self.add_entity(parent, child)
    }

    /// Detach `child` from `parent`. The child and its branch stay alive.
    pub fn remove_entity(&mut self, parent: EntityId, child: EntityId) -> Result<(), SceneError> {
        if self.node(child)?.parent != Some(parent) {
            return Err(SceneError::NotAChild {
                parent: self.entity_path(parent),
                child: self.entity_path(child),
            });
        }
        self.node_mut(parent)?.children.retain(|c| *c != child);
        self.node_mut(child)?.parent = None;

        self.notify_parent_changed(child, Some(parent), None);
        let components = self.components_of(parent).to_vec();
        self.dispatch_each(components, move |c, ctx| c.removed_entity(ctx, child));
        self.notify_ascending(parent, BranchEvent::EntityRemoved(child));
        self.notify_listeners(parent, |l, scene| l.removed_entity(scene, child));
        Ok(())
    }

    /// Detach every child of `parent`.
    pub fn clear_children(&mut self, parent: EntityId) -> Result<(), SceneError> {
        while let Some(&child) = self.children(parent).last() {
            self.remove_entity(parent, child)?;
        }
        Ok(())
    }

    /// Child of `parent` named `name`, created when missing.
    pub fn entity(&mut self, parent: EntityId, name: &str) -> Result<EntityId, SceneError> {
        check_name(name)?;
        if let Some(existing) = self.entity_by_name(parent, name) {
            return Ok(existing);
        }
        self.node(parent)?;
        let child = self.create_entity(name);
        self.add_entity(parent, child)?;
        Ok(child)
    }

    /// Rename an entity. Fails when a sibling already has the name or the
    /// name is not valid in a path.
    pub fn set_name(&mut self, entity: EntityId, name: &str) -> Result<(), SceneError> {
        if self.node(entity)?.name == name {
            return Ok(());
        }
        check_name(name)?;
        if let Some(parent) = self.parent(entity)
            && self.entity_by_name(parent, name).is_some()
        {
            return Err(SceneError::DuplicateEntityName {
                parent: self.entity_path(parent),
                name: name.to_owned(),
            });
        }
        self.node_mut(entity)?.name = name.to_owned();
        Ok(())
    }

    /// `candidate` if no child of `parent` uses it, otherwise the first free
    /// name from [`path::candidate_names`].
    pub fn make_child_name(&self, parent: EntityId, candidate: &str) -> Result<String, SceneError> {
        check_name(candidate)?;
        self.node(parent)?;
        let is_free = |name: &str| self.entity_by_name(parent, name).is_none();
        if is_free(candidate) {
            return Ok(candidate.to_owned());
        }
        let limit = self.config().name_suffix_limit.unwrap_or(u64::MAX);
        path::candidate_names(candidate)
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .find(|name| is_free(name.as_str()))
            .ok_or_else(|| SceneError::NameSpaceExhausted {
                parent: self.entity_path(parent),
                candidate: candidate.to_owned(),
            })
    }

    /// Walk `path` from `entity`, creating missing children on the way.
    pub fn make_entity_path(&mut self, entity: EntityId, path: &str) -> Result<EntityId, SceneError> {
        let parsed = EntityPath::parse(path).ok_or_else(|| SceneError::InvalidPath(path.to_owned()))?;
        let mut current = match parsed.base {
            PathBase::Current => entity,
            PathBase::ResourceRoot => self
                .resource_root
                .ok_or_else(|| SceneError::InvalidPath(path.to_owned()))?,
        };
        self.node(current)?;
        for segment in parsed.segments {
            current = match segment {
                Segment::Current => current,
                Segment::Parent => self
                    .parent(current)
                    .ok_or_else(|| SceneError::InvalidPath(path.to_owned()))?,
                Segment::Child(name) => self.entity(current, name)?,
            };
        }
        Ok(current)
    }

    /// First entity below `root` matching `predicate`.
    ///
    /// All direct children of an entity are checked before any of them is
    /// searched, so a matching child wins over a deeper match in an earlier
    /// sibling's branch. `root` itself is never tested.
    pub fn find_entity(&self, root: EntityId, mut predicate: impl FnMut(EntityId) -> bool) -> Option<EntityId> {
        self.find_below(root, &mut predicate)
    }

    fn find_below(&self, entity: EntityId, predicate: &mut dyn FnMut(EntityId) -> bool) -> Option<EntityId> {
        let children = self.children(entity);
        if let Some(&found) = children.iter().find(|&&child| predicate(child)) {
            return Some(found);
        }
        children.iter().find_map(|&child| self.find_below(child, predicate))
    }

    /// Tear down the branch below `entity`.
    ///
    /// Runs the `destroy` hook of the entity's components, then detaches and
    /// destroys every child and frees it, then detaches and frees the
    /// entity's own components. The entity itself stays alive and attached.
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<(), SceneError> {
        self.node(entity)?;
        let components = self.components_of(entity).to_vec();
        self.dispatch_each(components, move |c, ctx| c.destroy(ctx));

        while let Some(&child) = self.children(entity).last() {
            self.remove_entity(entity, child)?;
            self.destroy_entity(child)?;
            self.free_entity(child);
        }
        while let Some(&component) = self.components_of(entity).last() {
            self.remove_component(entity, component)?;
            self.free_component(component);
        }
        Ok(())
    }

    /// Detach `entity` from its parent, destroy it and free it.
    pub fn delete_entity(&mut self, entity: EntityId) -> Result<(), SceneError> {
        if let Some(parent) = self.parent(entity) {
            self.remove_entity(parent, entity)?;
        }
        self.destroy_entity(entity)?;
        self.free_entity(entity);
        Ok(())
    }

    pub(crate) fn free_entity(&mut self, entity: EntityId) {
        if self.entities.remove(&entity).is_some() && self.resource_root == Some(entity) {
            self.resource_root = None;
        }
    }
}
