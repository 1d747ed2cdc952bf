//! Attaching components to entities and detaching them.

use crate::hierarchy::BranchEvent;
use crate::{Component, ComponentId, EntityId, Scene, SceneError};

impl Scene {
    /// Attach a detached component to `entity`.
    ///
    /// After linking, the component's own `attached` hook runs, then in
    /// order: the entity's other components (`added_sibling_component`), the
    /// parent's components (`added_child_component`), the ancestor chain
    /// starting at `entity` (`added_component_to_branch`) and finally the
    /// entity's listeners (`added_component`). Pending references the
    /// component satisfies are delivered last.
    pub fn add_component(&mut self, entity: EntityId, component: ComponentId) -> Result<(), SceneError> {
        self.node(entity)?;
        let slot = self
            .components
            .get(&component)
            .ok_or(SceneError::ComponentIdNotFound(component))?;
        if let Some(owner) = slot.entity {
            return Err(SceneError::ComponentAlreadyAttached {
                component,
                entity: self.entity_path(owner),
            });
        }
        let type_name = slot.type_name.clone();
        if self.get_component_or_null(entity, &type_name).is_some() {
            return Err(SceneError::DuplicateComponent {
                entity: self.entity_path(entity),
                component: type_name,
            });
        }

        if let Some(slot) = self.components.get_mut(&component) {
            slot.entity = Some(entity);
        }
        self.node_mut(entity)?.components.push(component);

        self.dispatch(component, move |c, ctx| c.attached(ctx, entity));
        let siblings = self.siblings_of(entity, component);
        self.dispatch_each(siblings, move |c, ctx| c.added_sibling_component(ctx, component));
        if let Some(parent) = self.parent(entity) {
            let components = self.components_of(parent).to_vec();
            self.dispatch_each(components, move |c, ctx| c.added_child_component(ctx, component));
        }
        self.notify_ascending(entity, BranchEvent::ComponentAdded(component));
        self.notify_listeners(entity, |l, scene| l.added_component(scene, component));
        self.deliver_pending(component);
        Ok(())
    }

    /// Detach `component` from `entity`. The component stays alive.
    ///
    /// Mirrors [`Self::add_component`]: after unlinking, the same parties
    /// are told in the same order through the `removed_*` hooks, and the
    /// component's own `detached` hook runs last.
    pub fn remove_component(&mut self, entity: EntityId, component: ComponentId) -> Result<(), SceneError> {
        let node = self.node(entity)?;
        let Some(position) = node.components.iter().position(|c| *c == component) else {
            return Err(SceneError::ComponentNotFound {
                entity: self.entity_path(entity),
                component: self.component_name(component).unwrap_or_default().to_owned(),
            });
        };
        self.node_mut(entity)?.components.remove(position);
        if let Some(slot) = self.components.get_mut(&component) {
            slot.entity = None;
        }

        let siblings = self.components_of(entity).to_vec();
        self.dispatch_each(siblings, move |c, ctx| c.removed_sibling_component(ctx, component));
        if let Some(parent) = self.parent(entity) {
            let components = self.components_of(parent).to_vec();
            self.dispatch_each(components, move |c, ctx| c.removed_child_component(ctx, component));
        }
        self.notify_ascending(entity, BranchEvent::ComponentRemoved(component));
        self.notify_listeners(entity, |l, scene| l.removed_component(scene, component));
        self.dispatch(component, move |c, ctx| c.detached(ctx, entity));
        Ok(())
    }

    /// Detach the component of `type_name` from `entity`, if there is one.
    pub fn remove_component_by_name(
        &mut self,
        entity: EntityId,
        type_name: &str,
    ) -> Result<Option<ComponentId>, SceneError> {
        let Some(component) = self.get_component_or_null(entity, type_name) else {
            return Ok(None);
        };
        self.remove_component(entity, component)?;
        Ok(Some(component))
    }

    /// Detach (if attached), run the `destroy` hook and free a component.
    pub fn destroy_component(&mut self, component: ComponentId) -> Result<(), SceneError> {
        if !self.contains_component(component) {
            return Err(SceneError::ComponentIdNotFound(component));
        }
        if let Some(entity) = self.component_entity(component) {
            self.remove_component(entity, component)?;
        }
        self.dispatch(component, move |c, ctx| c.destroy(ctx));
        self.free_component(component);
        Ok(())
    }

    pub(crate) fn free_component(&mut self, component: ComponentId) {
        self.components.remove(&component);
        self.pending.drop_owner(component);
    }

    /// Component of `type_name` (or an alias of it) on `entity`.
    #[must_use]
    pub fn get_component_or_null(&self, entity: EntityId, type_name: &str) -> Option<ComponentId> {
        self.components_of(entity)
            .iter()
            .copied()
            .find(|c| self.is_component_name_alias(*c, type_name))
    }

    /// Like [`Self::get_component_or_null`] but fails when missing.
    pub fn get_component(&self, entity: EntityId, type_name: &str) -> Result<ComponentId, SceneError> {
        self.node(entity)?;
        self.get_component_or_null(entity, type_name)
            .ok_or_else(|| SceneError::ComponentNotFound {
                entity: self.entity_path(entity),
                component: type_name.to_owned(),
            })
    }

    /// Component of `type_name` on `entity`, created through the registry
    /// when missing.
    pub fn component(&mut self, entity: EntityId, type_name: &str) -> Result<ComponentId, SceneError> {
        self.node(entity)?;
        if let Some(existing) = self.get_component_or_null(entity, type_name) {
            return Ok(existing);
        }
        self.add_new_component(entity, type_name)
    }

    /// Create a component through the registry and attach it.
    pub fn add_new_component(&mut self, entity: EntityId, type_name: &str) -> Result<ComponentId, SceneError> {
        let component = self.create_component(type_name)?;
        self.attach_or_free(entity, component)
    }

    /// Typed get-or-create. Unregistered types are created with `T::default()`.
    pub fn component_typed<T: Component + Default>(&mut self, entity: EntityId) -> Result<ComponentId, SceneError> {
        self.node(entity)?;
        if let Some(existing) = self.get_component_or_null(entity, T::type_name()) {
            return Ok(existing);
        }
        if self.registry().contains(T::type_name()) {
            return self.add_new_component(entity, T::type_name());
        }
        let component = self.spawn_component(T::default());
        self.attach_or_free(entity, component)
    }

    /// Insert `value` as a new component on `entity`.
    pub fn insert_component<T: Component>(&mut self, entity: EntityId, value: T) -> Result<ComponentId, SceneError> {
        self.node(entity)?;
        let component = self.spawn_component(value);
        self.attach_or_free(entity, component)
    }

    fn attach_or_free(&mut self, entity: EntityId, component: ComponentId) -> Result<ComponentId, SceneError> {
        match self.add_component(entity, component) {
            Ok(()) => Ok(component),
            Err(err) => {
                self.free_component(component);
                Err(err)
            }
        }
    }

    fn siblings_of(&self, entity: EntityId, component: ComponentId) -> Vec<ComponentId> {
        self.components_of(entity)
            .iter()
            .copied()
            .filter(|c| *c != component)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ListenerRecorder, Recorder, Tag, Transform, new_log, take, test_scene};
    use crate::{ComponentContext, EntityId};

    #[test]
    fn test_one_component_per_type() {
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        scene.component(e, "Transform").unwrap();
        let extra = scene.create_component("Transform").unwrap();
        assert!(matches!(
            scene.add_component(e, extra),
            Err(SceneError::DuplicateComponent { .. })
        ));
        // aliases count as the same type
        assert!(matches!(
            scene.add_new_component(e, "ITransform"),
            Err(SceneError::DuplicateComponent { .. })
        ));
        assert_eq!(scene.components_of(e).len(), 1);
        assert_eq!(scene.component_entity(extra), None);
    }

    #[test]
    fn test_component_belongs_to_one_entity() {
        let mut scene = test_scene();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let t = scene.component(a, "Transform").unwrap();
        assert!(matches!(
            scene.add_component(b, t),
            Err(SceneError::ComponentAlreadyAttached { .. })
        ));
        assert_eq!(scene.component_entity(t), Some(a));
    }

    #[test]
    fn test_get_or_create_by_alias() {
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        let t = scene.component(e, "ITransform").unwrap();
        assert_eq!(scene.component(e, "Transform").unwrap(), t);
        assert_eq!(scene.get_component(e, "ITransform").unwrap(), t);
        assert!(matches!(
            scene.get_component(e, "Tag"),
            Err(SceneError::ComponentNotFound { .. })
        ));
        assert!(matches!(
            scene.component(e, "Nope"),
            Err(SceneError::UnknownComponentType(_))
        ));
    }

    #[test]
    fn test_typed_get_or_create() {
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        let t = scene.component_typed::<Transform>(e).unwrap();
        assert_eq!(scene.component_typed::<Transform>(e).unwrap(), t);
        let recorder = scene.insert_component(e, Recorder::new("p", &new_log())).unwrap();
        assert_eq!(scene.components_of(e), &[t, recorder]);
    }

    #[test]
    fn test_remove_component_back_reference() {
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        let t = scene.component(e, "Transform").unwrap();
        assert_eq!(scene.remove_component_by_name(e, "ITransform").unwrap(), Some(t));
        assert_eq!(scene.component_entity(t), None);
        assert!(scene.contains_component(t));
        assert_eq!(scene.remove_component_by_name(e, "Transform").unwrap(), None);
        assert!(scene.remove_component(e, t).is_err());
        // detached components can be attached again
        scene.add_component(e, t).unwrap();
    }

    #[test]
    fn test_add_and_remove_component_notification_order() {
        let log = new_log();
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let entity = scene.entity(root, "entity").unwrap();
        let root_rec = scene.spawn_component(Recorder::new("root", &log));
        scene.add_component(root, root_rec).unwrap();
        let recorder = scene.spawn_component(Recorder::new("sibling", &log));
        scene.add_component(entity, recorder).unwrap();
        scene
            .add_entity_listener(root, ListenerRecorder::shared("root_listener", &log))
            .unwrap();
        scene
            .add_entity_listener(entity, ListenerRecorder::shared("listener", &log))
            .unwrap();
        take(&log);

        let t = scene.component(entity, "Transform").unwrap();
        assert_eq!(
            take(&log),
            vec![
                "sibling:added_sibling(Transform)",
                "root:added_child_component(Transform)",
                "sibling:added_component_to_branch(Transform)",
                "root:added_component_to_branch(Transform)",
                "root_listener:added_component_to_branch(Transform)",
                "listener:added_component_to_branch(Transform)",
                "listener:added_component(Transform)",
            ]
        );

        scene.remove_component(entity, t).unwrap();
        assert_eq!(
            take(&log),
            vec![
                "sibling:removed_sibling(Transform)",
                "root:removed_child_component(Transform)",
                "sibling:removed_component_from_branch(Transform)",
                "root:removed_component_from_branch(Transform)",
                "root_listener:removed_component_from_branch(Transform)",
                "listener:removed_component_from_branch(Transform)",
                "listener:removed_component(Transform)",
            ]
        );
    }

    #[test]
    fn test_destroy_component() {
        let log = new_log();
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        let recorder = scene.insert_component(e, Recorder::new("p", &log)).unwrap();
        take(&log);
        scene.destroy_component(recorder).unwrap();
        assert!(!scene.contains_component(recorder));
        assert!(scene.components_of(e).is_empty());
        assert_eq!(take(&log), vec!["p:destroy"]);
        assert!(scene.destroy_component(recorder).is_err());
    }

    /// Ensures a `Tag` sibling exists as soon as it is attached.
    #[derive(Default)]
    struct NeedsTag {
        tag: Option<ComponentId>,
        siblings: Vec<ComponentId>,
    }

    impl Component for NeedsTag {
        fn type_name() -> &'static str {
            "NeedsTag"
        }

        fn attached(&mut self, ctx: &mut ComponentContext<'_>, _entity: EntityId) {
            self.tag = ctx.sibling("Tag").ok();
        }

        fn added_sibling_component(&mut self, _ctx: &mut ComponentContext<'_>, component: ComponentId) {
            self.siblings.push(component);
        }
    }

    /// Adds a `Tag` next to every `Transform` in its branch and remembers
    /// every `Tag` it hears about.
    #[derive(Default)]
    struct TagCache {
        tags: Vec<ComponentId>,
    }

    impl Component for TagCache {
        fn type_name() -> &'static str {
            "TagCache"
        }

        fn added_component_to_branch(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {
            let name = ctx.scene().component_name(component).map(str::to_owned);
            match name.as_deref() {
                Some("Transform") => {
                    if let Some(entity) = ctx.scene().component_entity(component) {
                        ctx.scene_mut().component(entity, "Tag").unwrap();
                    }
                }
                Some("Tag") => self.tags.push(component),
                _ => {}
            }
        }
    }

    #[test]
    fn test_hooks_may_attach_siblings() {
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        let needs = scene.insert_component(e, NeedsTag::default()).unwrap();
        let tag = scene.get_component(e, "Tag").unwrap();
        assert_eq!(scene.component_ref::<NeedsTag>(needs).unwrap().tag, Some(tag));
        assert_eq!(scene.components_of(e), &[needs, tag]);
        assert!(scene.component_ref::<Tag>(tag).is_some());
    }

    #[test]
    fn test_hook_hears_about_the_sibling_it_created() {
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        let needs = scene.insert_component(e, NeedsTag::default()).unwrap();
        let tag = scene.get_component(e, "Tag").unwrap();
        assert_eq!(scene.component_ref::<NeedsTag>(needs).unwrap().siblings, vec![tag]);

        // the component is checked back in once its queue is drained
        let later = scene.component(e, "Transform").unwrap();
        assert_eq!(scene.component_ref::<NeedsTag>(needs).unwrap().siblings, vec![tag, later]);
    }

    #[test]
    fn test_branch_hook_hears_about_components_it_created() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let cache = scene.insert_component(root, TagCache::default()).unwrap();
        let child = scene.entity(root, "child").unwrap();
        scene.component(child, "Transform").unwrap();

        let tag = scene.get_component(child, "Tag").unwrap();
        assert_eq!(scene.component_ref::<TagCache>(cache).unwrap().tags, vec![tag]);
    }
}
