//! Copying property values, entities and whole branches.

use tracing::warn;

use crate::{Component, ComponentId, EntityId, PropertyDescriptor, PropertyValue, Scene, SceneError};

impl Scene {
    /// Copy every property of `other` into `this`.
    ///
    /// Does nothing unless both components have the same type identity and
    /// are distinct. Reference properties are re-resolved relative to
    /// `this`'s entity.
    pub fn set_component(&mut self, this: ComponentId, other: ComponentId) -> Result<(), SceneError> {
        if this == other {
            return Ok(());
        }
        let name = self
            .component_name(this)
            .ok_or(SceneError::ComponentIdNotFound(this))?
            .to_owned();
        if self.component_name(other).ok_or(SceneError::ComponentIdNotFound(other))? != name {
            return Ok(());
        }
        let registry = self.registry_handle();
        let descriptor = registry
            .get(&name)
            .ok_or_else(|| SceneError::MissingDescriptor(name.clone()))?;
        for property in descriptor.properties() {
            if property.is_reference() {
                self.copy_reference(this, other, property)?;
            } else {
                self.with_pair(this, other, |to, from| property.copy(to, from))??;
            }
        }
        Ok(())
    }

    /// Copy a reference property from `other` to `this`.
    ///
    /// The path between `other`'s entity and the referenced component's
    /// entity is resolved again from `this`'s entity. Targets outside
    /// `other`'s tree (shared resources) are referenced as they are. When
    /// the path does not resolve, a warning is logged and the property is
    /// unset.
    fn copy_reference(
        &mut self,
        this: ComponentId,
        other: ComponentId,
        property: &PropertyDescriptor,
    ) -> Result<(), SceneError> {
        let data = self.component_dyn(other).ok_or(SceneError::ComponentBusy(other))?;
        let Some(target) = property.get(data)?.as_component_ref().flatten() else {
            return self.set_reference(this, property, None);
        };
        let (Some(other_entity), Some(target_entity)) =
            (self.component_entity(other), self.component_entity(target))
        else {
            return self.set_reference(this, property, Some(target));
        };
        if self.root_of(other_entity) != self.root_of(target_entity) {
            return self.set_reference(this, property, Some(target));
        }

        let resolved = match (self.relative_path_to(other_entity, target_entity), self.component_entity(this)) {
            (Some(path), Some(this_entity)) => self
                .entity_by_path(this_entity, &path)
                .and_then(|entity| self.get_component_or_null(entity, property.required_type().unwrap_or_default())),
            _ => None,
        };
        match resolved {
            Some(found) => self.set_reference(this, property, Some(found)),
            None => {
                warn!(
                    component = %self.component_path(this),
                    property = %property.name(),
                    source = %self.component_path(target),
                    "can't link component reference in copy"
                );
                self.set_reference(this, property, None)
            }
        }
    }

    fn set_reference(
        &mut self,
        this: ComponentId,
        property: &PropertyDescriptor,
        target: Option<ComponentId>,
    ) -> Result<(), SceneError> {
        let data = self
            .components
            .get_mut(&this)
            .and_then(|slot| slot.data.as_deref_mut())
            .ok_or(SceneError::ComponentBusy(this))?;
        property.set(data, PropertyValue::ComponentRef(target))
    }

    /// Run `f` with `this` mutably and `other` immutably.
    fn with_pair<R>(
        &mut self,
        this: ComponentId,
        other: ComponentId,
        f: impl FnOnce(&mut dyn Component, &dyn Component) -> R,
    ) -> Result<R, SceneError> {
        let mut data = self
            .components
            .get_mut(&this)
            .ok_or(SceneError::ComponentIdNotFound(this))?
            .data
            .take()
            .ok_or(SceneError::ComponentBusy(this))?;
        let result = match self.component_dyn(other) {
            Some(source) => Ok(f(data.as_mut(), source)),
            None => Err(SceneError::ComponentBusy(other)),
        };
        if let Some(slot) = self.components.get_mut(&this) {
            slot.data = Some(data);
        }
        result
    }

    /// Copy the components of `other` onto `this`.
    ///
    /// Missing component types are created and every match is filled with
    /// [`Self::set_component`]. With `full_replace`, `this` also takes
    /// `other`'s name and components whose type `other` lacks are detached
    /// and destroyed. Children are left alone.
    pub fn set_entity(&mut self, this: EntityId, other: EntityId, full_replace: bool) -> Result<(), SceneError> {
        if this == other {
            return Ok(());
        }
        if full_replace {
            self.copy_name(this, other)?;
        }
        self.sync_components(this, other, full_replace)?;
        for source in self.components_of(other).to_vec() {
            if let Some(component) = self.matching_component(this, source) {
                self.set_component(component, source)?;
            }
        }
        Ok(())
    }

    /// Merge the branch under `other` into the branch under `this`.
    ///
    /// Children are matched by name. The whole structure (children, component
    /// types) is synced first and values are copied afterwards, children
    /// before parents, so that references into the branch resolve against
    /// the new structure. Without `full_replace` nothing is removed from
    /// `this`; with it, children and components that `other` lacks are
    /// deleted and `this` takes `other`'s name, making the branch a mirror.
    pub fn set_deep(&mut self, this: EntityId, other: EntityId, full_replace: bool) -> Result<(), SceneError> {
        if this == other {
            return Ok(());
        }
        self.node(this)?;
        self.node(other)?;
        if self.is_in_branch(this, other) || self.is_in_branch(other, this) {
            return Err(SceneError::OverlappingBranches {
                this: self.entity_path(this),
                other: self.entity_path(other),
            });
        }
        if full_replace {
            self.copy_name(this, other)?;
        }
        self.sync_structure(this, other, full_replace)?;
        self.copy_values(this, other)
    }

    fn copy_name(&mut self, this: EntityId, other: EntityId) -> Result<(), SceneError> {
        let name = self.node(other)?.name.clone();
        self.set_name(this, &name)
    }

    fn sync_structure(&mut self, this: EntityId, other: EntityId, full_replace: bool) -> Result<(), SceneError> {
        if full_replace {
            for child in self.children(this).to_vec() {
                let keep = self
                    .name(child)
                    .is_some_and(|name| self.entity_by_name(other, name).is_some());
                if !keep {
                    self.delete_entity(child)?;
                }
            }
        }
        for source in self.children(other).to_vec() {
            let name = self.name(source).unwrap_or_default().to_owned();
            let child = self.entity(this, &name)?;
            self.sync_structure(child, source, full_replace)?;
        }
        self.sync_components(this, other, full_replace)?;
        let serialize = self.node(other)?.serialize;
        self.set_serialize(this, serialize)?;
        Ok(())
    }

    fn sync_components(&mut self, this: EntityId, other: EntityId, full_replace: bool) -> Result<(), SceneError> {
        if full_replace {
            for component in self.components_of(this).to_vec() {
                let name = self.component_name(component).unwrap_or_default();
                if self.get_component_or_null(other, name).is_none() {
                    self.destroy_component(component)?;
                }
            }
        }
        for source in self.components_of(other).to_vec() {
            if self.matching_component(this, source).is_some() {
                continue;
            }
            let name = self.component_name(source).unwrap_or_default().to_owned();
            self.component(this, &name)?;
        }
        Ok(())
    }

    fn copy_values(&mut self, this: EntityId, other: EntityId) -> Result<(), SceneError> {
        for source in self.children(other).to_vec() {
            let name = self.name(source).unwrap_or_default();
            if let Some(child) = self.entity_by_name(this, name) {
                self.copy_values(child, source)?;
            }
        }
        for source in self.components_of(other).to_vec() {
            if let Some(component) = self.matching_component(this, source) {
                self.set_component(component, source)?;
            }
        }
        Ok(())
    }

    /// Component on `entity` with the same type identity as `source`.
    fn matching_component(&self, entity: EntityId, source: ComponentId) -> Option<ComponentId> {
        let name = self.component_name(source)?;
        self.get_component_or_null(entity, name)
    }

    /// Detached copy of the branch under `entity`.
    ///
    /// The skeleton (names and component types) is built first; with
    /// `setup_components` the values are then copied with a full
    /// [`Self::set_deep`].
    pub fn copy_deep(&mut self, entity: EntityId, setup_components: bool) -> Result<EntityId, SceneError> {
        let copy = self.copy_skeleton(entity)?;
        if setup_components {
            self.set_deep(copy, entity, true)?;
        }
        Ok(copy)
    }

    /// [`Self::copy_deep`] with a different name for the copy's root.
    pub fn copy_deep_named(
        &mut self,
        entity: EntityId,
        name: &str,
        setup_components: bool,
    ) -> Result<EntityId, SceneError> {
        let copy = self.copy_deep(entity, setup_components)?;
        self.set_name(copy, name)?;
        Ok(copy)
    }

    fn copy_skeleton(&mut self, source: EntityId) -> Result<EntityId, SceneError> {
        let node = self.node(source)?;
        let (name, serialize) = (node.name.clone(), node.serialize);
        let copy = self.create_entity(name);
        self.set_serialize(copy, serialize)?;
        for child in self.children(source).to_vec() {
            let child_copy = self.copy_skeleton(child)?;
            self.add_entity(copy, child_copy)?;
        }
        for component in self.components_of(source).to_vec() {
            let name = self.component_name(component).unwrap_or_default().to_owned();
            self.component(copy, &name)?;
        }
        Ok(copy)
    }

    /// Detached copy of `entity` with its components but no children.
    pub fn copy_entity(&mut self, entity: EntityId) -> Result<EntityId, SceneError> {
        let name = self.node(entity)?.name.clone();
        let copy = self.create_entity(name);
        self.set_entity(copy, entity, true)?;
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::testing::{Follow, Tag, Transform, test_scene};
    use crate::{ComponentId, PropertyValue, SceneError};

    #[test]
    fn test_set_component_copies_values() {
        let mut scene = test_scene();
        let a = scene.create_component("Transform").unwrap();
        let b = scene.create_component("Transform").unwrap();
        scene.component_mut::<Transform>(a).unwrap().position = Vec3::new(1.0, 2.0, 3.0);
        scene.set_component(b, a).unwrap();
        assert_eq!(scene.component_ref::<Transform>(b).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_set_component_ignores_other_types() {
        let mut scene = test_scene();
        let t = scene.create_component("Transform").unwrap();
        let tag = scene.create_component("Tag").unwrap();
        scene.component_mut::<Tag>(tag).unwrap().layer = 4;
        scene.set_component(t, tag).unwrap();
        scene.set_component(t, t).unwrap();
        assert_eq!(scene.component_ref::<Transform>(t).unwrap(), &Transform::default());
    }

    #[test]
    fn test_set_entity_syncs_component_set() {
        let mut scene = test_scene();
        let source = scene.create_entity("source");
        let t = scene.component(source, "Transform").unwrap();
        scene.component_mut::<Transform>(t).unwrap().scale = Vec3::splat(2.0);
        let target = scene.create_entity("target");
        let stale = scene.component(target, "Tag").unwrap();

        scene.set_entity(target, source, true).unwrap();
        assert_eq!(scene.name(target), Some("source"));
        assert!(!scene.contains_component(stale));
        let copied = scene.get_component(target, "Transform").unwrap();
        assert_ne!(copied, t);
        assert_eq!(scene.component_ref::<Transform>(copied).unwrap().scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_additive_set_entity_keeps_extra_components() {
        let mut scene = test_scene();
        let source = scene.create_entity("source");
        let t = scene.component(source, "Transform").unwrap();
        scene.component_mut::<Transform>(t).unwrap().position = Vec3::Z;
        let target = scene.create_entity("target");
        let extra = scene.component(target, "Tag").unwrap();

        scene.set_entity(target, source, false).unwrap();
        assert_eq!(scene.name(target), Some("target"));
        assert!(scene.contains_component(extra));
        let copied = scene.get_component(target, "Transform").unwrap();
        assert_eq!(scene.components_of(target), &[extra, copied]);
        assert_eq!(scene.component_ref::<Transform>(copied).unwrap().position, Vec3::Z);
    }

    #[test]
    fn test_copy_entity_is_shallow() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        scene.component(root, "Tag").unwrap();
        scene.entity(root, "child").unwrap();
        let copy = scene.copy_entity(root).unwrap();
        assert_eq!(scene.name(copy), Some("root"));
        assert!(scene.children(copy).is_empty());
        assert!(scene.get_component_or_null(copy, "Tag").is_some());
    }

    #[test]
    fn test_copy_deep_relinks_references() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let a = scene.entity(root, "A").unwrap();
        let b = scene.entity(root, "B").unwrap();
        let transform = scene.component(a, "Transform").unwrap();
        scene.component_mut::<Transform>(transform).unwrap().position = Vec3::X;
        let follow = scene.component(b, "Follow").unwrap();
        scene.set_property(follow, "target", transform.into()).unwrap();

        let root2 = scene.copy_deep(root, true).unwrap();
        assert_eq!(scene.parent(root2), None);
        let b2 = scene.entity_by_path(root2, "B").unwrap();
        let follow2 = scene.get_component(b2, "Follow").unwrap();
        let target2 = scene.component_ref::<Follow>(follow2).unwrap().target.unwrap();
        assert_ne!(target2, transform);
        assert_eq!(scene.component_path(target2), "root/A:Transform");
        assert_eq!(scene.component_entity(target2), scene.entity_by_path(root2, "A"));
        assert_eq!(scene.component_ref::<Transform>(target2).unwrap().position, Vec3::X);
    }

    #[test]
    fn test_copies_are_independent() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let a = scene.entity(root, "a").unwrap();
        let t = scene.component(a, "Transform").unwrap();
        let copy = scene.copy_deep_named(root, "copy", true).unwrap();
        let t2 = scene.component_by_path(copy, "a:Transform").unwrap();

        scene.component_mut::<Transform>(t).unwrap().position = Vec3::Y;
        assert_eq!(scene.component_ref::<Transform>(t2).unwrap().position, Vec3::ZERO);

        // and the other way round
        scene.component_mut::<Transform>(t2).unwrap().scale = Vec3::splat(5.0);
        let b2 = scene.entity(copy, "b").unwrap();
        scene.component(b2, "Tag").unwrap();
        assert_eq!(scene.component_ref::<Transform>(t).unwrap().scale, Vec3::ONE);
        assert_eq!(scene.component_ref::<Transform>(t).unwrap().position, Vec3::Y);
        assert_eq!(scene.entity_by_name(root, "b"), None);
        assert_eq!(scene.children(root), &[a]);

        scene.delete_entity(copy).unwrap();
        assert!(scene.contains_component(t));
        assert_eq!(scene.name(root), Some("root"));
    }

    #[test]
    fn test_set_deep_merges_by_name() {
        let mut scene = test_scene();
        let source = scene.create_entity("source");
        let keep_src = scene.entity(source, "keep").unwrap();
        scene.component(keep_src, "Tag").unwrap();
        scene.make_entity_path(source, "new/leaf").unwrap();

        let target = scene.create_entity("target");
        let keep = scene.entity(target, "keep").unwrap();
        let gone = scene.entity(target, "gone").unwrap();

        scene.set_deep(target, source, true).unwrap();
        assert_eq!(scene.name(target), Some("source"));
        assert_eq!(scene.entity_by_name(target, "keep"), Some(keep));
        assert!(!scene.contains_entity(gone));
        assert!(scene.entity_by_path(target, "new/leaf").is_some());
        assert!(scene.get_component_or_null(keep, "Tag").is_some());
    }

    #[test]
    fn test_additive_set_deep_keeps_existing_branch() {
        let mut scene = test_scene();
        let source = scene.create_entity("source");
        let shared_src = scene.entity(source, "shared").unwrap();
        let tag_src = scene.component(shared_src, "Tag").unwrap();
        scene.component_mut::<Tag>(tag_src).unwrap().layer = 3;
        scene.make_entity_path(source, "new/leaf").unwrap();

        let target = scene.create_entity("target");
        let shared = scene.entity(target, "shared").unwrap();
        let transform = scene.component(shared, "Transform").unwrap();
        let own = scene.entity(target, "own").unwrap();

        scene.set_deep(target, source, false).unwrap();
        assert_eq!(scene.name(target), Some("target"));
        assert!(scene.contains_entity(own));
        assert!(scene.contains_component(transform));
        assert!(scene.entity_by_path(target, "new/leaf").is_some());
        let tag = scene.get_component(shared, "Tag").unwrap();
        assert_eq!(scene.component_ref::<Tag>(tag).unwrap().layer, 3);
        assert_eq!(
            scene.children(target).iter().filter_map(|&c| scene.name(c)).collect::<Vec<_>>(),
            vec!["shared", "own", "new"]
        );
    }

    #[test]
    fn test_set_deep_rejects_overlap() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let a = scene.entity(root, "a").unwrap();
        assert!(matches!(scene.set_deep(a, root, true), Err(SceneError::OverlappingBranches { .. })));
        assert!(matches!(scene.set_deep(root, a, false), Err(SceneError::OverlappingBranches { .. })));
    }

    #[test]
    fn test_unresolvable_reference_is_left_unset() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let a = scene.entity(root, "a").unwrap();
        let t = scene.component(a, "Transform").unwrap();
        let follow = scene.component(root, "Follow").unwrap();
        scene.set_property(follow, "target", PropertyValue::ComponentRef(Some(t))).unwrap();

        // the copy has no "a" child, so "a" can't be resolved from it
        let lone = scene.create_entity("lone");
        let lone_follow = scene.component(lone, "Follow").unwrap();
        scene.set_component(lone_follow, follow).unwrap();
        assert_eq!(scene.component_ref::<Follow>(lone_follow).unwrap().target, None::<ComponentId>);
    }

    #[test]
    fn test_shared_resource_reference_is_kept() {
        let mut scene = test_scene();
        let resources = scene.create_entity("resources");
        let shared = scene.component(resources, "Transform").unwrap();
        let root = scene.create_entity("root");
        let follow = scene.component(root, "Follow").unwrap();
        scene.set_property(follow, "target", shared.into()).unwrap();

        let copy = scene.copy_deep(root, true).unwrap();
        let follow2 = scene.get_component(copy, "Follow").unwrap();
        assert_eq!(scene.component_ref::<Follow>(follow2).unwrap().target, Some(shared));
    }
}
