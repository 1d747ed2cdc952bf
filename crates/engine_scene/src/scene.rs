//! The scene arena.
//!
//! A [`Scene`] owns every entity and component. Entities form trees: an
//! entity without a parent is a root, and a scene may hold any number of
//! roots (an editor scene, a resource tree, detached copies). All structural
//! operations are methods on `Scene` and are split over several modules:
//!
//! - `hierarchy`: adding, removing, naming and destroying entities.
//! - `attach`: adding and removing components.
//! - `addressing`: relative paths between entities.
//! - `merge`: copying values and whole branches.
//! - `json`: the document format.
//! - `reference`: deferred resolution of reference properties.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::{trace, warn};

use crate::component::{downcast_mut, downcast_ref};
use crate::entity::IdAllocator;
use crate::path;
use crate::reference::PendingReferences;
use crate::{
    Component, ComponentContext, ComponentDescriptor, ComponentId, DescriptorRegistry, EntityId,
    EntityListener, ListenerId, PropertyValue, SceneConfig, SceneError, SharedListener,
};

pub(crate) struct EntityNode {
    pub(crate) name: String,
    pub(crate) serialize: bool,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) components: Vec<ComponentId>,
    pub(crate) listeners: Vec<(ListenerId, SharedListener)>,
}

/// A hook waiting for its component to be checked back in.
pub(crate) type DeferredHook = Box<dyn FnOnce(&mut dyn Component, &mut ComponentContext<'_>)>;

pub(crate) struct ComponentSlot {
    pub(crate) type_name: String,
    pub(crate) entity: Option<EntityId>,
    /// `None` while a hook of this component is running.
    pub(crate) data: Option<Box<dyn Component>>,
    /// Notifications that arrived while `data` was checked out, oldest first.
    pub(crate) deferred: VecDeque<DeferredHook>,
}

/// Entity/component arena with hierarchy, addressing and notifications.
pub struct Scene {
    registry: Rc<DescriptorRegistry>,
    config: SceneConfig,
    pub(crate) entities: HashMap<EntityId, EntityNode>,
    pub(crate) components: HashMap<ComponentId, ComponentSlot>,
    entity_ids: IdAllocator,
    component_ids: IdAllocator,
    listener_ids: IdAllocator,
    pub(crate) resource_root: Option<EntityId>,
    pub(crate) pending: PendingReferences,
}

impl Scene {
    /// Create an empty scene using the default configuration.
    #[must_use]
    pub fn new(registry: Rc<DescriptorRegistry>) -> Self {
        Self::with_config(registry, SceneConfig::default())
    }

    #[must_use]
    pub fn with_config(registry: Rc<DescriptorRegistry>, config: SceneConfig) -> Self {
        Self {
            registry,
            config,
            entities: HashMap::new(),
            components: HashMap::new(),
            entity_ids: IdAllocator::new(),
            component_ids: IdAllocator::new(),
            listener_ids: IdAllocator::new(),
            resource_root: None,
            pending: PendingReferences::default(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// Shared handle to the registry, e.g. to build a sibling scene.
    #[must_use]
    pub fn registry_handle(&self) -> Rc<DescriptorRegistry> {
        Rc::clone(&self.registry)
    }

    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    // ----- entities -----

    /// Create a detached entity.
    ///
    /// The name is checked against the path grammar once the entity is
    /// attached to a parent.
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        let id = EntityId(self.entity_ids.allocate());
        self.entities.insert(
            id,
            EntityNode {
                name: name.into(),
                serialize: true,
                parent: None,
                children: Vec::new(),
                components: Vec::new(),
                listeners: Vec::new(),
            },
        );
        id
    }

    #[must_use]
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live components, attached or not.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn node(&self, entity: EntityId) -> Result<&EntityNode, SceneError> {
        self.entities.get(&entity).ok_or(SceneError::EntityNotFound(entity))
    }

    pub(crate) fn node_mut(&mut self, entity: EntityId) -> Result<&mut EntityNode, SceneError> {
        self.entities.get_mut(&entity).ok_or(SceneError::EntityNotFound(entity))
    }

    #[must_use]
    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.entities.get(&entity).map(|node| node.name.as_str())
    }

    /// Whether the entity is written as a child by
    /// [`Self::write_json`]. Defaults to `true`.
    #[must_use]
    pub fn serialize(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|node| node.serialize)
    }

    pub fn set_serialize(&mut self, entity: EntityId, serialize: bool) -> Result<(), SceneError> {
        self.node_mut(entity)?.serialize = serialize;
        Ok(())
    }

    #[must_use]
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.entities.get(&entity).and_then(|node| node.parent)
    }

    /// Children in insertion order. Empty for unknown entities.
    #[must_use]
    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.entities
            .get(&entity)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Components in attachment order. Empty for unknown entities.
    #[must_use]
    pub fn components_of(&self, entity: EntityId) -> &[ComponentId] {
        self.entities
            .get(&entity)
            .map(|node| node.components.as_slice())
            .unwrap_or_default()
    }

    /// Topmost ancestor, or `entity` itself when it has no parent.
    #[must_use]
    pub fn root_of(&self, entity: EntityId) -> EntityId {
        let mut current = entity;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Whether `ancestor` is `entity` or one of its ancestors.
    #[must_use]
    pub fn is_in_branch(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if e == ancestor {
                return true;
            }
            current = self.parent(e);
        }
        false
    }

    /// Names from the root down to `entity`, joined with `/`.
    #[must_use]
    pub fn entity_path(&self, entity: EntityId) -> String {
        let mut names = Vec::new();
        let mut current = Some(entity);
        while let Some(e) = current {
            match self.entities.get(&e) {
                Some(node) => names.push(node.name.as_str()),
                None => break,
            }
            current = self.parent(e);
        }
        names.reverse();
        names.join("/")
    }

    /// Direct child by name.
    #[must_use]
    pub fn entity_by_name(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.name(*child) == Some(name))
    }

    /// Descendant by name: direct children first, then each child's branch.
    #[must_use]
    pub fn find_entity_by_name(&self, root: EntityId, name: &str) -> Option<EntityId> {
        self.entity_by_name(root, name).or_else(|| {
            self.children(root)
                .iter()
                .find_map(|child| self.find_entity_by_name(*child, name))
        })
    }

    /// `entity` and all its descendants, depth first, parents before children.
    #[must_use]
    pub fn branch_entities(&self, entity: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![entity];
        while let Some(e) = stack.pop() {
            let Some(node) = self.entities.get(&e) else {
                continue;
            };
            out.push(e);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Components of every entity in the branch, in [`Self::branch_entities`] order.
    #[must_use]
    pub fn branch_components(&self, entity: EntityId) -> Vec<ComponentId> {
        self.branch_entities(entity)
            .into_iter()
            .flat_map(|e| self.components_of(e).iter().copied())
            .collect()
    }

    /// Root under which `res://` paths are resolved.
    #[must_use]
    pub fn resource_root(&self) -> Option<EntityId> {
        self.resource_root
    }

    pub fn set_resource_root(&mut self, root: Option<EntityId>) -> Result<(), SceneError> {
        if let Some(root) = root {
            self.node(root)?;
        }
        self.resource_root = root;
        Ok(())
    }

    // ----- components -----

    /// Insert a detached component.
    pub fn spawn_component<T: Component>(&mut self, component: T) -> ComponentId {
        self.spawn_boxed(T::type_name(), Box::new(component))
    }

    pub(crate) fn spawn_boxed(&mut self, type_name: &str, component: Box<dyn Component>) -> ComponentId {
        let id = ComponentId(self.component_ids.allocate());
        self.components.insert(
            id,
            ComponentSlot {
                type_name: type_name.to_owned(),
                entity: None,
                data: Some(component),
                deferred: VecDeque::new(),
            },
        );
        id
    }

    /// Create a detached component through the registry.
    pub fn create_component(&mut self, type_name: &str) -> Result<ComponentId, SceneError> {
        let (name, component) = self.registry.create_component(type_name)?;
        Ok(self.spawn_boxed(&name, component))
    }

    #[must_use]
    pub fn contains_component(&self, component: ComponentId) -> bool {
        self.components.contains_key(&component)
    }

    /// Type identity of the component.
    #[must_use]
    pub fn component_name(&self, component: ComponentId) -> Option<&str> {
        self.components.get(&component).map(|slot| slot.type_name.as_str())
    }

    /// Entity the component is attached to.
    #[must_use]
    pub fn component_entity(&self, component: ComponentId) -> Option<EntityId> {
        self.components.get(&component).and_then(|slot| slot.entity)
    }

    /// `entity/path:TypeName`, or just the type name for detached components.
    #[must_use]
    pub fn component_path(&self, component: ComponentId) -> String {
        let name = self.component_name(component).unwrap_or_default();
        match self.component_entity(component) {
            Some(entity) => path::component_path(&self.entity_path(entity), name),
            None => name.to_owned(),
        }
    }

    /// Erased access. `None` for unknown ids and components running a hook.
    #[must_use]
    pub fn component_dyn(&self, component: ComponentId) -> Option<&dyn Component> {
        self.components.get(&component)?.data.as_deref()
    }

    #[must_use]
    pub fn component_ref<T: Component>(&self, component: ComponentId) -> Option<&T> {
        downcast_ref::<T>(self.component_dyn(component)?)
    }

    #[must_use]
    pub fn component_mut<T: Component>(&mut self, component: ComponentId) -> Option<&mut T> {
        let data = self.components.get_mut(&component)?.data.as_deref_mut()?;
        downcast_mut::<T>(data)
    }

    /// Whether the component answers to `type_name` directly or via alias.
    #[must_use]
    pub fn is_component_name_alias(&self, component: ComponentId, type_name: &str) -> bool {
        let Some(name) = self.component_name(component) else {
            return false;
        };
        name == type_name || self.registry.resolve_name(type_name) == Some(name)
    }

    #[must_use]
    pub fn has_capability(&self, component: ComponentId, capability: &str) -> bool {
        self.component_name(component)
            .and_then(|name| self.registry.get(name))
            .is_some_and(|descriptor| descriptor.has_capability(capability))
    }

    pub fn component_descriptor(&self, component: ComponentId) -> Result<&ComponentDescriptor, SceneError> {
        let name = self
            .component_name(component)
            .ok_or(SceneError::ComponentIdNotFound(component))?;
        self.registry
            .get(name)
            .ok_or_else(|| SceneError::MissingDescriptor(name.to_owned()))
    }

    /// Read a property by name.
    pub fn get_property(&self, component: ComponentId, property: &str) -> Result<PropertyValue, SceneError> {
        let descriptor = self.component_descriptor(component)?;
        let property = descriptor.property(property).ok_or_else(|| SceneError::UnknownProperty {
            component: descriptor.component_name().to_owned(),
            property: property.to_owned(),
        })?;
        let data = self.component_dyn(component).ok_or(SceneError::ComponentBusy(component))?;
        property.get(data)
    }

    /// Write a property by name.
    pub fn set_property(
        &mut self,
        component: ComponentId,
        property: &str,
        value: PropertyValue,
    ) -> Result<(), SceneError> {
        let registry = Rc::clone(&self.registry);
        let name = self
            .component_name(component)
            .ok_or(SceneError::ComponentIdNotFound(component))?;
        let descriptor = registry
            .get(name)
            .ok_or_else(|| SceneError::MissingDescriptor(name.to_owned()))?;
        let property = descriptor.property(property).ok_or_else(|| SceneError::UnknownProperty {
            component: descriptor.component_name().to_owned(),
            property: property.to_owned(),
        })?;
        let data = self
            .components
            .get_mut(&component)
            .and_then(|slot| slot.data.as_deref_mut())
            .ok_or(SceneError::ComponentBusy(component))?;
        property.set(data, value)
    }

    /// Run `hook` on a checked-out component.
    ///
    /// When the component is already running a hook further up the stack,
    /// `hook` is queued on its slot and runs as soon as that outer hook
    /// returns, so a hook still hears about everything it caused. Skipped
    /// when the component no longer exists.
    pub(crate) fn dispatch(
        &mut self,
        target: ComponentId,
        hook: impl FnOnce(&mut dyn Component, &mut ComponentContext<'_>) + 'static,
    ) {
        let Some(slot) = self.components.get_mut(&target) else {
            return;
        };
        let Some(mut data) = slot.data.take() else {
            trace!(component = %target, queued = slot.deferred.len() + 1, "component busy, notification deferred");
            slot.deferred.push_back(Box::new(hook));
            return;
        };
        hook(data.as_mut(), &mut ComponentContext::new(self, target));
        loop {
            let next = match self.components.get_mut(&target) {
                Some(slot) => slot.deferred.pop_front(),
                // freed by its own hook
                None => return,
            };
            let Some(deferred) = next else {
                break;
            };
            deferred(data.as_mut(), &mut ComponentContext::new(self, target));
        }
        if let Some(slot) = self.components.get_mut(&target) {
            slot.data = Some(data);
        }
    }

    /// Run `hook` on each listed component in order.
    pub(crate) fn dispatch_each(
        &mut self,
        targets: Vec<ComponentId>,
        hook: impl Fn(&mut dyn Component, &mut ComponentContext<'_>) + Clone + 'static,
    ) {
        for target in targets {
            self.dispatch(target, hook.clone());
        }
    }

    // ----- listeners -----

    /// Register `listener` on `entity`.
    pub fn add_entity_listener(
        &mut self,
        entity: EntityId,
        listener: SharedListener,
    ) -> Result<ListenerId, SceneError> {
        let id = ListenerId(self.listener_ids.allocate());
        self.node_mut(entity)?.listeners.push((id, listener));
        Ok(id)
    }

    /// Returns `true` if the listener was registered on `entity`.
    pub fn remove_entity_listener(&mut self, entity: EntityId, listener: ListenerId) -> bool {
        let Some(node) = self.entities.get_mut(&entity) else {
            return false;
        };
        let before = node.listeners.len();
        node.listeners.retain(|(id, _)| *id != listener);
        node.listeners.len() != before
    }

    /// Notify the listeners registered on `entity`.
    ///
    /// The list is copied first, so listeners may be added or removed by
    /// whoever reacts to the notification.
    pub(crate) fn notify_listeners(&self, entity: EntityId, notify: impl Fn(&mut dyn EntityListener, &Scene)) {
        let listeners: Vec<SharedListener> = match self.entities.get(&entity) {
            Some(node) => node.listeners.iter().map(|(_, l)| Rc::clone(l)).collect(),
            None => return,
        };
        for listener in listeners {
            match listener.try_borrow_mut() {
                Ok(mut listener) => notify(&mut *listener, self),
                Err(_) => warn!(entity = %entity, "listener already borrowed, notification skipped"),
            }
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("entities", &self.entities.len())
            .field("components", &self.components.len())
            .field("resource_root", &self.resource_root)
            .field("pending_references", &self.pending.len())
            .finish_non_exhaustive()
    }
}
