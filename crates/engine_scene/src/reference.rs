//! Deferred resolution of reference properties.
//!
//! A reference property names its target as `(path, component type)`. When
//! the target does not exist yet, for example while a document is still
//! being read, the scene keeps a pending request and calls back as soon as
//! a component of that type is attached at the path. Requests that never
//! resolve stay pending until cancelled, cleared, or until their owner
//! component is freed.

use tracing::{debug, warn};

use crate::entity::IdAllocator;
use crate::path::{self, RESOURCE_ROOT_PREFIX};
use crate::{ComponentId, EntityId, PropertyDescriptor, PropertyValue, RequestId, Scene};

/// Callback run with the resolved target.
pub type ResolveFn = Box<dyn FnOnce(&mut Scene, ComponentId)>;

struct PendingRequest {
    id: RequestId,
    base: EntityId,
    path: String,
    component_type: String,
    owner: Option<ComponentId>,
    resolve: ResolveFn,
}

/// Public view of a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReference {
    pub id: RequestId,
    /// Entity the path is resolved from.
    pub base: EntityId,
    pub path: String,
    pub component_type: String,
    /// Component whose property waits for the target, if any.
    pub owner: Option<ComponentId>,
}

#[derive(Default)]
pub(crate) struct PendingReferences {
    ids: IdAllocator,
    requests: Vec<PendingRequest>,
}

impl PendingReferences {
    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }

    fn push(
        &mut self,
        base: EntityId,
        path: &str,
        component_type: &str,
        owner: Option<ComponentId>,
        resolve: ResolveFn,
    ) -> RequestId {
        let id = RequestId(self.ids.allocate());
        self.requests.push(PendingRequest {
            id,
            base,
            path: path.to_owned(),
            component_type: component_type.to_owned(),
            owner,
            resolve,
        });
        id
    }

    fn take(&mut self, id: RequestId) -> Option<PendingRequest> {
        let index = self.requests.iter().position(|r| r.id == id)?;
        Some(self.requests.remove(index))
    }

    /// Drop every request made on behalf of `owner`.
    pub(crate) fn drop_owner(&mut self, owner: ComponentId) {
        self.requests.retain(|r| r.owner != Some(owner));
    }
}

impl Scene {
    /// Resolve `path:component_type` from `base`, now or later.
    ///
    /// If the component exists, `resolve` runs immediately and `None` is
    /// returned. Otherwise the request is kept and its id returned; it
    /// fires once a matching component is attached at the path. `owner` ties
    /// the request to a component so it is dropped when that component is.
    pub fn on_component_added(
        &mut self,
        base: EntityId,
        path: &str,
        component_type: &str,
        owner: Option<ComponentId>,
        resolve: impl FnOnce(&mut Scene, ComponentId) + 'static,
    ) -> Option<RequestId> {
        if let Some(target) = self.resolve_reference(base, path, component_type) {
            resolve(self, target);
            return None;
        }
        Some(
            self.pending
                .push(base, path, component_type, owner, Box::new(resolve)),
        )
    }

    /// Forget a pending request. Returns `true` if it was still pending.
    pub fn cancel_pending_reference(&mut self, request: RequestId) -> bool {
        self.pending.take(request).is_some()
    }

    /// Requests still waiting for their target.
    #[must_use]
    pub fn pending_references(&self) -> Vec<PendingReference> {
        self.pending
            .requests
            .iter()
            .map(|r| PendingReference {
                id: r.id,
                base: r.base,
                path: r.path.clone(),
                component_type: r.component_type.clone(),
                owner: r.owner,
            })
            .collect()
    }

    /// Drop every pending request. Returns how many were dropped.
    pub fn clear_pending_references(&mut self) -> usize {
        let dropped = std::mem::take(&mut self.pending.requests);
        for request in &dropped {
            debug!(
                base = %self.entity_path(request.base),
                path = %request.path,
                component = %request.component_type,
                "dropping unresolved reference"
            );
        }
        dropped.len()
    }

    /// Component of `component_type` at `path` from `base`.
    pub(crate) fn resolve_reference(&self, base: EntityId, path: &str, component_type: &str) -> Option<ComponentId> {
        let entity = self.entity_by_path(base, path)?;
        self.get_component_or_null(entity, component_type)
    }

    /// Fire pending requests that `component` satisfies.
    pub(crate) fn deliver_pending(&mut self, component: ComponentId) {
        if self.pending.requests.is_empty() {
            return;
        }
        let Some(entity) = self.component_entity(component) else {
            return;
        };
        let ready: Vec<RequestId> = self
            .pending
            .requests
            .iter()
            .filter(|r| {
                self.is_component_name_alias(component, &r.component_type)
                    && self.entity_by_path(r.base, &r.path) == Some(entity)
            })
            .map(|r| r.id)
            .collect();
        for id in ready {
            if let Some(request) = self.pending.take(id) {
                (request.resolve)(self, component);
            }
        }
    }

    /// Fire pending requests satisfied by anything in the branch under `entity`.
    pub(crate) fn deliver_pending_in_branch(&mut self, entity: EntityId) {
        if self.pending.requests.is_empty() {
            return;
        }
        for component in self.branch_components(entity) {
            self.deliver_pending(component);
        }
    }

    /// Path stored in documents for a reference from `owner` to `target`.
    ///
    /// Targets in the owner's tree are addressed from its root (`.` for the
    /// root itself). Targets under the resource root get a `res://` path.
    #[must_use]
    pub fn reference_path(&self, owner: ComponentId, target: ComponentId) -> Option<String> {
        let owner_entity = self.component_entity(owner)?;
        let target_entity = self.component_entity(target)?;
        let root = self.root_of(owner_entity);
        if self.is_in_branch(root, target_entity) {
            return self.relative_path_to(root, target_entity);
        }
        let resources = self.resource_root?;
        if !self.is_in_branch(resources, target_entity) {
            return None;
        }
        let path = self.relative_path_to(resources, target_entity)?;
        Some(format!("{RESOURCE_ROOT_PREFIX}{path}"))
    }

    /// Point reference `property` of `owner` at whatever `path` resolves to,
    /// registering a pending request when it does not resolve yet.
    pub(crate) fn link_reference(&mut self, owner: ComponentId, property: &PropertyDescriptor, path: &str) {
        let (Some(entity), Some(required)) = (self.component_entity(owner), property.required_type()) else {
            return;
        };
        let base = self.root_of(entity);
        let name = property.name().to_owned();
        let request = self.on_component_added(base, path, required, Some(owner), move |scene, target| {
            if let Err(err) = scene.set_property(owner, &name, PropertyValue::ComponentRef(Some(target))) {
                warn!(component = %scene.component_path(owner), property = %name, error = %err, "can't set reference");
            }
        });
        if request.is_some() {
            debug!(
                component = %self.component_path(owner),
                property = %property.name(),
                path = %path::component_path(path, required),
                "reference target not available yet"
            );
        }
    }
}
