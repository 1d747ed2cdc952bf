//! Per-branch cache of the components a renderer walks every frame.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use engine_scene::{ComponentId, EntityId, EntityListener, ListenerId, Scene, SceneError};
use tracing::debug;

use crate::lights::LIGHT;
use crate::render::RENDERABLE;

/// Components in attach order, without duplicates.
#[derive(Debug, Default)]
struct Bucket {
    order: Vec<ComponentId>,
    present: HashSet<ComponentId>,
}

impl Bucket {
    fn insert(&mut self, component: ComponentId) {
        if self.present.insert(component) {
            self.order.push(component);
        }
    }

    fn remove(&mut self, component: ComponentId) {
        if self.present.remove(&component) {
            self.order.retain(|c| *c != component);
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Lights, renderables and transform nodes under one root, kept current
/// by listening to the root's branch.
#[derive(Debug, Default)]
pub struct SceneLayer {
    lights: Bucket,
    meshes: Bucket,
    nodes: Bucket,
}

impl SceneLayer {
    /// Build the layer for the branch under `root` and keep it registered.
    pub fn attach(scene: &mut Scene, root: EntityId) -> Result<(Rc<RefCell<SceneLayer>>, ListenerId), SceneError> {
        let mut layer = SceneLayer::default();
        for component in scene.branch_components(root) {
            layer.added_component_to_branch(scene, component);
        }
        debug!(
            root = %scene.entity_path(root),
            lights = layer.lights.len(),
            meshes = layer.meshes.len(),
            nodes = layer.nodes.len(),
            "scene layer attached"
        );
        let layer = Rc::new(RefCell::new(layer));
        let id = scene.add_entity_listener(root, layer.clone())?;
        Ok((layer, id))
    }

    #[must_use]
    pub fn lights(&self) -> &[ComponentId] {
        &self.lights.order
    }

    #[must_use]
    pub fn meshes(&self) -> &[ComponentId] {
        &self.meshes.order
    }

    #[must_use]
    pub fn nodes(&self) -> &[ComponentId] {
        &self.nodes.order
    }

    fn buckets(&mut self, scene: &Scene, component: ComponentId) -> impl Iterator<Item = &mut Bucket> {
        let lights = scene.has_capability(component, LIGHT);
        let meshes = scene.has_capability(component, RENDERABLE);
        let nodes = scene.has_capability(component, "transform");
        [
            (lights, &mut self.lights),
            (meshes, &mut self.meshes),
            (nodes, &mut self.nodes),
        ]
        .into_iter()
        .filter_map(|(matches, bucket)| matches.then_some(bucket))
    }
}

impl EntityListener for SceneLayer {
    fn added_component_to_branch(&mut self, scene: &Scene, component: ComponentId) {
        for bucket in self.buckets(scene, component) {
            bucket.insert(component);
        }
    }

    fn removed_component_from_branch(&mut self, _scene: &Scene, component: ComponentId) {
        for bucket in [&mut self.lights, &mut self.meshes, &mut self.nodes] {
            bucket.remove(component);
        }
    }
}
