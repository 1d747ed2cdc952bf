//! Fixture components shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use crate::{
    Component, ComponentContext, ComponentId, DescriptorRegistry, EntityId, EntityListener, Scene,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Component for Transform {
    fn type_name() -> &'static str {
        "Transform"
    }
}

#[derive(Debug, Default)]
pub struct Tag {
    pub label: String,
    pub layer: i32,
    pub visible: bool,
}

impl Component for Tag {
    fn type_name() -> &'static str {
        "Tag"
    }
}

#[derive(Debug, Default)]
pub struct Follow {
    pub target: Option<ComponentId>,
    pub distance: f32,
}

impl Component for Follow {
    fn type_name() -> &'static str {
        "Follow"
    }
}

pub type Log = Rc<RefCell<Vec<String>>>;

/// Records every hook it receives into a shared log.
pub struct Recorder {
    pub label: &'static str,
    pub log: Log,
}

impl Recorder {
    pub fn new(label: &'static str, log: &Log) -> Self {
        Self {
            label,
            log: Rc::clone(log),
        }
    }

    fn record(&self, event: String) {
        self.log.borrow_mut().push(format!("{}:{event}", self.label));
    }
}

impl Component for Recorder {
    fn type_name() -> &'static str {
        "Recorder"
    }

    fn parent_changed(&mut self, _ctx: &mut ComponentContext<'_>, old: Option<EntityId>, new: Option<EntityId>) {
        self.record(format!("parent_changed({},{})", old.is_some(), new.is_some()));
    }

    fn added_sibling_component(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {
        let name = ctx.scene().component_name(component).unwrap_or_default().to_owned();
        self.record(format!("added_sibling({name})"));
    }

    fn removed_sibling_component(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {
        let name = ctx.scene().component_name(component).unwrap_or_default().to_owned();
        self.record(format!("removed_sibling({name})"));
    }

    fn added_entity(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        let name = ctx.scene().name(entity).unwrap_or_default().to_owned();
        self.record(format!("added_entity({name})"));
    }

    fn removed_entity(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        let name = ctx.scene().name(entity).unwrap_or_default().to_owned();
        self.record(format!("removed_entity({name})"));
    }

    fn added_child_component(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {
        let name = ctx.scene().component_name(component).unwrap_or_default().to_owned();
        self.record(format!("added_child_component({name})"));
    }

    fn removed_child_component(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {
        let name = ctx.scene().component_name(component).unwrap_or_default().to_owned();
        self.record(format!("removed_child_component({name})"));
    }

    fn added_entity_to_branch(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        let name = ctx.scene().name(entity).unwrap_or_default().to_owned();
        self.record(format!("added_entity_to_branch({name})"));
    }

    fn removed_entity_from_branch(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        let name = ctx.scene().name(entity).unwrap_or_default().to_owned();
        self.record(format!("removed_entity_from_branch({name})"));
    }

    fn added_component_to_branch(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {
        let name = ctx.scene().component_name(component).unwrap_or_default().to_owned();
        self.record(format!("added_component_to_branch({name})"));
    }

    fn removed_component_from_branch(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {
        let name = ctx.scene().component_name(component).unwrap_or_default().to_owned();
        self.record(format!("removed_component_from_branch({name})"));
    }

    fn destroy(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.record("destroy".to_owned());
    }
}

/// Listener counterpart of [`Recorder`].
pub struct ListenerRecorder {
    pub label: &'static str,
    pub log: Log,
}

impl ListenerRecorder {
    pub fn shared(label: &'static str, log: &Log) -> Rc<RefCell<ListenerRecorder>> {
        Rc::new(RefCell::new(Self {
            label,
            log: Rc::clone(log),
        }))
    }

    fn record(&self, event: String) {
        self.log.borrow_mut().push(format!("{}:{event}", self.label));
    }
}

impl EntityListener for ListenerRecorder {
    fn parent_changed(&mut self, _scene: &Scene, _entity: EntityId, old: Option<EntityId>, new: Option<EntityId>) {
        self.record(format!("parent_changed({},{})", old.is_some(), new.is_some()));
    }

    fn added_component(&mut self, scene: &Scene, component: ComponentId) {
        let name = scene.component_name(component).unwrap_or_default();
        self.record(format!("added_component({name})"));
    }

    fn removed_component(&mut self, scene: &Scene, component: ComponentId) {
        let name = scene.component_name(component).unwrap_or_default();
        self.record(format!("removed_component({name})"));
    }

    fn added_entity(&mut self, scene: &Scene, entity: EntityId) {
        let name = scene.name(entity).unwrap_or_default();
        self.record(format!("added_entity({name})"));
    }

    fn removed_entity(&mut self, scene: &Scene, entity: EntityId) {
        let name = scene.name(entity).unwrap_or_default();
        self.record(format!("removed_entity({name})"));
    }

    fn added_entity_to_branch(&mut self, scene: &Scene, entity: EntityId) {
        let name = scene.name(entity).unwrap_or_default();
        self.record(format!("added_entity_to_branch({name})"));
    }

    fn removed_entity_from_branch(&mut self, scene: &Scene, entity: EntityId) {
        let name = scene.name(entity).unwrap_or_default();
        self.record(format!("removed_entity_from_branch({name})"));
    }

    fn added_component_to_branch(&mut self, scene: &Scene, component: ComponentId) {
        let name = scene.component_name(component).unwrap_or_default();
        self.record(format!("added_component_to_branch({name})"));
    }

    fn removed_component_from_branch(&mut self, scene: &Scene, component: ComponentId) {
        let name = scene.component_name(component).unwrap_or_default();
        self.record(format!("removed_component_from_branch({name})"));
    }
}

pub fn test_registry() -> DescriptorRegistry {
    let mut registry = DescriptorRegistry::new();
    registry
        .descriptor::<Transform>(|d| {
            d.alias("ITransform")
                .capability("spatial")
                .vec3("position", |t| t.position, |t, v| t.position = v)
                .vec3_with_default("scale", Vec3::ONE, |t| t.scale, |t, v| t.scale = v);
        })
        .unwrap();
    registry
        .descriptor::<Tag>(|d| {
            d.string("label", |t| t.label.clone(), |t, v| t.label = v)
                .int("layer", |t| t.layer, |t, v| t.layer = v)
                .bool_with_default("visible", true, |t| t.visible, |t, v| t.visible = v);
        })
        .unwrap();
    registry
        .descriptor::<Follow>(|d| {
            d.capability("spatial")
                .reference("target", "Transform", |f| f.target, |f, v| f.target = v)
                .float("distance", |f| f.distance, |f, v| f.distance = v);
        })
        .unwrap();
    registry
}

pub fn test_scene() -> Scene {
    Scene::new(Rc::new(test_registry()))
}

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Drain the log.
pub fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}
