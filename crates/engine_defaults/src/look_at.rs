//! Look-at constraint.
//!
//! [`LookAt`] turns the [`TransformNode`] on its entity so that its forward
//! axis (`-Z`) points at the target node. The rotation is written as the
//! local rotation, so it is only exact when ancestors are unrotated.

use engine_math::TransformNode;
use engine_scene::{Component, ComponentId, DescriptorError, DescriptorRegistry, EntityId, Scene};
use glam::{Mat4, Quat, Vec3};
use tracing::trace;

pub const CONSTRAINT: &str = "constraint";

#[derive(Debug, Clone, PartialEq)]
pub struct LookAt {
    pub target: Option<ComponentId>,
    pub up: Vec3,
}

impl Default for LookAt {
    fn default() -> Self {
        Self {
            target: None,
            up: Vec3::Y,
        }
    }
}

impl Component for LookAt {
    fn type_name() -> &'static str {
        "LookAt"
    }
}

pub fn register(registry: &mut DescriptorRegistry) -> Result<(), DescriptorError> {
    registry.descriptor::<LookAt>(|d| {
        d.capability(CONSTRAINT)
            .reference("target", TransformNode::type_name(), |l| l.target, |l, v| l.target = v)
            .vec3_with_default("up", Vec3::Y, |l| l.up, |l, v| l.up = v);
    })
}

/// Rotation that points `-Z` along `direction`.
fn look_rotation(direction: Vec3, up: Vec3) -> Option<Quat> {
    let direction = direction.try_normalize()?;
    if direction.cross(up).length_squared() < 1e-8 {
        return None;
    }
    Some(Quat::from_mat4(&Mat4::look_to_rh(Vec3::ZERO, direction, up)).inverse())
}

/// Apply every [`LookAt`] under `root` using world positions from the last
/// [`engine_math::propagate_transforms`]. Returns the number of nodes turned.
pub fn apply_look_at(scene: &mut Scene, root: EntityId) -> usize {
    let mut applied = 0;
    for component in scene.branch_components(root) {
        let Some(look_at) = scene.component_ref::<LookAt>(component).cloned() else {
            continue;
        };
        let Some(target) = look_at
            .target
            .and_then(|t| scene.component_ref::<TransformNode>(t))
            .map(TransformNode::world_position)
        else {
            continue;
        };
        let Some(node) = scene
            .component_entity(component)
            .and_then(|e| scene.get_component_or_null(e, TransformNode::type_name()))
        else {
            continue;
        };
        let Some(transform) = scene.component_mut::<TransformNode>(node) else {
            continue;
        };
        match look_rotation(target - transform.world_position(), look_at.up) {
            Some(rotation) => {
                transform.rotation = rotation;
                applied += 1;
            }
            None => trace!(component = %component, "look-at direction is degenerate"),
        }
    }
    applied
}
