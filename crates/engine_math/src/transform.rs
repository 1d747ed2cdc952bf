//! Hierarchical 3D transform component.
//!
//! [`TransformNode`] holds a local position, rotation and scale. The world
//! matrix is derived: [`propagate_transforms`] walks a branch and multiplies
//! each node's local matrix onto the nearest transformed ancestor's.

use engine_scene::{
    Component, ComponentContext, DescriptorError, DescriptorRegistry, EntityId, Scene,
};
use glam::{Mat4, Quat, Vec3, Vec4};
use tracing::trace;

/// Local transform of an entity relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformNode {
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    pub scale: Vec3,
    /// Last value computed by [`propagate_transforms`].
    pub world_matrix: Mat4,
    /// Set when the entity moves in the tree; cleared by propagation.
    pub dirty: bool,
}

impl TransformNode {
    /// Origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        world_matrix: Mat4::IDENTITY,
        dirty: true,
    };

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// The 4×4 matrix of this node relative to its parent.
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// World-space position from the last propagation.
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.w_axis.truncate()
    }
}

impl Default for TransformNode {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for TransformNode {
    fn type_name() -> &'static str {
        "TransformNode"
    }

    fn parent_changed(&mut self, _ctx: &mut ComponentContext<'_>, _old: Option<EntityId>, _new: Option<EntityId>) {
        self.dirty = true;
    }
}

/// Register [`TransformNode`] (alias `ITransformNode`, capability
/// `transform`).
pub fn register(registry: &mut DescriptorRegistry) -> Result<(), DescriptorError> {
    registry.descriptor::<TransformNode>(|d| {
        d.alias("ITransformNode")
            .capability("transform")
            .vec3("position", |t| t.position, |t, v| t.position = v)
            .vec4(
                "rotation",
                |t| Vec4::from(t.rotation),
                |t, v| t.rotation = Quat::from_vec4(v).normalize(),
            )
            .vec3_with_default("scale", Vec3::ONE, |t| t.scale, |t, v| t.scale = v)
            .mat4("world_matrix", |t| t.world_matrix, |t, m| t.world_matrix = m)
            .transient();
    })
}

/// Recompute world matrices for every [`TransformNode`] under `root`.
///
/// Entities without a transform pass their parent's matrix through
/// unchanged. Returns the number of nodes updated.
pub fn propagate_transforms(scene: &mut Scene, root: EntityId) -> usize {
    let base = world_matrix_above(scene, root);
    let mut updated = 0;
    let mut stack = vec![(root, base)];
    while let Some((entity, parent_world)) = stack.pop() {
        let mut world = parent_world;
        if let Some(id) = scene.get_component_or_null(entity, TransformNode::type_name())
            && let Some(node) = scene.component_mut::<TransformNode>(id)
        {
            world = parent_world * node.local_matrix();
            node.world_matrix = world;
            node.dirty = false;
            updated += 1;
        }
        for &child in scene.children(entity).iter().rev() {
            stack.push((child, world));
        }
    }
    trace!(root = %scene.entity_path(root), updated, "propagated transforms");
    updated
}

/// World matrix of the nearest transformed ancestor of `entity`.
fn world_matrix_above(scene: &Scene, entity: EntityId) -> Mat4 {
    let mut current = scene.parent(entity);
    while let Some(entity) = current {
        if let Some(node) = scene
            .get_component_or_null(entity, TransformNode::type_name())
            .and_then(|id| scene.component_ref::<TransformNode>(id))
        {
            return node.world_matrix;
        }
        current = scene.parent(entity);
    }
    Mat4::IDENTITY
}
