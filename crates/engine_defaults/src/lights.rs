//! Light components.
//!
//! A light is positioned by the [`TransformNode`] on its entity; attaching
//! a light creates one when the entity has none.

use engine_math::TransformNode;
use engine_scene::{Component, ComponentContext, DescriptorError, DescriptorRegistry, EntityId};
use glam::Vec3;
use tracing::warn;

/// Capability tag shared by every light type.
pub const LIGHT: &str = "light";

#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    /// Distance at which the light fades out. `0` means unbounded.
    pub range: f32,
    pub cast_shadows: bool,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            range: 0.0,
            cast_shadows: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadows: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            cast_shadows: true,
        }
    }
}

fn ensure_transform(ctx: &mut ComponentContext<'_>, entity: EntityId) {
    if let Err(err) = ctx.sibling_typed::<TransformNode>() {
        warn!(
            entity = %ctx.scene().entity_path(entity),
            error = %err,
            "can't add transform for light"
        );
    }
}

impl Component for PointLight {
    fn type_name() -> &'static str {
        "PointLight"
    }

    fn attached(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        ensure_transform(ctx, entity);
    }
}

impl Component for DirectionalLight {
    fn type_name() -> &'static str {
        "DirectionalLight"
    }

    fn attached(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        ensure_transform(ctx, entity);
    }
}

pub fn register(registry: &mut DescriptorRegistry) -> Result<(), DescriptorError> {
    registry.descriptor::<PointLight>(|d| {
        d.capability(LIGHT)
            .vec3_with_default("color", Vec3::ONE, |l| l.color, |l, v| l.color = v)
            .float_with_default("intensity", 1.0, |l| l.intensity, |l, v| l.intensity = v)
            .float("range", |l| l.range, |l, v| l.range = v)
            .bool("cast_shadows", |l| l.cast_shadows, |l, v| l.cast_shadows = v);
    })?;
    registry.descriptor::<DirectionalLight>(|d| {
        d.capability(LIGHT)
            .vec3_with_default("color", Vec3::ONE, |l| l.color, |l, v| l.color = v)
            .float_with_default("intensity", 1.0, |l| l.intensity, |l, v| l.intensity = v)
            .bool_with_default("cast_shadows", true, |l| l.cast_shadows, |l, v| l.cast_shadows = v);
    })
}
