//! Meshes and materials.

use engine_scene::{Component, ComponentId, DescriptorError, DescriptorRegistry};
use glam::Vec4;

/// Capability tag for anything the renderer draws.
pub const RENDERABLE: &str = "renderable";

pub const ALPHA_MODES: [&str; 3] = ["Opaque", "Mask", "Blend"];

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub base_color: Vec4,
    /// One of [`ALPHA_MODES`].
    pub alpha_mode: String,
    /// Draw order among materials with the same alpha mode.
    pub priority: i32,
    pub shader: String,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            alpha_mode: ALPHA_MODES[0].to_owned(),
            priority: 0,
            shader: String::new(),
        }
    }
}

impl Component for Material {
    fn type_name() -> &'static str {
        "Material"
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub source: String,
    pub vertex_count: i32,
    pub material: Option<ComponentId>,
}

impl Component for Mesh {
    fn type_name() -> &'static str {
        "Mesh"
    }
}

pub fn register(registry: &mut DescriptorRegistry) -> Result<(), DescriptorError> {
    registry.descriptor::<Material>(|d| {
        d.alias("IMaterial")
            .vec4_with_default("base_color", Vec4::ONE, |m| m.base_color, |m, v| m.base_color = v)
            .string_enum(
                "alpha_mode",
                &ALPHA_MODES,
                |m| m.alpha_mode.clone(),
                |m, v| m.alpha_mode = v,
            )
            .int("priority", |m| m.priority, |m, v| m.priority = v)
            .uri("shader", |m| m.shader.clone(), |m, v| m.shader = v);
    })?;
    registry.descriptor::<Mesh>(|d| {
        d.capability(RENDERABLE)
            .uri("source", |m| m.source.clone(), |m, v| m.source = v)
            .int("vertex_count", |m| m.vertex_count, |m, v| m.vertex_count = v)
            .reference("material", Material::type_name(), |m| m.material, |m, v| m.material = v);
    })
}
