//! # engine_defaults
//!
//! The stock component set every scene host starts from:
//!
//! - [`TransformNode`](engine_math::TransformNode) from `engine_math`.
//! - [`PointLight`] / [`DirectionalLight`] (capability `light`).
//! - [`Mesh`] (capability `renderable`) referencing a [`Material`].
//! - [`LookAt`] constraint referencing a transform node.
//! - [`SceneLayer`], a branch listener that caches lights, meshes and nodes.
//!
//! Everything is registered through the public
//! [`DescriptorRegistry`](engine_scene::DescriptorRegistry) API, the same
//! way a host adds its own components.

pub mod layer;
pub mod lights;
pub mod look_at;
pub mod render;

use engine_scene::{DescriptorError, DescriptorRegistry};

pub use layer::SceneLayer;
pub use lights::{DirectionalLight, PointLight};
pub use look_at::{LookAt, apply_look_at};
pub use render::{Material, Mesh};

/// Add the default component set to `registry`.
pub fn register_default_components(registry: &mut DescriptorRegistry) -> Result<(), DescriptorError> {
    engine_math::register(registry)?;
    lights::register(registry)?;
    render::register(registry)?;
    look_at::register(registry)?;
    Ok(())
}

/// A registry holding only the default component set.
pub fn default_registry() -> Result<DescriptorRegistry, DescriptorError> {
    let mut registry = DescriptorRegistry::new();
    register_default_components(&mut registry)?;
    Ok(registry)
}
