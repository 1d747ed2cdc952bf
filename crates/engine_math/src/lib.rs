//! # engine_math
//!
//! Math types for the scene graph. Re-exports [`glam`] for linear algebra
//! and defines [`TransformNode`], the spatial component most other
//! components look for on their entity.

pub mod transform;

// Re-export glam types for convenience.
pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use transform::{TransformNode, propagate_transforms, register};
