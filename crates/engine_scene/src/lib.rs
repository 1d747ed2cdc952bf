//! # engine_scene
//!
//! A hierarchical scene graph: named entities in a tree, each carrying
//! components that are described by a runtime schema.
//!
//! This crate provides:
//!
//! - [`Scene`]: the arena that owns every entity and component and routes
//!   lifecycle notifications through the tree.
//! - [`Component`] trait: hooks a component receives as the tree around it
//!   changes.
//! - [`EntityListener`]: observer attached to a single entity, plus
//!   [`BranchIndex`] which tracks every component of a capability in a branch.
//! - [`DescriptorRegistry`] / [`ComponentDescriptor`]: the property schema
//!   used for creation by name, copying and JSON documents.
//! - [`path`]: the textual path format (`a/b/c:TypeName`, `../x`, `res://`).
//! - [`EntityDocument`]: the JSON shape of a serialized branch.

mod addressing;
mod attach;
pub mod component;
pub mod config;
mod context;
pub mod descriptor;
pub mod entity;
pub mod error;
mod hierarchy;
mod json;
pub mod listener;
mod merge;
pub mod path;
pub mod property;
mod reference;
pub mod registry;
pub mod scene;
pub mod value;

#[cfg(test)]
mod testing;

pub use component::{AsAny, Component, downcast_mut, downcast_ref};
pub use config::SceneConfig;
pub use context::ComponentContext;
pub use descriptor::{ComponentDescriptor, DescriptorBuilder};
pub use entity::{ComponentId, EntityId, ListenerId, RequestId};
pub use error::{DescriptorError, SceneError};
pub use json::EntityDocument;
pub use listener::{BranchIndex, EntityListener, SharedListener};
pub use property::PropertyDescriptor;
pub use reference::{PendingReference, ResolveFn};
pub use registry::DescriptorRegistry;
pub use scene::Scene;
pub use value::{PropertyType, PropertyValue};
