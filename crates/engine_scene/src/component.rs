//! Component trait and lifecycle hooks.
//!
//! Components are plain Rust values stored type-erased in the scene arena.
//! Every hook receives a [`ComponentContext`] with mutable access to the
//! scene. While a hook runs its component is checked out of the arena, so
//! the hook mutates `self` directly and may attach, detach or create other
//! components and entities through the context.

use std::any::Any;

use crate::{ComponentContext, ComponentId, EntityId};

/// `Any` access for trait objects.
///
/// Implemented for every `'static` type. Call it on `&dyn Component`, not on
/// a `Box<dyn Component>`, or the box itself is what gets erased.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Data attached to an entity.
///
/// `type_name` is the component's type identity. It is what JSON documents,
/// component paths and the [`DescriptorRegistry`](crate::DescriptorRegistry)
/// key on, and an entity holds at most one component per type identity.
///
/// All hooks default to no-ops, except the entity and branch hooks whose
/// defaults fan out to the matching per-component hook.
#[allow(unused_variables)]
pub trait Component: AsAny {
    /// Type identity, e.g. `"TransformNode"`.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// The component was attached to `entity`. Runs before any other
    /// component is told about the attachment.
    fn attached(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {}

    /// The component was detached from `entity`.
    fn detached(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {}

    /// The owning entity moved from `old` to `new`.
    fn parent_changed(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        old: Option<EntityId>,
        new: Option<EntityId>,
    ) {
    }

    fn added_sibling_component(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {}

    fn removed_sibling_component(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {}

    /// A child entity was added to the owning entity.
    fn added_entity(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        for component in ctx.scene().components_of(entity).to_vec() {
            self.added_child_component(ctx, component);
        }
    }

    /// A child entity was removed from the owning entity.
    fn removed_entity(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        for component in ctx.scene().components_of(entity).to_vec() {
            self.removed_child_component(ctx, component);
        }
    }

    /// A component was attached to a direct child of the owning entity.
    fn added_child_component(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {}

    fn removed_child_component(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {}

    /// An entity was added somewhere below the owning entity.
    fn added_entity_to_branch(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        for component in ctx.scene().branch_components(entity) {
            self.added_component_to_branch(ctx, component);
        }
    }

    fn removed_entity_from_branch(&mut self, ctx: &mut ComponentContext<'_>, entity: EntityId) {
        for component in ctx.scene().branch_components(entity) {
            self.removed_component_from_branch(ctx, component);
        }
    }

    /// A component was attached to the owning entity or anywhere below it.
    fn added_component_to_branch(&mut self, ctx: &mut ComponentContext<'_>, component: ComponentId) {
    }

    fn removed_component_from_branch(
        &mut self,
        ctx: &mut ComponentContext<'_>,
        component: ComponentId,
    ) {
    }

    /// The owning entity is being destroyed.
    fn destroy(&mut self, ctx: &mut ComponentContext<'_>) {}
}

/// Downcast an erased component.
#[must_use]
pub fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    component.as_any().downcast_ref::<T>()
}

/// Downcast an erased component mutably.
#[must_use]
pub fn downcast_mut<T: Component>(component: &mut dyn Component) -> Option<&mut T> {
    component.as_any_mut().downcast_mut::<T>()
}
