//! Relative paths between entities and path lookup.

use crate::path::{self, EntityPath, PathBase, Segment, TO_PARENT, TO_SELF, UP_DELIMITER};
use crate::{ComponentId, EntityId, PropertyValue, Scene, SceneError};

impl Scene {
    /// Shortest-first path from `from` to `target`, following the search
    /// order: direct children, `from` itself, each child's branch, then the
    /// parent (with `from`'s branch excluded).
    ///
    /// Returns `None` when the two entities are in different trees.
    #[must_use]
    pub fn relative_path_to(&self, from: EntityId, target: EntityId) -> Option<String> {
        self.relative_path(from, target, None, true)
    }

    fn relative_path(&self, from: EntityId, target: EntityId, exclude: Option<EntityId>, up: bool) -> Option<String> {
        let node = self.entities.get(&from)?;
        if node.children.contains(&target) {
            return self.name(target).map(str::to_owned);
        }
        if from == target {
            return Some(TO_SELF.to_owned());
        }
        for &child in &node.children {
            if Some(child) == exclude {
                continue;
            }
            if let Some(rest) = self.relative_path(child, target, None, false) {
                return Some(path::join(self.name(child)?, &rest));
            }
        }
        if !up {
            return None;
        }
        let rest = self.relative_path(node.parent?, target, Some(from), true)?;
        if rest == TO_SELF {
            Some(TO_PARENT.to_owned())
        } else {
            Some(format!("{UP_DELIMITER}{rest}"))
        }
    }

    /// Relative component path (`path:TypeName`) from `from` to `component`.
    #[must_use]
    pub fn relative_component_path(&self, from: EntityId, component: ComponentId) -> Option<String> {
        let entity = self.component_entity(component)?;
        let entity_path = self.relative_path_to(from, entity)?;
        Some(path::component_path(&entity_path, self.component_name(component)?))
    }

    /// Entity at `path` relative to `from`. `None` for malformed or
    /// dangling paths.
    #[must_use]
    pub fn entity_by_path(&self, from: EntityId, path: &str) -> Option<EntityId> {
        let parsed = EntityPath::parse(path)?;
        let mut current = match parsed.base {
            PathBase::Current => from,
            PathBase::ResourceRoot => self.resource_root?,
        };
        if !self.contains_entity(current) {
            return None;
        }
        for segment in parsed.segments {
            current = match segment {
                Segment::Current => current,
                Segment::Parent => self.parent(current)?,
                Segment::Child(name) => self.entity_by_name(current, name)?,
            };
        }
        Some(current)
    }

    /// Component at `entity/path:TypeName` relative to `from`. An empty
    /// entity part means `from` itself.
    #[must_use]
    pub fn component_by_path(&self, from: EntityId, path: &str) -> Option<ComponentId> {
        let (entity_path, type_name) = path::split_component_path(path)?;
        let entity = if entity_path.is_empty() {
            self.contains_entity(from).then_some(from)?
        } else {
            self.entity_by_path(from, entity_path)?
        };
        self.get_component_or_null(entity, type_name)
    }

    /// Value of the property at `entity/path:TypeName.property` relative to
    /// `from`.
    #[must_use]
    pub fn property_by_path(&self, from: EntityId, path: &str) -> Option<PropertyValue> {
        let (entity_path, type_name, property) = path::split_property_path(path)?;
        let component = self.component_by_path(from, &path::component_path(entity_path, type_name))?;
        self.get_property(component, property).ok()
    }

    /// Component at `entity/path:TypeName` relative to `entity`, creating
    /// missing entities along the path and the component itself. A trailing
    /// `.property` is ignored.
    pub fn make_path_to_component(&mut self, entity: EntityId, path: &str) -> Result<ComponentId, SceneError> {
        let (entity_path, rest) =
            path::split_component_path(path).ok_or_else(|| SceneError::InvalidPath(path.to_owned()))?;
        let type_name = rest.split(path::PROPERTY_DELIMITER).next().unwrap_or(rest);
        let target = if entity_path.is_empty() {
            self.node(entity)?;
            entity
        } else {
            self.make_entity_path(entity, entity_path)?
        };
        self.component(target, type_name)
    }
}
