//! Entity documents.
//!
//! ```json
//! {
//!   "name": "root",
//!   "components": { "TransformNode": { "position": [1.0, 0.0, 0.0] } },
//!   "children": { "camera": { "name": "camera", "components": {} } }
//! }
//! ```
//!
//! Children are read before components so that reference properties can
//! resolve into the branch that is being read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::{ComponentId, EntityId, PropertyValue, Scene, SceneError};

/// Serialized form of one entity and its branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    #[serde(default)]
    pub name: String,
    /// Component type name to property object.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub components: Map<String, Value>,
    /// Child name to child document.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub children: Map<String, Value>,
}

impl Scene {
    /// Serialize `entity` and every child with the `serialize` flag set.
    pub fn write_json(&self, entity: EntityId) -> Result<Value, SceneError> {
        let node = self.node(entity)?;
        let mut document = EntityDocument {
            name: node.name.clone(),
            ..EntityDocument::default()
        };
        for &component in &node.components {
            let type_name = self.component_name(component).unwrap_or_default().to_owned();
            document
                .components
                .insert(type_name, self.write_component_json(component)?);
        }
        for &child in &node.children {
            if !self.serialize(child) {
                continue;
            }
            let name = self.name(child).unwrap_or_default().to_owned();
            document.children.insert(name, self.write_json(child)?);
        }
        Ok(serde_json::to_value(document)?)
    }

    /// Property object of one component.
    pub fn write_component_json(&self, component: ComponentId) -> Result<Value, SceneError> {
        let descriptor = self.component_descriptor(component)?;
        let data = self
            .component_dyn(component)
            .ok_or(SceneError::ComponentBusy(component))?;
        let mut properties = Map::new();
        for property in descriptor.properties().iter().filter(|p| p.is_serialized()) {
            let value = property.get(data)?;
            let json = match value {
                PropertyValue::ComponentRef(None) => None,
                PropertyValue::ComponentRef(Some(target)) => {
                    let path = self.reference_path(component, target);
                    if path.is_none() {
                        warn!(
                            component = %self.component_path(component),
                            property = %property.name(),
                            target = %self.component_path(target),
                            "reference target is not addressable, property not written"
                        );
                    }
                    path.map(Value::String)
                }
                other => property.write_json(&other),
            };
            if let Some(json) = json {
                properties.insert(property.name().to_owned(), json);
            }
        }
        Ok(Value::Object(properties))
    }

    /// Apply a document to `entity`: name, then children (created by name
    /// when missing), then components (created by type name when missing).
    pub fn read_json(&mut self, entity: EntityId, json: &Value) -> Result<(), SceneError> {
        let document = EntityDocument::deserialize(json)?;
        self.node(entity)?;
        if !document.name.is_empty() {
            self.set_name(entity, &document.name)?;
        }

        for (key, child_json) in &document.children {
            let name = child_json
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .unwrap_or(key.as_str());
            let child = self.entity(entity, name)?;
            self.read_json(child, child_json)?;
        }

        for (type_name, component_json) in &document.components {
            let component = match self.component(entity, type_name) {
                Ok(component) => component,
                Err(SceneError::UnknownComponentType(name)) if !self.config().strict_json => {
                    error!(entity = %self.entity_path(entity), component = %name, "can't find component type, skipped");
                    continue;
                }
                Err(err) => return Err(err),
            };
            self.read_component_json(component, component_json)?;
        }
        Ok(())
    }

    /// Apply a property object to one component. Missing keys reset the
    /// property to its default.
    pub fn read_component_json(&mut self, component: ComponentId, json: &Value) -> Result<(), SceneError> {
        let Some(object) = json.as_object() else {
            return Err(SceneError::InvalidDocument(format!(
                "properties of '{}' must be an object",
                self.component_path(component)
            )));
        };
        let registry = self.registry_handle();
        let descriptor = self
            .component_name(component)
            .and_then(|name| registry.get(name))
            .ok_or_else(|| SceneError::MissingDescriptor(self.component_name(component).unwrap_or_default().to_owned()))?;

        for key in object.keys() {
            if descriptor.property(key).is_none() {
                debug!(component = %descriptor.component_name(), property = %key, "ignoring unknown property");
            }
        }

        for property in descriptor.properties().iter().filter(|p| p.is_serialized()) {
            let name = property.name();
            let value = match object.get(name) {
                None => property.default_value(),
                Some(Value::String(path)) if property.is_reference() => {
                    self.set_property(component, name, PropertyValue::ComponentRef(None))?;
                    if !path.is_empty() {
                        self.link_reference(component, property, path);
                    }
                    continue;
                }
                Some(json) => match property.read_json(json) {
                    Some(value) => value,
                    None => {
                        warn!(
                            component = %self.component_path(component),
                            property = %name,
                            expected = %property.property_type(),
                            "invalid property value, using default"
                        );
                        property.default_value()
                    }
                },
            };
            self.set_property(component, name, value)?;
        }
        Ok(())
    }

    /// Create a detached entity from a document.
    pub fn read_new_entity(&mut self, json: &Value) -> Result<EntityId, SceneError> {
        let entity = self.create_entity("");
        if let Err(err) = self.read_json(entity, json) {
            self.delete_entity(entity)?;
            return Err(err);
        }
        Ok(entity)
    }

    /// [`Self::read_new_entity`] from JSON text.
    pub fn load_json_str(&mut self, text: &str) -> Result<EntityId, SceneError> {
        let json: Value = serde_json::from_str(text)?;
        self.read_new_entity(&json)
    }

    /// [`Self::write_json`] as pretty-printed text.
    pub fn to_json_string_pretty(&self, entity: EntityId) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(&self.write_json(entity)?)?)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::Vec3;
    use serde_json::json;

    use super::*;
    use crate::SceneConfig;
    use crate::testing::{Follow, Tag, Transform, test_registry, test_scene};

    fn sample() -> Value {
        json!({
            "name": "root",
            "components": {
                "Tag": { "label": "world", "layer": 2, "visible": false }
            },
            "children": {
                "a": {
                    "name": "a",
                    "components": {
                        "Transform": { "position": [1.0, 0.0, 0.0] }
                    }
                },
                "b": {
                    "name": "b",
                    "components": {
                        "Follow": { "target": "a", "distance": 2.5 }
                    }
                }
            }
        })
    }

    #[test]
    fn test_read_document() {
        let mut scene = test_scene();
        let root = scene.read_new_entity(&sample()).unwrap();
        assert_eq!(scene.name(root), Some("root"));

        let tag = scene.get_component(root, "Tag").unwrap();
        let tag = scene.component_ref::<Tag>(tag).unwrap();
        assert_eq!((tag.label.as_str(), tag.layer, tag.visible), ("world", 2, false));

        let a = scene.entity_by_path(root, "a").unwrap();
        let t = scene.get_component(a, "Transform").unwrap();
        let transform = scene.component_ref::<Transform>(t).unwrap();
        assert_eq!(transform.position, Vec3::X);
        assert_eq!(transform.scale, Vec3::ONE);

        let follow = scene.component_by_path(root, "b:Follow").unwrap();
        let follow = scene.component_ref::<Follow>(follow).unwrap();
        assert_eq!(follow.target, Some(t));
        assert_eq!(follow.distance, 2.5);
    }

    #[test]
    fn test_write_omits_defaults_and_keeps_order() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let z = scene.entity(root, "z").unwrap();
        scene.entity(root, "m").unwrap();
        scene.component(z, "Transform").unwrap();

        let json = scene.write_json(root).unwrap();
        assert_eq!(
            json,
            json!({
                "name": "root",
                "children": {
                    "z": { "name": "z", "components": { "Transform": {} } },
                    "m": { "name": "m" }
                }
            })
        );
        let keys: Vec<_> = json["children"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "m"]);
    }

    #[test]
    fn test_round_trip() {
        let mut scene = test_scene();
        let root = scene.read_new_entity(&sample()).unwrap();
        let written = scene.write_json(root).unwrap();

        let mut other = test_scene();
        let copy = other.read_new_entity(&written).unwrap();
        assert_eq!(other.write_json(copy).unwrap(), written);
        assert_eq!(written["children"]["b"]["components"]["Follow"]["target"], json!("a"));
    }

    #[test]
    fn test_forward_reference_resolves_when_target_appears() {
        let doc = json!({
            "name": "root",
            "components": { "Follow": { "target": "later" } }
        });
        let mut scene = test_scene();
        let root = scene.read_new_entity(&doc).unwrap();
        let follow = scene.get_component(root, "Follow").unwrap();
        assert_eq!(scene.component_ref::<Follow>(follow).unwrap().target, None);
        assert_eq!(scene.pending_references().len(), 1);

        let later = scene.entity(root, "later").unwrap();
        let t = scene.component(later, "Transform").unwrap();
        assert_eq!(scene.component_ref::<Follow>(follow).unwrap().target, Some(t));
    }

    #[test]
    fn test_self_reference_path() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let t = scene.component(root, "Transform").unwrap();
        let follow = scene.component(root, "Follow").unwrap();
        scene.set_property(follow, "target", t.into()).unwrap();
        let json = scene.write_json(root).unwrap();
        assert_eq!(json["components"]["Follow"]["target"], json!("."));
    }

    #[test]
    fn test_unknown_component_types() {
        let doc = json!({ "name": "x", "components": { "Ghost": {}, "Tag": {} } });
        let mut scene = test_scene();
        let x = scene.read_new_entity(&doc).unwrap();
        assert!(scene.get_component_or_null(x, "Tag").is_some());
        assert_eq!(scene.components_of(x).len(), 1);

        let strict = SceneConfig::new().with_strict_json(true);
        let mut scene = Scene::with_config(Rc::new(test_registry()), strict);
        assert!(matches!(
            scene.read_new_entity(&doc),
            Err(SceneError::UnknownComponentType(name)) if name == "Ghost"
        ));
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn test_missing_keys_read_as_defaults() {
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        let tag = scene.component(e, "Tag").unwrap();
        scene.component_mut::<Tag>(tag).unwrap().layer = 9;
        scene.read_component_json(tag, &json!({ "label": "x" })).unwrap();
        let tag = scene.component_ref::<Tag>(tag).unwrap();
        assert_eq!(tag.layer, 0);
        assert!(tag.visible);
        assert_eq!(tag.label, "x");
    }

    #[test]
    fn test_invalid_values_fall_back_to_default() {
        let mut scene = test_scene();
        let e = scene.create_entity("e");
        let t = scene.component(e, "Transform").unwrap();
        scene
            .read_component_json(t, &json!({ "position": [1.0, 2.0], "scale": "big" }))
            .unwrap();
        assert_eq!(scene.component_ref::<Transform>(t).unwrap(), &Transform::default());
        assert!(matches!(
            scene.read_component_json(t, &json!([1, 2])),
            Err(SceneError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_non_serialized_children_are_skipped() {
        let mut scene = test_scene();
        let root = scene.create_entity("root");
        let cache = scene.entity(root, "cache").unwrap();
        scene.set_serialize(cache, false).unwrap();
        let json = scene.write_json(root).unwrap();
        assert!(json.get("children").is_none());
    }

    #[test]
    fn test_load_json_str() {
        let mut scene = test_scene();
        let e = scene.load_json_str(r#"{ "name": "from_text" }"#).unwrap();
        assert_eq!(scene.name(e), Some("from_text"));
        assert!(scene.to_json_string_pretty(e).unwrap().contains("from_text"));
        assert!(matches!(scene.load_json_str("{"), Err(SceneError::Json(_))));
    }

    #[test]
    fn test_document_names_must_be_valid_path_segments() {
        let mut scene = test_scene();
        for doc in [
            json!({ "name": "root", "children": { "a/b": {} } }),
            json!({ "name": "root", "children": { "a": { "name": ".." } } }),
            json!({ "name": "root", "children": { "res://x": {} } }),
            json!({ "name": "a/b" }),
        ] {
            assert!(matches!(scene.read_new_entity(&doc), Err(SceneError::InvalidName(_))), "{doc}");
        }
        assert_eq!(scene.entity_count(), 0);

        let root = scene
            .read_new_entity(&json!({ "name": "root", "children": { "x:y": { "components": { "Tag": {} } } } }))
            .unwrap();
        assert!(scene.component_by_path(root, "x:y:Tag").is_some());
    }
}
