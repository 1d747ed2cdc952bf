//! Descriptor registry: maps component type names and aliases to descriptors.
//!
//! A host builds one registry at start-up, then shares it with every
//! [`Scene`](crate::Scene) as an `Rc<DescriptorRegistry>`.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{Component, ComponentDescriptor, DescriptorBuilder, DescriptorError, SceneError};

/// Registry of every known component type.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    /// Descriptors keyed by canonical type name.
    descriptors: HashMap<String, Rc<ComponentDescriptor>>,
    /// Alias to canonical type name.
    aliases: HashMap<String, String>,
}

impl DescriptorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare component type `T`, created with `T::default()`.
    pub fn descriptor<T: Component + Default>(
        &mut self,
        build: impl FnOnce(&mut DescriptorBuilder<T>),
    ) -> Result<(), DescriptorError> {
        self.descriptor_with(T::default, build)
    }

    /// Declare component type `T` with a custom factory.
    pub fn descriptor_with<T: Component>(
        &mut self,
        create: impl Fn() -> T + 'static,
        build: impl FnOnce(&mut DescriptorBuilder<T>),
    ) -> Result<(), DescriptorError> {
        let mut builder = DescriptorBuilder::new(create);
        build(&mut builder);
        for descriptor in builder.finish()? {
            self.register(descriptor);
        }
        Ok(())
    }

    /// Register a finished descriptor under its name and declared aliases.
    ///
    /// A descriptor registered under an existing name replaces the old one.
    pub fn register(&mut self, descriptor: ComponentDescriptor) {
        let name = descriptor.component_name().to_owned();
        for alias in descriptor.aliases() {
            self.aliases.insert(alias.clone(), name.clone());
        }
        debug!(
            component = %name,
            properties = descriptor.properties().len(),
            aliases = descriptor.aliases().len(),
            "registered component descriptor"
        );
        self.descriptors.insert(name, Rc::new(descriptor));
    }

    /// Add lookup names for an already registered type.
    pub fn add_aliases(&mut self, type_name: &str, aliases: &[&str]) -> Result<(), DescriptorError> {
        let canonical = self
            .resolve_name(type_name)
            .ok_or_else(|| DescriptorError::UnknownDescriptor(type_name.to_owned()))?
            .to_owned();
        for alias in aliases {
            self.aliases.insert((*alias).to_owned(), canonical.clone());
        }
        Ok(())
    }

    /// Look up a descriptor by type name or alias.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&ComponentDescriptor> {
        self.descriptors
            .get(type_name)
            .or_else(|| {
                self.aliases
                    .get(type_name)
                    .and_then(|canonical| self.descriptors.get(canonical))
            })
            .map(Rc::as_ref)
    }

    /// Canonical type name for a type name or alias.
    #[must_use]
    pub fn resolve_name(&self, type_name: &str) -> Option<&str> {
        self.get(type_name).map(ComponentDescriptor::component_name)
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    /// Instantiate a component by type name or alias.
    ///
    /// Returns the canonical type name along with the component.
    pub fn create_component(&self, type_name: &str) -> Result<(String, Box<dyn Component>), SceneError> {
        let descriptor = self
            .get(type_name)
            .ok_or_else(|| SceneError::UnknownComponentType(type_name.to_owned()))?;
        Ok((descriptor.component_name().to_owned(), descriptor.create()))
    }

    /// Canonical names of all registered types, sorted.
    #[must_use]
    pub fn component_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered types. Aliases are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// JSON description of every registered type, for tooling.
    #[must_use]
    pub fn describe(&self) -> Value {
        let mut aliases: HashMap<&str, Vec<&str>> = HashMap::new();
        for (alias, canonical) in &self.aliases {
            aliases.entry(canonical.as_str()).or_default().push(alias.as_str());
        }

        let mut components = Map::new();
        for name in self.component_names() {
            let Some(descriptor) = self.descriptors.get(name) else {
                continue;
            };
            let properties: Vec<Value> = descriptor
                .properties()
                .iter()
                .map(|p| {
                    json!({
                        "name": p.name(),
                        "type": p.property_type().to_string(),
                        "serialized": p.is_serialized(),
                    })
                })
                .collect();
            let mut names = aliases.remove(name).unwrap_or_default();
            names.sort_unstable();
            components.insert(
                name.to_owned(),
                json!({
                    "aliases": names,
                    "capabilities": descriptor.capabilities().collect::<Vec<_>>(),
                    "children": descriptor.children(),
                    "properties": properties,
                }),
            );
        }
        Value::Object(components)
    }
}
