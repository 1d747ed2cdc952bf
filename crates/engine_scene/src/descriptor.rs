//! Component descriptors and the typed builder used to declare them.
//!
//! A [`ComponentDescriptor`] is the reflection record of one component type:
//! its factory, ordered properties, aliases and capability tags. Descriptors
//! are assembled with a [`DescriptorBuilder`] inside
//! [`DescriptorRegistry::descriptor`](crate::DescriptorRegistry::descriptor):
//!
//! ```
//! use engine_scene::{Component, DescriptorRegistry};
//!
//! #[derive(Default)]
//! struct Spin {
//!     speed: f32,
//! }
//!
//! impl Component for Spin {
//!     fn type_name() -> &'static str {
//!         "Spin"
//!     }
//! }
//!
//! let mut registry = DescriptorRegistry::new();
//! registry
//!     .descriptor::<Spin>(|d| {
//!         d.float("speed", |s| s.speed, |s, v| s.speed = v)
//!             .capability("animated");
//!     })
//!     .unwrap();
//! assert!(registry.get("Spin").unwrap().has_capability("animated"));
//! ```

use std::collections::BTreeSet;
use std::marker::PhantomData;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::{Component, ComponentId, DescriptorError, PropertyDescriptor, PropertyType, PropertyValue};

type CreateFn = Box<dyn Fn() -> Box<dyn Component>>;

/// Reflection record of one component type.
pub struct ComponentDescriptor {
    component_name: String,
    create: CreateFn,
    properties: Vec<PropertyDescriptor>,
    aliases: Vec<String>,
    capabilities: BTreeSet<String>,
    children: Vec<String>,
}

impl ComponentDescriptor {
    /// Canonical type name.
    #[must_use]
    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// Instantiate a fresh component.
    #[must_use]
    pub fn create(&self) -> Box<dyn Component> {
        (self.create)()
    }

    /// Properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Aliases declared with [`DescriptorBuilder::alias`].
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    #[must_use]
    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(String::as_str)
    }

    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Names of descriptors nested under this one with
    /// [`DescriptorBuilder::child`]. Informational, used by tooling.
    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("component_name", &self.component_name)
            .field("properties", &self.properties)
            .field("aliases", &self.aliases)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Declares the properties of component type `T`.
///
/// Configuration mistakes (empty or duplicate property names) are recorded
/// and reported when the registry finishes the builder; the first one wins.
pub struct DescriptorBuilder<T> {
    descriptor: ComponentDescriptor,
    nested: Vec<ComponentDescriptor>,
    error: Option<DescriptorError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> DescriptorBuilder<T> {
    pub(crate) fn new(create: impl Fn() -> T + 'static) -> Self {
        Self {
            descriptor: ComponentDescriptor {
                component_name: T::type_name().to_owned(),
                create: Box::new(move || Box::new(create())),
                properties: Vec::new(),
                aliases: Vec::new(),
                capabilities: BTreeSet::new(),
                children: Vec::new(),
            },
            nested: Vec::new(),
            error: None,
            _marker: PhantomData,
        }
    }

    /// The finished descriptor followed by every nested one.
    pub(crate) fn finish(self) -> Result<Vec<ComponentDescriptor>, DescriptorError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut out = Vec::with_capacity(self.nested.len() + 1);
        out.push(self.descriptor);
        out.extend(self.nested);
        Ok(out)
    }

    fn record(&mut self, err: DescriptorError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Add a hand-built property.
    pub fn property(&mut self, property: PropertyDescriptor) -> &mut Self {
        let component = &self.descriptor.component_name;
        if property.name().is_empty() {
            let err = DescriptorError::EmptyPropertyName {
                component: component.clone(),
            };
            self.record(err);
        } else if self.descriptor.property(property.name()).is_some() {
            let err = DescriptorError::DuplicateProperty {
                component: component.clone(),
                property: property.name().to_owned(),
            };
            self.record(err);
        } else {
            self.descriptor.properties.push(property);
        }
        self
    }

    /// Exclude the most recently declared property from JSON documents.
    pub fn transient(&mut self) -> &mut Self {
        if let Some(last) = self.descriptor.properties.pop() {
            self.descriptor.properties.push(last.transient());
        }
        self
    }

    /// Register an extra name for this component type.
    pub fn alias(&mut self, alias: &str) -> &mut Self {
        self.descriptor.aliases.push(alias.to_owned());
        self
    }

    /// Tag the component type with a capability listeners can filter on.
    pub fn capability(&mut self, capability: &str) -> &mut Self {
        self.descriptor.capabilities.insert(capability.to_owned());
        self
    }

    /// Declare a nested component type, registered alongside this one.
    pub fn child<U: Component + Default>(
        &mut self,
        build: impl FnOnce(&mut DescriptorBuilder<U>),
    ) -> &mut Self {
        let mut builder = DescriptorBuilder::<U>::new(U::default);
        build(&mut builder);
        match builder.finish() {
            Ok(descriptors) => {
                self.descriptor.children.push(U::type_name().to_owned());
                self.nested.extend(descriptors);
            }
            Err(err) => self.record(err),
        }
        self
    }

    #[allow(clippy::too_many_arguments)]
    fn typed<V: 'static>(
        &mut self,
        name: &str,
        ty: PropertyType,
        default: PropertyValue,
        wrap: fn(V) -> PropertyValue,
        unwrap: fn(PropertyValue) -> Option<V>,
        get: impl Fn(&T) -> V + 'static,
        set: impl Fn(&mut T, V) + 'static,
    ) -> &mut Self {
        let property = PropertyDescriptor::new::<T>(
            name,
            ty,
            move || default.clone(),
            move |component| wrap(get(component)),
            move |component, value| match unwrap(value) {
                Some(value) => {
                    set(component, value);
                    true
                }
                None => false,
            },
        );
        self.property(property)
    }

    pub fn bool(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> bool + 'static,
        set: impl Fn(&mut T, bool) + 'static,
    ) -> &mut Self {
        self.bool_with_default(name, false, get, set)
    }

    pub fn bool_with_default(
        &mut self,
        name: &str,
        default: bool,
        get: impl Fn(&T) -> bool + 'static,
        set: impl Fn(&mut T, bool) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::Bool,
            PropertyValue::Bool(default),
            PropertyValue::Bool,
            |v| v.as_bool(),
            get,
            set,
        )
    }

    pub fn int(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> i32 + 'static,
        set: impl Fn(&mut T, i32) + 'static,
    ) -> &mut Self {
        self.int_with_default(name, 0, get, set)
    }

    pub fn int_with_default(
        &mut self,
        name: &str,
        default: i32,
        get: impl Fn(&T) -> i32 + 'static,
        set: impl Fn(&mut T, i32) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::Int,
            PropertyValue::Int(default),
            PropertyValue::Int,
            |v| v.as_int(),
            get,
            set,
        )
    }

    pub fn float(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> f32 + 'static,
        set: impl Fn(&mut T, f32) + 'static,
    ) -> &mut Self {
        self.float_with_default(name, 0.0, get, set)
    }

    pub fn float_with_default(
        &mut self,
        name: &str,
        default: f32,
        get: impl Fn(&T) -> f32 + 'static,
        set: impl Fn(&mut T, f32) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::Float,
            PropertyValue::Float(default),
            PropertyValue::Float,
            |v| v.as_float(),
            get,
            set,
        )
    }

    pub fn vec2(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> Vec2 + 'static,
        set: impl Fn(&mut T, Vec2) + 'static,
    ) -> &mut Self {
        self.vec2_with_default(name, Vec2::ZERO, get, set)
    }

    pub fn vec2_with_default(
        &mut self,
        name: &str,
        default: Vec2,
        get: impl Fn(&T) -> Vec2 + 'static,
        set: impl Fn(&mut T, Vec2) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::Vec2,
            PropertyValue::Vec2(default),
            PropertyValue::Vec2,
            |v| v.as_vec2(),
            get,
            set,
        )
    }

    pub fn vec3(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> Vec3 + 'static,
        set: impl Fn(&mut T, Vec3) + 'static,
    ) -> &mut Self {
        self.vec3_with_default(name, Vec3::ZERO, get, set)
    }

    pub fn vec3_with_default(
        &mut self,
        name: &str,
        default: Vec3,
        get: impl Fn(&T) -> Vec3 + 'static,
        set: impl Fn(&mut T, Vec3) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::Vec3,
            PropertyValue::Vec3(default),
            PropertyValue::Vec3,
            |v| v.as_vec3(),
            get,
            set,
        )
    }

    /// Four-component vector. Defaults to `(0, 0, 0, 1)`.
    pub fn vec4(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> Vec4 + 'static,
        set: impl Fn(&mut T, Vec4) + 'static,
    ) -> &mut Self {
        self.vec4_with_default(name, Vec4::W, get, set)
    }

    pub fn vec4_with_default(
        &mut self,
        name: &str,
        default: Vec4,
        get: impl Fn(&T) -> Vec4 + 'static,
        set: impl Fn(&mut T, Vec4) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::Vec4,
            PropertyValue::Vec4(default),
            PropertyValue::Vec4,
            |v| v.as_vec4(),
            get,
            set,
        )
    }

    /// 4x4 matrix. Defaults to identity.
    pub fn mat4(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> Mat4 + 'static,
        set: impl Fn(&mut T, Mat4) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::Mat4,
            PropertyValue::Mat4(Mat4::IDENTITY),
            PropertyValue::Mat4,
            |v| v.as_mat4(),
            get,
            set,
        )
    }

    pub fn string(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> String + 'static,
        set: impl Fn(&mut T, String) + 'static,
    ) -> &mut Self {
        self.string_with_default(name, "", get, set)
    }

    pub fn string_with_default(
        &mut self,
        name: &str,
        default: &str,
        get: impl Fn(&T) -> String + 'static,
        set: impl Fn(&mut T, String) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::String,
            PropertyValue::String(default.to_owned()),
            PropertyValue::String,
            PropertyValue::into_string,
            get,
            set,
        )
    }

    /// String naming an external resource (texture, shader, mesh file).
    pub fn uri(
        &mut self,
        name: &str,
        get: impl Fn(&T) -> String + 'static,
        set: impl Fn(&mut T, String) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::Uri,
            PropertyValue::Uri(String::new()),
            PropertyValue::Uri,
            PropertyValue::into_string,
            get,
            set,
        )
    }

    /// String restricted to `values`. The first value is the default.
    pub fn string_enum(
        &mut self,
        name: &str,
        values: &[&str],
        get: impl Fn(&T) -> String + 'static,
        set: impl Fn(&mut T, String) + 'static,
    ) -> &mut Self {
        let default = values.first().copied().unwrap_or_default();
        self.typed(
            name,
            PropertyType::Enum(values.iter().map(|v| (*v).to_owned()).collect()),
            PropertyValue::Enum(default.to_owned()),
            PropertyValue::Enum,
            PropertyValue::into_string,
            get,
            set,
        )
    }

    /// Reference to a component of type `required` somewhere in the scene.
    ///
    /// Stored in memory as a [`ComponentId`], written to JSON as a path.
    pub fn reference(
        &mut self,
        name: &str,
        required: &str,
        get: impl Fn(&T) -> Option<ComponentId> + 'static,
        set: impl Fn(&mut T, Option<ComponentId>) + 'static,
    ) -> &mut Self {
        self.typed(
            name,
            PropertyType::ComponentRef(required.to_owned()),
            PropertyValue::ComponentRef(None),
            PropertyValue::ComponentRef,
            |v| v.as_component_ref(),
            get,
            set,
        )
    }
}
