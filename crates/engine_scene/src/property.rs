//! Type-erased property accessors.
//!
//! A [`PropertyDescriptor`] is built once per component type and shared by
//! every instance. It reads and writes one field of a concrete component
//! through `&dyn Component`, failing with a [`SceneError`] when handed a
//! component of another type or a value of the wrong kind.

use serde_json::Value;

use crate::component::{downcast_mut, downcast_ref};
use crate::{Component, PropertyType, PropertyValue, SceneError};

type GetFn = Box<dyn Fn(&dyn Component) -> Option<PropertyValue>>;
type SetFn = Box<dyn Fn(&mut dyn Component, PropertyValue) -> Result<(), Access>>;
type CopyFn = Box<dyn Fn(&mut dyn Component, &dyn Component) -> Result<(), Access>>;
type DefaultFn = Box<dyn Fn() -> PropertyValue>;

enum Access {
    WrongComponent,
    WrongValue,
}

/// Accessor for one named property of one component type.
pub struct PropertyDescriptor {
    name: String,
    owner: &'static str,
    ty: PropertyType,
    default: DefaultFn,
    get: GetFn,
    set: SetFn,
    copy: Option<CopyFn>,
    serialized: bool,
}

impl PropertyDescriptor {
    /// Build a descriptor over component type `T`.
    ///
    /// `set` returns `false` to reject a value; the caller then gets
    /// [`SceneError::PropertyValueMismatch`]. Values that `ty` does not
    /// accept are rejected before `set` runs.
    pub fn new<T: Component>(
        name: impl Into<String>,
        ty: PropertyType,
        default: impl Fn() -> PropertyValue + 'static,
        get: impl Fn(&T) -> PropertyValue + 'static,
        set: impl Fn(&mut T, PropertyValue) -> bool + 'static,
    ) -> Self {
        let accepted = ty.clone();
        Self {
            name: name.into(),
            owner: T::type_name(),
            ty,
            default: Box::new(default),
            get: Box::new(move |component| downcast_ref::<T>(component).map(&get)),
            set: Box::new(move |component, value| {
                let component = downcast_mut::<T>(component).ok_or(Access::WrongComponent)?;
                if accepted.accepts(&value) && set(component, value) {
                    Ok(())
                } else {
                    Err(Access::WrongValue)
                }
            }),
            copy: None,
            serialized: true,
        }
    }

    /// Replace the default get-then-set copy with a direct field copy.
    #[must_use]
    pub fn with_copy<T: Component>(mut self, copy: impl Fn(&mut T, &T) + 'static) -> Self {
        self.copy = Some(Box::new(move |to, from| {
            let from = downcast_ref::<T>(from).ok_or(Access::WrongComponent)?;
            let to = downcast_mut::<T>(to).ok_or(Access::WrongComponent)?;
            copy(to, from);
            Ok(())
        }));
        self
    }

    /// Keep the property out of JSON documents.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.serialized = false;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn property_type(&self) -> &PropertyType {
        &self.ty
    }

    /// Type name of the component this property belongs to.
    #[must_use]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Whether the property takes part in JSON read/write.
    #[must_use]
    pub fn is_serialized(&self) -> bool {
        self.serialized
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self.ty, PropertyType::ComponentRef(_))
    }

    /// Component type a reference property points at.
    #[must_use]
    pub fn required_type(&self) -> Option<&str> {
        match &self.ty {
            PropertyType::ComponentRef(required) => Some(required),
            _ => None,
        }
    }

    /// Value a fresh component is expected to hold.
    #[must_use]
    pub fn default_value(&self) -> PropertyValue {
        (self.default)()
    }

    pub fn get(&self, component: &dyn Component) -> Result<PropertyValue, SceneError> {
        (self.get)(component).ok_or_else(|| self.wrong_component())
    }

    pub fn set(&self, component: &mut dyn Component, value: PropertyValue) -> Result<(), SceneError> {
        let found = value.kind();
        (self.set)(component, value).map_err(|access| self.access_error(access, found))
    }

    /// Copy the value from `from` into `to`. Both must be the owner type.
    pub fn copy(&self, to: &mut dyn Component, from: &dyn Component) -> Result<(), SceneError> {
        match &self.copy {
            Some(copy) => copy(to, from).map_err(|access| self.access_error(access, "")),
            None => {
                let value = self.get(from)?;
                self.set(to, value)
            }
        }
    }

    /// JSON encoding of `value`, or `None` when it should be omitted.
    ///
    /// Vectors and matrices equal to the default are omitted.
    #[must_use]
    pub fn write_json(&self, value: &PropertyValue) -> Option<Value> {
        let omit_default = matches!(
            self.ty,
            PropertyType::Vec2 | PropertyType::Vec3 | PropertyType::Vec4 | PropertyType::Mat4
        );
        if omit_default && *value == self.default_value() {
            return None;
        }
        value.to_json()
    }

    /// Decode a JSON value for this property.
    #[must_use]
    pub fn read_json(&self, json: &Value) -> Option<PropertyValue> {
        self.ty.value_from_json(json)
    }

    fn wrong_component(&self) -> SceneError {
        SceneError::ComponentTypeMismatch {
            property: self.name.clone(),
            expected: self.owner.to_owned(),
        }
    }

    fn access_error(&self, access: Access, found: &'static str) -> SceneError {
        match access {
            Access::WrongComponent => self.wrong_component(),
            Access::WrongValue => SceneError::PropertyValueMismatch {
                property: self.name.clone(),
                expected: self.ty.to_string(),
                found,
            },
        }
    }
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("ty", &self.ty)
            .field("serialized", &self.serialized)
            .finish_non_exhaustive()
    }
}
