//! Property type tags and the tagged value union passed through descriptors.

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde_json::Value;

use crate::ComponentId;

/// Declared type of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    String,
    /// A string naming an external resource.
    Uri,
    /// A string restricted to the listed values.
    Enum(Vec<String>),
    /// A reference to a component of the named type.
    ComponentRef(String),
}

impl PropertyType {
    /// Short tag used in error messages and schema dumps.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat4 => "mat4",
            Self::String => "string",
            Self::Uri => "uri",
            Self::Enum(_) => "enum",
            Self::ComponentRef(_) => "ref",
        }
    }

    /// Whether `value` is acceptable for this type.
    #[must_use]
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match (self, value) {
            (Self::Bool, PropertyValue::Bool(_))
            | (Self::Int, PropertyValue::Int(_))
            | (Self::Float, PropertyValue::Float(_))
            | (Self::Vec2, PropertyValue::Vec2(_))
            | (Self::Vec3, PropertyValue::Vec3(_))
            | (Self::Vec4, PropertyValue::Vec4(_))
            | (Self::Mat4, PropertyValue::Mat4(_))
            | (Self::String, PropertyValue::String(_))
            | (Self::Uri, PropertyValue::Uri(_) | PropertyValue::String(_))
            | (Self::ComponentRef(_), PropertyValue::ComponentRef(_)) => true,
            (Self::Enum(values), PropertyValue::Enum(v) | PropertyValue::String(v)) => {
                values.iter().any(|allowed| allowed == v)
            }
            _ => false,
        }
    }

    /// Decode a JSON value written by [`PropertyValue::to_json`].
    ///
    /// Returns `None` when the JSON does not fit this type. References are
    /// paths and are decoded by the scene, so they always return `None`.
    #[must_use]
    pub fn value_from_json(&self, json: &Value) -> Option<PropertyValue> {
        let value = match self {
            Self::Bool => PropertyValue::Bool(json.as_bool()?),
            Self::Int => PropertyValue::Int(i32::try_from(json.as_i64()?).ok()?),
            Self::Float => PropertyValue::Float(json.as_f64()? as f32),
            Self::Vec2 => PropertyValue::Vec2(Vec2::from_array(floats(json)?)),
            Self::Vec3 => PropertyValue::Vec3(Vec3::from_array(floats(json)?)),
            Self::Vec4 => PropertyValue::Vec4(Vec4::from_array(floats(json)?)),
            Self::Mat4 => PropertyValue::Mat4(Mat4::from_cols_array(&floats(json)?)),
            Self::String => PropertyValue::String(json.as_str()?.to_owned()),
            Self::Uri => PropertyValue::Uri(json.as_str()?.to_owned()),
            Self::Enum(values) => {
                let name = json.as_str()?;
                if !values.iter().any(|v| v == name) {
                    return None;
                }
                PropertyValue::Enum(name.to_owned())
            }
            Self::ComponentRef(_) => return None,
        };
        Some(value)
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enum(values) => write!(f, "enum[{}]", values.join("|")),
            Self::ComponentRef(required) => write!(f, "ref<{required}>"),
            other => f.write_str(other.tag()),
        }
    }
}

fn floats<const N: usize>(json: &Value) -> Option<[f32; N]> {
    let array = json.as_array()?;
    if array.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(array) {
        *slot = item.as_f64()? as f32;
    }
    Some(out)
}

/// A property value of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    String(String),
    Uri(String),
    Enum(String),
    ComponentRef(Option<ComponentId>),
}

impl PropertyValue {
    /// Kind name, matching [`PropertyType::tag`].
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat4(_) => "mat4",
            Self::String(_) => "string",
            Self::Uri(_) => "uri",
            Self::Enum(_) => "enum",
            Self::ComponentRef(_) => "ref",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_mat4(&self) -> Option<Mat4> {
        match self {
            Self::Mat4(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload of `String`, `Uri` and `Enum` values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) | Self::Uri(v) | Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Target of a reference value. The outer `None` means "not a reference".
    #[must_use]
    pub fn as_component_ref(&self) -> Option<Option<ComponentId>> {
        match self {
            Self::ComponentRef(v) => Some(*v),
            _ => None,
        }
    }

    /// Take the string payload of `String`, `Uri` and `Enum` values.
    #[must_use]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::String(v) | Self::Uri(v) | Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// JSON encoding. References have no direct encoding and return `None`.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        let json = match self {
            Self::Bool(v) => Value::from(*v),
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => Value::from(f64::from(*v)),
            Self::Vec2(v) => float_array(&v.to_array()),
            Self::Vec3(v) => float_array(&v.to_array()),
            Self::Vec4(v) => float_array(&v.to_array()),
            Self::Mat4(v) => float_array(&v.to_cols_array()),
            Self::String(v) | Self::Uri(v) | Self::Enum(v) => Value::from(v.as_str()),
            Self::ComponentRef(_) => return None,
        };
        Some(json)
    }
}

fn float_array(values: &[f32]) -> Value {
    Value::Array(values.iter().map(|v| Value::from(f64::from(*v))).collect())
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for PropertyValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for PropertyValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for PropertyValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for PropertyValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<ComponentId> for PropertyValue {
    fn from(v: ComponentId) -> Self {
        Self::ComponentRef(Some(v))
    }
}
