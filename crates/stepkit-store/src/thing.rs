//! Values held by the store

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Read access to named properties of an object.
///
/// The injection engine only talks to objects through this trait, so plain
/// records and objects that compute their properties on demand look the same
/// to it.
pub trait PropertyAccess: Send + Sync {
    fn has_property(&self, name: &str) -> bool;

    fn get_property(&self, name: &str) -> Option<Value>;
}

impl PropertyAccess for Map<String, Value> {
    fn has_property(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

type Resolver = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;
type Presence = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// An object whose properties are resolved by a closure rather than stored
/// as fields.
///
/// By default a property exists whenever the resolver yields a value. Use
/// [`DynamicObject::with_presence`] when the object reports existence
/// differently from how it resolves values.
#[derive(Clone)]
pub struct DynamicObject {
    resolver: Resolver,
    presence: Option<Presence>,
}

impl DynamicObject {
    pub fn new(resolver: impl Fn(&str) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
            presence: None,
        }
    }

    pub fn with_presence(mut self, presence: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.presence = Some(Arc::new(presence));
        self
    }
}

impl PropertyAccess for DynamicObject {
    fn has_property(&self, name: &str) -> bool {
        match &self.presence {
            Some(presence) => presence(name),
            None => (self.resolver)(name).is_some(),
        }
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        (self.resolver)(name)
    }
}

pub type Callable = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Anything a step can remember for later steps.
#[derive(Clone)]
pub enum Thing {
    /// Plain data: strings, numbers, lists and JSON objects.
    Value(Value),
    /// An object exposing properties through [`PropertyAccess`].
    Object(Arc<dyn PropertyAccess>),
    /// A stored function. Never a valid source of properties.
    Callable(Callable),
}

impl Thing {
    pub fn object(object: impl PropertyAccess + 'static) -> Self {
        Thing::Object(Arc::new(object))
    }

    pub fn callable(f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Thing::Callable(Arc::new(f))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Thing::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Objects and associative structures (JSON objects and lists).
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            Thing::Object(_) | Thing::Value(Value::Object(_)) | Thing::Value(Value::Array(_))
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Thing::Callable(_))
    }

    pub fn has_property(&self, name: &str) -> bool {
        match self {
            Thing::Value(Value::Object(map)) => map.has_property(name),
            Thing::Value(Value::Array(items)) => list_index(name).is_some_and(|i| i < items.len()),
            Thing::Object(object) => object.has_property(name),
            _ => false,
        }
    }

    pub fn get_property(&self, name: &str) -> Option<Value> {
        match self {
            Thing::Value(Value::Object(map)) => map.get_property(name),
            Thing::Value(Value::Array(items)) => list_index(name).and_then(|i| items.get(i).cloned()),
            Thing::Object(object) => object.get_property(name),
            _ => None,
        }
    }

    /// Short name of the kind of thing, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Thing::Value(Value::Null) => "null",
            Thing::Value(Value::Bool(_)) => "a boolean",
            Thing::Value(Value::Number(_)) => "a number",
            Thing::Value(Value::String(_)) => "a string",
            Thing::Value(Value::Array(_)) => "a list",
            Thing::Value(Value::Object(_)) => "a record",
            Thing::Object(_) => "an object",
            Thing::Callable(_) => "a function",
        }
    }

    /// Rendering used in assertion messages.
    pub fn describe(&self) -> String {
        match self {
            Thing::Value(value) => value.to_string(),
            Thing::Object(_) => "<object>".to_string(),
            Thing::Callable(_) => "<function>".to_string(),
        }
    }
}

fn list_index(name: &str) -> Option<usize> {
    name.parse().ok()
}

/// String form of a value as it appears after injection.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Debug for Thing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thing::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Thing::Object(_) => f.write_str("Object(..)"),
            Thing::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

impl From<Value> for Thing {
    fn from(value: Value) -> Self {
        Thing::Value(value)
    }
}

impl From<&str> for Thing {
    fn from(value: &str) -> Self {
        Thing::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Thing {
    fn from(value: String) -> Self {
        Thing::Value(Value::String(value))
    }
}

impl From<DynamicObject> for Thing {
    fn from(object: DynamicObject) -> Self {
        Thing::object(object)
    }
}
