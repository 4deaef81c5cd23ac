//! Default native class registry.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bytescript_common::Kind;

use crate::error::{CallError, InvokeError, PropertyError};
use crate::object::{Object, ObjectRef};
use crate::tables::ClassDb;
use crate::value::{Value, Vector2};

/// A native method: receives the object and the call arguments.
pub type NativeMethod = Rc<dyn Fn(&ObjectRef, &[Value]) -> Result<Value, InvokeError>>;

/// Description of one native class.
#[derive(Clone)]
pub struct NativeClass {
    name: Rc<str>,
    parent: Option<Rc<str>>,
    methods: HashMap<String, NativeMethod>,
    properties: HashMap<String, Kind>,
}

impl NativeClass {
    /// A class deriving from `Object`.
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            parent: (name != "Object").then(|| Rc::from("Object")),
            methods: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    pub fn inherits(mut self, parent: &str) -> Self {
        self.parent = Some(Rc::from(parent));
        self
    }

    pub fn method(
        mut self,
        name: &str,
        method: impl Fn(&ObjectRef, &[Value]) -> Result<Value, InvokeError> + 'static,
    ) -> Self {
        self.methods.insert(name.to_string(), Rc::new(method));
        self
    }

    /// Declare a typed property stored on the object.
    pub fn property(mut self, name: &str, kind: Kind) -> Self {
        self.properties.insert(name.to_string(), kind);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NativeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("NativeClass")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("methods", &methods)
            .field("properties", &self.properties)
            .finish()
    }
}

fn default_for(kind: Kind) -> Value {
    match kind {
        Kind::Bool => Value::Bool(false),
        Kind::Int => Value::Int(0),
        Kind::Float => Value::Float(0.0),
        Kind::String => Value::from(""),
        Kind::Vector2 => Value::Vector2(Vector2::default()),
        _ => Value::Nil,
    }
}

/// Registry of native classes keyed by name. `Object` is always present.
#[derive(Debug, Clone)]
pub struct NativeClasses {
    classes: HashMap<Rc<str>, NativeClass>,
}

impl NativeClasses {
    pub fn new() -> Self {
        let object = NativeClass::new("Object")
            .method("get_class", |object, args| {
                if !args.is_empty() {
                    return Err(CallError::TooManyArguments { expected: 0 }.into());
                }
                Ok(Value::from(object.class_name()))
            })
            .method("get_instance_id", |object, args| {
                if !args.is_empty() {
                    return Err(CallError::TooManyArguments { expected: 0 }.into());
                }
                Ok(Value::Int(object.id().get() as i64))
            });
        let mut registry = Self {
            classes: HashMap::new(),
        };
        registry.register(object);
        registry
    }

    /// Add or replace a class.
    pub fn register(&mut self, class: NativeClass) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn with(mut self, class: NativeClass) -> Self {
        self.register(class);
        self
    }

    /// `class` and its ancestors, nearest first. Stops on unknown names and
    /// on cycles.
    fn chain<'a>(&'a self, class: &str) -> impl Iterator<Item = &'a NativeClass> + 'a {
        let mut cursor = self.classes.get(class);
        let mut remaining = self.classes.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let current = cursor?;
            cursor = current.parent.as_deref().and_then(|p| self.classes.get(p));
            Some(current)
        })
    }

    fn find_method(&self, class: &str, method: &str) -> Option<NativeMethod> {
        self.chain(class).find_map(|c| c.methods.get(method).cloned())
    }

    fn find_property(&self, class: &str, name: &str) -> Option<Kind> {
        self.chain(class).find_map(|c| c.properties.get(name).copied())
    }
}

impl Default for NativeClasses {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassDb for NativeClasses {
    fn class_exists(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn is_parent_class(&self, class: &str, parent: &str) -> bool {
        self.chain(class).any(|c| &*c.name == parent)
    }

    fn has_method(&self, class: &str, method: &str) -> bool {
        self.find_method(class, method).is_some()
    }

    fn call_method(
        &self,
        object: &ObjectRef,
        method: &str,
        args: &[Value],
    ) -> Result<Value, InvokeError> {
        let method = self
            .find_method(object.class_name(), method)
            .ok_or(CallError::InvalidMethod)?;
        method(object, args)
    }

    fn get_property(&self, object: &Object, name: &str) -> Option<Value> {
        let kind = self.find_property(object.class_name(), name)?;
        Some(object.property(name).unwrap_or_else(|| default_for(kind)))
    }

    fn set_property(&self, object: &Object, name: &str, value: &Value) -> Result<(), PropertyError> {
        let kind = self
            .find_property(object.class_name(), name)
            .ok_or(PropertyError::Missing)?;
        let value = match (kind, value) {
            (Kind::Nil, v) => v.clone(),
            (Kind::Float, Value::Int(i)) => Value::Float(*i as f64),
            (k, v) if v.kind() == k => v.clone(),
            _ => return Err(PropertyError::InvalidType),
        };
        object.set_property(name, value);
        Ok(())
    }
}
