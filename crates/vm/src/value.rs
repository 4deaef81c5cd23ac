//! The dynamic value model.
//!
//! [`Value`] is a closed tagged union. Scalars are stored inline; arrays and
//! dictionaries are shared handles, so cloning a value never deep-copies a
//! container. Objects, classes and continuations are `Rc` handles as well.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;

use bytescript_common::Kind;

use crate::continuation::Continuation;
use crate::object::{ClassRef, ObjectRef};

/// Two-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

/// Shared, growable list of values.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Replace the element at `index`. Returns false when out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    pub fn pop(&self) -> Option<Value> {
        self.0.borrow_mut().pop()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.borrow().iter().any(|v| v == value)
    }

    pub fn items(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

/// Shared key/value table. Keys keep insertion order and are compared with
/// value equality.
#[derive(Clone, Default)]
pub struct Dictionary(Rc<RefCell<Vec<(Value, Value)>>>);

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.borrow().iter().any(|(k, _)| k == key)
    }

    /// Index of `key`. Keys may be dictionaries that compare against this
    /// one, so the entries are only borrowed shared here.
    fn position(&self, key: &Value) -> Option<usize> {
        self.0.borrow().iter().position(|(k, _)| k == key)
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&self, key: Value, value: Value) {
        match self.position(&key) {
            Some(pos) => {
                let old = mem::replace(&mut self.0.borrow_mut()[pos].1, value);
                drop(old);
            }
            None => self.0.borrow_mut().push((key, value)),
        }
    }

    pub fn remove(&self, key: &Value) -> Option<Value> {
        let pos = self.position(key)?;
        let (_, value) = self.0.borrow_mut().remove(pos);
        Some(value)
    }

    pub fn keys(&self) -> Vec<Value> {
        self.0.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.0.borrow().iter().map(|(_, v)| v.clone()).collect()
    }

    fn key_at(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).map(|(k, _)| k.clone())
    }

    pub fn ptr_eq(&self, other: &Dictionary) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (self.0.borrow(), other.0.borrow());
        a.len() == b.len()
            && a.iter()
                .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.borrow().iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// A dynamically typed script value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<str>),
    Vector2(Vector2),
    Array(Array),
    Dictionary(Dictionary),
    /// `None` is the null instance.
    Object(Option<ObjectRef>),
    Class(ClassRef),
    Continuation(Continuation),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Vector2(_) => Kind::Vector2,
            Value::Array(_) => Kind::Array,
            Value::Dictionary(_) => Kind::Dictionary,
            Value::Object(_) => Kind::Object,
            Value::Class(_) => Kind::Class,
            Value::Continuation(_) => Kind::Continuation,
        }
    }

    /// Type name used in diagnostics. Objects report their class, with the
    /// script file in parentheses when scripted.
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(None) => "null instance".to_string(),
            Value::Object(Some(object)) => match object.script() {
                Some(script) => format!("{} ({})", object.class_name(), script.file_name()),
                None => object.class_name().to_string(),
            },
            other => other.kind().name().to_string(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Truth value for conditionals. `None` when the kind has none.
    pub fn booleanize(&self) -> Option<bool> {
        match self {
            Value::Nil => Some(false),
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::String(s) => Some(!s.is_empty()),
            Value::Object(o) => Some(o.is_some()),
            Value::Vector2(_)
            | Value::Array(_)
            | Value::Dictionary(_)
            | Value::Class(_)
            | Value::Continuation(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as a float; ints are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(Some(o)) => Some(o),
            _ => None,
        }
    }

    pub fn as_continuation(&self) -> Option<&Continuation> {
        match self {
            Value::Continuation(c) => Some(c),
            _ => None,
        }
    }

    // ---- Keyed access ----

    /// Keyed load. `None` when the base does not support the index.
    pub fn get(&self, index: &Value) -> Option<Value> {
        match (self, index) {
            (Value::Array(array), Value::Int(i)) => {
                wrap_index(*i, array.len()).and_then(|i| array.get(i))
            }
            (Value::Dictionary(dict), key) => dict.get(key),
            (Value::String(s), Value::Int(i)) => {
                let count = s.chars().count();
                let i = wrap_index(*i, count)?;
                s.chars().nth(i).map(|c| Value::from(c.to_string()))
            }
            (Value::Vector2(v), Value::Int(0)) => Some(Value::Float(v.x)),
            (Value::Vector2(v), Value::Int(1)) => Some(Value::Float(v.y)),
            (Value::Vector2(_), Value::String(name)) => self.get_named(name),
            (Value::Object(Some(_)), Value::String(name)) => self.get_named(name),
            _ => None,
        }
    }

    /// Keyed store. Returns false when the base does not support the index.
    pub fn set(&mut self, index: &Value, value: Value) -> bool {
        if let (Value::Vector2(_) | Value::Object(Some(_)), Value::String(name)) = (&*self, index) {
            let name = name.clone();
            return self.set_named(&name, value);
        }
        match (self, index) {
            (Value::Array(array), Value::Int(i)) => match wrap_index(*i, array.len()) {
                Some(i) => array.set(i, value),
                None => false,
            },
            (Value::Dictionary(dict), key) => {
                dict.insert(key.clone(), value);
                true
            }
            (Value::Vector2(v), Value::Int(i)) => match (*i, value.as_float()) {
                (0, Some(f)) => {
                    v.x = f;
                    true
                }
                (1, Some(f)) => {
                    v.y = f;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Load by name: vector components, string dictionary keys, script
    /// members and dynamic properties of objects.
    pub fn get_named(&self, name: &str) -> Option<Value> {
        match self {
            Value::Vector2(v) => match name {
                "x" => Some(Value::Float(v.x)),
                "y" => Some(Value::Float(v.y)),
                _ => None,
            },
            Value::Dictionary(dict) => dict.get(&Value::from(name)),
            Value::Object(Some(object)) => object
                .member_by_name(name)
                .or_else(|| object.property(name)),
            _ => None,
        }
    }

    /// Store by name. Returns false when the name is not settable.
    pub fn set_named(&mut self, name: &str, value: Value) -> bool {
        match self {
            Value::Vector2(v) => match (name, value.as_float()) {
                ("x", Some(f)) => {
                    v.x = f;
                    true
                }
                ("y", Some(f)) => {
                    v.y = f;
                    true
                }
                _ => false,
            },
            Value::Dictionary(dict) => {
                dict.insert(Value::from(name), value);
                true
            }
            Value::Object(Some(object)) => {
                if object.set_member_by_name(name, value.clone()) {
                    return true;
                }
                object.set_property(name, value);
                true
            }
            _ => false,
        }
    }

    // ---- Iteration ----

    /// Start iterating. `None` when the kind is not iterable, `Some(false)`
    /// when it is empty. On success `counter` holds the first position.
    pub fn iter_init(&self, counter: &mut Value) -> Option<bool> {
        let len = self.iteration_len()?;
        if len == 0 {
            return Some(false);
        }
        *counter = Value::Int(0);
        Some(true)
    }

    /// Advance `counter`. `Some(false)` once the elements are exhausted.
    pub fn iter_next(&self, counter: &mut Value) -> Option<bool> {
        let len = self.iteration_len()?;
        let next = counter.as_int()? + 1;
        if next < 0 || next as usize >= len {
            return Some(false);
        }
        *counter = Value::Int(next);
        Some(true)
    }

    /// The element at `counter`: characters, array elements or dictionary keys.
    pub fn iter_get(&self, counter: &Value) -> Option<Value> {
        let index = usize::try_from(counter.as_int()?).ok()?;
        match self {
            Value::String(s) => s.chars().nth(index).map(|c| Value::from(c.to_string())),
            Value::Array(array) => array.get(index),
            Value::Dictionary(dict) => dict.key_at(index),
            _ => None,
        }
    }

    fn iteration_len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(array) => Some(array.len()),
            Value::Dictionary(dict) => Some(dict.len()),
            _ => None,
        }
    }
}

/// Resolve a possibly negative index against `len`.
fn wrap_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        Some(index as usize)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vector2(a), Value::Vector2(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dictionary(a), Value::Dictionary(b)) => a == b,
            (Value::Object(None), Value::Object(None)) => true,
            (Value::Object(Some(a)), Value::Object(Some(b))) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Continuation(a), Value::Continuation(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Null"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Vector2(v) => write!(f, "({}, {})", v.x, v.y),
            Value::Array(array) => {
                f.write_str("[")?;
                for (i, item) in array.items().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Dictionary(dict) => {
                f.write_str("{")?;
                for (i, (k, v)) in dict.0.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("}")
            }
            Value::Object(None) => f.write_str("[Object:null]"),
            Value::Object(Some(object)) => write!(f, "[{}:{}]", object.class_name(), object.id()),
            Value::Class(class) => write!(f, "[{}]", class.name()),
            Value::Continuation(_) => f.write_str("[Continuation]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Vector2> for Value {
    fn from(v: Vector2) -> Self {
        Value::Vector2(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::new(items))
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(Some(object))
    }
}

impl From<Continuation> for Value {
    fn from(c: Continuation) -> Self {
        Value::Continuation(c)
    }
}
