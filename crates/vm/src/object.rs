//! Object handles and class references.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::class::ScriptClass;
use crate::value::Value;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique object identity. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared handle to an object.
pub type ObjectRef = Rc<Object>;

/// A native object, optionally carrying a script instance.
///
/// Script instances get one member slot per member declared along their
/// script chain. Native properties live in a name-keyed table whose shape is
/// enforced by the class registry, not by the object itself.
pub struct Object {
    id: ObjectId,
    class_name: Rc<str>,
    script: Option<Rc<ScriptClass>>,
    members: RefCell<Vec<Value>>,
    properties: RefCell<BTreeMap<String, Value>>,
    signals: RefCell<BTreeSet<String>>,
}

impl Object {
    /// A plain native object of class `class_name`.
    pub fn new(class_name: impl Into<Rc<str>>) -> ObjectRef {
        Rc::new(Object {
            id: ObjectId::next(),
            class_name: class_name.into(),
            script: None,
            members: RefCell::new(Vec::new()),
            properties: RefCell::new(BTreeMap::new()),
            signals: RefCell::new(BTreeSet::new()),
        })
    }

    /// An instance of `script` with every member slot set to nil.
    ///
    /// The native class is the one the script chain extends, or `Object`.
    pub fn instance(script: &Rc<ScriptClass>) -> ObjectRef {
        let class_name = script
            .native_class()
            .unwrap_or_else(|| Rc::from("Object"));
        Rc::new(Object {
            id: ObjectId::next(),
            class_name,
            script: Some(Rc::clone(script)),
            members: RefCell::new(vec![Value::Nil; script.member_count()]),
            properties: RefCell::new(BTreeMap::new()),
            signals: RefCell::new(BTreeSet::new()),
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn script(&self) -> Option<&Rc<ScriptClass>> {
        self.script.as_ref()
    }

    pub fn member_count(&self) -> usize {
        self.members.borrow().len()
    }

    pub fn member(&self, index: usize) -> Option<Value> {
        self.members.borrow().get(index).cloned()
    }

    /// Store into member slot `index`. Returns false when out of range.
    pub fn set_member(&self, index: usize, value: Value) -> bool {
        match self.members.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn member_by_name(&self, name: &str) -> Option<Value> {
        let index = self.script.as_ref()?.member_index(name)?;
        self.member(index)
    }

    pub fn set_member_by_name(&self, name: &str, value: Value) -> bool {
        match self.script.as_ref().and_then(|s| s.member_index(name)) {
            Some(index) => self.set_member(index, value),
            None => false,
        }
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.properties.borrow().get(name).cloned()
    }

    pub fn set_property(&self, name: &str, value: Value) {
        self.properties.borrow_mut().insert(name.to_string(), value);
    }

    /// Declare a user signal on this object.
    pub fn add_user_signal(&self, name: &str) {
        self.signals.borrow_mut().insert(name.to_string());
    }

    /// True when the object or its script chain declares `name`.
    pub fn has_signal(&self, name: &str) -> bool {
        self.signals.borrow().contains(name)
            || self.script.as_ref().is_some_and(|s| s.has_signal(name))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("class_name", &self.class_name)
            .field("scripted", &self.script.is_some())
            .finish()
    }
}

/// A class usable as a value: the target of `extends` tests and `new`.
#[derive(Debug, Clone)]
pub enum ClassRef {
    Script(Rc<ScriptClass>),
    /// A class known to the native class registry.
    Native(Rc<str>),
}

impl ClassRef {
    pub fn name(&self) -> &str {
        match self {
            ClassRef::Script(script) if !script.name().is_empty() => script.name(),
            ClassRef::Script(script) => script.path(),
            ClassRef::Native(name) => name,
        }
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ClassRef::Script(a), ClassRef::Script(b)) => Rc::ptr_eq(a, b),
            (ClassRef::Native(a), ClassRef::Native(b)) => a == b,
            _ => false,
        }
    }
}
