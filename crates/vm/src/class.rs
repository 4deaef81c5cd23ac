//! Script classes and the lookups the interpreter performs on them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::BuildError;
use crate::function::{Function, FunctionBuilder};
use crate::value::Value;

/// A compiled script class.
///
/// `base` is the script this class extends; `native` names the registry
/// class at the root of the chain; `owner` is the enclosing class of an inner
/// class. Member slot indices continue the base class numbering.
pub struct ScriptClass {
    name: Rc<str>,
    path: Rc<str>,
    base: Option<Rc<ScriptClass>>,
    native: Option<Rc<str>>,
    owner: Option<Weak<ScriptClass>>,
    constants: HashMap<String, Value>,
    members: Vec<Rc<str>>,
    functions: HashMap<String, Rc<Function>>,
    signals: BTreeSet<String>,
}

impl ScriptClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path component, e.g. `player.gd` for `res://actors/player.gd`.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn base(&self) -> Option<&Rc<ScriptClass>> {
        self.base.as_ref()
    }

    pub fn owner(&self) -> Option<Rc<ScriptClass>> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    /// The native class the chain extends.
    pub fn native_class(&self) -> Option<Rc<str>> {
        let mut cursor = Some(self);
        while let Some(class) = cursor {
            if let Some(native) = &class.native {
                return Some(native.clone());
            }
            cursor = class.base.as_deref();
        }
        None
    }

    /// Total member slots, including inherited ones.
    pub fn member_count(&self) -> usize {
        self.base.as_ref().map_or(0, |b| b.member_count()) + self.members.len()
    }

    /// Slot index of member `name`, searching this class first.
    pub fn member_index(&self, name: &str) -> Option<usize> {
        let mut cursor = Some(self);
        while let Some(class) = cursor {
            if let Some(pos) = class.members.iter().position(|m| &**m == name) {
                let inherited = class.base.as_ref().map_or(0, |b| b.member_count());
                return Some(inherited + pos);
            }
            cursor = class.base.as_deref();
        }
        None
    }

    /// A function declared directly on this class.
    pub fn function(&self, name: &str) -> Option<&Rc<Function>> {
        self.functions.get(name)
    }

    /// The nearest function named `name` along the inheritance chain.
    pub fn find_function(&self, name: &str) -> Option<Rc<Function>> {
        let mut cursor = Some(self);
        while let Some(class) = cursor {
            if let Some(function) = class.functions.get(name) {
                return Some(function.clone());
            }
            cursor = class.base.as_deref();
        }
        None
    }

    pub fn has_signal(&self, name: &str) -> bool {
        let mut cursor = Some(self);
        while let Some(class) = cursor {
            if class.signals.contains(name) {
                return true;
            }
            cursor = class.base.as_deref();
        }
        false
    }

    /// True when `other` is this class or one of its ancestors.
    pub fn inherits(&self, other: &Rc<ScriptClass>) -> bool {
        let mut cursor = Some(self);
        while let Some(class) = cursor {
            if std::ptr::eq(class, Rc::as_ptr(other)) {
                return true;
            }
            cursor = class.base.as_deref();
        }
        false
    }
}

impl fmt::Debug for ScriptClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptClass")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Class constant lookup used by the `ClassConstant` address space.
pub trait ResolvesConstants {
    /// Search this class and its ancestors, then each enclosing class and its
    /// ancestors. The nearest definition wins.
    fn resolve_constant(&self, name: &str) -> Option<Value>;
}

impl ResolvesConstants for ScriptClass {
    fn resolve_constant(&self, name: &str) -> Option<Value> {
        if let Some(value) = constant_in_chain(self, name) {
            return Some(value);
        }
        let mut owner = self.owner();
        while let Some(class) = owner {
            if let Some(value) = constant_in_chain(&class, name) {
                return Some(value);
            }
            owner = class.owner();
        }
        None
    }
}

fn constant_in_chain(class: &ScriptClass, name: &str) -> Option<Value> {
    let mut cursor = Some(class);
    while let Some(class) = cursor {
        if let Some(value) = class.constants.get(name) {
            return Some(value.clone());
        }
        cursor = class.base.as_deref();
    }
    None
}

/// Where a `super`-style call lands.
#[derive(Debug, Clone)]
pub enum BaseMethod {
    Script(Rc<Function>),
    /// Not scripted; the named native class may implement it.
    Native(Rc<str>),
    Missing,
}

/// Base-chain dispatch used by `CALL_SELF_BASE`.
pub trait ResolvesBaseMethod {
    /// Search the ancestors of this class (not the class itself). When no
    /// script defines `name`, fall through to the native class at the root.
    fn resolve_base_method(&self, name: &str) -> BaseMethod;
}

impl ResolvesBaseMethod for ScriptClass {
    fn resolve_base_method(&self, name: &str) -> BaseMethod {
        let mut native = self.native.clone();
        let mut cursor = self.base.clone();
        while let Some(class) = cursor {
            if let Some(function) = class.functions.get(name) {
                return BaseMethod::Script(function.clone());
            }
            native = class.native.clone();
            cursor = class.base.clone();
        }
        match native {
            Some(native) => BaseMethod::Native(native),
            None => BaseMethod::Missing,
        }
    }
}

/// Assembles a [`ScriptClass`] and wires each of its functions back to it.
#[derive(Debug, Default)]
pub struct ScriptClassBuilder {
    name: String,
    path: String,
    base: Option<Rc<ScriptClass>>,
    native: Option<String>,
    owner: Option<Weak<ScriptClass>>,
    constants: HashMap<String, Value>,
    members: Vec<Rc<str>>,
    functions: Vec<FunctionBuilder>,
    signals: BTreeSet<String>,
}

impl ScriptClassBuilder {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn base(mut self, base: &Rc<ScriptClass>) -> Self {
        self.base = Some(base.clone());
        self
    }

    pub fn native(mut self, class: &str) -> Self {
        self.native = Some(class.to_string());
        self
    }

    /// Make this an inner class of `owner`.
    pub fn owner(mut self, owner: &Rc<ScriptClass>) -> Self {
        self.owner = Some(Rc::downgrade(owner));
        self
    }

    pub fn constant(mut self, name: &str, value: Value) -> Self {
        self.constants.insert(name.to_string(), value);
        self
    }

    pub fn member(mut self, name: &str) -> Self {
        self.members.push(Rc::from(name));
        self
    }

    pub fn signal(mut self, name: &str) -> Self {
        self.signals.insert(name.to_string());
        self
    }

    /// Add a member function. Its source defaults to the class path.
    pub fn function(mut self, function: FunctionBuilder) -> Self {
        self.functions.push(function);
        self
    }

    pub fn build(self) -> Result<Rc<ScriptClass>, BuildError> {
        let mut functions = Vec::with_capacity(self.functions.len());
        for builder in self.functions {
            let builder = if builder.source_is_empty() {
                builder.source(&self.path)
            } else {
                builder
            };
            functions.push(builder.build()?);
        }

        Ok(Rc::new_cyclic(|me| ScriptClass {
            name: Rc::from(self.name),
            path: Rc::from(self.path),
            base: self.base,
            native: self.native.map(Rc::from),
            owner: self.owner,
            constants: self.constants,
            members: self.members,
            functions: functions
                .into_iter()
                .map(|mut f| {
                    f.script = Some(me.clone());
                    (f.name().to_string(), Rc::new(f))
                })
                .collect(),
            signals: self.signals,
        }))
    }
}
