//! Interfaces to the collaborators the interpreter calls out to.
//!
//! The VM owns one implementation of each table. Defaults live in
//! [`builtins`](crate::builtins), [`classdb`](crate::classdb),
//! [`signals`](crate::signals) and [`debug`](crate::debug).

use std::rc::Rc;

use bytescript_common::{BuiltinFunction, Kind, Operator};

use crate::continuation::Continuation;
use crate::error::{InvokeError, OperatorError, PropertyError, ScriptError};
use crate::object::{Object, ObjectId, ObjectRef};
use crate::value::Value;

/// Operators, constructors, methods and free functions of the built-in kinds.
pub trait Builtins {
    /// Evaluate `op`. Unary operators ignore `b`.
    fn evaluate(&self, op: Operator, a: &Value, b: &Value) -> Result<Value, OperatorError>;

    /// Construct a value of `kind` using constructor `overload`.
    fn construct(&self, kind: Kind, overload: u32, args: &[Value]) -> Result<Value, InvokeError>;

    /// Release whatever `value` holds. The slot is reset to nil afterwards.
    fn destruct(&self, value: &mut Value) {
        *value = Value::Nil;
    }

    /// Call a method on a non-object value.
    fn call_method(&self, base: &Value, method: &str, args: &[Value]) -> Result<Value, InvokeError>;

    fn has_method(&self, kind: Kind, method: &str) -> bool;

    /// Call a built-in free function.
    fn call_function(&self, func: BuiltinFunction, args: &[Value]) -> Result<Value, InvokeError>;
}

/// Native class registry.
pub trait ClassDb {
    fn class_exists(&self, class: &str) -> bool;

    /// True when `class` is `parent` or derives from it.
    fn is_parent_class(&self, class: &str, parent: &str) -> bool;

    fn has_method(&self, class: &str, method: &str) -> bool;

    fn call_method(
        &self,
        object: &ObjectRef,
        method: &str,
        args: &[Value],
    ) -> Result<Value, InvokeError>;

    /// `None` when the class declares no such property.
    fn get_property(&self, object: &Object, name: &str) -> Option<Value>;

    fn set_property(&self, object: &Object, name: &str, value: &Value) -> Result<(), PropertyError>;
}

/// One-shot event registrations used by signal yields.
pub trait EventHub {
    /// Arrange for `continuation` to be resumed the next time `target` emits
    /// `event`. Returns false when the registration is refused.
    fn register_one_shot(&mut self, target: &ObjectRef, event: &str, continuation: Continuation)
        -> bool;

    /// Remove and return every registration for `event` on `target`.
    fn take(&mut self, target: ObjectId, event: &str) -> Vec<Continuation>;
}

/// What the debugger sees when execution stops.
#[derive(Debug, Clone)]
pub struct BreakContext<'a> {
    pub reason: &'a str,
    pub function: &'a str,
    pub source: &'a str,
    pub line: u32,
    /// Visible locals in scope order, with their current values.
    pub locals: Vec<(Rc<str>, Value)>,
}

/// Synchronous debugger hooks.
///
/// Stepping is driven by two counters the debugger owns: `lines_left` and
/// `depth`. A negative `lines_left` means not stepping.
pub trait Debugger {
    /// A runtime error was raised. Return true when the debugger handled it;
    /// otherwise the VM logs it.
    fn on_error(&mut self, error: &ScriptError) -> bool;

    /// Execution stopped at a breakpoint or a step.
    fn on_break(&mut self, context: &BreakContext<'_>);

    fn is_breakpoint(&self, line: u32, source: &str) -> bool;

    fn lines_left(&self) -> i32;
    fn set_lines_left(&mut self, lines: i32);
    fn depth(&self) -> i32;
    fn set_depth(&mut self, depth: i32);

    /// Called after every line marker.
    fn line_poll(&mut self) {}

    /// Account for a line marker while stepping. Returns true when the step
    /// is complete and execution should break.
    fn should_step(&mut self) -> bool {
        if self.lines_left() <= 0 {
            return false;
        }
        if self.depth() <= 0 {
            self.set_lines_left(self.lines_left() - 1);
        }
        self.lines_left() <= 0
    }

    /// A function was entered.
    fn enter_function(&mut self, _function: &str) {
        if self.lines_left() > 0 && self.depth() >= 0 {
            self.set_depth(self.depth() + 1);
        }
    }

    /// A function returned, suspended or failed.
    fn exit_function(&mut self) {
        if self.lines_left() > 0 && self.depth() >= 0 {
            self.set_depth(self.depth() - 1);
        }
    }
}
