//! Entry points for running script functions and dispatching method calls.

use std::rc::Rc;

use bytescript_common::Kind;

use crate::class::ScriptClass;
use crate::continuation::Continuation;
use crate::error::{CallError, InvokeError, ScriptError};
use crate::frame::Frame;
use crate::function::Function;
use crate::machine::Vm;
use crate::object::{ClassRef, Object, ObjectRef};
use crate::value::Value;

/// How an invocation ended.
#[derive(Debug, Clone)]
pub enum Completion {
    Returned(Value),
    /// The function suspended; resume through the handle.
    Suspended(Continuation),
    /// A runtime error was raised and reported.
    Failed(ScriptError),
}

impl Completion {
    /// The value a caller sees: the return value, the continuation itself
    /// when suspended, nil after a failure.
    pub fn into_value(self) -> Value {
        match self {
            Completion::Returned(value) => value,
            Completion::Suspended(continuation) => Value::Continuation(continuation),
            Completion::Failed(_) => Value::Nil,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, Completion::Suspended(_))
    }

    pub fn error(&self) -> Option<&ScriptError> {
        match self {
            Completion::Failed(error) => Some(error),
            _ => None,
        }
    }
}

fn split_method_name(args: &[Value]) -> Result<(&str, &[Value]), CallError> {
    match args.split_first() {
        Some((Value::String(name), rest)) => Ok((&**name, rest)),
        Some(_) => Err(CallError::InvalidArgument {
            argument: 0,
            expected: Kind::String,
        }),
        None => Err(CallError::TooFewArguments { expected: 1 }),
    }
}

impl Vm {
    /// Call `function` and return its value.
    ///
    /// A suspended function yields `Value::Continuation`. A function that
    /// raised a runtime error yields nil; the error has already gone to the
    /// debugger or the log.
    pub fn call(
        &mut self,
        function: &Rc<Function>,
        receiver: Option<&ObjectRef>,
        args: &[Value],
    ) -> Result<Value, CallError> {
        self.invoke(function, receiver, args)
            .map(Completion::into_value)
    }

    /// Like [`Vm::call`], but reports how the invocation ended.
    pub fn invoke(
        &mut self,
        function: &Rc<Function>,
        receiver: Option<&ObjectRef>,
        args: &[Value],
    ) -> Result<Completion, CallError> {
        let frame = Frame::bind(function, receiver, args)?;
        Ok(self.execute(frame))
    }

    /// Create an instance of `class` and run the nearest `_init` with `args`.
    pub fn instantiate(
        &mut self,
        class: &Rc<ScriptClass>,
        args: &[Value],
    ) -> Result<ObjectRef, CallError> {
        let object = Object::instance(class);
        match class.find_function("_init") {
            Some(init) => {
                self.invoke(&init, Some(&object), args)?;
            }
            None if !args.is_empty() => {
                return Err(CallError::TooManyArguments { expected: 0 });
            }
            None => {}
        }
        Ok(object)
    }

    /// Dispatch `method` on any value.
    ///
    /// `call` re-dispatches using its first argument as the method name.
    /// Continuations answer `resume` and `is_valid`; classes answer `new`;
    /// scripted objects run their script functions first, then the class
    /// registry. Other kinds go to the built-in method table.
    pub fn call_method(
        &mut self,
        base: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, InvokeError> {
        if method == "call" {
            let (method, rest) = split_method_name(args)?;
            return self.call_method(base, method, rest);
        }

        match base {
            Value::Continuation(continuation) => match method {
                "resume" => {
                    if args.len() > 1 {
                        return Err(CallError::TooManyArguments { expected: 1 }.into());
                    }
                    let value = args.first().cloned().unwrap_or_default();
                    continuation
                        .resume(self, value)
                        .map_err(|e| InvokeError::Failed(e.to_string()))
                }
                "is_valid" => {
                    if !args.is_empty() {
                        return Err(CallError::TooManyArguments { expected: 0 }.into());
                    }
                    Ok(Value::Bool(continuation.is_valid()))
                }
                _ => Err(CallError::InvalidMethod.into()),
            },
            Value::Class(ClassRef::Script(class)) if method == "new" => {
                Ok(Value::from(self.instantiate(class, args)?))
            }
            Value::Class(ClassRef::Native(name))
                if method == "new" && self.class_db.class_exists(name) =>
            {
                if !args.is_empty() {
                    return Err(CallError::TooManyArguments { expected: 0 }.into());
                }
                Ok(Value::from(Object::new(name.clone())))
            }
            Value::Class(_) => Err(CallError::InvalidMethod.into()),
            Value::Object(None) => Err(CallError::InstanceIsNull.into()),
            Value::Object(Some(object)) => self.call_object_method(object, method, args),
            _ => self.builtins.call_method(base, method, args),
        }
    }

    fn call_object_method(
        &mut self,
        object: &ObjectRef,
        method: &str,
        args: &[Value],
    ) -> Result<Value, InvokeError> {
        if let Some(function) = object.script().and_then(|s| s.find_function(method)) {
            return Ok(self.invoke(&function, Some(object), args)?.into_value());
        }
        if method == "emit_signal" {
            let (event, payload) = split_method_name(args)?;
            if !object.has_signal(event) {
                return Err(InvokeError::Failed(format!(
                    "Can't emit non-existing signal \"{event}\"."
                )));
            }
            for result in self.emit_signal(object, event, payload) {
                if let Err(error) = result {
                    tracing::debug!(target: "bytescript::vm::signal", event, %error, "resume failed");
                }
            }
            return Ok(Value::Nil);
        }
        self.class_db.call_method(object, method, args)
    }

    /// True when [`Vm::call_method`] would find `method` on `base`.
    pub fn has_method(&self, base: &Value, method: &str) -> bool {
        match base {
            Value::Object(None) => false,
            _ if method == "call" => true,
            Value::Continuation(_) => matches!(method, "resume" | "is_valid"),
            Value::Class(ClassRef::Script(_)) => method == "new",
            Value::Class(ClassRef::Native(name)) => {
                method == "new" && self.class_db.class_exists(name)
            }
            Value::Object(Some(object)) => {
                object
                    .script()
                    .is_some_and(|s| s.find_function(method).is_some())
                    || method == "emit_signal"
                    || self.class_db.has_method(object.class_name(), method)
            }
            other => self.builtins.has_method(other.kind(), method),
        }
    }
}
