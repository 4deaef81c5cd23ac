//! Suspended invocations.
//!
//! A [`Continuation`] is what a suspending function returns in place of its
//! value. It owns the function's stack slots, the position just past the
//! suspending instruction and weak links to the receiver and script. It can be
//! resumed once; after that, or after [`Continuation::abandon`], it is spent.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::call::Completion;
use crate::class::ScriptClass;
use crate::error::ResumeError;
use crate::frame::Frame;
use crate::function::Function;
use crate::machine::Vm;
use crate::object::{Object, ObjectRef};
use crate::value::Value;

/// Everything needed to rebuild the frame of a suspended function.
#[derive(Debug)]
pub(crate) struct SuspendedState {
    pub(crate) function: Rc<Function>,
    pub(crate) stack: Vec<Value>,
    pub(crate) ip: usize,
    pub(crate) line: u32,
    pub(crate) defarg: usize,
    pub(crate) receiver: Option<Weak<Object>>,
    pub(crate) class: Option<Weak<ScriptClass>>,
}

/// Shared handle to a suspended invocation.
#[derive(Clone, Default)]
pub struct Continuation(Rc<RefCell<Option<SuspendedState>>>);

impl Continuation {
    /// A handle with no state yet. Used to register for an event before the
    /// frame is moved in.
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn fill(&self, state: SuspendedState) {
        *self.0.borrow_mut() = Some(state);
    }

    fn take(&self) -> Option<SuspendedState> {
        self.0.borrow_mut().take()
    }

    /// True while the continuation can still be resumed.
    pub fn is_valid(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Drop the saved state, releasing every stack slot it holds.
    pub fn abandon(&self) {
        drop(self.take());
    }

    pub fn ptr_eq(&self, other: &Continuation) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Name of the suspended function, while valid.
    pub fn function_name(&self) -> Option<String> {
        self.0.borrow().as_ref().map(|s| s.function.name().to_string())
    }

    /// Source line the function was suspended at, while valid.
    pub fn line(&self) -> Option<u32> {
        self.0.borrow().as_ref().map(|s| s.line)
    }

    /// Resume with `value` and return what the function produced: its return
    /// value, a new continuation if it suspended again, or nil if it failed.
    pub fn resume(&self, vm: &mut Vm, value: Value) -> Result<Value, ResumeError> {
        vm.resume(self, value).map(Completion::into_value)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.borrow() {
            Some(state) => f
                .debug_struct("Continuation")
                .field("function", &state.function.name())
                .field("ip", &state.ip)
                .field("line", &state.line)
                .finish(),
            None => f.write_str("Continuation(spent)"),
        }
    }
}

impl Vm {
    /// Resume a suspended invocation.
    ///
    /// The state is consumed before anything else is checked, so a
    /// continuation whose owner is gone is spent afterwards too.
    pub fn resume(
        &mut self,
        continuation: &Continuation,
        value: Value,
    ) -> Result<Completion, ResumeError> {
        let state = continuation.take().ok_or(ResumeError::Spent)?;

        let receiver: Option<ObjectRef> = match &state.receiver {
            Some(weak) => Some(weak.upgrade().ok_or(ResumeError::InstanceGone)?),
            None => None,
        };
        let class = match &state.class {
            Some(weak) => Some(weak.upgrade().ok_or(ResumeError::ScriptGone)?),
            None => None,
        };

        tracing::debug!(
            target: "bytescript::vm::yield",
            function = state.function.name(),
            ip = state.ip,
            "resuming"
        );

        let frame = Frame {
            args: Vec::with_capacity(state.function.call_size()),
            function: state.function,
            stack: state.stack,
            receiver,
            class,
            ip: state.ip,
            line: state.line,
            defarg: state.defarg,
            resume_value: Some(value),
            call_time: Duration::ZERO,
        };
        Ok(self.execute(frame))
    }

    /// Emit `event` on `target`, resuming every continuation waiting on it.
    ///
    /// Registrations are one-shot: they are removed before any resumes, so a
    /// second emission resumes nothing. The payload is nil, the single value,
    /// or an array of all values.
    pub fn emit_signal(
        &mut self,
        target: &ObjectRef,
        event: &str,
        payload: &[Value],
    ) -> Vec<Result<Value, ResumeError>> {
        let pending = self.events.take(target.id(), event);
        if pending.is_empty() {
            tracing::debug!(
                target: "bytescript::vm::signal",
                object = %target.id(),
                event,
                "no continuations waiting"
            );
            return Vec::new();
        }

        let value = match payload {
            [] => Value::Nil,
            [single] => single.clone(),
            many => Value::from(many.to_vec()),
        };

        let mut results = Vec::with_capacity(pending.len());
        for continuation in pending {
            if !continuation.is_valid() {
                tracing::debug!(
                    target: "bytescript::vm::signal",
                    object = %target.id(),
                    event,
                    "skipping spent continuation"
                );
                continue;
            }
            results.push(continuation.resume(self, value.clone()));
        }
        results
    }
}
