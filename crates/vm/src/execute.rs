//! Main execution loop and opcode dispatch.

use std::mem;
use std::rc::Rc;
use std::time::Instant;

use bytescript_common::{BuiltinFunction, Kind, Opcode, Operator};

use crate::call::Completion;
use crate::class::{BaseMethod, ResolvesBaseMethod};
use crate::continuation::{Continuation, SuspendedState};
use crate::error::{CallError, InternalError, InvokeError, OperatorError, PropertyError, RuntimeError, ScriptError};
use crate::frame::Frame;
use crate::machine::Vm;
use crate::object::ClassRef;
use crate::tables::BreakContext;
use crate::value::{Dictionary, Value};

/// What the loop does after an instruction.
pub(crate) enum Flow {
    Continue,
    Return(Value),
    Suspend(Continuation),
}

/// `'text'`, or `of type 'T'` when the value has no printable text.
fn index_text(index: &Value) -> String {
    let text = index.to_string();
    if text.is_empty() {
        format!("of type '{}'", index.type_name())
    } else {
        format!("'{text}'")
    }
}

/// The kind of the argument a call error points at.
fn offending_kind(error: &CallError, args: &[Value]) -> Option<Kind> {
    match error {
        CallError::InvalidArgument { argument, .. } => args.get(*argument).map(Value::kind),
        _ => None,
    }
}

fn invoke_failure(error: InvokeError, place: String, args: &[Value]) -> RuntimeError {
    match error {
        InvokeError::Call(error) => RuntimeError::CallFailed {
            found: offending_kind(&error, args),
            error,
            place,
        },
        InvokeError::Failed(message) => RuntimeError::InvocationFailed { place, message },
    }
}

/// Message for a failed method call. Calls made through `call` name the
/// real method and count arguments from the user-visible list.
fn method_failure(base: &Value, method: &str, args: &[Value], error: InvokeError) -> RuntimeError {
    let (method, args) = match (method, args.split_first()) {
        ("call", Some((Value::String(name), rest))) => (format!("{name} (via call)"), rest),
        _ => (method.to_string(), args),
    };
    let place = format!("function '{method}' in base '{}'", base.type_name());
    invoke_failure(error, place, args)
}

impl Vm {
    /// Run `frame` until it returns, suspends or fails.
    pub(crate) fn execute(&mut self, mut frame: Frame) -> Completion {
        if self.call_depth >= self.config.max_call_depth {
            let error = RuntimeError::StackOverflow(self.call_depth);
            return Completion::Failed(self.report_error(&frame, error));
        }

        self.call_depth += 1;
        let debugger = self.debugger.clone();
        if let Some(debugger) = &debugger {
            debugger.borrow_mut().enter_function(frame.function.name());
        }
        let started = self.config.profiling.then(Instant::now);

        let completion = loop {
            match self.step(&mut frame) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Return(value)) => break Completion::Returned(value),
                Ok(Flow::Suspend(continuation)) => break Completion::Suspended(continuation),
                Err(error) => break Completion::Failed(self.report_error(&frame, error)),
            }
        };

        if let Some(started) = started {
            self.record_profile(&frame.function, started.elapsed(), frame.call_time);
        }
        if let Some(debugger) = &debugger {
            debugger.borrow_mut().exit_function();
        }
        self.call_depth -= 1;
        completion
    }

    /// Execute one instruction. `ip` only moves when the instruction succeeds.
    fn step(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let Some(&word) = frame.function.code().get(frame.ip) else {
            return Ok(Flow::Return(Value::Nil));
        };
        let opcode = Opcode::try_from(word).map_err(|_| InternalError::IllegalOpcode {
            opcode: word,
            ip: frame.ip,
        })?;
        // A resume value is only visible to the instruction right after the
        // suspension point.
        let resume_value = frame.resume_value.take();

        match opcode {
            // Data movement
            Opcode::Operator => self.exec_operator(frame),
            Opcode::ExtendsTest => self.exec_extends_test(frame),
            Opcode::Set => self.exec_set(frame),
            Opcode::Get => self.exec_get(frame),
            Opcode::SetNamed => self.exec_set_named(frame),
            Opcode::GetNamed => self.exec_get_named(frame),
            Opcode::SetMember => self.exec_set_member(frame),
            Opcode::GetMember => self.exec_get_member(frame),
            Opcode::Assign => {
                let value = self.load(frame, frame.word(2)?)?;
                let dst = frame.word(1)?;
                self.write(frame, dst, value)?;
                Ok(advance(frame, 3))
            }
            Opcode::AssignTrue => {
                let dst = frame.word(1)?;
                self.write(frame, dst, Value::Bool(true))?;
                Ok(advance(frame, 2))
            }
            Opcode::AssignFalse => {
                let dst = frame.word(1)?;
                self.write(frame, dst, Value::Bool(false))?;
                Ok(advance(frame, 2))
            }

            // Construction
            Opcode::Construct => self.exec_construct(frame),
            Opcode::Destruct => {
                let target = frame.word(1)?;
                let mut value = self.load(frame, target)?;
                self.builtins.destruct(&mut value);
                self.write(frame, target, value)?;
                Ok(advance(frame, 2))
            }
            Opcode::ConstructArray => self.exec_construct_array(frame),
            Opcode::ConstructDictionary => self.exec_construct_dictionary(frame),

            // Calls
            Opcode::Call => self.exec_call(frame, false),
            Opcode::CallReturn => self.exec_call(frame, true),
            Opcode::CallBuiltIn => self.exec_call_builtin(frame),
            Opcode::CallSelfBase => self.exec_call_self_base(frame),

            // Coroutines
            Opcode::Yield => {
                let resume_ip = frame.ip + 1;
                Ok(self.suspend(frame, Continuation::empty(), resume_ip))
            }
            Opcode::YieldSignal => self.exec_yield_signal(frame),
            Opcode::YieldResume => {
                let value = resume_value.ok_or(RuntimeError::InvalidResume)?;
                let dst = frame.word(1)?;
                self.write(frame, dst, value)?;
                Ok(advance(frame, 2))
            }

            // Control flow
            Opcode::Jump => {
                frame.ip = frame.jump_target(frame.word(1)?)?;
                Ok(Flow::Continue)
            }
            Opcode::JumpIf => self.exec_conditional_jump(frame, true),
            Opcode::JumpIfNot => self.exec_conditional_jump(frame, false),
            Opcode::JumpToDefArgument => {
                let table = frame.function.default_arguments();
                let target = *table.get(frame.defarg).ok_or(
                    InternalError::DefaultArgumentOutOfRange {
                        index: frame.defarg,
                        count: table.len(),
                    },
                )?;
                frame.ip = target;
                Ok(Flow::Continue)
            }
            Opcode::Return => {
                let value = self.load(frame, frame.word(1)?)?;
                Ok(Flow::Return(value))
            }
            Opcode::IterateBegin => self.exec_iterate(frame, true),
            Opcode::Iterate => self.exec_iterate(frame, false),

            // Meta
            Opcode::Assert => {
                let test = self.load(frame, frame.word(1)?)?;
                match test.booleanize() {
                    Some(true) => Ok(advance(frame, 2)),
                    Some(false) => Err(RuntimeError::AssertionFailed),
                    None => Err(RuntimeError::NotBooleanizable(test.kind().name())),
                }
            }
            Opcode::Breakpoint => {
                self.debug_break(frame, "Breakpoint Statement");
                Ok(advance(frame, 1))
            }
            Opcode::Line => self.exec_line(frame),
            Opcode::End => Ok(Flow::Return(Value::Nil)),
        }
    }

    // ---- Data movement ----

    fn exec_operator(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let raw = frame.word(1)?;
        let op = Operator::try_from(raw).map_err(|_| InternalError::BadOperator(raw))?;
        let a = self.load(frame, frame.word(2)?)?;
        let b = self.load(frame, frame.word(3)?)?;
        let result = self.builtins.evaluate(op, &a, &b).map_err(|error| match error {
            OperatorError::InvalidOperands => RuntimeError::InvalidOperands {
                left: a.kind().name(),
                right: b.kind().name(),
                operator: op.symbol(),
            },
            OperatorError::Message(message) => RuntimeError::OperatorFailed {
                message,
                operator: op.symbol(),
            },
        })?;
        let dst = frame.word(4)?;
        self.write(frame, dst, result)?;
        Ok(advance(frame, 5))
    }

    fn exec_extends_test(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let a = self.load(frame, frame.word(1)?)?;
        let b = self.load(frame, frame.word(2)?)?;

        let object = a.as_object().ok_or(RuntimeError::ExtendsLeftNotInstance)?;
        let extends = match &b {
            Value::Class(ClassRef::Script(class)) => {
                object.script().is_some_and(|script| script.inherits(class))
            }
            Value::Class(ClassRef::Native(name)) => {
                self.class_db.is_parent_class(object.class_name(), name)
            }
            Value::Object(Some(other)) => {
                return Err(RuntimeError::ExtendsRightNotClassType(
                    other.class_name().to_string(),
                ))
            }
            _ => return Err(RuntimeError::ExtendsRightNotClass),
        };

        let dst = frame.word(3)?;

        self.write(frame, dst, Value::Bool(extends))?;
        Ok(advance(frame, 4))
    }

    /// Named store on any value. Objects try script members, then the class
    /// registry.
    fn store_named(&self, base: &mut Value, name: &str, value: Value) -> bool {
        match base {
            Value::Object(Some(object)) => {
                object.set_member_by_name(name, value.clone())
                    || self.class_db.set_property(object, name, &value).is_ok()
            }
            _ => base.set_named(name, value),
        }
    }

    fn load_named(&self, base: &Value, name: &str) -> Option<Value> {
        match base {
            Value::Object(Some(object)) => object
                .member_by_name(name)
                .or_else(|| self.class_db.get_property(object, name)),
            _ => base.get_named(name),
        }
    }

    fn exec_set(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let base_word = frame.word(1)?;
        let mut base = self.load(frame, base_word)?;
        let index = self.load(frame, frame.word(2)?)?;
        let value = self.load(frame, frame.word(3)?)?;

        let stored = match index.as_str() {
            Some(name) if matches!(base, Value::Object(Some(_))) => {
                self.store_named(&mut base, name, value)
            }
            _ => base.set(&index, value),
        };
        if !stored {
            return Err(RuntimeError::InvalidSetIndex {
                index: index_text(&index),
                base: base.type_name(),
            });
        }
        // Vectors are held by value; write the updated copy back.
        if matches!(base, Value::Vector2(_)) {
            self.write(frame, base_word, base)?;
        }
        Ok(advance(frame, 4))
    }

    fn exec_get(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let base = self.load(frame, frame.word(1)?)?;
        let index = self.load(frame, frame.word(2)?)?;

        let value = match index.as_str() {
            Some(name) if matches!(base, Value::Object(Some(_))) => self.load_named(&base, name),
            _ => base.get(&index),
        };
        let value = value.ok_or_else(|| RuntimeError::InvalidGetIndex {
            index: index_text(&index),
            base: base.type_name(),
        })?;
        let dst = frame.word(3)?;
        self.write(frame, dst, value)?;
        Ok(advance(frame, 4))
    }

    fn exec_set_named(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let base_word = frame.word(1)?;
        let mut base = self.load(frame, base_word)?;
        let name = frame.name(frame.word(2)? as usize)?;
        let value = self.load(frame, frame.word(3)?)?;

        if !self.store_named(&mut base, &name, value) {
            return Err(RuntimeError::InvalidSetIndex {
                index: format!("'{name}'"),
                base: base.type_name(),
            });
        }
        if matches!(base, Value::Vector2(_)) {
            self.write(frame, base_word, base)?;
        }
        Ok(advance(frame, 4))
    }

    fn exec_get_named(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let base = self.load(frame, frame.word(1)?)?;
        let name = frame.name(frame.word(2)? as usize)?;

        let Some(value) = self.load_named(&base, &name) else {
            if self.has_method(&base, &name) {
                return Err(RuntimeError::InvalidGetIndexMethod {
                    name: name.to_string(),
                    base: base.type_name(),
                });
            }
            return Err(RuntimeError::InvalidGetIndex {
                index: format!("'{name}'"),
                base: base.type_name(),
            });
        };
        let dst = frame.word(3)?;
        self.write(frame, dst, value)?;
        Ok(advance(frame, 4))
    }

    fn exec_set_member(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let name = frame.name(frame.word(1)? as usize)?;
        let value = self.load(frame, frame.word(2)?)?;
        let receiver = frame.receiver.as_ref().ok_or(RuntimeError::SelfWithoutInstance)?;

        match self.class_db.set_property(receiver, &name, &value) {
            Ok(()) => Ok(advance(frame, 3)),
            Err(PropertyError::Missing) => Err(RuntimeError::PropertyMissingOnSet(name.to_string())),
            Err(PropertyError::InvalidType) => Err(RuntimeError::PropertyType {
                name: name.to_string(),
                kind: value.kind().name(),
            }),
        }
    }

    fn exec_get_member(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let name = frame.name(frame.word(1)? as usize)?;
        let receiver = frame.receiver.as_ref().ok_or(RuntimeError::SelfWithoutInstance)?;
        let value = self
            .class_db
            .get_property(receiver, &name)
            .ok_or_else(|| RuntimeError::PropertyMissingOnGet(name.to_string()))?;
        let dst = frame.word(2)?;
        self.write(frame, dst, value)?;
        Ok(advance(frame, 3))
    }

    // ---- Construction ----

    /// Load `argc` operands starting at word `first` into the frame's
    /// scratch buffer. The buffer is handed back once the call is done.
    fn gather_args(
        &self,
        frame: &mut Frame,
        first: usize,
        argc: usize,
    ) -> Result<Vec<Value>, RuntimeError> {
        let capacity = frame.function.call_size();
        if argc > capacity {
            return Err(InternalError::ScratchOverflow { argc, capacity }.into());
        }
        let mut args = mem::take(&mut frame.args);
        args.clear();
        for i in 0..argc {
            args.push(self.load(frame, frame.word(first + i)?)?);
        }
        Ok(args)
    }

    fn load_operands(&self, frame: &Frame, first: usize, count: usize) -> Result<Vec<Value>, RuntimeError> {
        (0..count)
            .map(|i| self.load(frame, frame.word(first + i)?))
            .collect()
    }

    fn exec_construct(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let raw = frame.word(1)?;
        let kind = Kind::try_from(raw).map_err(|_| InternalError::BadKind(raw))?;
        let overload = frame.word(2)?;
        let argc = frame.word(3)? as usize;
        let dst = frame.word(4 + argc)?;
        let args = self.gather_args(frame, 4, argc)?;

        let result = self.builtins.construct(kind, overload, &args);
        let value = match result {
            Ok(value) => value,
            Err(error) => return Err(invoke_failure(error, format!("'{kind}' constructor"), &args)),
        };
        frame.args = args;
        self.write(frame, dst, value)?;
        Ok(advance(frame, 5 + argc))
    }

    fn exec_construct_array(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let argc = frame.word(1)? as usize;
        let dst = frame.word(2 + argc)?;
        let items = self.load_operands(frame, 2, argc)?;
        self.write(frame, dst, Value::from(items))?;
        Ok(advance(frame, 3 + argc))
    }

    fn exec_construct_dictionary(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let pairs = frame.word(1)? as usize;
        let dst = frame.word(2 + pairs * 2)?;
        let words = self.load_operands(frame, 2, pairs * 2)?;
        let dict = Dictionary::new();
        for pair in words.chunks_exact(2) {
            dict.insert(pair[0].clone(), pair[1].clone());
        }
        self.write(frame, dst, Value::Dictionary(dict))?;
        Ok(advance(frame, 3 + pairs * 2))
    }

    // ---- Calls ----

    fn exec_call(&mut self, frame: &mut Frame, keep_result: bool) -> Result<Flow, RuntimeError> {
        let argc = frame.word(1)? as usize;
        let base = self.load(frame, frame.word(2)?)?;
        let method = frame.name(frame.word(3)? as usize)?;
        let dst = if keep_result { Some(frame.word(4 + argc)?) } else { None };
        let args = self.gather_args(frame, 4, argc)?;

        let started = self.config.profiling.then(Instant::now);
        let result = self.call_method(&base, &method, &args);
        if let Some(started) = started {
            frame.call_time += started.elapsed();
        }

        let value = match result {
            Ok(value) => value,
            Err(error) => return Err(method_failure(&base, &method, &args, error)),
        };
        frame.args = args;
        if let Some(dst) = dst {
            self.write(frame, dst, value)?;
        }
        Ok(advance(frame, 4 + argc + usize::from(keep_result)))
    }

    fn exec_call_builtin(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let raw = frame.word(1)?;
        let func = BuiltinFunction::try_from(raw).map_err(|_| InternalError::BadBuiltin(raw))?;
        let argc = frame.word(2)? as usize;
        let dst = frame.word(3 + argc)?;
        let args = self.gather_args(frame, 3, argc)?;

        let value = match self.builtins.call_function(func, &args) {
            Ok(value) => value,
            Err(error) => {
                let place = format!("built-in function '{}'", func.name());
                return Err(invoke_failure(error, place, &args));
            }
        };
        frame.args = args;
        self.write(frame, dst, value)?;
        Ok(advance(frame, 4 + argc))
    }

    fn exec_call_self_base(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let name = frame.name(frame.word(1)? as usize)?;
        let argc = frame.word(2)? as usize;
        let dst = frame.word(3 + argc)?;
        let args = self.gather_args(frame, 3, argc)?;

        // Dispatch starts above the class the function was compiled in, not
        // the receiver's class.
        let class = frame.function.script().ok_or(InternalError::NoClass)?;
        let started = self.config.profiling.then(Instant::now);
        let result = match class.resolve_base_method(&name) {
            BaseMethod::Script(function) => self
                .invoke(&function, frame.receiver.as_ref(), &args)
                .map(Completion::into_value)
                .map_err(InvokeError::from),
            _ if &*name == "_init" => Ok(Value::Nil),
            BaseMethod::Native(native) => match &frame.receiver {
                Some(receiver) if self.class_db.has_method(&native, &name) => {
                    self.class_db.call_method(receiver, &name, &args)
                }
                _ => Err(CallError::InvalidMethod.into()),
            },
            BaseMethod::Missing => Err(CallError::InvalidMethod.into()),
        };
        if let Some(started) = started {
            frame.call_time += started.elapsed();
        }

        let value = match result {
            Ok(value) => value,
            Err(error) => return Err(invoke_failure(error, format!("function '{name}'"), &args)),
        };
        frame.args = args;
        self.write(frame, dst, value)?;
        Ok(advance(frame, 4 + argc))
    }

    // ---- Coroutines ----

    fn exec_yield_signal(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let target = self.load(frame, frame.word(1)?)?;
        let signal = self.load(frame, frame.word(2)?)?;

        let target = match target {
            Value::Object(Some(object)) => object,
            Value::Object(None) => return Err(RuntimeError::YieldTargetNull),
            _ => return Err(RuntimeError::YieldTargetNotObject),
        };
        let signal = signal.as_str().ok_or(RuntimeError::YieldSignalNotString)?;
        if signal.is_empty() {
            return Err(RuntimeError::YieldSignalEmpty);
        }

        // Register before moving anything, so a refusal leaves the frame intact.
        let continuation = Continuation::empty();
        if !self
            .events
            .register_one_shot(&target, signal, continuation.clone())
        {
            return Err(RuntimeError::YieldConnect(signal.to_string()));
        }
        let resume_ip = frame.ip + 3;
        Ok(self.suspend(frame, continuation, resume_ip))
    }

    /// Move the frame's state into `continuation`. Execution resumes at
    /// `resume_ip`.
    fn suspend(&self, frame: &mut Frame, continuation: Continuation, resume_ip: usize) -> Flow {
        tracing::debug!(
            target: "bytescript::vm::yield",
            function = frame.function.name(),
            line = frame.line,
            ip = frame.ip,
            "suspending"
        );
        continuation.fill(SuspendedState {
            function: Rc::clone(&frame.function),
            stack: mem::take(&mut frame.stack),
            ip: resume_ip,
            line: frame.line,
            defarg: frame.defarg,
            receiver: frame.receiver.as_ref().map(Rc::downgrade),
            class: frame.class.as_ref().map(Rc::downgrade),
        });
        Flow::Suspend(continuation)
    }

    // ---- Control flow ----

    fn exec_conditional_jump(&mut self, frame: &mut Frame, when: bool) -> Result<Flow, RuntimeError> {
        let test = self.load(frame, frame.word(1)?)?;
        let truth = test
            .booleanize()
            .ok_or(RuntimeError::NotBooleanizable(test.kind().name()))?;
        if truth == when {
            frame.ip = frame.jump_target(frame.word(2)?)?;
            Ok(Flow::Continue)
        } else {
            Ok(advance(frame, 3))
        }
    }

    fn exec_iterate(&mut self, frame: &mut Frame, begin: bool) -> Result<Flow, RuntimeError> {
        let counter_word = frame.word(1)?;
        let mut counter = self.load(frame, counter_word)?;
        let container = self.load(frame, frame.word(2)?)?;
        let exit = frame.jump_target(frame.word(3)?)?;
        let iterator_word = frame.word(4)?;
        let kind = container.kind().name();

        let more = if begin {
            container
                .iter_init(&mut counter)
                .ok_or(RuntimeError::NotIterable(kind))?
        } else {
            container
                .iter_next(&mut counter)
                .ok_or(RuntimeError::IterationTypeChanged(kind))?
        };
        if !more {
            self.write(frame, counter_word, counter)?;
            frame.ip = exit;
            return Ok(Flow::Continue);
        }

        let item = container.iter_get(&counter).ok_or(if begin {
            RuntimeError::IteratorUnavailable(kind)
        } else {
            RuntimeError::IteratorLost(kind)
        })?;
        self.write(frame, counter_word, counter)?;
        self.write(frame, iterator_word, item)?;
        Ok(advance(frame, 5))
    }

    // ---- Meta ----

    fn exec_line(&mut self, frame: &mut Frame) -> Result<Flow, RuntimeError> {
        let line = frame.word(1)?;
        frame.line = line;
        frame.ip += 2;

        if let Some(debugger) = self.debugger.clone() {
            let stop = {
                let mut debugger = debugger.borrow_mut();
                let stepped = debugger.should_step();
                stepped || debugger.is_breakpoint(line, frame.function.source())
            };
            if stop {
                self.debug_break(frame, "Breakpoint");
            }
            debugger.borrow_mut().line_poll();
        }
        Ok(Flow::Continue)
    }

    fn debug_break(&self, frame: &Frame, reason: &str) {
        let Some(debugger) = &self.debugger else {
            return;
        };
        let context = BreakContext {
            reason,
            function: frame.function.name(),
            source: frame.function.source(),
            line: frame.line,
            locals: frame.locals(),
        };
        debugger.borrow_mut().on_break(&context);
    }

    /// Attribute `error` to the running function and hand it to the debugger,
    /// or log it when no debugger takes it.
    fn report_error(&self, frame: &Frame, error: RuntimeError) -> ScriptError {
        let script = frame.receiver.as_ref().and_then(|object| object.script());
        let file = script
            .map(|s| s.path().to_string())
            .or_else(|| frame.class.as_ref().map(|c| c.path().to_string()))
            .or_else(|| {
                let source = frame.function.source();
                (!source.is_empty()).then(|| source.to_string())
            })
            .unwrap_or_else(|| "<built-in>".to_string());
        let function = match script.filter(|s| !s.name().is_empty()) {
            Some(script) => format!("{}.{}", script.name(), frame.function.name()),
            None => frame.function.name().to_string(),
        };

        let report = ScriptError {
            message: error.to_string(),
            function,
            file,
            line: frame.line,
            ip: frame.ip,
            internal: error.is_internal(),
        };

        let handled = match &self.debugger {
            Some(debugger) => debugger.borrow_mut().on_error(&report),
            None => false,
        };
        if !handled {
            tracing::error!(
                target: "bytescript::vm",
                function = %report.function,
                source = %report.file,
                line = report.line,
                internal = report.internal,
                "{}",
                report.message
            );
        }
        report
    }
}

fn advance(frame: &mut Frame, words: usize) -> Flow {
    frame.ip += words;
    Flow::Continue
}
