//! Suspending with `yield` and resuming through continuations and signals.

mod support;

use std::rc::Rc;

use bytescript_common::{Address, CodeEmitter, Operator};
use bytescript_vm::{
    Completion, Object, ResumeError, ScriptClassBuilder, Value, Vm, VmConfig,
};
use proptest::prelude::*;

use support::{debugged_vm, free, function, single_error};

/// func twice(a): var d = a * 2; var r = yield(); return d + r
fn doubling() -> Rc<bytescript_vm::Function> {
    let mut e = CodeEmitter::new();
    e.line(1)
        .operator(Operator::Multiply, Address::stack(0), Address::constant(0), Address::stack(1))
        .line(2)
        .yield_()
        .yield_resume(Address::stack(2))
        .line(3)
        .operator(Operator::Add, Address::stack(1), Address::stack(2), Address::stack(3))
        .ret(Address::stack(3));
    free(
        function("twice", e)
            .source("res://twice.gd")
            .constants(vec![Value::Int(2)])
            .arguments(1)
            .stack_size(4),
    )
}

/// func wait(target): var v = yield(target, "ready"); return v
fn waiter() -> Rc<bytescript_vm::Function> {
    let mut e = CodeEmitter::new();
    e.yield_signal(Address::stack(0), Address::constant(0))
        .yield_resume(Address::stack(1))
        .ret(Address::stack(1));
    free(
        function("wait", e)
            .constants(vec![Value::from("ready")])
            .arguments(1)
            .stack_size(2),
    )
}

#[test]
fn locals_survive_a_suspension() {
    let mut vm = Vm::default();
    let suspended = vm.invoke(&doubling(), None, &[Value::Int(5)]).unwrap();
    let Completion::Suspended(continuation) = suspended else {
        panic!("expected a suspension, got {suspended:?}");
    };
    assert!(continuation.is_valid());
    assert_eq!(continuation.function_name().as_deref(), Some("twice"));
    assert_eq!(continuation.line(), Some(2));
    assert_eq!(vm.call_depth(), 0);

    assert_eq!(continuation.resume(&mut vm, Value::Int(7)), Ok(Value::Int(17)));
    assert!(!continuation.is_valid());
}

#[test]
fn a_spent_continuation_cannot_resume() {
    let mut vm = Vm::default();
    let value = vm.call(&doubling(), None, &[Value::Int(1)]).unwrap();
    let continuation = value.as_continuation().unwrap().clone();

    continuation.resume(&mut vm, Value::Int(0)).unwrap();
    assert_eq!(
        continuation.resume(&mut vm, Value::Int(0)),
        Err(ResumeError::Spent)
    );
    assert_eq!(
        vm.call_method(&value, "is_valid", &[]),
        Ok(Value::Bool(false))
    );
}

#[test]
fn continuations_resume_through_their_methods() {
    let mut vm = Vm::default();
    let value = vm.call(&doubling(), None, &[Value::Int(4)]).unwrap();
    assert!(vm.has_method(&value, "resume"));
    assert_eq!(
        vm.call_method(&value, "resume", &[Value::Int(1)]),
        Ok(Value::Int(9))
    );
}

#[test]
fn yielding_again_returns_a_fresh_continuation() {
    // func count(): var a = yield(); var b = yield(); return a + b
    let mut e = CodeEmitter::new();
    e.yield_()
        .yield_resume(Address::stack(0))
        .yield_()
        .yield_resume(Address::stack(1))
        .operator(Operator::Add, Address::stack(0), Address::stack(1), Address::stack(2))
        .ret(Address::stack(2));
    let count = free(function("count", e).stack_size(3));

    let mut vm = Vm::default();
    let first = vm.call(&count, None, &[]).unwrap();
    let first = first.as_continuation().unwrap();
    let second = first.resume(&mut vm, Value::Int(10)).unwrap();
    let second = second.as_continuation().unwrap();
    assert!(!first.ptr_eq(second));
    assert!(!first.is_valid());
    assert_eq!(second.resume(&mut vm, Value::Int(5)), Ok(Value::Int(15)));
}

#[test]
fn a_suspended_callee_hands_its_continuation_to_the_caller() {
    let mut e = CodeEmitter::new();
    e.yield_().yield_resume(Address::stack(0)).ret(Address::stack(0));
    let class = ScriptClassBuilder::new("Job", "res://job.gd")
        .function(function("step", e).stack_size(1))
        .build()
        .unwrap();

    // func run(job): return job.step()
    let mut e = CodeEmitter::new();
    e.call_return(Address::stack(0), 0, &[], Address::stack(1))
        .ret(Address::stack(1));
    let run = free(function("run", e).names(&["step"]).arguments(1).stack_size(2));

    let mut vm = Vm::default();
    let job = Value::from(Object::instance(&class));
    let result = vm.call(&run, None, &[job.clone()]).unwrap();
    let continuation = result.as_continuation().unwrap();
    assert_eq!(continuation.function_name().as_deref(), Some("step"));
    assert_eq!(continuation.resume(&mut vm, Value::from("done")), Ok(Value::from("done")));
}

#[test]
fn a_signal_resumes_its_waiter_once() {
    let mut vm = Vm::default();
    let target = Object::new("Node");
    target.add_user_signal("ready");

    let result = vm.call(&waiter(), None, &[Value::from(target.clone())]).unwrap();
    let continuation = result.as_continuation().unwrap().clone();
    assert!(continuation.is_valid());

    assert_eq!(
        vm.emit_signal(&target, "ready", &[Value::Int(42)]),
        vec![Ok(Value::Int(42))]
    );
    assert!(!continuation.is_valid());
    assert!(vm.emit_signal(&target, "ready", &[Value::Int(43)]).is_empty());
}

#[test]
fn signal_payloads_pack_into_one_value() {
    let mut vm = Vm::default();
    let target = Object::new("Node");
    target.add_user_signal("ready");

    vm.call(&waiter(), None, &[Value::from(target.clone())]).unwrap();
    assert_eq!(vm.emit_signal(&target, "ready", &[]), vec![Ok(Value::Nil)]);

    vm.call(&waiter(), None, &[Value::from(target.clone())]).unwrap();
    assert_eq!(
        vm.emit_signal(&target, "ready", &[Value::Int(1), Value::Int(2)]),
        vec![Ok(Value::from(vec![Value::Int(1), Value::Int(2)]))]
    );
}

#[test]
fn script_declared_signals_fire_through_emit_signal() {
    let class = ScriptClassBuilder::new("Door", "res://door.gd")
        .signal("opened")
        .build()
        .unwrap();
    let door = Object::instance(&class);

    let mut e = CodeEmitter::new();
    e.yield_signal(Address::stack(0), Address::constant(0))
        .yield_resume(Address::global(0))
        .end();
    let wait = free(
        function("wait", e)
            .constants(vec![Value::from("opened")])
            .arguments(1)
            .stack_size(1),
    );

    let mut vm = Vm::new(VmConfig {
        globals: 1,
        ..VmConfig::default()
    });
    let door_value = Value::from(door.clone());
    vm.call(&wait, None, &[door_value.clone()]).unwrap();
    vm.call_method(&door_value, "emit_signal", &[Value::from("opened"), Value::Bool(true)])
        .unwrap();
    assert_eq!(vm.globals(), &[Value::Bool(true)]);
}

#[test]
fn an_abandoned_waiter_is_skipped() {
    let mut vm = Vm::default();
    let target = Object::new("Node");
    target.add_user_signal("ready");

    let first = vm.call(&waiter(), None, &[Value::from(target.clone())]).unwrap();
    vm.call(&waiter(), None, &[Value::from(target.clone())]).unwrap();
    first.as_continuation().unwrap().abandon();

    assert_eq!(
        vm.emit_signal(&target, "ready", &[Value::Int(1)]),
        vec![Ok(Value::Int(1))]
    );
}

#[test]
fn undeclared_signals_refuse_the_yield() {
    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    let target = Object::new("Node");

    let result = vm.invoke(&waiter(), None, &[Value::from(target.clone())]).unwrap();
    assert!(!result.is_suspended());
    assert_eq!(
        single_error(&debugger).message,
        "Error connecting to signal: ready during yield()."
    );
    assert!(vm.emit_signal(&target, "ready", &[]).is_empty());
}

#[test]
fn yield_targets_must_be_live_objects() {
    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    vm.call(&waiter(), None, &[Value::Int(3)]).unwrap();
    vm.call(&waiter(), None, &[Value::Object(None)]).unwrap();

    let messages: Vec<String> = support::errors(&debugger)
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(
        messages,
        [
            "First argument of yield() not of type object.",
            "First argument of yield() is null.",
        ]
    );
}

#[test]
fn resuming_after_the_instance_is_gone_fails() {
    let mut e = CodeEmitter::new();
    e.yield_().yield_resume(Address::stack(0)).ret(Address::stack(0));
    let class = ScriptClassBuilder::new("Job", "res://job.gd")
        .function(function("step", e).stack_size(1))
        .build()
        .unwrap();

    let mut vm = Vm::default();
    let job = Object::instance(&class);
    let result = vm.call_method(&Value::from(job.clone()), "step", &[]).unwrap();
    let continuation = result.as_continuation().unwrap().clone();
    drop(result);
    drop(job);

    assert_eq!(
        continuation.resume(&mut vm, Value::Nil),
        Err(ResumeError::InstanceGone)
    );
    assert!(!continuation.is_valid());
}

#[test]
fn resuming_after_the_script_is_gone_fails() {
    let mut e = CodeEmitter::new();
    e.yield_().end();
    let class = ScriptClassBuilder::new("Job", "res://job.gd")
        .function(function("step", e))
        .build()
        .unwrap();
    let step = class.function("step").unwrap().clone();

    let mut vm = Vm::default();
    let result = vm.call(&step, None, &[]).unwrap();
    let continuation = result.as_continuation().unwrap().clone();
    drop(class);

    assert_eq!(
        continuation.resume(&mut vm, Value::Nil),
        Err(ResumeError::ScriptGone)
    );
}

#[test]
fn a_resumed_body_cannot_resume_itself() {
    // func f(): var me = yield(); me.resume()
    let mut e = CodeEmitter::new();
    e.yield_()
        .yield_resume(Address::stack(0))
        .call_return(Address::stack(0), 0, &[], Address::stack(1))
        .ret(Address::stack(1));
    let f = free(function("f", e).names(&["resume"]).stack_size(2));

    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    let handle = vm.call(&f, None, &[]).unwrap();
    let continuation = handle.as_continuation().unwrap().clone();
    assert_eq!(continuation.resume(&mut vm, handle.clone()), Ok(Value::Nil));

    assert_eq!(
        single_error(&debugger).message,
        "Error calling function 'resume' in base 'Continuation': \
         Continuation was already resumed or abandoned"
    );
    assert_eq!(
        continuation.resume(&mut vm, Value::Nil),
        Err(ResumeError::Spent)
    );
}

#[test]
fn the_resume_value_is_only_seen_right_after_the_yield() {
    // yield(); x = 1; var late = <resume value>
    let mut e = CodeEmitter::new();
    e.yield_()
        .assign(Address::stack(0), Address::constant(0))
        .yield_resume(Address::stack(1))
        .ret(Address::stack(1));
    let f = free(function("f", e).constants(vec![Value::Int(1)]).stack_size(2));

    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    let handle = vm.call(&f, None, &[]).unwrap();
    let resumed = handle
        .as_continuation()
        .unwrap()
        .resume(&mut vm, Value::Int(9));
    assert_eq!(resumed, Ok(Value::Nil));
    assert_eq!(single_error(&debugger).message, "Invalid Resume (bug?)");
}

#[test]
fn a_dropped_target_releases_its_waiters() {
    // func wait(payload): yield(TARGET, "ready")
    let mut e = CodeEmitter::new();
    e.yield_signal(Address::global(0), Address::constant(0)).end();
    let wait = free(
        function("wait", e)
            .constants(vec![Value::from("ready")])
            .arguments(1)
            .stack_size(1),
    );

    let mut vm = Vm::new(VmConfig {
        globals: 1,
        ..VmConfig::default()
    });
    let target = Object::new("Node");
    target.add_user_signal("ready");
    vm.set_global(0, Value::from(target.clone()));

    let payload = Object::new("Big");
    let handle = vm.call(&wait, None, &[Value::from(payload.clone())]).unwrap();
    assert_eq!(Rc::strong_count(&payload), 2);

    vm.set_global(0, Value::Nil);
    drop(target);
    let other = Object::new("Node");
    assert!(vm.emit_signal(&other, "ready", &[]).is_empty());

    assert!(!handle.as_continuation().unwrap().is_valid());
    assert_eq!(Rc::strong_count(&payload), 1);
}

/// func direct(a, v): var d = a * 2; var r = v; return d + r
fn bound_directly() -> Rc<bytescript_vm::Function> {
    let mut e = CodeEmitter::new();
    e.line(1)
        .operator(Operator::Multiply, Address::stack(0), Address::constant(0), Address::stack(2))
        .line(2)
        .assign(Address::stack(3), Address::stack(1))
        .line(3)
        .operator(Operator::Add, Address::stack(2), Address::stack(3), Address::stack(4))
        .ret(Address::stack(4));
    free(
        function("direct", e)
            .constants(vec![Value::Int(2)])
            .arguments(2)
            .stack_size(5),
    )
}

proptest! {
    #[test]
    fn resuming_with_a_value_matches_binding_it(a in any::<i64>(), v in any::<i64>()) {
        let mut vm = Vm::default();
        let expected = vm.call(&bound_directly(), None, &[Value::Int(a), Value::Int(v)]).unwrap();

        let handle = vm.call(&doubling(), None, &[Value::Int(a)]).unwrap();
        let resumed = handle.as_continuation().unwrap().resume(&mut vm, Value::Int(v));
        prop_assert_eq!(resumed, Ok(expected));
        prop_assert_eq!(vm.call_depth(), 0);
    }
}
