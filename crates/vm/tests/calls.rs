//! Argument binding, method dispatch and instruction-level behavior.

mod support;

use std::rc::Rc;

use bytescript_common::{Address, BuiltinFunction, CodeEmitter, Kind, Operator};
use bytescript_vm::{
    CallError, ClassRef, InvokeError, NativeClass, NativeClasses, Object, ScriptClassBuilder,
    Value, Vector2, Vm, VmConfig,
};
use proptest::prelude::*;

use support::{debugged_vm, free, function, single_error};

/// func f(a, b = 10): return [a, b]
fn with_default() -> Rc<bytescript_vm::Function> {
    let mut e = CodeEmitter::new();
    e.jump_to_default_argument();
    let init = e.here();
    e.assign(Address::stack(1), Address::constant(0));
    let body = e.here();
    e.construct_array(&[Address::stack(0), Address::stack(1)], Address::stack(2))
        .ret(Address::stack(2));
    free(
        function("f", e)
            .constants(vec![Value::Int(10)])
            .arguments(2)
            .default_arguments(vec![body, init])
            .stack_size(3),
    )
}

#[test]
fn missing_trailing_argument_takes_its_default() {
    let mut vm = Vm::default();
    let f = with_default();
    assert_eq!(
        vm.call(&f, None, &[Value::Int(3)]).unwrap(),
        Value::from(vec![Value::Int(3), Value::Int(10)])
    );
}

#[test]
fn supplied_argument_skips_the_default_initializer() {
    let mut vm = Vm::default();
    let f = with_default();
    assert_eq!(
        vm.call(&f, None, &[Value::Int(3), Value::Int(4)]).unwrap(),
        Value::from(vec![Value::Int(3), Value::Int(4)])
    );
}

#[test]
fn argument_count_is_checked_before_running() {
    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    let f = with_default();
    assert_eq!(
        vm.call(&f, None, &[]),
        Err(CallError::TooFewArguments { expected: 1 })
    );
    assert_eq!(
        vm.call(&f, None, &[Value::Int(1), Value::Int(2), Value::Int(3)]),
        Err(CallError::TooManyArguments { expected: 2 })
    );
    assert!(support::errors(&debugger).is_empty());
    assert_eq!(vm.call_depth(), 0);
}

#[test]
fn calling_a_missing_native_method_reports_the_base() {
    let classes = NativeClasses::new().with(NativeClass::new("Widget"));
    let (vm, debugger) = debugged_vm(VmConfig::default());
    let mut vm = vm.with_class_db(classes);

    let mut e = CodeEmitter::new();
    e.line(7).call(Address::self_ref(), 0, &[]).end();
    let go = free(function("go", e).names(&["foo"]).source("res://w.gd"));

    let widget = Object::new("Widget");
    assert_eq!(vm.call(&go, Some(&widget), &[]).unwrap(), Value::Nil);

    let error = single_error(&debugger);
    assert_eq!(
        error.message,
        "Invalid call. Nonexistent function 'foo' in base 'Widget'."
    );
    assert_eq!(error.line, 7);
    assert_eq!(error.ip, 2);
    assert!(!error.internal);
}

#[test]
fn calls_through_call_name_the_real_method() {
    let classes = NativeClasses::new().with(NativeClass::new("Widget"));
    let (vm, debugger) = debugged_vm(VmConfig::default());
    let mut vm = vm.with_class_db(classes);

    let mut e = CodeEmitter::new();
    e.call(Address::self_ref(), 0, &[Address::constant(0)]).end();
    let go = free(
        function("go", e)
            .names(&["call"])
            .constants(vec![Value::from("foo")]),
    );

    vm.call(&go, Some(&Object::new("Widget")), &[]).unwrap();
    assert_eq!(
        single_error(&debugger).message,
        "Invalid call. Nonexistent function 'foo (via call)' in base 'Widget'."
    );
}

#[test]
fn native_methods_receive_arguments() {
    let classes = NativeClasses::new().with(NativeClass::new("Counter").method(
        "add",
        |_, args| match args {
            [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
            _ => Err(InvokeError::Failed("expected two ints".into())),
        },
    ));
    let mut vm = Vm::default().with_class_db(classes);

    let mut e = CodeEmitter::new();
    e.call_return(
        Address::stack(0),
        0,
        &[Address::constant(0), Address::constant(1)],
        Address::stack(1),
    )
    .ret(Address::stack(1));
    let go = free(
        function("go", e)
            .names(&["add"])
            .constants(vec![Value::Int(2), Value::Int(5)])
            .arguments(1)
            .stack_size(2),
    );

    let counter = Value::from(Object::new("Counter"));
    assert_eq!(vm.call(&go, None, &[counter]).unwrap(), Value::Int(7));
}

#[test]
fn script_methods_run_against_the_instance() {
    // var hp; func hit(n): hp = hp - n; return hp
    let mut e = CodeEmitter::new();
    e.operator(
        Operator::Subtract,
        Address::member(0),
        Address::stack(0),
        Address::member(0),
    )
    .ret(Address::member(0));
    let class = ScriptClassBuilder::new("Enemy", "res://enemy.gd")
        .member("hp")
        .function(function("hit", e).arguments(1).stack_size(1))
        .build()
        .unwrap();

    let mut vm = Vm::default();
    let enemy = Object::instance(&class);
    enemy.set_member(0, Value::Int(10));
    let base = Value::from(enemy.clone());
    assert_eq!(vm.call_method(&base, "hit", &[Value::Int(3)]), Ok(Value::Int(7)));
    assert_eq!(vm.call_method(&base, "hit", &[Value::Int(3)]), Ok(Value::Int(4)));
    assert_eq!(enemy.member_by_name("hp"), Some(Value::Int(4)));
}

#[test]
fn instantiation_runs_the_nearest_init() {
    // func _init(v): value = v
    let mut e = CodeEmitter::new();
    e.assign(Address::member(0), Address::stack(0)).end();
    let class = ScriptClassBuilder::new("Box", "res://box.gd")
        .member("value")
        .function(function("_init", e).arguments(1).stack_size(1))
        .build()
        .unwrap();

    let mut vm = Vm::default();
    let created = vm
        .call_method(&Value::Class(ClassRef::Script(class.clone())), "new", &[Value::Int(9)])
        .unwrap();
    let object = created.as_object().unwrap();
    assert_eq!(object.member_by_name("value"), Some(Value::Int(9)));

    assert_eq!(
        vm.instantiate(&class, &[]).unwrap_err(),
        CallError::TooFewArguments { expected: 1 }
    );
}

#[test]
fn super_calls_start_above_the_compiling_class() {
    let mut e = CodeEmitter::new();
    e.ret(Address::constant(0));
    let base = ScriptClassBuilder::new("Base", "res://base.gd")
        .function(function("greet", e).constants(vec![Value::from("base")]))
        .build()
        .unwrap();

    // func greet(): return "derived+" + .greet()
    let mut e = CodeEmitter::new();
    e.call_self_base(0, &[], Address::stack(0))
        .operator(
            Operator::Add,
            Address::constant(0),
            Address::stack(0),
            Address::stack(1),
        )
        .ret(Address::stack(1));
    let derived = ScriptClassBuilder::new("Derived", "res://derived.gd")
        .base(&base)
        .function(
            function("greet", e)
                .names(&["greet"])
                .constants(vec![Value::from("derived+")])
                .stack_size(2),
        )
        .build()
        .unwrap();

    let mut vm = Vm::default();
    let object = Value::from(Object::instance(&derived));
    assert_eq!(
        vm.call_method(&object, "greet", &[]),
        Ok(Value::from("derived+base"))
    );
}

#[test]
fn missing_base_init_is_not_an_error() {
    let mut e = CodeEmitter::new();
    e.call_self_base(0, &[], Address::stack(0)).ret(Address::stack(0));
    let base = ScriptClassBuilder::new("Base", "res://base.gd").build().unwrap();
    let derived = ScriptClassBuilder::new("Derived", "res://derived.gd")
        .base(&base)
        .function(function("_init", e).names(&["_init"]).stack_size(1))
        .build()
        .unwrap();

    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    vm.instantiate(&derived, &[]).unwrap();
    assert!(support::errors(&debugger).is_empty());
}

#[test]
fn class_constants_resolve_from_the_compiling_class() {
    let mut read_k = CodeEmitter::new();
    read_k.ret(Address::class_constant(0));
    let root = ScriptClassBuilder::new("Root", "res://root.gd")
        .constant("K", Value::Int(1))
        .function(function("root_k", read_k).names(&["K"]))
        .build()
        .unwrap();
    let mid = ScriptClassBuilder::new("Mid", "res://mid.gd")
        .base(&root)
        .constant("K", Value::Int(2))
        .build()
        .unwrap();
    let mut read_k = CodeEmitter::new();
    read_k.ret(Address::class_constant(0));
    let leaf = ScriptClassBuilder::new("Leaf", "res://leaf.gd")
        .base(&mid)
        .function(function("leaf_k", read_k).names(&["K"]))
        .build()
        .unwrap();

    let mut vm = Vm::default();
    let object = Value::from(Object::instance(&leaf));
    assert_eq!(vm.call_method(&object, "leaf_k", &[]), Ok(Value::Int(2)));
    assert_eq!(vm.call_method(&object, "root_k", &[]), Ok(Value::Int(1)));
}

#[test]
fn extends_checks_script_and_native_ancestry() {
    let classes = NativeClasses::new()
        .with(NativeClass::new("Node"))
        .with(NativeClass::new("Widget").inherits("Node"));
    let root = ScriptClassBuilder::new("Root", "res://root.gd").build().unwrap();
    let leaf = ScriptClassBuilder::new("Leaf", "res://leaf.gd")
        .base(&root)
        .build()
        .unwrap();

    let mut e = CodeEmitter::new();
    e.extends_test(Address::stack(0), Address::stack(1), Address::stack(2))
        .ret(Address::stack(2));
    let extends = free(function("extends", e).arguments(2).stack_size(3));

    let mut vm = Vm::default().with_class_db(classes);
    let check = |vm: &mut Vm, object: &Value, class: Value| {
        vm.call(&extends, None, &[object.clone(), class]).unwrap()
    };
    let instance = Value::from(Object::instance(&leaf));
    let widget = Value::from(Object::new("Widget"));

    let root = Value::Class(ClassRef::Script(root));
    let node = Value::Class(ClassRef::Native("Node".into()));

    assert_eq!(check(&mut vm, &instance, root.clone()), Value::Bool(true));
    assert_eq!(check(&mut vm, &widget, node), Value::Bool(true));
    assert_eq!(check(&mut vm, &widget, root), Value::Bool(false));
}

#[test]
fn operator_errors_name_both_operand_types() {
    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    let mut e = CodeEmitter::new();
    e.operator(Operator::Add, Address::stack(0), Address::stack(1), Address::stack(2))
        .ret(Address::stack(2));
    let add = free(function("add", e).arguments(2).stack_size(3));

    assert_eq!(
        vm.call(&add, None, &[Value::from("a"), Value::Int(1)]).unwrap(),
        Value::Nil
    );
    let error = single_error(&debugger);
    assert_eq!(
        error.message,
        "Invalid operands 'String' and 'int' in operator '+'."
    );
    assert_eq!(error.file, "<built-in>");
    assert_eq!(error.function, "add");
}

#[test]
fn division_by_zero_carries_the_operator() {
    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    let mut e = CodeEmitter::new();
    e.operator(Operator::Divide, Address::stack(0), Address::stack(1), Address::stack(2))
        .ret(Address::stack(2));
    let div = free(function("div", e).arguments(2).stack_size(3));

    assert_eq!(vm.call(&div, None, &[Value::Int(7), Value::Int(2)]).unwrap(), Value::Int(3));
    vm.call(&div, None, &[Value::Int(7), Value::Int(0)]).unwrap();
    assert_eq!(single_error(&debugger).message, "Division By Zero in operator '/'.");
}

#[test]
fn builtin_failures_name_the_function() {
    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    let mut e = CodeEmitter::new();
    e.call_builtin(BuiltinFunction::Len, &[Address::stack(0)], Address::stack(1))
        .ret(Address::stack(1));
    let len = free(function("len", e).arguments(1).stack_size(2));

    assert_eq!(vm.call(&len, None, &[Value::from("abcd")]).unwrap(), Value::Int(4));
    vm.call(&len, None, &[Value::Int(5)]).unwrap();
    assert_eq!(
        single_error(&debugger).message,
        "Error calling built-in function 'len': Object can't provide a length."
    );
}

#[test]
fn named_get_suggests_the_method() {
    let (mut vm, debugger) = debugged_vm(VmConfig::default());
    let mut e = CodeEmitter::new();
    e.get_named(Address::stack(0), 0, Address::stack(1)).ret(Address::stack(1));
    let get = free(function("get", e).names(&["size"]).arguments(1).stack_size(2));

    vm.call(&get, None, &[Value::from(vec![Value::Int(1)])]).unwrap();
    assert_eq!(
        single_error(&debugger).message,
        "Invalid get index 'size' (on base: 'Array'). Did you mean '.size()' ?"
    );
}

#[test]
fn named_set_writes_vectors_back() {
    let mut e = CodeEmitter::new();
    e.set_named(Address::stack(0), 0, Address::constant(0)).ret(Address::stack(0));
    let set_x = free(
        function("set_x", e)
            .names(&["x"])
            .constants(vec![Value::Float(3.0)])
            .arguments(1)
            .stack_size(1),
    );

    let mut vm = Vm::default();
    let moved = vm
        .call(&set_x, None, &[Value::from(Vector2::new(1.0, 2.0))])
        .unwrap();
    assert_eq!(moved, Value::from(Vector2::new(3.0, 2.0)));
}

#[test]
fn native_properties_are_typed() {
    let classes = NativeClasses::new().with(NativeClass::new("Sprite").property("scale", Kind::Float));
    let (vm, debugger) = debugged_vm(VmConfig::default());
    let mut vm = vm.with_class_db(classes);

    let mut e = CodeEmitter::new();
    e.set_member(0, Address::stack(0))
        .get_member(0, Address::stack(1))
        .ret(Address::stack(1));
    let scale = free(function("scale", e).names(&["scale"]).arguments(1).stack_size(2));

    let sprite = Object::new("Sprite");
    assert_eq!(vm.call(&scale, Some(&sprite), &[Value::Int(2)]).unwrap(), Value::Float(2.0));
    vm.call(&scale, Some(&sprite), &[Value::from("big")]).unwrap();
    assert_eq!(
        single_error(&debugger).message,
        "Error setting property 'scale' with value of type String."
    );
}

#[test]
fn globals_are_shared_across_calls() {
    let mut vm = Vm::new(VmConfig {
        globals: 1,
        ..VmConfig::default()
    });
    let mut e = CodeEmitter::new();
    e.operator(Operator::Add, Address::global(0), Address::constant(0), Address::global(0))
        .ret(Address::global(0));
    let bump = free(function("bump", e).constants(vec![Value::Int(1)]));

    assert!(vm.set_global(0, Value::Int(40)));
    vm.call(&bump, None, &[]).unwrap();
    assert_eq!(vm.call(&bump, None, &[]).unwrap(), Value::Int(42));
    assert_eq!(vm.globals(), &[Value::Int(42)]);
}

#[test]
fn loops_over_arrays() {
    // func sum(items): var total = 0; for x in items: total += x; return total
    let mut e = CodeEmitter::new();
    e.assign(Address::stack(1), Address::constant(0));
    let begin_exit = e.iterate_begin(Address::stack(2), Address::stack(0), 0, Address::stack(3));
    let body = e.here();
    e.operator(Operator::Add, Address::stack(1), Address::stack(3), Address::stack(1));
    let next_exit = e.iterate(Address::stack(2), Address::stack(0), 0, Address::stack(3));
    e.jump(body);
    let exit = e.here();
    e.ret(Address::stack(1));
    e.patch(begin_exit, exit);
    e.patch(next_exit, exit);
    let sum = free(
        function("sum", e)
            .constants(vec![Value::Int(0)])
            .arguments(1)
            .stack_size(4),
    );

    let mut vm = Vm::default();
    let items = Value::from(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(vm.call(&sum, None, &[items]).unwrap(), Value::Int(6));
    assert_eq!(vm.call(&sum, None, &[Value::from(vec![])]).unwrap(), Value::Int(0));
}

proptest! {
    #[test]
    fn int_addition_matches_wrapping_add(a in any::<i64>(), b in any::<i64>()) {
        let mut e = CodeEmitter::new();
        e.operator(Operator::Add, Address::stack(0), Address::stack(1), Address::stack(2))
            .ret(Address::stack(2));
        let add = free(function("add", e).arguments(2).stack_size(3));
        let mut vm = Vm::default();
        prop_assert_eq!(
            vm.call(&add, None, &[Value::Int(a), Value::Int(b)]).unwrap(),
            Value::Int(a.wrapping_add(b))
        );
    }

    #[test]
    fn binding_accepts_exactly_the_declared_range(given in 0usize..6, declared in 0usize..4, defaults in 0usize..4) {
        let defaults = defaults.min(declared);
        let mut e = CodeEmitter::new();
        e.end();
        let f = free(
            function("f", e)
                .arguments(declared)
                .default_arguments(vec![0; defaults + 1])
                .stack_size(declared),
        );
        let args = vec![Value::Nil; given];
        let result = Vm::default().call(&f, None, &args);
        if given > declared {
            prop_assert_eq!(result, Err(CallError::TooManyArguments { expected: declared }));
        } else if given < declared - defaults {
            prop_assert_eq!(result, Err(CallError::TooFewArguments { expected: declared - defaults }));
        } else {
            prop_assert_eq!(result, Ok(Value::Nil));
        }
    }
}
