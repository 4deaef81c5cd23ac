//! Shared helpers for the VM integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use bytescript_common::CodeEmitter;
use bytescript_vm::{FunctionBuilder, ScriptDebugger, ScriptError, Vm, VmConfig};

/// A function builder over the emitted code with room for call arguments.
pub fn function(name: &str, code: CodeEmitter) -> FunctionBuilder {
    FunctionBuilder::new(name).code(code.finish()).call_size(8)
}

pub fn free(builder: FunctionBuilder) -> Rc<bytescript_vm::Function> {
    Rc::new(builder.build().unwrap())
}

/// A VM whose debugger traps every error, plus a handle to that debugger.
pub fn debugged_vm(config: VmConfig) -> (Vm, Rc<RefCell<ScriptDebugger>>) {
    let debugger = Rc::new(RefCell::new(ScriptDebugger::new()));
    debugger.borrow_mut().set_trap_errors(true);
    let vm = Vm::new(config).with_debugger(debugger.clone());
    (vm, debugger)
}

pub fn errors(debugger: &Rc<RefCell<ScriptDebugger>>) -> Vec<ScriptError> {
    debugger.borrow().errors().to_vec()
}

/// Message of the only error the debugger saw.
pub fn single_error(debugger: &Rc<RefCell<ScriptDebugger>>) -> ScriptError {
    let errors = errors(debugger);
    assert_eq!(errors.len(), 1, "expected one error, got {errors:?}");
    errors[0].clone()
}
