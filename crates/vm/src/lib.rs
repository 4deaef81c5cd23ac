//! Bytescript virtual machine: runs compiled script functions against a
//! dynamically typed value model.
//!
//! Functions are register-addressed: every operand is an address into the
//! frame's stack, the receiver's members, the function's constants, the
//! class constants or the global table. A function may suspend itself with
//! `Yield` or `YieldSignal`; the caller then receives a [`Continuation`]
//! that can be resumed later, from anywhere, exactly once.
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//!
//! use bytescript_common::{Address, CodeEmitter, Operator};
//! use bytescript_vm::{FunctionBuilder, Value, Vm};
//!
//! // func add(a, b): return a + b
//! let mut code = CodeEmitter::new();
//! code.operator(Operator::Add, Address::stack(0), Address::stack(1), Address::stack(2))
//!     .ret(Address::stack(2));
//! let add = FunctionBuilder::new("add")
//!     .code(code.finish())
//!     .arguments(2)
//!     .stack_size(3)
//!     .build()?;
//!
//! let mut vm = Vm::default();
//! let sum = vm.call(&Rc::new(add), None, &[Value::Int(2), Value::Int(3)])?;
//! assert_eq!(sum, Value::Int(5));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod addressing;
pub mod builtins;
pub mod call;
pub mod class;
pub mod classdb;
pub mod config;
pub mod continuation;
pub mod debug;
pub mod error;
mod execute;
mod frame;
pub mod function;
pub mod machine;
pub mod object;
pub mod profile;
pub mod signals;
pub mod tables;
pub mod value;

pub use builtins::CoreBuiltins;
pub use call::Completion;
pub use class::{BaseMethod, ResolvesBaseMethod, ResolvesConstants, ScriptClass, ScriptClassBuilder};
pub use classdb::{NativeClass, NativeClasses, NativeMethod};
pub use config::VmConfig;
pub use continuation::Continuation;
pub use debug::{BreakRecord, DebugCommand, ScriptDebugger};
pub use error::{
    BuildError, CallError, InternalError, InvokeError, OperatorError, PropertyError, ResumeError,
    RuntimeError, ScriptError,
};
pub use function::{Function, FunctionBuilder, StackDebug};
pub use machine::Vm;
pub use object::{ClassRef, Object, ObjectId, ObjectRef};
pub use profile::ProfileEntry;
pub use signals::SignalHub;
pub use tables::{BreakContext, Builtins, ClassDb, Debugger, EventHub};
pub use value::{Array, Dictionary, Value, Vector2};
