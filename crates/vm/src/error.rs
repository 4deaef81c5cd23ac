//! Errors produced by the Bytescript VM.
//!
//! Failures fall into separate families:
//! - [`CallError`]: a call was rejected before it ran. Returned to the
//!   immediate caller and never routed to the debugger.
//! - [`RuntimeError`]: an instruction failed while a function was running.
//!   Its `Display` text is the script-facing message. [`InternalError`] is
//!   the subset caused by malformed bytecode.
//! - [`ScriptError`]: a runtime error after it was attributed to a function,
//!   file and line and reported.
//! - [`ResumeError`]: a continuation could not be resumed.
//! - [`InvokeError`]: what the method, constructor and built-in tables return.

use bytescript_common::{DecodeError, Kind};
use thiserror::Error;

/// Why a call was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("invalid method")]
    InvalidMethod,

    /// `argument` is zero-based.
    #[error("invalid type for argument {}, expected {expected}", .argument + 1)]
    InvalidArgument { argument: usize, expected: Kind },

    #[error("too many arguments, expected {expected}")]
    TooManyArguments { expected: usize },

    #[error("too few arguments, expected {expected}")]
    TooFewArguments { expected: usize },

    #[error("instance is null")]
    InstanceIsNull,

    #[error("method is not const")]
    MethodNotConst,
}

/// Failure reported by an external table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Call(#[from] CallError),

    /// A free-form message, e.g. `Division By Zero`.
    #[error("{0}")]
    Failed(String),
}

/// Failure of an operator evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorError {
    #[error("invalid operands")]
    InvalidOperands,

    #[error("{0}")]
    Message(String),
}

/// Failure of a native property store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("property not found")]
    Missing,

    #[error("value has the wrong type")]
    InvalidType,
}

/// Errors raised by malformed bytecode or inconsistent function tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("Illegal opcode {opcode} at address {ip}")]
    IllegalOpcode { opcode: u32, ip: usize },

    #[error("truncated instruction at address {ip}")]
    TruncatedInstruction { ip: usize },

    #[error("stack slot {index} out of range (stack size {size})")]
    StackOutOfRange { index: usize, size: usize },

    #[error("constant {index} out of range ({count} constants)")]
    ConstantOutOfRange { index: usize, count: usize },

    #[error("name {index} out of range ({count} names)")]
    NameOutOfRange { index: usize, count: usize },

    #[error("global {index} out of range ({count} globals)")]
    GlobalOutOfRange { index: usize, count: usize },

    #[error("member {index} out of range ({count} members)")]
    MemberOutOfRange { index: usize, count: usize },

    #[error("{argc} call arguments exceed scratch size {capacity}")]
    ScratchOverflow { argc: usize, capacity: usize },

    #[error("bad address word: {0}")]
    BadAddress(DecodeError),

    #[error("bad operator: {0}")]
    BadOperator(u32),

    #[error("bad value kind: {0}")]
    BadKind(u32),

    #[error("bad built-in function id: {0}")]
    BadBuiltin(u32),

    #[error("jump target {target} out of range (code size {size})")]
    JumpOutOfRange { target: usize, size: usize },

    #[error("default argument entry {index} out of range ({count} entries)")]
    DefaultArgumentOutOfRange { index: usize, count: usize },

    #[error("class constant '{0}' not found")]
    MissingClassConstant(String),

    #[error("cannot write to read-only address {0}")]
    ReadOnlyAddress(String),

    #[error("function has no owning class")]
    NoClass,
}

/// Errors raised while executing an instruction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Cannot access self without instance.")]
    SelfWithoutInstance,

    #[error("Cannot access member without instance.")]
    MemberWithoutInstance,

    #[error("Invalid operands '{left}' and '{right}' in operator '{operator}'.")]
    InvalidOperands {
        left: &'static str,
        right: &'static str,
        operator: &'static str,
    },

    #[error("{message} in operator '{operator}'.")]
    OperatorFailed {
        message: String,
        operator: &'static str,
    },

    #[error("Left operand of 'extends' is not an instance of anything.")]
    ExtendsLeftNotInstance,

    #[error("Right operand of 'extends' is not a class.")]
    ExtendsRightNotClass,

    #[error("Right operand of 'extends' is not a class (type: '{0}').")]
    ExtendsRightNotClassType(String),

    /// `index` is either `'text'` or `of type 'T'`.
    #[error("Invalid set index {index} (on base: '{base}').")]
    InvalidSetIndex { index: String, base: String },

    #[error("Invalid get index {index} (on base: '{base}').")]
    InvalidGetIndex { index: String, base: String },

    #[error("Invalid get index '{name}' (on base: '{base}'). Did you mean '.{name}()' ?")]
    InvalidGetIndexMethod { name: String, base: String },

    #[error("Internal error setting property: {0}")]
    PropertyMissingOnSet(String),

    #[error("Error setting property '{name}' with value of type {kind}.")]
    PropertyType { name: String, kind: &'static str },

    #[error("Internal error getting property: {0}")]
    PropertyMissingOnGet(String),

    /// A rejected call. `found` is the kind of the offending argument.
    #[error("{}", call_message(.error, .place, .found))]
    CallFailed {
        error: CallError,
        place: String,
        found: Option<Kind>,
    },

    #[error("Error calling {place}: {message}")]
    InvocationFailed { place: String, message: String },

    #[error("First argument of yield() not of type object.")]
    YieldTargetNotObject,

    #[error("Second argument of yield() not a string (for signal name).")]
    YieldSignalNotString,

    #[error("First argument of yield() is null.")]
    YieldTargetNull,

    #[error("Second argument of yield() is an empty string (for signal name).")]
    YieldSignalEmpty,

    #[error("Error connecting to signal: {0} during yield().")]
    YieldConnect(String),

    #[error("Invalid Resume (bug?)")]
    InvalidResume,

    #[error("cannot evaluate conditional expression of type: {0}")]
    NotBooleanizable(&'static str),

    #[error("Assertion failed.")]
    AssertionFailed,

    #[error("Unable to iterate on object of type '{0}'.")]
    NotIterable(&'static str),

    #[error("Unable to obtain iterator object of type '{0}'.")]
    IteratorUnavailable(&'static str),

    #[error("Unable to iterate on object of type '{0}' (type changed since first iteration?).")]
    IterationTypeChanged(&'static str),

    #[error("Unable to obtain iterator object of type '{0}' (but was obtained on first iteration?).")]
    IteratorLost(&'static str),

    #[error("Stack overflow (call depth: {0}). Check for infinite recursion.")]
    StackOverflow(usize),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl RuntimeError {
    /// Returns true for errors caused by malformed bytecode.
    pub fn is_internal(&self) -> bool {
        matches!(self, RuntimeError::Internal(_))
    }
}

/// Formats a rejected call the way scripts see it.
///
/// `place` names the callee, e.g. `function 'foo' in base 'Widget'`.
pub fn call_message(error: &CallError, place: &str, found: &Option<Kind>) -> String {
    match error {
        CallError::InvalidArgument { argument, expected } => format!(
            "Invalid type in {place}. Cannot convert argument {} from {} to {expected}.",
            argument + 1,
            found.unwrap_or(Kind::Nil),
        ),
        CallError::TooManyArguments { expected } | CallError::TooFewArguments { expected } => {
            format!("Invalid call to {place}. Expected {expected} arguments.")
        }
        CallError::InvalidMethod => format!("Invalid call. Nonexistent {place}."),
        CallError::InstanceIsNull => format!("Attempt to call {place} on a null instance."),
        CallError::MethodNotConst => format!("Invalid call to {place}. Method is not const."),
    }
}

/// Why a continuation could not be resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResumeError {
    #[error("Continuation was already resumed or abandoned")]
    Spent,

    #[error("Resumed after yield, but class instance is gone")]
    InstanceGone,

    #[error("Resumed after yield, but script is gone")]
    ScriptGone,
}

/// A reported runtime error, attributed to the function that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}:{line} - {function}: {message}")]
pub struct ScriptError {
    pub message: String,
    /// `Script.function` when the receiver's script is named.
    pub function: String,
    /// Script path, or `<built-in>`.
    pub file: String,
    pub line: u32,
    /// Offset of the failing instruction.
    pub ip: usize,
    /// True when caused by malformed bytecode.
    pub internal: bool,
}

/// Rejections raised while assembling functions and classes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("function '{function}': stack size {stack_size} cannot hold {argument_count} arguments")]
    StackTooSmall {
        function: String,
        stack_size: usize,
        argument_count: usize,
    },

    #[error("function '{function}': {defaults} default arguments for {argument_count} parameters")]
    TooManyDefaults {
        function: String,
        defaults: usize,
        argument_count: usize,
    },

    #[error("function '{function}': default argument target {target} past end of code ({size} words)")]
    DefaultTargetOutOfRange {
        function: String,
        target: usize,
        size: usize,
    },
}
