//! Bytescript common types and instruction encoding.
//!
//! This crate holds the pieces of the instruction set that do not depend on
//! the runtime:
//!
//! - [`Opcode`]: every instruction the interpreter dispatches on
//! - [`Operator`]: operators evaluated by `OPERATOR`
//! - [`Kind`]: value kinds used by `CONSTRUCT` and in diagnostics
//! - [`BuiltinFunction`]: ids of built-in free functions
//! - [`Address`]: the 32-bit operand address encoding
//! - [`CodeEmitter`]: a writer producing instruction words in VM layout
//! - [`DecodeError`]: errors from decoding words
//!
//! Code is a flat `Vec<u32>`. An instruction is an opcode word followed by
//! its operand words; operand layouts are documented on [`Opcode`].

pub mod address;
pub mod builtin;
pub mod emit;
pub mod error;
pub mod kind;
pub mod opcode;
pub mod operator;

// Re-export commonly used types at the crate root.
pub use address::{Address, AddressSpace};
pub use builtin::BuiltinFunction;
pub use emit::CodeEmitter;
pub use error::DecodeError;
pub use kind::Kind;
pub use opcode::Opcode;
pub use operator::Operator;
