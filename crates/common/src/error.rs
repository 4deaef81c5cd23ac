//! Decode errors for Bytescript instruction words.

use thiserror::Error;

/// Errors that occur while decoding a 32-bit instruction or operand word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Opcode word 0 is illegal and always rejected.
    #[error("illegal opcode 0")]
    IllegalOpcode,

    /// Opcode word not assigned to any operation.
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u32),

    /// Operator index outside the operator table.
    #[error("invalid operator: {0}")]
    InvalidOperator(u32),

    /// Value kind index outside the kind table.
    #[error("invalid value kind: {0}")]
    InvalidKind(u32),

    /// Built-in function id not assigned.
    #[error("invalid built-in function id: {0}")]
    InvalidBuiltin(u32),

    /// Address word whose space bits name no address space.
    #[error("invalid address space: {0:#04x}")]
    InvalidAddressSpace(u32),
}
