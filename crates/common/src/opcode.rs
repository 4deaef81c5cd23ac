//! Opcode definitions for the Bytescript instruction set.
//!
//! An instruction is one opcode word followed by its operand words. Operand
//! words are either encoded [`Address`](crate::Address)es, indexes into the
//! function's interned-name table, jump targets, or small immediates (counts,
//! operator and kind indexes).

use crate::error::DecodeError;

/// Identifies the operation to perform.
///
/// The `#[repr(u32)]` attribute gives every variant a stable word value.
/// Word 0 is illegal so that zero-filled code never executes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Data movement
    /// `op, a, b, dst`: evaluate a binary or unary operator.
    Operator = 0x01,
    /// `a, b, dst`: true when object `a` derives from class `b`.
    ExtendsTest = 0x02,
    /// `base, index, value`: keyed store.
    Set = 0x03,
    /// `base, index, dst`: keyed load.
    Get = 0x04,
    /// `base, name, value`: store by interned name.
    SetNamed = 0x05,
    /// `base, name, dst`: load by interned name.
    GetNamed = 0x06,
    /// `name, src`: set a native property on the receiver.
    SetMember = 0x07,
    /// `name, dst`: get a native property of the receiver.
    GetMember = 0x08,
    /// `dst, src`: copy a value.
    Assign = 0x09,
    /// `dst`: store `true`.
    AssignTrue = 0x0A,
    /// `dst`: store `false`.
    AssignFalse = 0x0B,

    // Construction
    /// `kind, overload, argc, args.., dst`: construct a built-in kind.
    Construct = 0x10,
    /// `target`: run the kind's destructor and reset the slot to nil.
    Destruct = 0x11,
    /// `argc, args.., dst`: build an array literal.
    ConstructArray = 0x12,
    /// `pairs, (key, value).., dst`: build a dictionary literal.
    ConstructDictionary = 0x13,

    // Calls
    /// `argc, base, name, args..`: call a method, discard the result.
    Call = 0x20,
    /// `argc, base, name, args.., dst`: call a method, keep the result.
    CallReturn = 0x21,
    /// `id, argc, args.., dst`: call a built-in free function.
    CallBuiltIn = 0x22,
    /// `name, argc, args.., dst`: call a function on the static base chain.
    CallSelfBase = 0x23,

    // Coroutines
    /// Suspend the running function.
    Yield = 0x30,
    /// `target, signal`: suspend until `target` emits `signal`.
    YieldSignal = 0x31,
    /// `dst`: store the value passed to `resume`.
    YieldResume = 0x32,

    // Control flow
    /// `target`: unconditional jump.
    Jump = 0x40,
    /// `test, target`: jump when `test` booleanizes to true.
    JumpIf = 0x41,
    /// `test, target`: jump when `test` booleanizes to false.
    JumpIfNot = 0x42,
    /// Jump into the default-argument initializers selected at call time.
    JumpToDefArgument = 0x43,
    /// `src`: return a value.
    Return = 0x44,
    /// `counter, container, exit, iterator`: start iterating.
    IterateBegin = 0x45,
    /// `counter, container, exit, iterator`: advance an iteration.
    Iterate = 0x46,

    // Meta
    /// `test`: fail unless `test` booleanizes to true.
    Assert = 0x50,
    /// Break into the debugger.
    Breakpoint = 0x51,
    /// `line`: source line marker.
    Line = 0x52,
    /// End of the instruction stream; returns nil.
    End = 0x53,
}

/// All valid opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 33] = [
    Opcode::Operator,
    Opcode::ExtendsTest,
    Opcode::Set,
    Opcode::Get,
    Opcode::SetNamed,
    Opcode::GetNamed,
    Opcode::SetMember,
    Opcode::GetMember,
    Opcode::Assign,
    Opcode::AssignTrue,
    Opcode::AssignFalse,
    Opcode::Construct,
    Opcode::Destruct,
    Opcode::ConstructArray,
    Opcode::ConstructDictionary,
    Opcode::Call,
    Opcode::CallReturn,
    Opcode::CallBuiltIn,
    Opcode::CallSelfBase,
    Opcode::Yield,
    Opcode::YieldSignal,
    Opcode::YieldResume,
    Opcode::Jump,
    Opcode::JumpIf,
    Opcode::JumpIfNot,
    Opcode::JumpToDefArgument,
    Opcode::Return,
    Opcode::IterateBegin,
    Opcode::Iterate,
    Opcode::Assert,
    Opcode::Breakpoint,
    Opcode::Line,
    Opcode::End,
];

impl TryFrom<u32> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x00 => Err(DecodeError::IllegalOpcode),

            0x01 => Ok(Opcode::Operator),
            0x02 => Ok(Opcode::ExtendsTest),
            0x03 => Ok(Opcode::Set),
            0x04 => Ok(Opcode::Get),
            0x05 => Ok(Opcode::SetNamed),
            0x06 => Ok(Opcode::GetNamed),
            0x07 => Ok(Opcode::SetMember),
            0x08 => Ok(Opcode::GetMember),
            0x09 => Ok(Opcode::Assign),
            0x0A => Ok(Opcode::AssignTrue),
            0x0B => Ok(Opcode::AssignFalse),

            0x10 => Ok(Opcode::Construct),
            0x11 => Ok(Opcode::Destruct),
            0x12 => Ok(Opcode::ConstructArray),
            0x13 => Ok(Opcode::ConstructDictionary),

            0x20 => Ok(Opcode::Call),
            0x21 => Ok(Opcode::CallReturn),
            0x22 => Ok(Opcode::CallBuiltIn),
            0x23 => Ok(Opcode::CallSelfBase),

            0x30 => Ok(Opcode::Yield),
            0x31 => Ok(Opcode::YieldSignal),
            0x32 => Ok(Opcode::YieldResume),

            0x40 => Ok(Opcode::Jump),
            0x41 => Ok(Opcode::JumpIf),
            0x42 => Ok(Opcode::JumpIfNot),
            0x43 => Ok(Opcode::JumpToDefArgument),
            0x44 => Ok(Opcode::Return),
            0x45 => Ok(Opcode::IterateBegin),
            0x46 => Ok(Opcode::Iterate),

            0x50 => Ok(Opcode::Assert),
            0x51 => Ok(Opcode::Breakpoint),
            0x52 => Ok(Opcode::Line),
            0x53 => Ok(Opcode::End),

            _ => Err(DecodeError::InvalidOpcode(value)),
        }
    }
}

impl Opcode {
    /// Returns the disassembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Operator => "OPERATOR",
            Opcode::ExtendsTest => "EXTENDS_TEST",
            Opcode::Set => "SET",
            Opcode::Get => "GET",
            Opcode::SetNamed => "SET_NAMED",
            Opcode::GetNamed => "GET_NAMED",
            Opcode::SetMember => "SET_MEMBER",
            Opcode::GetMember => "GET_MEMBER",
            Opcode::Assign => "ASSIGN",
            Opcode::AssignTrue => "ASSIGN_TRUE",
            Opcode::AssignFalse => "ASSIGN_FALSE",
            Opcode::Construct => "CONSTRUCT",
            Opcode::Destruct => "DESTRUCT",
            Opcode::ConstructArray => "CONSTRUCT_ARRAY",
            Opcode::ConstructDictionary => "CONSTRUCT_DICTIONARY",
            Opcode::Call => "CALL",
            Opcode::CallReturn => "CALL_RETURN",
            Opcode::CallBuiltIn => "CALL_BUILT_IN",
            Opcode::CallSelfBase => "CALL_SELF_BASE",
            Opcode::Yield => "YIELD",
            Opcode::YieldSignal => "YIELD_SIGNAL",
            Opcode::YieldResume => "YIELD_RESUME",
            Opcode::Jump => "JUMP",
            Opcode::JumpIf => "JUMP_IF",
            Opcode::JumpIfNot => "JUMP_IF_NOT",
            Opcode::JumpToDefArgument => "JUMP_TO_DEF_ARGUMENT",
            Opcode::Return => "RETURN",
            Opcode::IterateBegin => "ITERATE_BEGIN",
            Opcode::Iterate => "ITERATE",
            Opcode::Assert => "ASSERT",
            Opcode::Breakpoint => "BREAKPOINT",
            Opcode::Line => "LINE",
            Opcode::End => "END",
        }
    }
}
