//! Operators evaluated by the `OPERATOR` instruction.

use crate::error::DecodeError;

/// A binary or unary operator. Unary operators ignore their right operand.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Comparison
    Equal = 0,
    NotEqual = 1,
    Less = 2,
    LessEqual = 3,
    Greater = 4,
    GreaterEqual = 5,
    // Arithmetic
    Add = 6,
    Subtract = 7,
    Multiply = 8,
    Divide = 9,
    Negate = 10,
    Positive = 11,
    Modulo = 12,
    // Bitwise
    ShiftLeft = 13,
    ShiftRight = 14,
    BitAnd = 15,
    BitOr = 16,
    BitXor = 17,
    BitNegate = 18,
    // Logic
    And = 19,
    Or = 20,
    Xor = 21,
    Not = 22,
    // Containment
    In = 23,
}

/// All operators, in definition order.
pub const ALL_OPERATORS: [Operator; 24] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::Less,
    Operator::LessEqual,
    Operator::Greater,
    Operator::GreaterEqual,
    Operator::Add,
    Operator::Subtract,
    Operator::Multiply,
    Operator::Divide,
    Operator::Negate,
    Operator::Positive,
    Operator::Modulo,
    Operator::ShiftLeft,
    Operator::ShiftRight,
    Operator::BitAnd,
    Operator::BitOr,
    Operator::BitXor,
    Operator::BitNegate,
    Operator::And,
    Operator::Or,
    Operator::Xor,
    Operator::Not,
    Operator::In,
];

impl TryFrom<u32> for Operator {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ALL_OPERATORS
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::InvalidOperator(value))
    }
}

impl Operator {
    /// The display name used in diagnostics, e.g. `+` or `unary-`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Negate => "unary-",
            Operator::Positive => "unary+",
            Operator::Modulo => "%",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitNegate => "~",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Xor => "xor",
            Operator::Not => "not",
            Operator::In => "in",
        }
    }

    /// Returns true for operators that only read their left operand.
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Operator::Negate | Operator::Positive | Operator::BitNegate | Operator::Not
        )
    }
}
