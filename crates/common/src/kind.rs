//! Value kinds of the Bytescript dynamic value model.

use crate::error::DecodeError;

/// The discriminant of a dynamic value.
///
/// Kinds appear in bytecode as the target of a `CONSTRUCT` instruction and in
/// call errors as the expected type of a rejected argument.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Nil = 0x00,
    Bool = 0x01,
    Int = 0x02,
    Float = 0x03,
    String = 0x04,
    /// Two-component float vector.
    Vector2 = 0x05,
    /// Shared, growable list of values.
    Array = 0x06,
    /// Shared, insertion-ordered key/value table.
    Dictionary = 0x07,
    /// Object handle (possibly the null instance).
    Object = 0x08,
    /// Script or native class reference.
    Class = 0x09,
    /// Handle to a suspended function.
    Continuation = 0x0A,
}

/// All kinds, in definition order.
pub const ALL_KINDS: [Kind; 11] = [
    Kind::Nil,
    Kind::Bool,
    Kind::Int,
    Kind::Float,
    Kind::String,
    Kind::Vector2,
    Kind::Array,
    Kind::Dictionary,
    Kind::Object,
    Kind::Class,
    Kind::Continuation,
];

impl TryFrom<u32> for Kind {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ALL_KINDS
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::InvalidKind(value))
    }
}

impl Kind {
    /// Returns the user-visible type name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Nil => "Nil",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "String",
            Kind::Vector2 => "Vector2",
            Kind::Array => "Array",
            Kind::Dictionary => "Dictionary",
            Kind::Object => "Object",
            Kind::Class => "Class",
            Kind::Continuation => "Continuation",
        }
    }

    /// Returns true for `Int` and `Float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Kind::Int | Kind::Float)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
