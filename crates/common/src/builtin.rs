//! Identifiers of built-in free functions called by `CALL_BUILT_IN`.

use crate::error::DecodeError;

/// A built-in free function, addressed by a stable numeric id.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Abs = 0,
    Min = 1,
    Max = 2,
    Len = 3,
    Str = 4,
    Range = 5,
    TypeOf = 6,
    Print = 7,
}

/// All built-in functions, in id order.
pub const ALL_BUILTINS: [BuiltinFunction; 8] = [
    BuiltinFunction::Abs,
    BuiltinFunction::Min,
    BuiltinFunction::Max,
    BuiltinFunction::Len,
    BuiltinFunction::Str,
    BuiltinFunction::Range,
    BuiltinFunction::TypeOf,
    BuiltinFunction::Print,
];

impl TryFrom<u32> for BuiltinFunction {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ALL_BUILTINS
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::InvalidBuiltin(value))
    }
}

impl BuiltinFunction {
    /// The script-visible name of the function.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunction::Abs => "abs",
            BuiltinFunction::Min => "min",
            BuiltinFunction::Max => "max",
            BuiltinFunction::Len => "len",
            BuiltinFunction::Str => "str",
            BuiltinFunction::Range => "range",
            BuiltinFunction::TypeOf => "typeof",
            BuiltinFunction::Print => "print",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_table_positions() {
        for (i, &func) in ALL_BUILTINS.iter().enumerate() {
            assert_eq!(func as usize, i);
            assert_eq!(BuiltinFunction::try_from(i as u32), Ok(func));
        }
    }

    #[test]
    fn unknown_id() {
        assert_eq!(
            BuiltinFunction::try_from(8),
            Err(DecodeError::InvalidBuiltin(8))
        );
    }

    #[test]
    fn names_are_lowercase() {
        for &func in &ALL_BUILTINS {
            assert_eq!(func.name(), func.name().to_lowercase());
        }
    }
}
