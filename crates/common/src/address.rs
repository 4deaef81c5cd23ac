//! Operand addresses.
//!
//! An address is a single 32-bit word:
//! ```text
//! bits 24-31: address space
//! bits  0-23: offset into that space
//! ```
//! Addresses are only meaningful relative to the function and invocation
//! whose instruction stream contains them.

use std::fmt;

use crate::error::DecodeError;

/// Number of low bits holding the offset.
pub const ADDR_BITS: u32 = 24;
/// Mask selecting the offset bits.
pub const ADDR_MASK: u32 = (1 << ADDR_BITS) - 1;

/// The storage an address refers to.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSpace {
    /// The receiver (`self`) of the running function.
    SelfRef = 0,
    /// The class that owns the running function.
    Class = 1,
    /// A member slot of the receiver.
    Member = 2,
    /// A class constant, looked up by interned name.
    ClassConstant = 3,
    /// An entry of the function's constant table.
    LocalConstant = 4,
    /// A slot of the current call frame.
    Stack = 5,
    /// An entry of the process-wide global table.
    Global = 6,
    /// The shared nil value.
    Nil = 7,
}

impl TryFrom<u32> for AddressSpace {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AddressSpace::SelfRef),
            1 => Ok(AddressSpace::Class),
            2 => Ok(AddressSpace::Member),
            3 => Ok(AddressSpace::ClassConstant),
            4 => Ok(AddressSpace::LocalConstant),
            5 => Ok(AddressSpace::Stack),
            6 => Ok(AddressSpace::Global),
            7 => Ok(AddressSpace::Nil),
            _ => Err(DecodeError::InvalidAddressSpace(value)),
        }
    }
}

/// A decoded operand address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub space: AddressSpace,
    pub offset: u32,
}

impl Address {
    /// Create an address. Offsets wider than 24 bits are truncated on encode.
    pub const fn new(space: AddressSpace, offset: u32) -> Self {
        Self { space, offset }
    }

    pub const fn self_ref() -> Self {
        Self::new(AddressSpace::SelfRef, 0)
    }

    pub const fn class() -> Self {
        Self::new(AddressSpace::Class, 0)
    }

    pub const fn member(index: u32) -> Self {
        Self::new(AddressSpace::Member, index)
    }

    /// A class constant whose name is entry `name` of the interned-name table.
    pub const fn class_constant(name: u32) -> Self {
        Self::new(AddressSpace::ClassConstant, name)
    }

    pub const fn constant(index: u32) -> Self {
        Self::new(AddressSpace::LocalConstant, index)
    }

    pub const fn stack(slot: u32) -> Self {
        Self::new(AddressSpace::Stack, slot)
    }

    pub const fn global(index: u32) -> Self {
        Self::new(AddressSpace::Global, index)
    }

    pub const fn nil() -> Self {
        Self::new(AddressSpace::Nil, 0)
    }

    /// Encode into a single operand word.
    pub fn encode(&self) -> u32 {
        ((self.space as u32) << ADDR_BITS) | (self.offset & ADDR_MASK)
    }

    /// Decode an operand word.
    pub fn decode(word: u32) -> Result<Self, DecodeError> {
        let space = AddressSpace::try_from(word >> ADDR_BITS)?;
        Ok(Self {
            space,
            offset: word & ADDR_MASK,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.space {
            AddressSpace::SelfRef => write!(f, "self"),
            AddressSpace::Class => write!(f, "class"),
            AddressSpace::Member => write!(f, "member[{}]", self.offset),
            AddressSpace::ClassConstant => write!(f, "class_const[{}]", self.offset),
            AddressSpace::LocalConstant => write!(f, "const[{}]", self.offset),
            AddressSpace::Stack => write!(f, "stack[{}]", self.offset),
            AddressSpace::Global => write!(f, "global[{}]", self.offset),
            AddressSpace::Nil => write!(f, "nil"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_lives_in_top_byte() {
        assert_eq!(Address::stack(3).encode(), 0x0500_0003);
        assert_eq!(Address::nil().encode(), 0x0700_0000);
        assert_eq!(Address::self_ref().encode(), 0);
    }

    #[test]
    fn decode_stack_slot() {
        assert_eq!(Address::decode(0x0500_0010), Ok(Address::stack(16)));
    }

    #[test]
    fn decode_rejects_unknown_space() {
        assert_eq!(
            Address::decode(0x0800_0000),
            Err(DecodeError::InvalidAddressSpace(0x08))
        );
        assert_eq!(
            Address::decode(u32::MAX),
            Err(DecodeError::InvalidAddressSpace(0xFF))
        );
    }

    #[test]
    fn wide_offsets_are_masked() {
        let addr = Address::global(ADDR_MASK + 5);
        assert_eq!(Address::decode(addr.encode()), Ok(Address::global(4)));
    }

    #[test]
    fn display() {
        assert_eq!(Address::stack(2).to_string(), "stack[2]");
        assert_eq!(Address::constant(0).to_string(), "const[0]");
        assert_eq!(Address::self_ref().to_string(), "self");
    }
}
