//! Operand resolution: turns an address word into a value or a writable slot
//! relative to the running frame.

use bytescript_common::{Address, AddressSpace};

use crate::class::ResolvesConstants;
use crate::error::{InternalError, RuntimeError};
use crate::frame::Frame;
use crate::machine::Vm;
use crate::object::{ClassRef, ObjectRef};
use crate::value::Value;

/// A validated write destination.
#[derive(Debug)]
pub(crate) enum Slot {
    Stack(usize),
    Member(ObjectRef, usize),
    Global(usize),
    /// Writes to the nil address are dropped.
    Discard,
}

fn decode(word: u32) -> Result<Address, InternalError> {
    Address::decode(word).map_err(InternalError::BadAddress)
}

/// The receiver, when it carries member storage.
fn member_owner(frame: &Frame) -> Result<&ObjectRef, RuntimeError> {
    frame
        .receiver
        .as_ref()
        .filter(|object| object.script().is_some())
        .ok_or(RuntimeError::MemberWithoutInstance)
}

impl Vm {
    /// Read the operand at `word`.
    pub(crate) fn load(&self, frame: &Frame, word: u32) -> Result<Value, RuntimeError> {
        let address = decode(word)?;
        let index = address.offset as usize;
        match address.space {
            AddressSpace::SelfRef => frame
                .receiver
                .clone()
                .map(Value::from)
                .ok_or(RuntimeError::SelfWithoutInstance),
            AddressSpace::Class => match &frame.class {
                Some(class) => Ok(Value::Class(ClassRef::Script(class.clone()))),
                None => Err(InternalError::NoClass.into()),
            },
            AddressSpace::Member => {
                let object = member_owner(frame)?;
                object.member(index).ok_or_else(|| {
                    InternalError::MemberOutOfRange {
                        index,
                        count: object.member_count(),
                    }
                    .into()
                })
            }
            AddressSpace::ClassConstant => {
                let name = frame.name(index)?;
                // Constants resolve from the class the function was compiled in.
                let class = frame
                    .function
                    .script()
                    .or_else(|| frame.class.clone())
                    .ok_or(InternalError::NoClass)?;
                class
                    .resolve_constant(&name)
                    .ok_or_else(|| InternalError::MissingClassConstant(name.to_string()).into())
            }
            AddressSpace::LocalConstant => {
                let constants = frame.function.constants();
                constants.get(index).cloned().ok_or_else(|| {
                    InternalError::ConstantOutOfRange {
                        index,
                        count: constants.len(),
                    }
                    .into()
                })
            }
            AddressSpace::Stack => frame.stack.get(index).cloned().ok_or_else(|| {
                InternalError::StackOutOfRange {
                    index,
                    size: frame.stack.len(),
                }
                .into()
            }),
            AddressSpace::Global => self.globals.get(index).cloned().ok_or_else(|| {
                InternalError::GlobalOutOfRange {
                    index,
                    count: self.globals.len(),
                }
                .into()
            }),
            AddressSpace::Nil => Ok(Value::Nil),
        }
    }

    /// Validate `word` as a write destination.
    pub(crate) fn destination(&self, frame: &Frame, word: u32) -> Result<Slot, RuntimeError> {
        let address = decode(word)?;
        let index = address.offset as usize;
        match address.space {
            AddressSpace::Stack if index < frame.stack.len() => Ok(Slot::Stack(index)),
            AddressSpace::Stack => Err(InternalError::StackOutOfRange {
                index,
                size: frame.stack.len(),
            }
            .into()),
            AddressSpace::Member => {
                let object = member_owner(frame)?;
                if index < object.member_count() {
                    Ok(Slot::Member(object.clone(), index))
                } else {
                    Err(InternalError::MemberOutOfRange {
                        index,
                        count: object.member_count(),
                    }
                    .into())
                }
            }
            AddressSpace::Global if index < self.globals.len() => Ok(Slot::Global(index)),
            AddressSpace::Global => Err(InternalError::GlobalOutOfRange {
                index,
                count: self.globals.len(),
            }
            .into()),
            AddressSpace::Nil => Ok(Slot::Discard),
            AddressSpace::SelfRef
            | AddressSpace::Class
            | AddressSpace::ClassConstant
            | AddressSpace::LocalConstant => {
                Err(InternalError::ReadOnlyAddress(address.to_string()).into())
            }
        }
    }

    pub(crate) fn store(&mut self, frame: &mut Frame, slot: Slot, value: Value) {
        match slot {
            Slot::Stack(index) => {
                if let Some(target) = frame.stack.get_mut(index) {
                    *target = value;
                }
            }
            Slot::Member(object, index) => {
                object.set_member(index, value);
            }
            Slot::Global(index) => {
                self.set_global(index, value);
            }
            Slot::Discard => {}
        }
    }

    /// Validate and write in one step.
    pub(crate) fn write(
        &mut self,
        frame: &mut Frame,
        word: u32,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let slot = self.destination(frame, word)?;
        self.store(frame, slot, value);
        Ok(())
    }
}
