//! A small emitter that writes instruction words in the layout the VM decodes.
//!
//! Compilers and tests use it to produce code without hand-packing words.
//! Methods that emit a jump return the position of the jump-target operand so
//! forward jumps can be patched once the target is known.

use crate::address::Address;
use crate::builtin::BuiltinFunction;
use crate::kind::Kind;
use crate::opcode::Opcode;
use crate::operator::Operator;

/// Instruction word writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeEmitter {
    code: Vec<u32>,
}

impl CodeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the next word to be written.
    pub fn here(&self) -> usize {
        self.code.len()
    }

    /// Overwrite the jump-target operand at `at` with `target`.
    pub fn patch(&mut self, at: usize, target: usize) {
        self.code[at] = target as u32;
    }

    /// Consume the emitter and return the instruction words.
    pub fn finish(self) -> Vec<u32> {
        self.code
    }

    /// Append an arbitrary word. Used to build deliberately malformed code.
    pub fn raw(&mut self, word: u32) -> &mut Self {
        self.code.push(word);
        self
    }

    fn op(&mut self, opcode: Opcode) {
        self.code.push(opcode as u32);
    }

    fn addr(&mut self, address: Address) {
        self.code.push(address.encode());
    }

    fn addrs(&mut self, addresses: &[Address]) {
        for &address in addresses {
            self.addr(address);
        }
    }

    pub fn operator(&mut self, op: Operator, a: Address, b: Address, dst: Address) -> &mut Self {
        self.op(Opcode::Operator);
        self.code.push(op as u32);
        self.addrs(&[a, b, dst]);
        self
    }

    pub fn extends_test(&mut self, a: Address, b: Address, dst: Address) -> &mut Self {
        self.op(Opcode::ExtendsTest);
        self.addrs(&[a, b, dst]);
        self
    }

    pub fn set(&mut self, base: Address, index: Address, value: Address) -> &mut Self {
        self.op(Opcode::Set);
        self.addrs(&[base, index, value]);
        self
    }

    pub fn get(&mut self, base: Address, index: Address, dst: Address) -> &mut Self {
        self.op(Opcode::Get);
        self.addrs(&[base, index, dst]);
        self
    }

    /// `name` indexes the function's interned-name table.
    pub fn set_named(&mut self, base: Address, name: u32, value: Address) -> &mut Self {
        self.op(Opcode::SetNamed);
        self.addr(base);
        self.code.push(name);
        self.addr(value);
        self
    }

    pub fn get_named(&mut self, base: Address, name: u32, dst: Address) -> &mut Self {
        self.op(Opcode::GetNamed);
        self.addr(base);
        self.code.push(name);
        self.addr(dst);
        self
    }

    pub fn set_member(&mut self, name: u32, src: Address) -> &mut Self {
        self.op(Opcode::SetMember);
        self.code.push(name);
        self.addr(src);
        self
    }

    pub fn get_member(&mut self, name: u32, dst: Address) -> &mut Self {
        self.op(Opcode::GetMember);
        self.code.push(name);
        self.addr(dst);
        self
    }

    pub fn assign(&mut self, dst: Address, src: Address) -> &mut Self {
        self.op(Opcode::Assign);
        self.addrs(&[dst, src]);
        self
    }

    pub fn assign_true(&mut self, dst: Address) -> &mut Self {
        self.op(Opcode::AssignTrue);
        self.addr(dst);
        self
    }

    pub fn assign_false(&mut self, dst: Address) -> &mut Self {
        self.op(Opcode::AssignFalse);
        self.addr(dst);
        self
    }

    pub fn construct(
        &mut self,
        kind: Kind,
        overload: u32,
        args: &[Address],
        dst: Address,
    ) -> &mut Self {
        self.op(Opcode::Construct);
        self.code.push(kind as u32);
        self.code.push(overload);
        self.code.push(args.len() as u32);
        self.addrs(args);
        self.addr(dst);
        self
    }

    pub fn destruct(&mut self, target: Address) -> &mut Self {
        self.op(Opcode::Destruct);
        self.addr(target);
        self
    }

    pub fn construct_array(&mut self, items: &[Address], dst: Address) -> &mut Self {
        self.op(Opcode::ConstructArray);
        self.code.push(items.len() as u32);
        self.addrs(items);
        self.addr(dst);
        self
    }

    pub fn construct_dictionary(&mut self, pairs: &[(Address, Address)], dst: Address) -> &mut Self {
        self.op(Opcode::ConstructDictionary);
        self.code.push(pairs.len() as u32);
        for &(key, value) in pairs {
            self.addrs(&[key, value]);
        }
        self.addr(dst);
        self
    }

    pub fn call(&mut self, base: Address, name: u32, args: &[Address]) -> &mut Self {
        self.op(Opcode::Call);
        self.code.push(args.len() as u32);
        self.addr(base);
        self.code.push(name);
        self.addrs(args);
        self
    }

    pub fn call_return(
        &mut self,
        base: Address,
        name: u32,
        args: &[Address],
        dst: Address,
    ) -> &mut Self {
        self.op(Opcode::CallReturn);
        self.code.push(args.len() as u32);
        self.addr(base);
        self.code.push(name);
        self.addrs(args);
        self.addr(dst);
        self
    }

    pub fn call_builtin(
        &mut self,
        func: BuiltinFunction,
        args: &[Address],
        dst: Address,
    ) -> &mut Self {
        self.op(Opcode::CallBuiltIn);
        self.code.push(func as u32);
        self.code.push(args.len() as u32);
        self.addrs(args);
        self.addr(dst);
        self
    }

    pub fn call_self_base(&mut self, name: u32, args: &[Address], dst: Address) -> &mut Self {
        self.op(Opcode::CallSelfBase);
        self.code.push(name);
        self.code.push(args.len() as u32);
        self.addrs(args);
        self.addr(dst);
        self
    }

    pub fn yield_(&mut self) -> &mut Self {
        self.op(Opcode::Yield);
        self
    }

    pub fn yield_signal(&mut self, target: Address, signal: Address) -> &mut Self {
        self.op(Opcode::YieldSignal);
        self.addrs(&[target, signal]);
        self
    }

    pub fn yield_resume(&mut self, dst: Address) -> &mut Self {
        self.op(Opcode::YieldResume);
        self.addr(dst);
        self
    }

    /// Returns the position of the target operand.
    pub fn jump(&mut self, target: usize) -> usize {
        self.op(Opcode::Jump);
        self.code.push(target as u32);
        self.here() - 1
    }

    /// Returns the position of the target operand.
    pub fn jump_if(&mut self, test: Address, target: usize) -> usize {
        self.op(Opcode::JumpIf);
        self.addr(test);
        self.code.push(target as u32);
        self.here() - 1
    }

    /// Returns the position of the target operand.
    pub fn jump_if_not(&mut self, test: Address, target: usize) -> usize {
        self.op(Opcode::JumpIfNot);
        self.addr(test);
        self.code.push(target as u32);
        self.here() - 1
    }

    pub fn jump_to_default_argument(&mut self) -> &mut Self {
        self.op(Opcode::JumpToDefArgument);
        self
    }

    pub fn ret(&mut self, src: Address) -> &mut Self {
        self.op(Opcode::Return);
        self.addr(src);
        self
    }

    /// Returns the position of the exit-target operand.
    pub fn iterate_begin(
        &mut self,
        counter: Address,
        container: Address,
        exit: usize,
        iterator: Address,
    ) -> usize {
        self.iteration(Opcode::IterateBegin, counter, container, exit, iterator)
    }

    /// Returns the position of the exit-target operand.
    pub fn iterate(
        &mut self,
        counter: Address,
        container: Address,
        exit: usize,
        iterator: Address,
    ) -> usize {
        self.iteration(Opcode::Iterate, counter, container, exit, iterator)
    }

    fn iteration(
        &mut self,
        opcode: Opcode,
        counter: Address,
        container: Address,
        exit: usize,
        iterator: Address,
    ) -> usize {
        self.op(opcode);
        self.addrs(&[counter, container]);
        self.code.push(exit as u32);
        let at = self.here() - 1;
        self.addr(iterator);
        at
    }

    pub fn assert(&mut self, test: Address) -> &mut Self {
        self.op(Opcode::Assert);
        self.addr(test);
        self
    }

    pub fn breakpoint(&mut self) -> &mut Self {
        self.op(Opcode::Breakpoint);
        self
    }

    pub fn line(&mut self, line: u32) -> &mut Self {
        self.op(Opcode::Line);
        self.code.push(line);
        self
    }

    pub fn end(&mut self) -> &mut Self {
        self.op(Opcode::End);
        self
    }
}
