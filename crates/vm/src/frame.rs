//! Per-invocation state.

use std::rc::Rc;
use std::time::Duration;

use crate::class::ScriptClass;
use crate::error::{CallError, InternalError};
use crate::function::Function;
use crate::object::ObjectRef;
use crate::value::Value;

/// One running invocation of a [`Function`].
///
/// A frame is owned by exactly one invocation. When the function suspends,
/// its stack slots move into the continuation and the frame is dropped.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) function: Rc<Function>,
    pub(crate) stack: Vec<Value>,
    /// Scratch buffer reused for call arguments.
    pub(crate) args: Vec<Value>,
    pub(crate) receiver: Option<ObjectRef>,
    /// Receiver's script, or the function's own class.
    pub(crate) class: Option<Rc<ScriptClass>>,
    pub(crate) ip: usize,
    pub(crate) line: u32,
    /// Number of omitted trailing arguments.
    pub(crate) defarg: usize,
    /// Value handed to `resume`. Only the first instruction after the
    /// suspension point sees it.
    pub(crate) resume_value: Option<Value>,
    /// Time spent in calls made from this frame.
    pub(crate) call_time: Duration,
}

impl Frame {
    /// Bind `args` to a fresh frame for `function`.
    pub(crate) fn bind(
        function: &Rc<Function>,
        receiver: Option<&ObjectRef>,
        args: &[Value],
    ) -> Result<Self, CallError> {
        let declared = function.argument_count();
        if args.len() > declared {
            return Err(CallError::TooManyArguments { expected: declared });
        }
        let required = declared - function.default_argument_count();
        if args.len() < required {
            return Err(CallError::TooFewArguments { expected: required });
        }

        let mut stack = Vec::with_capacity(function.stack_size());
        stack.extend_from_slice(args);
        stack.resize(function.stack_size(), Value::Nil);

        let class = receiver
            .and_then(|object| object.script().cloned())
            .or_else(|| function.script());

        Ok(Self {
            function: Rc::clone(function),
            stack,
            args: Vec::with_capacity(function.call_size()),
            receiver: receiver.cloned(),
            class,
            ip: 0,
            line: function.initial_line(),
            defarg: declared - args.len(),
            resume_value: None,
            call_time: Duration::ZERO,
        })
    }

    /// The word `offset` positions past the current instruction's opcode.
    pub(crate) fn word(&self, offset: usize) -> Result<u32, InternalError> {
        self.function
            .code()
            .get(self.ip + offset)
            .copied()
            .ok_or(InternalError::TruncatedInstruction { ip: self.ip })
    }

    pub(crate) fn name(&self, index: usize) -> Result<Rc<str>, InternalError> {
        let names = self.function.names();
        names
            .get(index)
            .cloned()
            .ok_or(InternalError::NameOutOfRange {
                index,
                count: names.len(),
            })
    }

    /// Validate a jump target. The end of code is a valid target.
    pub(crate) fn jump_target(&self, word: u32) -> Result<usize, InternalError> {
        let target = word as usize;
        let size = self.function.code().len();
        if target > size {
            return Err(InternalError::JumpOutOfRange { target, size });
        }
        Ok(target)
    }

    /// Visible locals at the current line with their values.
    pub(crate) fn locals(&self) -> Vec<(Rc<str>, Value)> {
        self.function
            .stack_member_state(self.line)
            .into_iter()
            .map(|(id, pos)| {
                let value = self.stack.get(pos).cloned().unwrap_or_default();
                (id, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionBuilder;

    fn f_with_default() -> Rc<Function> {
        Rc::new(
            FunctionBuilder::new("f")
                .arguments(2)
                .stack_size(4)
                .code(vec![0; 8])
                .default_arguments(vec![4, 0])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn binds_supplied_arguments_and_fills_nil() {
        let f = f_with_default();
        let frame = Frame::bind(&f, None, &[Value::Int(3)]).unwrap();
        assert_eq!(
            frame.stack,
            vec![Value::Int(3), Value::Nil, Value::Nil, Value::Nil]
        );
        assert_eq!(frame.defarg, 1);
        let full = Frame::bind(&f, None, &[Value::Int(3), Value::Int(4)]).unwrap();
        assert_eq!(full.defarg, 0);
    }

    #[test]
    fn argument_count_bounds() {
        let f = f_with_default();
        assert_eq!(
            Frame::bind(&f, None, &[]).unwrap_err(),
            CallError::TooFewArguments { expected: 1 }
        );
        assert_eq!(
            Frame::bind(&f, None, &[Value::Nil, Value::Nil, Value::Nil]).unwrap_err(),
            CallError::TooManyArguments { expected: 2 }
        );
    }

    #[test]
    fn words_and_jumps_are_bounds_checked() {
        let f = f_with_default();
        let mut frame = Frame::bind(&f, None, &[Value::Nil]).unwrap();
        frame.ip = 7;
        assert_eq!(frame.word(0), Ok(0));
        assert_eq!(
            frame.word(1),
            Err(InternalError::TruncatedInstruction { ip: 7 })
        );
        assert_eq!(frame.jump_target(8), Ok(8));
        assert_eq!(
            frame.jump_target(9),
            Err(InternalError::JumpOutOfRange { target: 9, size: 8 })
        );
        assert_eq!(
            frame.name(0),
            Err(InternalError::NameOutOfRange { index: 0, count: 0 })
        );
    }
}
