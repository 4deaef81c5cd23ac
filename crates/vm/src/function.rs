//! Compiled function descriptors.
//!
//! A [`Function`] is immutable once built and shared through `Rc` by every
//! invocation and continuation that runs it.

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::class::ScriptClass;
use crate::error::BuildError;
use crate::value::Value;

/// A stack-debug record: `identifier` entered or left scope at `line` in
/// stack slot `pos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDebug {
    pub line: u32,
    pub pos: usize,
    pub added: bool,
    pub identifier: Rc<str>,
}

/// A compiled script function.
#[derive(Debug)]
pub struct Function {
    name: Rc<str>,
    source: Rc<str>,
    code: Vec<u32>,
    constants: Vec<Value>,
    names: Vec<Rc<str>>,
    argument_count: usize,
    default_arguments: Vec<usize>,
    stack_size: usize,
    call_size: usize,
    initial_line: u32,
    stack_debug: Vec<StackDebug>,
    pub(crate) script: Option<Weak<ScriptClass>>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn code(&self) -> &[u32] {
        &self.code
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn names(&self) -> &[Rc<str>] {
        &self.names
    }

    pub fn argument_count(&self) -> usize {
        self.argument_count
    }

    /// Number of trailing parameters that have a default value.
    pub fn default_argument_count(&self) -> usize {
        self.default_arguments.len().saturating_sub(1)
    }

    /// Jump table indexed by the number of missing arguments.
    pub fn default_arguments(&self) -> &[usize] {
        &self.default_arguments
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    pub fn call_size(&self) -> usize {
        self.call_size
    }

    pub fn initial_line(&self) -> u32 {
        self.initial_line
    }

    pub fn stack_debug(&self) -> &[StackDebug] {
        &self.stack_debug
    }

    /// The class this function is a member of, if it is still alive.
    pub fn script(&self) -> Option<Rc<ScriptClass>> {
        self.script.as_ref().and_then(Weak::upgrade)
    }

    /// Identifiers visible at `line` and the stack slot each one occupies,
    /// in the order they first entered scope.
    pub fn stack_member_state(&self, line: u32) -> Vec<(Rc<str>, usize)> {
        // identifier -> (first-seen order, stack of slots)
        let mut scopes: BTreeMap<Rc<str>, (usize, Vec<usize>)> = BTreeMap::new();
        let mut order = 0;

        for record in &self.stack_debug {
            if record.line > line {
                break;
            }
            if record.added {
                let entry = scopes.entry(record.identifier.clone()).or_insert_with(|| {
                    order += 1;
                    (order, Vec::new())
                });
                entry.1.push(record.pos);
            } else if let Some((_, slots)) = scopes.get_mut(&record.identifier) {
                slots.pop();
                if slots.is_empty() {
                    scopes.remove(&record.identifier);
                }
            }
        }

        let mut visible: Vec<(usize, Rc<str>, usize)> = scopes
            .into_iter()
            .filter_map(|(id, (order, slots))| slots.last().map(|&pos| (order, id, pos)))
            .collect();
        visible.sort_by_key(|(order, _, _)| *order);
        visible.into_iter().map(|(_, id, pos)| (id, pos)).collect()
    }
}

/// Assembles a [`Function`].
#[derive(Debug, Clone, Default)]
pub struct FunctionBuilder {
    name: String,
    source: String,
    code: Vec<u32>,
    constants: Vec<Value>,
    names: Vec<Rc<str>>,
    argument_count: usize,
    default_arguments: Vec<usize>,
    stack_size: usize,
    call_size: usize,
    initial_line: u32,
    stack_debug: Vec<StackDebug>,
}

impl FunctionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn source_is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn code(mut self, code: Vec<u32>) -> Self {
        self.code = code;
        self
    }

    pub fn constants(mut self, constants: Vec<Value>) -> Self {
        self.constants = constants;
        self
    }

    pub fn names(mut self, names: &[&str]) -> Self {
        self.names = names.iter().map(|n| Rc::from(*n)).collect();
        self
    }

    pub fn arguments(mut self, count: usize) -> Self {
        self.argument_count = count;
        self
    }

    /// Jump table for default arguments: entry `i` is where execution starts
    /// when `i` trailing arguments were omitted.
    pub fn default_arguments(mut self, targets: Vec<usize>) -> Self {
        self.default_arguments = targets;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    pub fn call_size(mut self, size: usize) -> Self {
        self.call_size = size;
        self
    }

    pub fn initial_line(mut self, line: u32) -> Self {
        self.initial_line = line;
        self
    }

    pub fn stack_debug(mut self, line: u32, pos: usize, added: bool, identifier: &str) -> Self {
        self.stack_debug.push(StackDebug {
            line,
            pos,
            added,
            identifier: Rc::from(identifier),
        });
        self
    }

    /// Validate and produce a free function (no owning class).
    pub fn build(self) -> Result<Function, BuildError> {
        if self.stack_size < self.argument_count {
            return Err(BuildError::StackTooSmall {
                function: self.name,
                stack_size: self.stack_size,
                argument_count: self.argument_count,
            });
        }
        let defaults = self.default_arguments.len().saturating_sub(1);
        if defaults > self.argument_count {
            return Err(BuildError::TooManyDefaults {
                function: self.name,
                defaults,
                argument_count: self.argument_count,
            });
        }
        if let Some(&target) = self.default_arguments.iter().find(|&&t| t > self.code.len()) {
            return Err(BuildError::DefaultTargetOutOfRange {
                function: self.name,
                target,
                size: self.code.len(),
            });
        }

        Ok(Function {
            name: Rc::from(self.name),
            source: Rc::from(self.source),
            code: self.code,
            constants: self.constants,
            names: self.names,
            argument_count: self.argument_count,
            default_arguments: self.default_arguments,
            stack_size: self.stack_size,
            call_size: self.call_size,
            initial_line: self.initial_line,
            stack_debug: self.stack_debug,
            script: None,
        })
    }
}
