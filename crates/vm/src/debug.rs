//! A recording debugger.
//!
//! [`ScriptDebugger`] keeps breakpoints, records every break and error it
//! sees, and answers each break with the next queued [`DebugCommand`]
//! (continue when the queue is empty).

use std::collections::{BTreeSet, VecDeque};

use crate::error::ScriptError;
use crate::tables::{BreakContext, Debugger};
use crate::value::Value;

/// What to do after a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    Continue,
    /// Break at the next line, entering calls.
    StepInto,
    /// Break at the next line of the same function.
    StepOver,
}

/// One recorded break.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakRecord {
    pub reason: String,
    pub function: String,
    pub source: String,
    pub line: u32,
    pub locals: Vec<(String, Value)>,
}

#[derive(Debug)]
pub struct ScriptDebugger {
    breakpoints: BTreeSet<(String, u32)>,
    commands: VecDeque<DebugCommand>,
    lines_left: i32,
    depth: i32,
    trap_errors: bool,
    breaks: Vec<BreakRecord>,
    errors: Vec<ScriptError>,
    polls: usize,
}

impl ScriptDebugger {
    pub fn new() -> Self {
        Self {
            breakpoints: BTreeSet::new(),
            commands: VecDeque::new(),
            lines_left: -1,
            depth: -1,
            trap_errors: false,
            breaks: Vec::new(),
            errors: Vec::new(),
            polls: 0,
        }
    }

    pub fn insert_breakpoint(&mut self, source: &str, line: u32) {
        self.breakpoints.insert((source.to_string(), line));
    }

    pub fn remove_breakpoint(&mut self, source: &str, line: u32) {
        self.breakpoints.remove(&(source.to_string(), line));
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Queue the answer to a future break.
    pub fn queue(&mut self, command: DebugCommand) {
        self.commands.push_back(command);
    }

    /// Apply `command` now, e.g. to start stepping before a call.
    pub fn apply(&mut self, command: DebugCommand) {
        let (lines_left, depth) = match command {
            DebugCommand::Continue => (-1, -1),
            DebugCommand::StepInto => (1, -1),
            DebugCommand::StepOver => (1, 0),
        };
        self.lines_left = lines_left;
        self.depth = depth;
    }

    /// When set, errors are reported as handled and not logged by the VM.
    pub fn set_trap_errors(&mut self, trap: bool) {
        self.trap_errors = trap;
    }

    pub fn breaks(&self) -> &[BreakRecord] {
        &self.breaks
    }

    pub fn errors(&self) -> &[ScriptError] {
        &self.errors
    }

    /// Number of line markers seen.
    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl Default for ScriptDebugger {
    fn default() -> Self {
        Self::new()
    }
}

impl Debugger for ScriptDebugger {
    fn on_error(&mut self, error: &ScriptError) -> bool {
        self.errors.push(error.clone());
        self.trap_errors
    }

    fn on_break(&mut self, context: &BreakContext<'_>) {
        self.breaks.push(BreakRecord {
            reason: context.reason.to_string(),
            function: context.function.to_string(),
            source: context.source.to_string(),
            line: context.line,
            locals: context
                .locals
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        });
        let command = self.commands.pop_front().unwrap_or(DebugCommand::Continue);
        self.apply(command);
    }

    fn is_breakpoint(&self, line: u32, source: &str) -> bool {
        !self.breakpoints.is_empty() && self.breakpoints.contains(&(source.to_string(), line))
    }

    fn lines_left(&self) -> i32 {
        self.lines_left
    }

    fn set_lines_left(&mut self, lines: i32) {
        self.lines_left = lines;
    }

    fn depth(&self) -> i32 {
        self.depth
    }

    fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    fn line_poll(&mut self) {
        self.polls += 1;
    }
}
