//! The runtime context shared by every invocation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::builtins::CoreBuiltins;
use crate::classdb::NativeClasses;
use crate::config::VmConfig;
use crate::function::Function;
use crate::profile::{FunctionProfile, ProfileEntry};
use crate::signals::SignalHub;
use crate::tables::{Builtins, ClassDb, Debugger, EventHub};
use crate::value::Value;

/// The Bytescript virtual machine.
///
/// Owns the global table, the external collaborators, profiling counters and
/// the current call depth. Functions, frames and continuations are separate;
/// the VM is passed explicitly to whatever runs them.
pub struct Vm {
    pub(crate) config: VmConfig,
    pub(crate) globals: Vec<Value>,
    pub(crate) builtins: Box<dyn Builtins>,
    pub(crate) class_db: Box<dyn ClassDb>,
    pub(crate) events: Box<dyn EventHub>,
    pub(crate) debugger: Option<Rc<RefCell<dyn Debugger>>>,
    pub(crate) profiles: HashMap<String, FunctionProfile>,
    pub(crate) call_depth: usize,
}

impl Vm {
    /// A VM with the core built-ins, the default class registry and signal hub.
    pub fn new(config: VmConfig) -> Self {
        Self {
            globals: vec![Value::Nil; config.globals],
            config,
            builtins: Box::new(CoreBuiltins::new()),
            class_db: Box::new(NativeClasses::new()),
            events: Box::new(SignalHub::new()),
            debugger: None,
            profiles: HashMap::new(),
            call_depth: 0,
        }
    }

    pub fn with_builtins(mut self, builtins: impl Builtins + 'static) -> Self {
        self.builtins = Box::new(builtins);
        self
    }

    pub fn with_class_db(mut self, class_db: impl ClassDb + 'static) -> Self {
        self.class_db = Box::new(class_db);
        self
    }

    pub fn with_events(mut self, events: impl EventHub + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    /// Attach a debugger. The caller keeps a handle to inspect it.
    pub fn with_debugger(mut self, debugger: Rc<RefCell<dyn Debugger>>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// Overwrite global `index`. Returns false when out of range.
    pub fn set_global(&mut self, index: usize, value: Value) -> bool {
        match self.globals.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Append a global and return its index.
    pub fn add_global(&mut self, value: Value) -> usize {
        self.globals.push(value);
        self.globals.len() - 1
    }

    /// Number of script invocations currently running.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Profiling snapshot, most expensive first.
    pub fn profile(&self) -> Vec<ProfileEntry> {
        let mut entries: Vec<ProfileEntry> = self
            .profiles
            .iter()
            .map(|(signature, p)| ProfileEntry::new(signature, p))
            .collect();
        entries.sort_by(|a, b| {
            b.total_time
                .cmp(&a.total_time)
                .then_with(|| a.signature.cmp(&b.signature))
        });
        entries
    }

    /// Close the current profiling frame: per-frame counters move into the
    /// `last_frame_*` fields and restart from zero.
    pub fn profiling_frame(&mut self) {
        for profile in self.profiles.values_mut() {
            profile.roll_frame();
        }
    }

    pub fn clear_profile(&mut self) {
        self.profiles.clear();
    }

    pub(crate) fn record_profile(&mut self, function: &Function, total: Duration, nested: Duration) {
        let signature = format!("{}::{}", function.source(), function.name());
        self.profiles
            .entry(signature)
            .or_default()
            .record(total, nested);
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}
