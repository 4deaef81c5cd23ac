//! VM configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`Vm`](crate::Vm). Every field has a default, so a partial
/// document deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Collect per-function call counts and timings.
    pub profiling: bool,
    /// Nested calls allowed before a call fails with a stack overflow.
    pub max_call_depth: usize,
    /// Initial size of the global table.
    pub globals: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            profiling: false,
            max_call_depth: 1024,
            globals: 0,
        }
    }
}
