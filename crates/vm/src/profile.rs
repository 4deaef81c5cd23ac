//! Per-function profiling counters.
//!
//! Counters are only updated when [`VmConfig::profiling`](crate::VmConfig) is
//! set. Times are in microseconds.

use std::time::Duration;

use serde::Serialize;

/// Running counters for one function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionProfile {
    pub call_count: u64,
    pub total_time: u64,
    pub self_time: u64,
    pub frame_call_count: u64,
    pub frame_total_time: u64,
    pub frame_self_time: u64,
    pub last_frame_call_count: u64,
    pub last_frame_total_time: u64,
    pub last_frame_self_time: u64,
}

impl FunctionProfile {
    /// Account for one finished invocation. `nested` is the time spent in
    /// calls made from it.
    pub(crate) fn record(&mut self, total: Duration, nested: Duration) {
        let total = micros(total);
        let own = total.saturating_sub(micros(nested));
        self.call_count += 1;
        self.total_time += total;
        self.self_time += own;
        self.frame_call_count += 1;
        self.frame_total_time += total;
        self.frame_self_time += own;
    }

    pub(crate) fn roll_frame(&mut self) {
        self.last_frame_call_count = std::mem::take(&mut self.frame_call_count);
        self.last_frame_total_time = std::mem::take(&mut self.frame_total_time);
        self.last_frame_self_time = std::mem::take(&mut self.frame_self_time);
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// Snapshot of one function's counters, as returned by
/// [`Vm::profile`](crate::Vm::profile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    /// `source::name`.
    pub signature: String,
    pub call_count: u64,
    pub total_time: u64,
    pub self_time: u64,
    pub last_frame_call_count: u64,
    pub last_frame_total_time: u64,
    pub last_frame_self_time: u64,
}

impl ProfileEntry {
    pub(crate) fn new(signature: &str, profile: &FunctionProfile) -> Self {
        Self {
            signature: signature.to_string(),
            call_count: profile.call_count,
            total_time: profile.total_time,
            self_time: profile.self_time,
            last_frame_call_count: profile.last_frame_call_count,
            last_frame_total_time: profile.last_frame_total_time,
            last_frame_self_time: profile.last_frame_self_time,
        }
    }
}
