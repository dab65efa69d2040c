//! Observability for the denormalization runtime.
//!
//! Engine logic MUST NOT mutate counter state directly; all instrumentation
//! flows through `DenormEvent` and `DenormSink` in [`sink`]. This module owns
//! only the default counter state and its report/reset surface.

pub mod sink;

use std::cell::RefCell;

///
/// DenormCounters
///
/// Cumulative event counters recorded by the default sink.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DenormCounters {
    pub descriptors_registered: u64,
    pub hooks_registered: u64,
    pub duplicate_hook_registrations: u64,
    pub setups_resolved: u64,
    pub read_backs: u64,
    pub tokens_issued: u64,
    pub associations_changed: u64,
    pub recomputes_applied: u64,
    pub recomputes_skipped: u64,
}

thread_local! {
    static COUNTERS: RefCell<DenormCounters> = RefCell::new(DenormCounters::default());
}

pub(crate) fn with_counters_mut<R>(f: impl FnOnce(&mut DenormCounters) -> R) -> R {
    COUNTERS.with_borrow_mut(f)
}

/// Snapshot the current counter state for endpoint/test plumbing.
#[must_use]
pub fn counters_report() -> DenormCounters {
    COUNTERS.with_borrow(|counters| *counters)
}

/// Reset all counter state.
pub fn counters_reset() {
    COUNTERS.with_borrow_mut(|counters| *counters = DenormCounters::default());
}
