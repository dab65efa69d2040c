//! Event sink boundary.
//!
//! This module is the only allowed bridge between engine logic and the
//! global counter state.

use crate::{
    denorm::descriptor::DenormKind,
    lifecycle::{HookKind, SaveMode},
    obs::{self, DenormCounters},
};
use std::{cell::RefCell, rc::Rc};

///
/// DenormEvent
///

#[derive(Clone, Copy, Debug)]
pub enum DenormEvent {
    DescriptorRegistered {
        entity_path: &'static str,
        field_name: &'static str,
        kind: DenormKind,
    },
    HookRegistered {
        kind: HookKind,
        entity_path: &'static str,
        handler_id: &'static str,
    },
    DuplicateHookIgnored {
        kind: HookKind,
        entity_path: &'static str,
        handler_id: &'static str,
    },
    SetupResolved {
        entity_path: &'static str,
        field_name: &'static str,
        dependencies: usize,
    },
    ReadBack {
        entity_path: &'static str,
        field_name: &'static str,
        mode: SaveMode,
    },
    TokenIssued,
    AssociationChanged {
        entity_path: &'static str,
        relation: &'static str,
    },
    RecomputeApplied {
        entity_path: &'static str,
        field_name: &'static str,
    },
    RecomputeSkipped {
        entity_path: &'static str,
        field_name: &'static str,
    },
}

///
/// DenormSink
///

pub trait DenormSink {
    fn record(&self, event: DenormEvent);
}

/// GlobalDenormSink
/// Default process-local sink that writes into global counter state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalDenormSink;

impl DenormSink for GlobalDenormSink {
    fn record(&self, event: DenormEvent) {
        obs::with_counters_mut(|counters: &mut DenormCounters| match event {
            DenormEvent::DescriptorRegistered { .. } => {
                counters.descriptors_registered = counters.descriptors_registered.saturating_add(1);
            }
            DenormEvent::HookRegistered { .. } => {
                counters.hooks_registered = counters.hooks_registered.saturating_add(1);
            }
            DenormEvent::DuplicateHookIgnored { .. } => {
                counters.duplicate_hook_registrations =
                    counters.duplicate_hook_registrations.saturating_add(1);
            }
            DenormEvent::SetupResolved { .. } => {
                counters.setups_resolved = counters.setups_resolved.saturating_add(1);
            }
            DenormEvent::ReadBack { .. } => {
                counters.read_backs = counters.read_backs.saturating_add(1);
            }
            DenormEvent::TokenIssued => {
                counters.tokens_issued = counters.tokens_issued.saturating_add(1);
            }
            DenormEvent::AssociationChanged { .. } => {
                counters.associations_changed = counters.associations_changed.saturating_add(1);
            }
            DenormEvent::RecomputeApplied { .. } => {
                counters.recomputes_applied = counters.recomputes_applied.saturating_add(1);
            }
            DenormEvent::RecomputeSkipped { .. } => {
                counters.recomputes_skipped = counters.recomputes_skipped.saturating_add(1);
            }
        });
    }
}

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn DenormSink>>> = const { RefCell::new(None) };
}

pub(crate) fn record(event: DenormEvent) {
    let override_sink = SINK_OVERRIDE.with_borrow(Clone::clone);
    if let Some(sink) = override_sink {
        sink.record(event);
    } else {
        GlobalDenormSink.record(event);
    }
}

/// Run a closure with a temporary sink override, restoring the previous sink
/// afterwards (including on unwind).
pub fn with_sink<T>(sink: Rc<dyn DenormSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn DenormSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with_borrow_mut(|slot| *slot = self.0.take());
        }
    }

    let prev = SINK_OVERRIDE.with_borrow_mut(|slot| slot.replace(sink));
    let _guard = Guard(prev);

    f()
}
