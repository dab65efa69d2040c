use std::cell::Cell;

///
/// DenormConfig
///
/// Process-local runtime configuration. Read on the hot paths, mutated only
/// at startup (or inside a scoped override in tests).
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DenormConfig {
    /// When set, computed-field descriptors do not publish dependency edges
    /// to the trigger surface (`dependents_of`). Matches hosts whose bulk
    /// write paths cannot honor row triggers; pre-save semantics are
    /// unaffected.
    pub bulk_unsafe_triggers: bool,
}

thread_local! {
    static CONFIG: Cell<DenormConfig> = const { Cell::new(DenormConfig { bulk_unsafe_triggers: false }) };
}

/// Current runtime configuration.
#[must_use]
pub fn config() -> DenormConfig {
    CONFIG.with(Cell::get)
}

/// Replace the runtime configuration.
pub fn set_config(config: DenormConfig) {
    CONFIG.with(|cell| cell.set(config));
}

/// Run a closure with a temporary configuration, restoring the previous one
/// afterwards (including on unwind).
pub fn with_config<T>(config: DenormConfig, f: impl FnOnce() -> T) -> T {
    struct Guard(DenormConfig);

    impl Drop for Guard {
        fn drop(&mut self) {
            CONFIG.with(|cell| cell.set(self.0));
        }
    }

    let prev = CONFIG.with(|cell| cell.replace(config));
    let _guard = Guard(prev);

    f()
}

#[cfg(test)]
mod tests {
    use super::{DenormConfig, config, set_config, with_config};

    #[test]
    fn with_config_restores_previous_state() {
        set_config(DenormConfig::default());
        assert!(!config().bulk_unsafe_triggers);

        with_config(
            DenormConfig {
                bulk_unsafe_triggers: true,
            },
            || {
                assert!(config().bulk_unsafe_triggers);
            },
        );

        assert!(
            !config().bulk_unsafe_triggers,
            "scoped override should restore the previous configuration"
        );
    }
}
