//! In-memory store backend and runtime-reset helpers for the lifecycle
//! scenarios. Production code never depends on this module.

use crate::{
    config::{self, DenormConfig},
    denorm::registry as descriptors,
    error::InternalError,
    lifecycle::{self, SaveMode},
    obs, store,
    store::StoreBackend,
    traits::{EntityKind, EntityValue},
    value::Value,
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

/// Clear every process-local registry so a test starts from a blank
/// runtime, regardless of what ran earlier on this thread.
pub(crate) fn reset_runtime() {
    descriptors::reset();
    lifecycle::reset();
    store::reset();
    obs::counters_reset();
    config::set_config(DenormConfig::default());
}

///
/// MemoryStore
///
/// Row store keyed by (entity path, primary key). A missing row surfaces as
/// the fatal `NotFound` read-back failure; a present row with an unset
/// attribute reads as `Null`.
///

#[derive(Default)]
pub(crate) struct MemoryStore {
    rows: RefCell<HashMap<(String, Value), BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// Create a store and register it for the given entity paths.
    pub fn install(paths: &[&'static str]) -> Rc<Self> {
        let backend = Rc::new(Self::default());
        for &path in paths {
            store::register_backend(path, backend.clone())
                .expect("test backend registration should succeed");
        }

        backend
    }

    /// Direct persisted-store write, bypassing the save path. Simulates the
    /// external trigger mechanism correcting a stored value.
    pub fn set(&self, entity_path: &str, key: &Value, field: &str, value: Value) {
        self.rows
            .borrow_mut()
            .entry((entity_path.to_string(), key.clone()))
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Read a persisted attribute, if the row and attribute exist.
    pub fn get(&self, entity_path: &str, key: &Value, field: &str) -> Option<Value> {
        self.rows
            .borrow()
            .get(&(entity_path.to_string(), key.clone()))
            .and_then(|row| row.get(field).cloned())
    }

    pub fn row_exists(&self, entity_path: &str, key: &Value) -> bool {
        self.rows
            .borrow()
            .contains_key(&(entity_path.to_string(), key.clone()))
    }

    /// Drop a row, simulating a primary key vanishing between load and save.
    pub fn remove_row(&self, entity_path: &str, key: &Value) {
        self.rows
            .borrow_mut()
            .remove(&(entity_path.to_string(), key.clone()));
    }

    // Persist every attribute the instance exposes, as the host row write
    // would.
    fn write_instance<E>(&self, instance: &E)
    where
        E: EntityKind + EntityValue,
    {
        let key = instance.key();
        let mut rows = self.rows.borrow_mut();
        let row = rows.entry((E::PATH.to_string(), key)).or_default();
        for field in E::MODEL.fields {
            if let Some(value) = instance.get_value(field.name) {
                row.insert(field.name.to_string(), value);
            }
        }
    }
}

impl StoreBackend for MemoryStore {
    fn read_scalar(
        &self,
        entity_path: &str,
        key: &Value,
        field: &str,
    ) -> Result<Value, InternalError> {
        self.rows
            .borrow()
            .get(&(entity_path.to_string(), key.clone()))
            .map(|row| row.get(field).cloned().unwrap_or(Value::Null))
            .ok_or_else(|| InternalError::store_not_found(entity_path, field))
    }

    fn write_scalar(
        &self,
        entity_path: &str,
        key: &Value,
        field: &str,
        value: Value,
    ) -> Result<(), InternalError> {
        self.set(entity_path, key, field, value);

        Ok(())
    }
}

/// Drive one full host-save cycle: pre-save policies, the row write, then
/// the post-save association pass. Mirrors the order the host ORM uses.
pub(crate) fn save<E>(
    backend: &MemoryStore,
    instance: &mut E,
    mode: SaveMode,
) -> Result<(), InternalError>
where
    E: EntityKind + EntityValue,
{
    lifecycle::before_save(instance, mode)?;
    backend.write_instance(instance);
    lifecycle::after_save(instance)
}
