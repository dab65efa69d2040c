use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use std::{cell::RefCell, collections::HashMap, rc::Rc};
use thiserror::Error as ThisError;

///
/// StoreRegistryError
///

#[derive(Debug, ThisError)]
pub enum StoreRegistryError {
    #[error("no store backend registered for '{0}'")]
    BackendNotFound(String),

    #[error("store backend for '{0}' already registered")]
    BackendAlreadyRegistered(String),
}

impl StoreRegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::BackendNotFound(_) => ErrorClass::Internal,
            Self::BackendAlreadyRegistered(_) => ErrorClass::InvariantViolation,
        }
    }
}

impl From<StoreRegistryError> for InternalError {
    fn from(err: StoreRegistryError) -> Self {
        Self::classified(err.class(), ErrorOrigin::Store, err.to_string())
    }
}

///
/// StoreBackend
///
/// Point-lookup surface the host persistence layer supplies. `read_scalar`
/// backs the read-back policies (count and cache-key UPDATE paths) and the
/// association snapshots; `write_scalar` backs dependency-triggered
/// recomputation.
///
/// A missing row must surface as a `NotFound`-classed error
/// ([`InternalError::store_not_found`]); callers treat it as fatal for the
/// enclosing save.
///

pub trait StoreBackend {
    fn read_scalar(
        &self,
        entity_path: &str,
        key: &crate::value::Value,
        field: &str,
    ) -> Result<crate::value::Value, InternalError>;

    fn write_scalar(
        &self,
        entity_path: &str,
        key: &crate::value::Value,
        field: &str,
        value: crate::value::Value,
    ) -> Result<(), InternalError>;
}

///
/// StoreRegistry
///
/// Process-local registry binding entity paths to store backends.
/// Mutated at type-registration time only.
///

#[derive(Default)]
pub struct StoreRegistry {
    backends: HashMap<&'static str, Rc<dyn StoreBackend>>,
}

impl StoreRegistry {
    /// Create an empty store registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an entity path to its backend.
    pub fn register_backend(
        &mut self,
        path: &'static str,
        backend: Rc<dyn StoreBackend>,
    ) -> Result<(), InternalError> {
        if self.backends.contains_key(path) {
            return Err(StoreRegistryError::BackendAlreadyRegistered(path.to_string()).into());
        }

        self.backends.insert(path, backend);
        Ok(())
    }

    /// Look up a backend by entity path.
    pub fn try_get_backend(&self, path: &str) -> Result<Rc<dyn StoreBackend>, InternalError> {
        self.backends
            .get(path)
            .cloned()
            .ok_or_else(|| StoreRegistryError::BackendNotFound(path.to_string()).into())
    }
}

thread_local! {
    static STORE_REGISTRY: RefCell<StoreRegistry> = RefCell::new(StoreRegistry::new());
}

/// Bind an entity path to its backend in the process-local registry.
pub fn register_backend(
    path: &'static str,
    backend: Rc<dyn StoreBackend>,
) -> Result<(), InternalError> {
    STORE_REGISTRY.with_borrow_mut(|registry| registry.register_backend(path, backend))
}

/// Run a closure against the backend registered for an entity path.
pub fn with_backend<R>(
    path: &str,
    f: impl FnOnce(&dyn StoreBackend) -> Result<R, InternalError>,
) -> Result<R, InternalError> {
    let backend = STORE_REGISTRY.with_borrow(|registry| registry.try_get_backend(path))?;

    f(backend.as_ref())
}

/// Drop all registered backends.
#[cfg(test)]
pub(crate) fn reset() {
    STORE_REGISTRY.with_borrow_mut(|registry| *registry = StoreRegistry::new());
}
