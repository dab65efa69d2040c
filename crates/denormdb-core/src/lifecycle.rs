//! Lifecycle hook dispatcher.
//!
//! Bridges descriptor setup and recomputation into the host entity
//! lifecycle. Hooks are held in an explicit process-local registry with
//! typed registration functions; registration is idempotent per
//! (hook kind, entity path, handler id) and happens at type-definition time
//! only, so concurrently-saving instances never mutate shared state here.

use crate::{
    denorm::{
        descriptor::{DenormKind, DescriptorError},
        registry as descriptors,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    obs::sink::{self, DenormEvent},
    store,
    traits::{EntityKind, EntityValue},
    value::Value,
};
use std::{
    any::Any,
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap},
    rc::Rc,
};
use thiserror::Error as ThisError;

pub(crate) const M2M_PRE_SAVE: &str = "m2m_pre_save";
pub(crate) const M2M_POST_SAVE: &str = "m2m_post_save";

///
/// HookError
///

#[derive(Debug, ThisError)]
pub enum HookError {
    #[error("type '{0}' was already marked ready; attach fields before marking")]
    TypeAlreadyReady(&'static str),

    #[error("'{entity_path}' rejected a write to attribute '{field_name}'")]
    AttributeWriteRejected {
        entity_path: &'static str,
        field_name: &'static str,
    },

    #[error("hook for '{0}' invoked with an instance of a different entity type")]
    WrongInstanceType(&'static str),
}

impl HookError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::TypeAlreadyReady(_) | Self::AttributeWriteRejected { .. } => {
                ErrorClass::InvariantViolation
            }
            Self::WrongInstanceType(_) => ErrorClass::Internal,
        }
    }
}

impl From<HookError> for InternalError {
    fn from(err: HookError) -> Self {
        Self::classified(err.class(), ErrorOrigin::Hook, err.to_string())
    }
}

///
/// SaveMode
///
/// INSERT/UPDATE split driving the pre-save value policies.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveMode {
    Insert,
    Update,
}

impl SaveMode {
    #[must_use]
    pub const fn is_insert(self) -> bool {
        matches!(self, Self::Insert)
    }
}

///
/// HookKind
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum HookKind {
    TypeReady,
    BeforeSave,
    AfterSave,
}

type TypeReadyHandler = Rc<dyn Fn() -> Result<(), InternalError>>;
type BeforeSaveHandler = Rc<dyn Fn(&dyn Any, SaveMode) -> Result<(), InternalError>>;
type AfterSaveHandler = Rc<dyn Fn(&mut dyn Any) -> Result<(), InternalError>>;

///
/// HookRegistry
///
/// Explicit hook storage keyed by entity path, with an idempotence set over
/// (hook kind, entity path, handler id). Duplicate registration is a no-op,
/// not an error.
///

#[derive(Default)]
struct HookRegistry {
    seen: BTreeSet<(HookKind, &'static str, &'static str)>,
    ready: BTreeSet<&'static str>,
    type_ready: HashMap<&'static str, Vec<TypeReadyHandler>>,
    before_save: HashMap<&'static str, Vec<BeforeSaveHandler>>,
    after_save: HashMap<&'static str, Vec<AfterSaveHandler>>,
}

thread_local! {
    static HOOKS: RefCell<HookRegistry> = RefCell::new(HookRegistry::default());
}

// Record a registration attempt in the idempotence set. Returns whether the
// handler is new; duplicates are reported as events, never as errors.
fn note_registration(
    kind: HookKind,
    entity_path: &'static str,
    handler_id: &'static str,
) -> Result<bool, InternalError> {
    HOOKS.with_borrow_mut(|hooks| {
        if kind == HookKind::TypeReady && hooks.ready.contains(entity_path) {
            return Err(HookError::TypeAlreadyReady(entity_path).into());
        }

        if hooks.seen.insert((kind, entity_path, handler_id)) {
            sink::record(DenormEvent::HookRegistered {
                kind,
                entity_path,
                handler_id,
            });
            Ok(true)
        } else {
            sink::record(DenormEvent::DuplicateHookIgnored {
                kind,
                entity_path,
                handler_id,
            });
            Ok(false)
        }
    })
}

/// Register a type-ready handler. Rejected once the type is marked ready;
/// duplicate (path, handler id) pairs are silently ignored.
pub fn on_type_ready(
    entity_path: &'static str,
    handler_id: &'static str,
    handler: TypeReadyHandler,
) -> Result<(), InternalError> {
    if note_registration(HookKind::TypeReady, entity_path, handler_id)? {
        HOOKS.with_borrow_mut(|hooks| {
            hooks.type_ready.entry(entity_path).or_default().push(handler);
        });
    }

    Ok(())
}

/// Register a before-save handler; duplicates are silently ignored.
pub fn on_before_save(
    entity_path: &'static str,
    handler_id: &'static str,
    handler: BeforeSaveHandler,
) -> Result<(), InternalError> {
    if note_registration(HookKind::BeforeSave, entity_path, handler_id)? {
        HOOKS.with_borrow_mut(|hooks| {
            hooks
                .before_save
                .entry(entity_path)
                .or_default()
                .push(handler);
        });
    }

    Ok(())
}

/// Register an after-save handler; duplicates are silently ignored.
pub fn on_after_save(
    entity_path: &'static str,
    handler_id: &'static str,
    handler: AfterSaveHandler,
) -> Result<(), InternalError> {
    if note_registration(HookKind::AfterSave, entity_path, handler_id)? {
        HOOKS.with_borrow_mut(|hooks| {
            hooks
                .after_save
                .entry(entity_path)
                .or_default()
                .push(handler);
        });
    }

    Ok(())
}

/// Whether the entity type has been marked ready.
#[must_use]
pub fn type_ready(entity_path: &str) -> bool {
    HOOKS.with_borrow(|hooks| hooks.ready.contains(entity_path))
}

/// Finalize an entity type: run its deferred setup handlers (dependency
/// resolution) and mark it ready. Setup failures surface here, at
/// type-definition time, never at first save. Calling again is a no-op.
pub fn mark_type_ready<E: EntityKind>() -> Result<(), InternalError> {
    let entity_path = E::PATH;
    if type_ready(entity_path) {
        return Ok(());
    }

    let handlers = HOOKS
        .with_borrow(|hooks| hooks.type_ready.get(entity_path).cloned())
        .unwrap_or_default();
    for handler in handlers {
        handler()?;
    }

    HOOKS.with_borrow_mut(|hooks| {
        hooks.ready.insert(entity_path);
    });

    Ok(())
}

/// Apply every denormalized-field pre-save policy for this instance, then
/// run the before-save hooks (many-to-many snapshot capture). Must be called
/// before the host performs the row write; a failure aborts the save with no
/// partial attribute state persisted.
pub fn before_save<E>(instance: &mut E, mode: SaveMode) -> Result<(), InternalError>
where
    E: EntityKind + EntityValue,
{
    let key = instance.key();

    for descriptor in descriptors::descriptors_for(E::PATH) {
        if !descriptor.is_resolved() {
            return Err(DescriptorError::NotResolved {
                entity_path: descriptor.entity_path(),
                field_name: descriptor.field_name(),
            }
            .into());
        }

        let value = match (descriptor.kind(), mode) {
            // Recomputed unconditionally on every save, INSERT or UPDATE.
            (DenormKind::Callback, _) => descriptor.compute(&*instance)?,

            // A new row can have no related rows yet, and an external
            // trigger cannot race ahead of the insert.
            (DenormKind::Count, SaveMode::Insert) => Value::Uint(0),

            (DenormKind::CacheKey, SaveMode::Insert) => descriptor.compute(&*instance)?,

            // Never trust the in-memory value: a trigger may have updated
            // the stored one after this instance was loaded.
            (DenormKind::Count | DenormKind::CacheKey, SaveMode::Update) => {
                read_back::<E>(&key, descriptor.field_name(), mode)?
            }
        };

        write_attribute(instance, descriptor.field_name(), value)?;
    }

    let handlers = HOOKS
        .with_borrow(|hooks| hooks.before_save.get(E::PATH).cloned())
        .unwrap_or_default();
    for handler in handlers {
        handler(&*instance, mode)?;
    }

    Ok(())
}

/// Run the after-save hooks: detect many-to-many association changes and
/// recompute (and persist) any descriptor whose dependency graph covers the
/// changed association.
pub fn after_save<E>(instance: &mut E) -> Result<(), InternalError>
where
    E: EntityKind + EntityValue,
{
    let handlers = HOOKS
        .with_borrow(|hooks| hooks.after_save.get(E::PATH).cloned())
        .unwrap_or_default();
    for handler in handlers {
        handler(&mut *instance)?;
    }

    Ok(())
}

fn write_attribute<E: EntityValue>(
    instance: &mut E,
    field_name: &'static str,
    value: Value,
) -> Result<(), InternalError> {
    if instance.set_value(field_name, value) {
        Ok(())
    } else {
        Err(HookError::AttributeWriteRejected {
            entity_path: E::PATH,
            field_name,
        }
        .into())
    }
}

fn read_back<E: EntityKind>(
    key: &Value,
    field_name: &'static str,
    mode: SaveMode,
) -> Result<Value, InternalError> {
    let value = store::with_backend(E::PATH, |backend| backend.read_scalar(E::PATH, key, field_name))?;
    sink::record(DenormEvent::ReadBack {
        entity_path: E::PATH,
        field_name,
        mode,
    });

    Ok(value)
}

// ============================================================================
// Many-to-many association tracking
// ============================================================================

type SnapshotKey = (&'static str, Value);
type AssociationSnapshot = BTreeMap<&'static str, Vec<Value>>;

thread_local! {
    static M2M_SNAPSHOTS: RefCell<HashMap<SnapshotKey, AssociationSnapshot>> =
        RefCell::new(HashMap::new());
}

/// Register the shared many-to-many pre/post-save handlers for one entity
/// type. Safe to call repeatedly (one registration per hook kind survives,
/// however many denormalized fields the type declares).
pub(crate) fn register_m2m_hooks<E>() -> Result<(), InternalError>
where
    E: EntityKind + EntityValue,
{
    on_before_save(
        E::PATH,
        M2M_PRE_SAVE,
        Rc::new(|instance: &dyn Any, mode| m2m_pre_save::<E>(instance, mode)),
    )?;
    on_after_save(
        E::PATH,
        M2M_POST_SAVE,
        Rc::new(|instance: &mut dyn Any| m2m_post_save::<E>(instance)),
    )?;

    Ok(())
}

// Capture the persisted association state before the row write. For an
// INSERT there is nothing persisted yet; the snapshot is empty lists.
fn m2m_pre_save<E>(instance: &dyn Any, mode: SaveMode) -> Result<(), InternalError>
where
    E: EntityKind + EntityValue,
{
    let instance = instance
        .downcast_ref::<E>()
        .ok_or(HookError::WrongInstanceType(E::PATH))?;

    let relations: Vec<_> = E::MODEL.many_to_many_relations().collect();
    if relations.is_empty() {
        return Ok(());
    }

    let key = instance.key();
    let mut snapshot = AssociationSnapshot::new();
    for relation in relations {
        let before = match mode {
            SaveMode::Insert => Vec::new(),
            SaveMode::Update => {
                let stored = store::with_backend(E::PATH, |backend| {
                    backend.read_scalar(E::PATH, &key, relation.field_name)
                })?;
                stored.as_list().map(<[Value]>::to_vec).unwrap_or_default()
            }
        };
        snapshot.insert(relation.field_name, before);
    }

    M2M_SNAPSHOTS.with_borrow_mut(|snapshots| {
        snapshots.insert((E::PATH, key), snapshot);
    });

    Ok(())
}

// Compare the pre-save snapshot against the instance's (now persisted)
// association state and recompute every descriptor whose dependency list
// covers a changed relation. Count descriptors are exempt: their stored
// value is maintained by the external trigger mechanism and must never be
// recomputed in-process.
fn m2m_post_save<E>(instance: &mut dyn Any) -> Result<(), InternalError>
where
    E: EntityKind + EntityValue,
{
    let instance = instance
        .downcast_mut::<E>()
        .ok_or(HookError::WrongInstanceType(E::PATH))?;

    let key = instance.key();
    let Some(snapshot) = M2M_SNAPSHOTS.with_borrow_mut(|snapshots| {
        snapshots.remove(&(E::PATH, key.clone()))
    }) else {
        return Ok(());
    };

    let mut changed: Vec<&'static str> = Vec::new();
    for (&relation, before) in &snapshot {
        let after = instance
            .get_value(relation)
            .as_ref()
            .and_then(Value::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        if &after != before {
            changed.push(relation);
            sink::record(DenormEvent::AssociationChanged {
                entity_path: E::PATH,
                relation,
            });
        }
    }
    if changed.is_empty() {
        return Ok(());
    }

    for descriptor in descriptors::descriptors_for(E::PATH) {
        if descriptor.kind() == DenormKind::Count {
            continue;
        }
        if !changed
            .iter()
            .any(|relation| descriptor.depends_on_relation(relation))
        {
            continue;
        }
        if descriptor.should_skip(&*instance) {
            sink::record(DenormEvent::RecomputeSkipped {
                entity_path: E::PATH,
                field_name: descriptor.field_name(),
            });
            continue;
        }

        let value = descriptor.compute(&*instance)?;
        write_attribute(instance, descriptor.field_name(), value.clone())?;
        store::with_backend(E::PATH, |backend| {
            backend.write_scalar(E::PATH, &key, descriptor.field_name(), value)
        })?;
        sink::record(DenormEvent::RecomputeApplied {
            entity_path: E::PATH,
            field_name: descriptor.field_name(),
        });
    }

    Ok(())
}

/// Number of live handlers for one (hook kind, entity path) pair.
#[cfg(test)]
pub(crate) fn handler_count(kind: HookKind, entity_path: &str) -> usize {
    HOOKS.with_borrow(|hooks| match kind {
        HookKind::TypeReady => hooks.type_ready.get(entity_path).map_or(0, Vec::len),
        HookKind::BeforeSave => hooks.before_save.get(entity_path).map_or(0, Vec::len),
        HookKind::AfterSave => hooks.after_save.get(entity_path).map_or(0, Vec::len),
    })
}

/// Drop all hooks, readiness marks, and pending snapshots.
#[cfg(test)]
pub(crate) fn reset() {
    HOOKS.with_borrow_mut(|hooks| *hooks = HookRegistry::default());
    M2M_SNAPSHOTS.with_borrow_mut(HashMap::clear);
}
