use crate::{
    config,
    denorm::descriptor::{DenormDescriptor, DenormKind, DescriptorError},
    error::InternalError,
    obs::sink::{self, DenormEvent},
};
use std::{cell::RefCell, collections::HashMap, rc::Rc};

///
/// DenormRegistry
///
/// Process-local registry of denorm descriptors, keyed by owning entity
/// path. This is the registration surface the external trigger mechanism
/// reads to learn what to recompute and when. Mutated at type-definition
/// time only.
///

#[derive(Default)]
pub struct DenormRegistry {
    by_path: HashMap<&'static str, Vec<Rc<DenormDescriptor>>>,
}

impl DenormRegistry {
    /// Create an empty descriptor registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, enforcing attribute-name uniqueness per
    /// (entity path, kind).
    pub fn register(&mut self, descriptor: Rc<DenormDescriptor>) -> Result<(), InternalError> {
        let slot = self.by_path.entry(descriptor.entity_path()).or_default();

        let duplicate = slot.iter().any(|existing| {
            existing.field_name() == descriptor.field_name()
                && existing.kind() == descriptor.kind()
        });
        if duplicate {
            return Err(DescriptorError::DuplicateDescriptor {
                entity_path: descriptor.entity_path(),
                field_name: descriptor.field_name(),
                kind: descriptor.kind(),
            }
            .into());
        }

        sink::record(DenormEvent::DescriptorRegistered {
            entity_path: descriptor.entity_path(),
            field_name: descriptor.field_name(),
            kind: descriptor.kind(),
        });
        slot.push(descriptor);

        Ok(())
    }

    /// Descriptors declared on one entity type, in declaration order.
    #[must_use]
    pub fn descriptors_for(&self, entity_path: &str) -> Vec<Rc<DenormDescriptor>> {
        self.by_path.get(entity_path).cloned().unwrap_or_default()
    }

    /// Descriptors whose resolved dependency graph reaches the given target
    /// type. Callback descriptors are withheld when the runtime is
    /// configured with `bulk_unsafe_triggers`.
    #[must_use]
    pub fn dependents_of(&self, target_path: &str) -> Vec<Rc<DenormDescriptor>> {
        let withhold_callbacks = config::config().bulk_unsafe_triggers;

        self.by_path
            .values()
            .flatten()
            .filter(|descriptor| {
                !(withhold_callbacks && descriptor.kind() == DenormKind::Callback)
            })
            .filter(|descriptor| {
                descriptor
                    .resolved_dependencies()
                    .is_some_and(|deps| deps.iter().any(|dep| dep.target_path == target_path))
            })
            .cloned()
            .collect()
    }
}

thread_local! {
    static DENORM_REGISTRY: RefCell<DenormRegistry> = RefCell::new(DenormRegistry::new());
}

/// Register a descriptor in the process-local registry.
pub(crate) fn register(descriptor: Rc<DenormDescriptor>) -> Result<(), InternalError> {
    DENORM_REGISTRY.with_borrow_mut(|registry| registry.register(descriptor))
}

/// Descriptors declared on one entity type, in declaration order.
#[must_use]
pub fn descriptors_for(entity_path: &str) -> Vec<Rc<DenormDescriptor>> {
    DENORM_REGISTRY.with_borrow(|registry| registry.descriptors_for(entity_path))
}

/// Descriptors whose resolved dependency graph reaches the given target type.
#[must_use]
pub fn dependents_of(target_path: &str) -> Vec<Rc<DenormDescriptor>> {
    DENORM_REGISTRY.with_borrow(|registry| registry.dependents_of(target_path))
}

/// Drop all registered descriptors.
#[cfg(test)]
pub(crate) fn reset() {
    DENORM_REGISTRY.with_borrow_mut(|registry| *registry = DenormRegistry::new());
}

#[cfg(test)]
mod tests {
    use super::DenormRegistry;
    use crate::{
        config::{self, DenormConfig},
        denorm::{
            compute::ComputeRule,
            descriptor::{CountSpec, DenormDescriptor},
        },
        depend::DependOnRelated,
        error::ErrorClass,
        model::{
            entity::EntityModel,
            field::{EntityFieldKind, EntityFieldModel, RelationKind},
        },
        value::Value,
    };
    use std::rc::Rc;

    struct Author;

    const FIELDS: [EntityFieldModel; 2] = [
        EntityFieldModel {
            name: "id",
            kind: EntityFieldKind::Uint,
        },
        EntityFieldModel {
            name: "books",
            kind: EntityFieldKind::Relation {
                target_path: "registry_tests::Book",
                kind: RelationKind::ForeignKey,
            },
        },
    ];

    const MODEL: EntityModel = EntityModel {
        path: "registry_tests::Author",
        entity_name: "Author",
        primary_key: "id",
        fields: &FIELDS,
    };

    fn callback(field_name: &'static str) -> Rc<DenormDescriptor> {
        let (compute, depend) = ComputeRule::new(|_: &Author| Ok(Value::Null))
            .depends_on(DependOnRelated::new("books"))
            .into_parts();

        Rc::new(DenormDescriptor::callback(
            MODEL.path, field_name, compute, depend, None,
        ))
    }

    #[test]
    fn duplicate_field_of_same_kind_is_rejected() {
        let mut registry = DenormRegistry::new();
        registry
            .register(callback("summary"))
            .expect("first registration should succeed");

        let err = registry
            .register(callback("summary"))
            .expect_err("same (path, field, kind) must be unique");
        assert_eq!(err.class, ErrorClass::InvariantViolation);
        assert!(err.message.contains("registry_tests::Author.summary"));
    }

    #[test]
    fn same_field_name_of_different_kind_is_allowed() {
        let mut registry = DenormRegistry::new();
        registry
            .register(callback("stat"))
            .expect("callback registration should succeed");

        let count = Rc::new(DenormDescriptor::count(
            MODEL.path,
            "stat",
            CountSpec {
                relation: "books",
                filter: Vec::new(),
            },
            None,
        ));
        registry
            .register(count)
            .expect("uniqueness is scoped per descriptor kind");

        assert_eq!(registry.descriptors_for(MODEL.path).len(), 2);
    }

    #[test]
    fn dependents_walk_resolved_edges() {
        let mut registry = DenormRegistry::new();
        let descriptor = callback("summary");
        descriptor
            .setup(&MODEL)
            .expect("declared relation should resolve");
        registry
            .register(descriptor)
            .expect("registration should succeed");

        let unresolved = callback("draft");
        registry
            .register(unresolved)
            .expect("registration should succeed");

        let dependents = registry.dependents_of("registry_tests::Book");
        assert_eq!(
            dependents.len(),
            1,
            "only resolved descriptors are visible to the trigger surface"
        );
        assert_eq!(dependents[0].field_name(), "summary");

        assert!(registry.dependents_of("registry_tests::Elsewhere").is_empty());
    }

    #[test]
    fn bulk_unsafe_triggers_withhold_callback_edges() {
        let mut registry = DenormRegistry::new();
        let descriptor = callback("summary");
        descriptor
            .setup(&MODEL)
            .expect("declared relation should resolve");
        registry
            .register(descriptor)
            .expect("registration should succeed");

        config::with_config(
            DenormConfig {
                bulk_unsafe_triggers: true,
            },
            || {
                assert!(
                    registry.dependents_of("registry_tests::Book").is_empty(),
                    "bulk-unsafe mode should not publish callback edges"
                );
            },
        );

        assert_eq!(registry.dependents_of("registry_tests::Book").len(), 1);
    }
}
