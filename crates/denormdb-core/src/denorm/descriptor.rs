use crate::{
    denorm::compute::{ErasedCompute, SkipRule},
    depend::{DependOnRelated, ResolvedDependency},
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::entity::EntityModel,
    obs::sink::{self, DenormEvent},
    value::Value,
};
use std::{any::Any, cell::OnceCell, fmt, rc::Rc};
use thiserror::Error as ThisError;

///
/// DescriptorError
///

#[derive(Debug, ThisError)]
pub enum DescriptorError {
    #[error("{kind} descriptor already registered for '{entity_path}.{field_name}'")]
    DuplicateDescriptor {
        entity_path: &'static str,
        field_name: &'static str,
        kind: DenormKind,
    },

    #[error("descriptor '{entity_path}.{field_name}' was set up twice")]
    SetupRanTwice {
        entity_path: &'static str,
        field_name: &'static str,
    },

    #[error("descriptor '{entity_path}.{field_name}' used before its type was marked ready")]
    NotResolved {
        entity_path: &'static str,
        field_name: &'static str,
    },

    #[error("{kind} descriptor '{entity_path}.{field_name}' has no compute rule")]
    MissingCompute {
        entity_path: &'static str,
        field_name: &'static str,
        kind: DenormKind,
    },
}

impl DescriptorError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateDescriptor { .. }
            | Self::SetupRanTwice { .. }
            | Self::NotResolved { .. } => ErrorClass::InvariantViolation,
            Self::MissingCompute { .. } => ErrorClass::Internal,
        }
    }
}

impl From<DescriptorError> for InternalError {
    fn from(err: DescriptorError) -> Self {
        Self::classified(err.class(), ErrorOrigin::Descriptor, err.to_string())
    }
}

///
/// DenormKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DenormKind {
    /// Computed/callback field: recomputed on every save and on triggers.
    Callback,
    /// Related-row count maintained externally by the trigger mechanism.
    Count,
    /// Opaque change-detection token.
    CacheKey,
}

impl fmt::Display for DenormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Callback => "callback",
            Self::Count => "count",
            Self::CacheKey => "cache-key",
        };
        write!(f, "{label}")
    }
}

///
/// CountSpec
///
/// Relation manager and row filter a count descriptor publishes to the
/// trigger mechanism. The engine itself never counts in-process.
///

#[derive(Clone, Debug)]
pub struct CountSpec {
    pub relation: &'static str,
    /// Equality pairs the trigger mechanism applies when counting rows.
    pub filter: Vec<(&'static str, Value)>,
}

///
/// DenormDescriptor
///
/// One denormalized attribute's recomputation rule plus its dependency
/// list. Built when a field wrapper attaches to an entity type; the
/// dependency list is resolved exactly once, when the owning type is marked
/// ready, and the descriptor is immutable from then on.
///

pub struct DenormDescriptor {
    kind: DenormKind,
    entity_path: &'static str,
    field_name: &'static str,
    compute: Option<Rc<dyn ErasedCompute>>,
    depend: Vec<DependOnRelated>,
    skip: Option<SkipRule>,
    count_spec: Option<CountSpec>,
    resolved: OnceCell<Vec<ResolvedDependency>>,
}

impl DenormDescriptor {
    pub(crate) fn callback(
        entity_path: &'static str,
        field_name: &'static str,
        compute: Rc<dyn ErasedCompute>,
        depend: Vec<DependOnRelated>,
        skip: Option<SkipRule>,
    ) -> Self {
        Self {
            kind: DenormKind::Callback,
            entity_path,
            field_name,
            compute: Some(compute),
            depend,
            skip,
            count_spec: None,
            resolved: OnceCell::new(),
        }
    }

    pub(crate) fn count(
        entity_path: &'static str,
        field_name: &'static str,
        count_spec: CountSpec,
        skip: Option<SkipRule>,
    ) -> Self {
        // The count relation itself is the dependency edge; the trigger
        // mechanism maintains the stored value through it.
        let depend = vec![DependOnRelated::new(count_spec.relation)];

        Self {
            kind: DenormKind::Count,
            entity_path,
            field_name,
            compute: None,
            depend,
            skip,
            count_spec: Some(count_spec),
            resolved: OnceCell::new(),
        }
    }

    pub(crate) fn cache_key(
        entity_path: &'static str,
        field_name: &'static str,
        compute: Rc<dyn ErasedCompute>,
        depend: Vec<DependOnRelated>,
    ) -> Self {
        Self {
            kind: DenormKind::CacheKey,
            entity_path,
            field_name,
            compute: Some(compute),
            depend,
            skip: None,
            count_spec: None,
            resolved: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> DenormKind {
        self.kind
    }

    #[must_use]
    pub const fn entity_path(&self) -> &'static str {
        self.entity_path
    }

    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        self.field_name
    }

    #[must_use]
    pub const fn count_spec(&self) -> Option<&CountSpec> {
        self.count_spec.as_ref()
    }

    /// Declared (unresolved) dependency list.
    #[must_use]
    pub fn declared_dependencies(&self) -> &[DependOnRelated] {
        &self.depend
    }

    /// Resolved dependency list; `None` until the owning type is ready.
    #[must_use]
    pub fn resolved_dependencies(&self) -> Option<&[ResolvedDependency]> {
        self.resolved.get().map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Whether a change through the named relation fires this descriptor.
    #[must_use]
    pub fn depends_on_relation(&self, relation: &str) -> bool {
        self.resolved
            .get()
            .is_some_and(|deps| deps.iter().any(|dep| dep.relation == relation))
    }

    /// Resolve the declared dependency list against the owning type's model.
    /// Called by the type-ready hook; failures surface at type-definition
    /// time, never at first save.
    pub(crate) fn setup(&self, model: &'static EntityModel) -> Result<(), InternalError> {
        let resolved = self
            .depend
            .iter()
            .map(|dep| dep.resolve(model))
            .collect::<Result<Vec<_>, _>>()?;

        let dependencies = resolved.len();
        self.resolved.set(resolved).map_err(|_| {
            InternalError::from(DescriptorError::SetupRanTwice {
                entity_path: self.entity_path,
                field_name: self.field_name,
            })
        })?;

        sink::record(DenormEvent::SetupResolved {
            entity_path: self.entity_path,
            field_name: self.field_name,
            dependencies,
        });

        Ok(())
    }

    /// Invoke the recomputation rule. Count descriptors have none: their
    /// stored value is maintained externally and must never be recomputed
    /// in-process.
    pub(crate) fn compute(&self, instance: &dyn Any) -> Result<Value, InternalError> {
        let compute = self.compute.as_ref().ok_or(DescriptorError::MissingCompute {
            entity_path: self.entity_path,
            field_name: self.field_name,
            kind: self.kind,
        })?;

        compute.compute(instance)
    }

    #[must_use]
    pub(crate) fn should_skip(&self, instance: &dyn Any) -> bool {
        self.skip
            .as_ref()
            .is_some_and(|skip| skip.should_skip(instance))
    }
}
