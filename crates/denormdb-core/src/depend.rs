use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{entity::EntityModel, field::RelationKind},
};
use serde::Serialize;
use thiserror::Error as ThisError;

///
/// DependencyError
///

#[derive(Debug, ThisError)]
pub enum DependencyError {
    #[error("'{entity_path}' has no relation named '{relation}'")]
    UnknownRelation {
        entity_path: &'static str,
        relation: &'static str,
    },

    #[error(
        "dependency on '{entity_path}.{relation}' targets '{declared}' but the relation reaches '{actual}'"
    )]
    TargetMismatch {
        entity_path: &'static str,
        relation: &'static str,
        declared: &'static str,
        actual: &'static str,
    },
}

impl DependencyError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownRelation { .. } | Self::TargetMismatch { .. } => {
                ErrorClass::InvariantViolation
            }
        }
    }
}

impl From<DependencyError> for InternalError {
    fn from(err: DependencyError) -> Self {
        Self::classified(err.class(), ErrorOrigin::Dependency, err.to_string())
    }
}

///
/// DependOnRelated
///
/// Declares a directed recomputation edge: changes to instances of the
/// related type, reachable via the named relation, require recomputation of
/// the owning descriptor. Immutable after construction; resolution against
/// the owning entity's model happens once, at type-ready time.
///
/// Shared between the computed-field rule path and
/// `CacheKeyField::depend_on_related`.
///

#[derive(Clone, Debug)]
pub struct DependOnRelated {
    relation: &'static str,
    target_path: Option<&'static str>,
    fields: Vec<&'static str>,
}

impl DependOnRelated {
    /// Declare a dependency through the named relation.
    #[must_use]
    pub const fn new(relation: &'static str) -> Self {
        Self {
            relation,
            target_path: None,
            fields: Vec::new(),
        }
    }

    /// Constrain the relation's target type; resolution fails when the
    /// relation reaches a different path.
    #[must_use]
    pub const fn target(mut self, path: &'static str) -> Self {
        self.target_path = Some(path);
        self
    }

    /// Restrict the trigger to changes of the listed related attributes.
    /// Empty (the default) means any attribute change fires.
    #[must_use]
    pub fn on_fields(mut self, fields: &[&'static str]) -> Self {
        self.fields = fields.to_vec();
        self
    }

    #[must_use]
    pub const fn relation(&self) -> &'static str {
        self.relation
    }

    /// Resolve this declaration against the owning entity's model.
    /// Fails fast on an unknown relation name or a target-path mismatch.
    pub(crate) fn resolve(
        &self,
        model: &'static EntityModel,
    ) -> Result<ResolvedDependency, DependencyError> {
        let Some(relation) = model.relation(self.relation) else {
            return Err(DependencyError::UnknownRelation {
                entity_path: model.path,
                relation: self.relation,
            });
        };

        if let Some(declared) = self.target_path
            && declared != relation.target_path
        {
            return Err(DependencyError::TargetMismatch {
                entity_path: model.path,
                relation: self.relation,
                declared,
                actual: relation.target_path,
            });
        }

        Ok(ResolvedDependency {
            relation: self.relation,
            target_path: relation.target_path,
            kind: relation.kind,
            fields: self.fields.clone(),
        })
    }
}

///
/// ResolvedDependency
///
/// A dependency declaration bound to concrete relation metadata. This is
/// the form the trigger mechanism consumes through the descriptor registry.
///

#[derive(Clone, Debug, Serialize)]
pub struct ResolvedDependency {
    pub relation: &'static str,
    pub target_path: &'static str,
    pub kind: RelationKind,
    pub fields: Vec<&'static str>,
}

impl ResolvedDependency {
    /// Whether a change to the named attribute of the related type fires
    /// this edge. An empty filter matches every attribute.
    #[must_use]
    pub fn matches_field(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.contains(&field)
    }
}
