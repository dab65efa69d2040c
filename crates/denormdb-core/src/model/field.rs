///
/// EntityFieldModel
/// Runtime field metadata used by dependency resolution and diagnostics.
///

pub struct EntityFieldModel {
    /// Field name as used in attribute access and dependency declarations.
    pub name: &'static str,
    /// Runtime type shape (no schema-layer nodes).
    pub kind: EntityFieldKind,
}

///
/// EntityFieldKind
///
/// Minimal type surface needed by the denormalization engine. Relation
/// fields carry enough target metadata to resolve dependency declarations
/// without consulting the target type.
///

pub enum EntityFieldKind {
    Bool,
    Int,
    Uint,
    Text,

    /// Named relation endpoint reachable from this entity.
    Relation {
        target_path: &'static str,
        kind: RelationKind,
    },

    /// Marker for fields the engine does not reason about.
    Unsupported,
}

///
/// RelationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub enum RelationKind {
    /// Single-valued or reverse foreign-key traversal (relation managers).
    ForeignKey,
    /// Many-to-many association; the instance attribute holds the id list.
    ManyToMany,
}

///
/// RelationInfo
///
/// Lightweight relation descriptor extracted from runtime field metadata.
///

#[derive(Clone, Copy, Debug)]
pub struct RelationInfo {
    pub field_name: &'static str,
    pub target_path: &'static str,
    pub kind: RelationKind,
}

// Resolve a model field into relation metadata (if applicable).
pub(crate) const fn relation_from_field(
    field_name: &'static str,
    kind: &EntityFieldKind,
) -> Option<RelationInfo> {
    match kind {
        EntityFieldKind::Relation { target_path, kind } => Some(RelationInfo {
            field_name,
            target_path,
            kind: *kind,
        }),
        _ => None,
    }
}
