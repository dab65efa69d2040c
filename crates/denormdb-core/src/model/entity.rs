use crate::model::field::{EntityFieldModel, RelationInfo, RelationKind, relation_from_field};

///
/// EntityModel
/// Minimal runtime model for one entity.
///

pub struct EntityModel {
    /// Fully-qualified Rust type path (for dispatch and diagnostics).
    pub path: &'static str,
    /// Stable external name used in diagnostics.
    pub entity_name: &'static str,
    /// Primary key field name (points at an entry in `fields`).
    pub primary_key: &'static str,
    /// Ordered field list (authoritative for dependency resolution).
    pub fields: &'static [EntityFieldModel],
}

impl EntityModel {
    /// Look up a relation endpoint by name.
    #[must_use]
    pub fn relation(&self, name: &str) -> Option<RelationInfo> {
        self.fields
            .iter()
            .filter(|field| field.name == name)
            .find_map(|field| relation_from_field(field.name, &field.kind))
    }

    /// All many-to-many relation endpoints declared on this entity.
    pub(crate) fn many_to_many_relations(&self) -> impl Iterator<Item = RelationInfo> + '_ {
        self.fields
            .iter()
            .filter_map(|field| relation_from_field(field.name, &field.kind))
            .filter(|relation| relation.kind == RelationKind::ManyToMany)
    }
}
