//! Core runtime for DenormDB: denorm descriptors, dependency declarations,
//! field wrappers, and the lifecycle hook dispatcher, plus the ergonomics
//! exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod depend;
pub mod denorm;
pub mod error;
pub mod field;
pub mod hash;
pub mod lifecycle;
pub mod model;
pub mod obs;
pub mod store;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, registries, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        denorm::{ComputeRule, SkipRule},
        depend::DependOnRelated,
        field::{
            BigIntColumn, BoolColumn, CacheKeyField, Column, ColumnSpec, ComputedField,
            CountField, IntegerColumn, PositiveIntColumn, TextColumn,
        },
        lifecycle::SaveMode,
        model::{
            entity::EntityModel,
            field::{EntityFieldKind, EntityFieldModel, RelationKind},
        },
        traits::{
            EntityIdentity, EntityKind, EntitySchema, EntityValue, FieldValue, FieldValues,
            FieldValuesMut, Path,
        },
        value::Value,
    };
}
