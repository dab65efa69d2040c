//! DenormDB: denormalization helpers for typed entity stores.
//!
//! ## Crate layout
//! - `core`: descriptors, dependency declarations, field wrappers, the
//!   lifecycle hook dispatcher, and observability.
//!
//! The `prelude` module mirrors the surface used by entity-definition code;
//! host integrations that need registries or the error taxonomy should
//! reach into `core` directly.

pub use denormdb_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Errors
//

pub use denormdb_core::error::InternalError as Error;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        denorm::{ComputeRule, SkipRule},
        depend::DependOnRelated,
        field::{
            BigIntColumn, BoolColumn, CacheKeyField, Column as _, ColumnSpec, ComputedField,
            CountField, IntegerColumn, PositiveIntColumn, TextColumn,
        },
        lifecycle::{self, SaveMode},
        store::{self, StoreBackend},
        traits::{
            EntityIdentity as _, EntityKind as _, EntitySchema as _, EntityValue as _,
            FieldValue as _, FieldValues as _, FieldValuesMut as _, Path as _,
        },
        value::Value,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn version_matches_workspace_package() {
        assert_eq!(crate::VERSION, env!("CARGO_PKG_VERSION"));
    }
}
