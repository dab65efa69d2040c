use crate::{
    denorm::{
        compute::TokenCompute,
        descriptor::DenormDescriptor,
        registry as descriptors,
    },
    depend::DependOnRelated,
    error::InternalError,
    field::column::{BigIntColumn, Column, ColumnSpec},
    lifecycle,
    traits::{EntityKind, EntityValue},
    value::Value,
};
use derive_more::Deref;
use std::rc::Rc;

///
/// CacheKeyField
///
/// A big-integer column holding an opaque token that changes whenever the
/// owning entity is saved or a declared dependency fires. Useful as a
/// coarse change detector for external caching layers; updates apply
/// immediately, with no explicit flush step.
///
/// Limitation: a direct bulk update issued against the owning entity type
/// bypasses the per-instance save path and leaves the token unchanged.
/// This is an accepted boundary of the design.
///

#[derive(Deref)]
pub struct CacheKeyField {
    #[deref]
    column: BigIntColumn,
    dependencies: Vec<DependOnRelated>,
}

impl Default for CacheKeyField {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheKeyField {
    #[must_use]
    pub fn new() -> Self {
        Self {
            column: BigIntColumn::new().default_to(0),
            dependencies: Vec::new(),
        }
    }

    /// Append a dependency edge. Accepts the same declaration the computed
    /// field's rule path uses; may be called repeatedly to accumulate
    /// several independently matchable edges.
    pub fn depend_on_related(&mut self, dep: DependOnRelated) {
        self.dependencies.push(dep);
    }

    #[must_use]
    pub fn dependencies(&self) -> &[DependOnRelated] {
        &self.dependencies
    }

    /// Attach this field to its owning entity type under the given
    /// attribute name. The descriptor's compute rule issues a fresh token
    /// on every invocation; its dependency list is exactly the accumulated
    /// `depend_on_related` calls.
    pub fn attach<E>(&self, field_name: &'static str) -> Result<(), InternalError>
    where
        E: EntityKind + EntityValue,
    {
        let descriptor = Rc::new(DenormDescriptor::cache_key(
            E::PATH,
            field_name,
            Rc::new(TokenCompute),
            self.dependencies.clone(),
        ));
        descriptors::register(descriptor.clone())?;

        lifecycle::on_type_ready(
            E::PATH,
            field_name,
            Rc::new(move || {
                if descriptor.is_resolved() {
                    return Ok(());
                }
                descriptor.setup(E::MODEL)
            }),
        )?;
        if !self.dependencies.is_empty() {
            lifecycle::register_m2m_hooks::<E>()?;
        }

        Ok(())
    }
}

impl Column for CacheKeyField {
    fn class_path(&self) -> &'static str {
        self.column.class_path()
    }

    fn default_value(&self) -> Option<Value> {
        self.column.default_value()
    }

    fn is_nullable(&self) -> bool {
        self.column.is_nullable()
    }

    fn spec(&self) -> ColumnSpec {
        self.column.spec()
    }
}
