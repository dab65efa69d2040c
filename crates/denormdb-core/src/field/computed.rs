use crate::{
    denorm::{
        compute::{ComputeRule, ErasedCompute, SkipRule},
        descriptor::DenormDescriptor,
        registry as descriptors,
    },
    depend::DependOnRelated,
    error::InternalError,
    field::column::{Column, ColumnSpec},
    lifecycle,
    traits::{EntityKind, EntityValue},
    value::Value,
};
use derive_more::Deref;
use std::{marker::PhantomData, rc::Rc};

///
/// ComputedField
///
/// A stored column whose value is the result of a compute rule, refreshed
/// on every save of the owning entity. Analogous to a read-only property,
/// except the result is persisted. If the rule carries dependency
/// declarations, dependency events refresh the value as well.
///
/// The wrapper composes over its underlying column and forwards column
/// behavior to it; migration tooling only ever sees the inner column type.
///

#[derive(Deref)]
pub struct ComputedField<E, C: Column> {
    #[deref]
    column: C,
    compute: Rc<dyn ErasedCompute>,
    depend: Vec<DependOnRelated>,
    skip: Option<SkipRule>,
    _marker: PhantomData<E>,
}

impl<E, C> ComputedField<E, C>
where
    E: EntityKind + EntityValue,
    C: Column,
{
    /// Bind a compute rule to an underlying column.
    pub fn new(column: C, rule: ComputeRule<E>) -> Self {
        let (compute, depend) = rule.into_parts();

        Self {
            column,
            compute,
            depend,
            skip: None,
            _marker: PhantomData,
        }
    }

    /// Suppress dependency-triggered recomputation when the predicate
    /// holds. Absence means "never skip".
    #[must_use]
    pub fn skip(mut self, rule: SkipRule) -> Self {
        self.skip = Some(rule);
        self
    }

    /// Attach this field to its owning entity type under the given
    /// attribute name. Registers the denorm descriptor, defers dependency
    /// resolution to the type-ready hook, and installs the shared
    /// many-to-many save hooks for the type (idempotent across multiple
    /// denormalized fields).
    pub fn attach(&self, field_name: &'static str) -> Result<(), InternalError> {
        let descriptor = Rc::new(DenormDescriptor::callback(
            E::PATH,
            field_name,
            self.compute.clone(),
            self.depend.clone(),
            self.skip.clone(),
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
        lifecycle::register_m2m_hooks::<E>()?;

        Ok(())
    }
}

impl<E, C> Column for ComputedField<E, C>
where
    E: EntityKind + EntityValue,
    C: Column,
{
    fn class_path(&self) -> &'static str {
        self.column.class_path()
    }

    fn default_value(&self) -> Option<Value> {
        self.column.default_value()
    }

    // The column must be storable before its first computation, so it is
    // forced nullable unless a default is supplied.
    fn is_nullable(&self) -> bool {
        self.column.is_nullable() || self.column.default_value().is_none()
    }

    fn spec(&self) -> ColumnSpec {
        let mut spec = self.column.spec();
        spec.kwargs.insert("blank", Value::Bool(true));
        if self.column.default_value().is_none() {
            spec.kwargs.insert("null", Value::Bool(true));
        }

        spec
    }
}
