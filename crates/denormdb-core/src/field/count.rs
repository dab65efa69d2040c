use crate::{
    denorm::{
        compute::SkipRule,
        descriptor::{CountSpec, DenormDescriptor},
        registry as descriptors,
    },
    error::InternalError,
    field::column::{Column, ColumnSpec, PositiveIntColumn},
    lifecycle,
    traits::{EntityKind, EntityValue},
    value::Value,
};
use derive_more::Deref;
use std::rc::Rc;

///
/// CountField
///
/// A positive-integer column that stores the number of rows related to this
/// instance through the named relation manager, optionally filtered. The
/// stored value is maintained incrementally by the external trigger
/// mechanism as related rows are added and removed.
///
/// This wrapper's sole save-time job is to avoid clobbering that value:
/// a new row stores 0 (no related rows can exist yet, and a trigger cannot
/// race ahead of the insert), and an update reads the persisted count back
/// verbatim rather than recomputing, because a trigger may have corrected
/// it after this instance was loaded.
///

#[derive(Deref)]
pub struct CountField {
    #[deref]
    column: PositiveIntColumn,
    relation: &'static str,
    filter: Vec<(&'static str, Value)>,
    skip: Option<SkipRule>,
}

impl CountField {
    /// Count rows reachable through the named relation manager.
    #[must_use]
    pub fn new(relation: &'static str) -> Self {
        Self {
            column: PositiveIntColumn::new().default_to(0),
            relation,
            filter: Vec::new(),
            skip: None,
        }
    }

    /// Restrict the count to rows whose attribute equals the given value.
    /// May be called repeatedly; pairs combine conjunctively.
    #[must_use]
    pub fn filter(mut self, field: &'static str, value: Value) -> Self {
        self.filter.push((field, value));
        self
    }

    /// Suppress trigger-driven maintenance when the predicate holds.
    #[must_use]
    pub fn skip(mut self, rule: SkipRule) -> Self {
        self.skip = Some(rule);
        self
    }

    #[must_use]
    pub const fn relation(&self) -> &'static str {
        self.relation
    }

    /// Attach this field to its owning entity type under the given
    /// attribute name. The relation name is resolved when the type is
    /// marked ready; an unknown manager name fails fast there.
    pub fn attach<E>(&self, field_name: &'static str) -> Result<(), InternalError>
    where
        E: EntityKind + EntityValue,
    {
        let descriptor = Rc::new(DenormDescriptor::count(
            E::PATH,
            field_name,
            CountSpec {
                relation: self.relation,
                filter: self.filter.clone(),
            },
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

        Ok(())
    }
}

impl Column for CountField {
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
