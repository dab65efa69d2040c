use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

///
/// ColumnSpec
///
/// Migration-introspection triple: column class path plus the positional
/// and keyword arguments needed to recreate the underlying column. External
/// migration tooling consumes this without knowledge of any wrapper type.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub class_path: &'static str,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<&'static str, Value>,
}

///
/// Column
///
/// The underlying typed storage field a denormalized wrapper composes over.
/// Wrappers forward this surface to their inner column, so tooling only
/// ever sees base column types.
///

pub trait Column {
    fn class_path(&self) -> &'static str;

    fn default_value(&self) -> Option<Value>;

    fn is_nullable(&self) -> bool;

    fn spec(&self) -> ColumnSpec {
        let mut kwargs = BTreeMap::new();
        if let Some(default) = self.default_value() {
            kwargs.insert("default", default);
        }
        if self.is_nullable() {
            kwargs.insert("null", Value::Bool(true));
        }

        ColumnSpec {
            class_path: self.class_path(),
            args: Vec::new(),
            kwargs,
        }
    }
}

///
/// IntegerColumn
///

#[derive(Clone, Copy, Debug, Default)]
pub struct IntegerColumn {
    default: Option<i64>,
    nullable: bool,
}

impl IntegerColumn {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default: None,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn default_to(mut self, value: i64) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl Column for IntegerColumn {
    fn class_path(&self) -> &'static str {
        "denormdb_core::field::IntegerColumn"
    }

    fn default_value(&self) -> Option<Value> {
        self.default.map(Value::Int)
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }
}

///
/// BigIntColumn
///

#[derive(Clone, Copy, Debug, Default)]
pub struct BigIntColumn {
    default: Option<i64>,
    nullable: bool,
}

impl BigIntColumn {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default: None,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn default_to(mut self, value: i64) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl Column for BigIntColumn {
    fn class_path(&self) -> &'static str {
        "denormdb_core::field::BigIntColumn"
    }

    fn default_value(&self) -> Option<Value> {
        self.default.map(Value::Int)
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }
}

///
/// PositiveIntColumn
///

#[derive(Clone, Copy, Debug, Default)]
pub struct PositiveIntColumn {
    default: Option<u64>,
    nullable: bool,
}

impl PositiveIntColumn {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default: None,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn default_to(mut self, value: u64) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl Column for PositiveIntColumn {
    fn class_path(&self) -> &'static str {
        "denormdb_core::field::PositiveIntColumn"
    }

    fn default_value(&self) -> Option<Value> {
        self.default.map(Value::Uint)
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }
}

///
/// TextColumn
///

#[derive(Clone, Debug, Default)]
pub struct TextColumn {
    default: Option<String>,
    max_length: Option<u64>,
    nullable: bool,
}

impl TextColumn {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default: None,
            max_length: None,
            nullable: false,
        }
    }

    #[must_use]
    pub fn default_to(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub const fn max_length(mut self, length: u64) -> Self {
        self.max_length = Some(length);
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl Column for TextColumn {
    fn class_path(&self) -> &'static str {
        "denormdb_core::field::TextColumn"
    }

    fn default_value(&self) -> Option<Value> {
        self.default.clone().map(Value::Text)
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn spec(&self) -> ColumnSpec {
        let mut kwargs = BTreeMap::new();
        if let Some(default) = self.default_value() {
            kwargs.insert("default", default);
        }
        if let Some(length) = self.max_length {
            kwargs.insert("max_length", Value::Uint(length));
        }
        if self.nullable {
            kwargs.insert("null", Value::Bool(true));
        }

        ColumnSpec {
            class_path: self.class_path(),
            args: Vec::new(),
            kwargs,
        }
    }
}

///
/// BoolColumn
///

#[derive(Clone, Copy, Debug, Default)]
pub struct BoolColumn {
    default: Option<bool>,
    nullable: bool,
}

impl BoolColumn {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default: None,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn default_to(mut self, value: bool) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl Column for BoolColumn {
    fn class_path(&self) -> &'static str {
        "denormdb_core::field::BoolColumn"
    }

    fn default_value(&self) -> Option<Value> {
        self.default.map(Value::Bool)
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }
}
