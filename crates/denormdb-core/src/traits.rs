//! Narrow host-entity contract.
//!
//! These traits are the only surface the engine requires from the host ORM's
//! entity layer: identity, declared schema, and attribute get/set by name.

use crate::{model::entity::EntityModel, value::Value};

// ============================================================================
// FOUNDATIONAL KINDS
// ============================================================================
//
// These traits define *where* something lives in the system,
// not what data it contains.
//

///
/// Path
/// Fully-qualified schema path.
///

pub trait Path {
    const PATH: &'static str;
}

// ============================================================================
// ENTITY IDENTITY & SCHEMA
// ============================================================================

///
/// EntityIdentity
///
/// Semantic primary-key metadata about an entity.
///

pub trait EntityIdentity: Path {
    const ENTITY_NAME: &'static str;
    const PRIMARY_KEY: &'static str;
}

///
/// EntitySchema
///
/// Declared schema facts for an entity.
///

pub trait EntitySchema: EntityIdentity {
    const MODEL: &'static EntityModel;
}

///
/// EntityKind
///
/// Fully runtime-bound entity. This is the contract the lifecycle dispatcher
/// requires; code that only inspects schema should ask for `EntitySchema`.
///

pub trait EntityKind: EntitySchema + Sized + 'static {}

impl<T> EntityKind for T where T: EntitySchema + Sized + 'static {}

// ============================================================================
// ENTITY VALUES
// ============================================================================

///
/// EntityValue
///
/// A concrete entity instance the dispatcher can identify and mutate.
/// `key()` returns the primary-key value in its storage representation.
///

pub trait EntityValue: EntityIdentity + FieldValues + FieldValuesMut {
    fn key(&self) -> Value;
}

///
/// FieldValues
///
/// Read access to one attribute by field name.
/// Returns `None` for names the instance does not expose (reverse relations,
/// unknown fields).
///

pub trait FieldValues {
    fn get_value(&self, field: &str) -> Option<Value>;
}

///
/// FieldValuesMut
///
/// Write access to one attribute by field name. Returns `false` when the
/// instance does not expose the attribute or rejects the value's shape;
/// the dispatcher treats that as a fatal save error.
///

pub trait FieldValuesMut {
    fn set_value(&mut self, field: &str, value: Value) -> bool;
}

// ============================================================================
// QUERY VALUE BOUNDARIES
// ============================================================================

///
/// FieldValue
///
/// Conversion boundary between concrete attribute types and [`Value`].
///

pub trait FieldValue {
    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

impl FieldValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        if matches!(value, Value::Null) {
            return Some(None);
        }

        T::from_value(value).map(Some)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        let Value::List(items) = value else {
            return None;
        };

        let mut out = Self::with_capacity(items.len());
        for item in items {
            out.push(T::from_value(item)?);
        }

        Some(out)
    }
}

// impl_field_value
#[macro_export]
macro_rules! impl_field_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl $crate::traits::FieldValue for $type {
                fn to_value(&self) -> $crate::value::Value {
                    $crate::value::Value::$variant((*self).into())
                }

                fn from_value(value: &$crate::value::Value) -> Option<Self> {
                    match value {
                        $crate::value::Value::$variant(v) => (*v).try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_field_value!(
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    bool => Bool,
);

#[cfg(test)]
mod tests {
    use super::FieldValue;
    use crate::value::Value;

    #[test]
    fn option_round_trips_null() {
        let none: Option<i64> = None;
        assert_eq!(none.to_value(), Value::Null);
        assert_eq!(Option::<i64>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<i64>::from_value(&Value::Int(4)), Some(Some(4)));
    }

    #[test]
    fn vec_rejects_mixed_shapes() {
        let mixed = Value::List(vec![Value::Uint(1), Value::Text("x".into())]);
        assert_eq!(Vec::<u64>::from_value(&mixed), None);
    }

    #[test]
    fn narrowing_conversions_fail_closed() {
        assert_eq!(u8::from_value(&Value::Uint(300)), None);
        assert_eq!(u8::from_value(&Value::Uint(255)), Some(255));
    }
}
