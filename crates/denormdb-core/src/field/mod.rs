pub mod cache_key;
pub mod column;
pub mod computed;
pub mod count;

pub use cache_key::CacheKeyField;
pub use column::{
    BigIntColumn, BoolColumn, Column, ColumnSpec, IntegerColumn, PositiveIntColumn, TextColumn,
};
pub use computed::ComputedField;
pub use count::CountField;
