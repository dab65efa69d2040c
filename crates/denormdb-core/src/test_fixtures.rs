//! Shared test entities for the save-lifecycle scenarios: an order with a
//! computed total, an author with a maintained book count, and an article
//! with a many-to-many tag set.

use crate::{
    model::{
        entity::EntityModel,
        field::{EntityFieldKind, EntityFieldModel, RelationKind},
    },
    traits::{EntityIdentity, EntitySchema, EntityValue, FieldValue, FieldValues, FieldValuesMut, Path},
    value::Value,
};
use std::{cell::RefCell, collections::HashMap};

///
/// Order
///
/// `total` is computed from the related line amounts, which live in a
/// fixture table rather than the store so compute rules can read them
/// without a query layer.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct Order {
    pub id: u64,
    pub total: Option<i64>,
}

const ORDER_FIELDS: [EntityFieldModel; 3] = [
    EntityFieldModel {
        name: "id",
        kind: EntityFieldKind::Uint,
    },
    EntityFieldModel {
        name: "total",
        kind: EntityFieldKind::Int,
    },
    EntityFieldModel {
        name: "lines",
        kind: EntityFieldKind::Relation {
            target_path: "test_fixtures::OrderLine",
            kind: RelationKind::ForeignKey,
        },
    },
];

const ORDER_MODEL: EntityModel = EntityModel {
    path: "test_fixtures::Order",
    entity_name: "Order",
    primary_key: "id",
    fields: &ORDER_FIELDS,
};

impl Path for Order {
    const PATH: &'static str = "test_fixtures::Order";
}

impl EntityIdentity for Order {
    const ENTITY_NAME: &'static str = "Order";
    const PRIMARY_KEY: &'static str = "id";
}

impl EntitySchema for Order {
    const MODEL: &'static EntityModel = &ORDER_MODEL;
}

impl FieldValues for Order {
    fn get_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.to_value()),
            "total" => Some(self.total.to_value()),
            _ => None,
        }
    }
}

impl FieldValuesMut for Order {
    fn set_value(&mut self, field: &str, value: Value) -> bool {
        match field {
            "total" => match Option::<i64>::from_value(&value) {
                Some(total) => {
                    self.total = total;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }
}

impl EntityValue for Order {
    fn key(&self) -> Value {
        Value::Uint(self.id)
    }
}

thread_local! {
    static ORDER_LINES: RefCell<HashMap<u64, Vec<i64>>> = RefCell::new(HashMap::new());
}

pub(crate) fn set_order_lines(order_id: u64, amounts: &[i64]) {
    ORDER_LINES.with_borrow_mut(|lines| {
        lines.insert(order_id, amounts.to_vec());
    });
}

pub(crate) fn order_lines_total(order_id: u64) -> i64 {
    ORDER_LINES.with_borrow(|lines| lines.get(&order_id).map_or(0, |amounts| amounts.iter().sum()))
}

///
/// Author
///
/// `book_count` is maintained externally; the fixtures only exercise the
/// insert-zero and update-read-back policies.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct Author {
    pub id: u64,
    pub book_count: u64,
}

const AUTHOR_FIELDS: [EntityFieldModel; 3] = [
    EntityFieldModel {
        name: "id",
        kind: EntityFieldKind::Uint,
    },
    EntityFieldModel {
        name: "book_count",
        kind: EntityFieldKind::Uint,
    },
    EntityFieldModel {
        name: "books",
        kind: EntityFieldKind::Relation {
            target_path: "test_fixtures::Book",
            kind: RelationKind::ForeignKey,
        },
    },
];

const AUTHOR_MODEL: EntityModel = EntityModel {
    path: "test_fixtures::Author",
    entity_name: "Author",
    primary_key: "id",
    fields: &AUTHOR_FIELDS,
};

impl Path for Author {
    const PATH: &'static str = "test_fixtures::Author";
}

impl EntityIdentity for Author {
    const ENTITY_NAME: &'static str = "Author";
    const PRIMARY_KEY: &'static str = "id";
}

impl EntitySchema for Author {
    const MODEL: &'static EntityModel = &AUTHOR_MODEL;
}

impl FieldValues for Author {
    fn get_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.to_value()),
            "book_count" => Some(self.book_count.to_value()),
            _ => None,
        }
    }
}

impl FieldValuesMut for Author {
    fn set_value(&mut self, field: &str, value: Value) -> bool {
        match field {
            "book_count" => match u64::from_value(&value) {
                Some(count) => {
                    self.book_count = count;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }
}

impl EntityValue for Author {
    fn key(&self) -> Value {
        Value::Uint(self.id)
    }
}

///
/// Article
///
/// Carries a many-to-many tag set plus every denormalized attribute the
/// association-change scenarios need.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct Article {
    pub id: u64,
    pub title: String,
    pub tags: Vec<u64>,
    pub tag_count: Option<i64>,
    pub cache_key: i64,
    pub summary: Option<String>,
}

const ARTICLE_FIELDS: [EntityFieldModel; 6] = [
    EntityFieldModel {
        name: "id",
        kind: EntityFieldKind::Uint,
    },
    EntityFieldModel {
        name: "title",
        kind: EntityFieldKind::Text,
    },
    EntityFieldModel {
        name: "tags",
        kind: EntityFieldKind::Relation {
            target_path: "test_fixtures::Tag",
            kind: RelationKind::ManyToMany,
        },
    },
    EntityFieldModel {
        name: "tag_count",
        kind: EntityFieldKind::Int,
    },
    EntityFieldModel {
        name: "cache_key",
        kind: EntityFieldKind::Int,
    },
    EntityFieldModel {
        name: "summary",
        kind: EntityFieldKind::Text,
    },
];

const ARTICLE_MODEL: EntityModel = EntityModel {
    path: "test_fixtures::Article",
    entity_name: "Article",
    primary_key: "id",
    fields: &ARTICLE_FIELDS,
};

impl Path for Article {
    const PATH: &'static str = "test_fixtures::Article";
}

impl EntityIdentity for Article {
    const ENTITY_NAME: &'static str = "Article";
    const PRIMARY_KEY: &'static str = "id";
}

impl EntitySchema for Article {
    const MODEL: &'static EntityModel = &ARTICLE_MODEL;
}

impl FieldValues for Article {
    fn get_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.to_value()),
            "title" => Some(self.title.to_value()),
            "tags" => Some(self.tags.to_value()),
            "tag_count" => Some(self.tag_count.to_value()),
            "cache_key" => Some(self.cache_key.to_value()),
            "summary" => Some(self.summary.to_value()),
            _ => None,
        }
    }
}

impl FieldValuesMut for Article {
    fn set_value(&mut self, field: &str, value: Value) -> bool {
        match field {
            "tag_count" => match Option::<i64>::from_value(&value) {
                Some(count) => {
                    self.tag_count = count;
                    true
                }
                None => false,
            },
            "cache_key" => match i64::from_value(&value) {
                Some(token) => {
                    self.cache_key = token;
                    true
                }
                None => false,
            },
            "summary" => match Option::<String>::from_value(&value) {
                Some(summary) => {
                    self.summary = summary;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }
}

impl EntityValue for Article {
    fn key(&self) -> Value {
        Value::Uint(self.id)
    }
}
