//! `structuredQuery` bodies for `:runQuery`.

use serde::Serialize;
use serde_json::Value;

use shutter_core::feed::{Collection, Order};

/// A structured query over one collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<FieldOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_at: Option<QueryCursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector {
    collection_id: String,
}

/// A `where` clause.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    #[serde(rename_all = "camelCase")]
    FieldFilter {
        field: FieldReference,
        op: FieldOp,
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    CompositeFilter { op: CompositeOp, filters: Vec<Filter> },
}

impl Filter {
    /// `field <op> value`.
    pub fn field(field: &str, op: FieldOp, value: Value) -> Self {
        Filter::FieldFilter {
            field: FieldReference::new(field),
            op,
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    field_path: String,
}

impl FieldReference {
    fn new(path: &str) -> Self {
        Self {
            field_path: path.to_string(),
        }
    }
}

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOp {
    Equal,
    GreaterThanOrEqual,
    LessThan,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositeOp {
    And,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldOrder {
    field: FieldReference,
    direction: Direction,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum Direction {
    Ascending,
    Descending,
}

impl From<Order> for Direction {
    fn from(order: Order) -> Self {
        match order {
            Order::Ascending => Direction::Ascending,
            Order::Descending => Direction::Descending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct QueryCursor {
    values: Vec<Value>,
    /// True positions the cursor just before the values, including them.
    before: bool,
}

impl StructuredQuery {
    /// Every document in `collection`.
    pub fn new(collection: Collection) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection.as_str().to_string(),
            }],
            filter: None,
            order_by: Vec::new(),
            start_at: None,
            limit: None,
        }
    }

    /// Add a filter, AND-ed with any already present.
    pub fn and(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            None => filter,
            Some(Filter::CompositeFilter { op, mut filters }) => {
                filters.push(filter);
                Filter::CompositeFilter { op, filters }
            }
            Some(existing) => Filter::CompositeFilter {
                op: CompositeOp::And,
                filters: vec![existing, filter],
            },
        });
        self
    }

    /// Shorthand for `and(Filter::field(..))`.
    pub fn filter(self, field: &str, op: FieldOp, value: Value) -> Self {
        self.and(Filter::field(field, op, value))
    }

    pub fn order_by(mut self, field: &str, order: Order) -> Self {
        self.order_by.push(FieldOrder {
            field: FieldReference::new(field),
            direction: order.into(),
        });
        self
    }

    /// Start at the position `values` gives for the orderings, in turn, or
    /// just after it with `exclude`.
    pub fn start_at(mut self, values: Vec<Value>, exclude: bool) -> Self {
        self.start_at = Some(QueryCursor {
            values,
            before: !exclude,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
