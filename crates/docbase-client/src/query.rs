//! Selector composition helpers.
//!
//! Pure data-structure builders over `serde_json::Value` for the MongoDB
//! style operators the backend understands (`$or`, `$and`, `$gt`, `$in`,
//! ...). No I/O happens here; the produced selectors feed
//! [`Connector::search`](crate::Connector::search) and friends.

use serde_json::{Map, Value, json};

/// One field name or several; comparisons apply to each named field.
pub trait IntoFields {
    fn into_fields(self) -> Vec<String>;
}

impl IntoFields for &str {
    fn into_fields(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoFields for String {
    fn into_fields(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: Into<String>> IntoFields for Vec<S> {
    fn into_fields(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String> + Clone> IntoFields for &[S] {
    fn into_fields(self) -> Vec<String> {
        self.iter().cloned().map(Into::into).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoFields for [S; N] {
    fn into_fields(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

fn comparison(fields: impl IntoFields, operand: Value) -> Value {
    let mut selector = Map::new();
    for field in fields.into_fields() {
        selector.insert(field, operand.clone());
    }
    Value::Object(selector)
}

/// Matches values equal to `value`.
pub fn eq(fields: impl IntoFields, value: impl Into<Value>) -> Value {
    comparison(fields, value.into())
}

/// Matches values not equal to `value`.
pub fn ne(fields: impl IntoFields, value: impl Into<Value>) -> Value {
    comparison(fields, json!({ "$ne": value.into() }))
}

/// Matches values greater than `value`.
pub fn gt(fields: impl IntoFields, value: impl Into<Value>) -> Value {
    comparison(fields, json!({ "$gt": value.into() }))
}

/// Matches values greater than or equal to `value`.
pub fn gte(fields: impl IntoFields, value: impl Into<Value>) -> Value {
    comparison(fields, json!({ "$gte": value.into() }))
}

/// Matches values less than `value`.
pub fn lt(fields: impl IntoFields, value: impl Into<Value>) -> Value {
    comparison(fields, json!({ "$lt": value.into() }))
}

/// Matches values less than or equal to `value`.
pub fn lte(fields: impl IntoFields, value: impl Into<Value>) -> Value {
    comparison(fields, json!({ "$lte": value.into() }))
}

/// Matches values present in `values`.
pub fn in_list<V: Into<Value>>(
    fields: impl IntoFields,
    values: impl IntoIterator<Item = V>,
) -> Value {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    comparison(fields, json!({ "$in": values }))
}

/// Matches values absent from `values`.
pub fn not_in_list<V: Into<Value>>(
    fields: impl IntoFields,
    values: impl IntoIterator<Item = V>,
) -> Value {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    comparison(fields, json!({ "$nin": values }))
}

/// Case-insensitive regex match.
pub fn like(fields: impl IntoFields, pattern: impl Into<String>) -> Value {
    comparison(
        fields,
        json!({ "$regex": pattern.into(), "$options": "i" }),
    )
}

/// `$or` over the given expressions.
pub fn any_of(expressions: impl IntoIterator<Item = Value>) -> Value {
    json!({ "$or": expressions.into_iter().collect::<Vec<_>>() })
}

/// `$and` over the given expressions.
pub fn all_of(expressions: impl IntoIterator<Item = Value>) -> Value {
    json!({ "$and": expressions.into_iter().collect::<Vec<_>>() })
}

/// Incremental selector builder.
///
/// ```
/// use docbase_client::query::{self, QueryBuilder};
///
/// let selector = QueryBuilder::new()
///     .add(query::eq("debtor.status", "active"))
///     .add_or(query::gt("invoiceDate", "2026-01-01"))
///     .add_or(query::eq("paid", false))
///     .build();
/// assert!(selector["$or"].is_array());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Map<String, Value>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the expression's top-level keys into the selector.
    pub fn add(mut self, expression: Value) -> Self {
        if let Value::Object(map) = expression {
            self.query.extend(map);
        }
        self
    }

    /// Appends the expression to the selector's `$or` list.
    pub fn add_or(mut self, expression: Value) -> Self {
        self.push_clause("$or", expression);
        self
    }

    /// Appends the expression to the selector's `$and` list.
    pub fn add_and(mut self, expression: Value) -> Self {
        self.push_clause("$and", expression);
        self
    }

    fn push_clause(&mut self, operator: &str, expression: Value) {
        match self.query.get_mut(operator) {
            Some(Value::Array(clauses)) => clauses.push(expression),
            _ => {
                self.query
                    .insert(operator.to_string(), Value::Array(vec![expression]));
            }
        }
    }

    pub fn build(self) -> Value {
        Value::Object(self.query)
    }
}
