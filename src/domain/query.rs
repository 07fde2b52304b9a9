//! Query descriptions and their canonical, defaults-filled form

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainError;

/// A retrieval request as issued by a caller
///
/// Every field is optional. `None` and an explicit default describe the same
/// query once normalized, so `{}` and a fully spelled out default query share
/// a cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joins: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Value>,

    /// Whether side-effecting hooks run on the underlying source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<bool>,

    /// Source specific options passed through untouched (e.g. `recursive`)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl QueryDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query from its JSON form
    pub fn from_json(input: &str) -> Result<Self, DomainError> {
        serde_json::from_str(input)
            .map_err(|e| DomainError::validation(format!("Invalid query description: {}", e)))
    }

    pub fn with_conditions(mut self, conditions: Value) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn with_fields(mut self, fields: Value) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_join(mut self, join: Value) -> Self {
        self.joins.get_or_insert_with(Vec::new).push(join);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_order(mut self, order: Value) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_group(mut self, group: Value) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_callbacks(mut self, callbacks: bool) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Fills omitted fields with their defaults
    pub fn normalized(&self) -> NormalizedQuery {
        NormalizedQuery {
            conditions: non_null(&self.conditions),
            fields: non_null(&self.fields),
            joins: self.joins.clone().unwrap_or_default(),
            limit: self.limit,
            offset: self.offset,
            order: non_null(&self.order),
            page: self.page,
            group: non_null(&self.group),
            callbacks: self.callbacks.unwrap_or(true),
            extra: self
                .extra
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

fn non_null(value: &Option<Value>) -> Option<Value> {
    value.as_ref().filter(|v| !v.is_null()).cloned()
}

/// A query with every default filled in
///
/// Defaults: `conditions`, `fields`, `limit`, `offset`, `order`, `page` and
/// `group` are none, `joins` is empty and `callbacks` is true.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    pub conditions: Option<Value>,
    pub fields: Option<Value>,
    pub joins: Vec<Value>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub order: Option<Value>,
    pub page: Option<u64>,
    pub group: Option<Value>,
    pub callbacks: bool,
    pub extra: BTreeMap<String, Value>,
}

impl NormalizedQuery {
    /// Deterministic JSON rendering used as hash input
    ///
    /// Object keys are sorted at every depth; array order is preserved.
    pub fn canonical_json(&self) -> String {
        let mut root = Map::new();
        let mut put = |name: &str, value: Value| {
            root.insert(name.to_string(), canonicalize(value));
        };

        put("callbacks", Value::Bool(self.callbacks));
        put("conditions", self.conditions.clone().unwrap_or(Value::Null));
        put("fields", self.fields.clone().unwrap_or(Value::Null));
        put("group", self.group.clone().unwrap_or(Value::Null));
        put("joins", Value::Array(self.joins.clone()));
        put("limit", self.limit.map(Value::from).unwrap_or(Value::Null));
        put("offset", self.offset.map(Value::from).unwrap_or(Value::Null));
        put("order", self.order.clone().unwrap_or(Value::Null));
        put("page", self.page.map(Value::from).unwrap_or(Value::Null));

        // Kept apart from the known fields so an option can never shadow one
        let extra: Map<String, Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        put("options", Value::Object(extra));

        canonicalize(Value::Object(root)).to_string()
    }
}

/// Rebuilds every object with its keys in sorted order
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
