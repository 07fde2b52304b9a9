//! In-memory data source backed by JSON fixtures

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{DataSource, DomainError, Entity, QueryDescription, ResultSet};

/// Data source holding records per entity alias in memory
///
/// Understands a small query subset: equality `conditions` on an object
/// (keys may be qualified as `Alias.field`), `order`, `limit`, `offset`,
/// `page` and `fields`. Joins and grouping are rejected.
#[derive(Debug)]
pub struct InMemoryDataSource {
    name: String,
    records: RwLock<HashMap<String, ResultSet>>,
}

impl InMemoryDataSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Builds a source from fixtures shaped like `{ "Alias": [record, ...] }`
    pub fn from_fixtures(name: impl Into<String>, fixtures: &str) -> Result<Self, DomainError> {
        let name = name.into();
        let records: HashMap<String, ResultSet> = serde_json::from_str(fixtures).map_err(|e| {
            DomainError::configuration(format!("Invalid fixtures for source '{}': {}", name, e))
        })?;

        Ok(Self {
            name,
            records: RwLock::new(records),
        })
    }

    /// Loads fixtures from a JSON file
    pub async fn from_fixture_file(
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read fixtures '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_fixtures(name, &contents)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn insert(&self, alias: &str, record: Value) {
        self.records
            .write()
            .await
            .entry(alias.to_string())
            .or_default()
            .push(record);
    }

    /// Deletes records whose `field` equals `value`, returning how many went
    pub async fn delete_where(&self, alias: &str, field: &str, value: &Value) -> usize {
        let mut records = self.records.write().await;
        let Some(rows) = records.get_mut(alias) else {
            return 0;
        };

        let before = rows.len();
        rows.retain(|row| row.get(field) != Some(value));
        before - rows.len()
    }

    fn error(&self, message: impl Into<String>) -> DomainError {
        DomainError::source(self.name.clone(), message)
    }

    fn matches(&self, alias: &str, row: &Value, conditions: &Map<String, Value>) -> bool {
        conditions
            .iter()
            .all(|(field, expected)| row.get(unqualified(alias, field)) == Some(expected))
    }
}

/// Strips an `Alias.` qualifier from a field name
fn unqualified<'a>(alias: &str, field: &'a str) -> &'a str {
    field
        .strip_prefix(alias)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(field)
}

/// Parses `"field"`, `"field DESC"` or an array of those
fn order_clauses(alias: &str, order: &Value) -> Option<Vec<(String, bool)>> {
    let parse = |clause: &str| {
        let mut parts = clause.split_whitespace();
        let field = parts.next()?;
        let descending = parts
            .next()
            .is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
        Some((unqualified(alias, field).to_string(), descending))
    };

    match order {
        Value::String(clause) => parse(clause.as_str()).map(|c| vec![c]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().and_then(|clause| parse(clause)))
            .collect(),
        _ => None,
    }
}

/// Total order over JSON scalars: null < bool < number < string, others equal
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn project(alias: &str, row: Value, fields: &[String]) -> Value {
    let Value::Object(record) = row else {
        return row;
    };

    let projected: Map<String, Value> = fields
        .iter()
        .filter_map(|field| {
            let field = unqualified(alias, field);
            record.get(field).map(|v| (field.to_string(), v.clone()))
        })
        .collect();

    Value::Object(projected)
}

#[async_trait]
impl DataSource for InMemoryDataSource {
    async fn read(
        &self,
        entity: &Entity,
        query: &QueryDescription,
    ) -> Result<ResultSet, DomainError> {
        let alias = entity.alias();

        if query.joins.as_ref().is_some_and(|joins| !joins.is_empty()) {
            return Err(self.error("joins are not supported"));
        }
        if query.group.as_ref().is_some_and(|group| !group.is_null()) {
            return Err(self.error("grouping is not supported"));
        }

        let conditions = match &query.conditions {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(conditions)) => conditions.clone(),
            Some(other) => {
                return Err(self.error(format!("unsupported conditions: {}", other)));
            }
        };

        let mut rows: ResultSet = self
            .records
            .read()
            .await
            .get(alias)
            .map(|rows| {
                rows.iter()
                    .filter(|row| self.matches(alias, row, &conditions))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = query.order.as_ref().filter(|o| !o.is_null()) {
            let clauses = order_clauses(alias, order)
                .ok_or_else(|| self.error(format!("unsupported order: {}", order)))?;

            rows.sort_by(|a, b| {
                clauses
                    .iter()
                    .map(|(field, descending)| {
                        let ordering = compare_values(a.get(field), b.get(field));
                        if *descending { ordering.reverse() } else { ordering }
                    })
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let start: u64 = match (query.page, query.limit) {
            (Some(page), Some(limit)) => page.saturating_sub(1).saturating_mul(limit),
            _ => query.offset.unwrap_or(0),
        };
        let take = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        let rows = rows.into_iter().skip(start as usize).take(take);

        let rows: ResultSet = match &query.fields {
            Some(Value::Array(fields)) => {
                let fields: Vec<String> = fields
                    .iter()
                    .filter_map(|f| f.as_str().map(str::to_string))
                    .collect();
                rows.map(|row| project(alias, row, &fields)).collect()
            }
            Some(Value::String(field)) => {
                let fields = vec![field.clone()];
                rows.map(|row| project(alias, row, &fields)).collect()
            }
            _ => rows.collect(),
        };

        debug!(
            source = %self.name,
            entity = %alias,
            rows = rows.len(),
            "Read from in-memory source"
        );

        Ok(rows)
    }
}
