// In-memory record tables, one per model, keyed by ascending integer id

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::Record;
use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct ModelTable {
    records: BTreeMap<i64, Record>,
    next_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    tables: Arc<RwLock<HashMap<String, ModelTable>>>,
}

/// Equality filters plus the `{max, last}` cursor of a list call
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub max: usize,
    pub last: Option<i64>,
    pub filters: Record,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, model: &str) {
        let mut tables = self.tables.write().await;
        tables.entry(model.to_string()).or_insert_with(|| ModelTable {
            records: BTreeMap::new(),
            next_id: 1,
        });
    }

    pub async fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.tables.read().await.keys().cloned().collect();
        models.sort();
        models
    }

    pub async fn insert(&self, model: &str, mut record: Record) -> AppResult<Record> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(model)
            .ok_or_else(|| AppError::NotFound(format!("Unknown model {}", model)))?;

        let id = table.next_id;
        table.next_id += 1;
        let now = Utc::now().timestamp_millis();
        record.insert("id".to_string(), json!(id));
        record.entry("created_at").or_insert_with(|| json!(now));
        record.insert("updated_at".to_string(), json!(now));

        table.records.insert(id, record.clone());
        debug!("Inserted {} {}", model, id);
        Ok(record)
    }

    /// Records after `last` in id order, at most `max` of them
    pub async fn list(&self, model: &str, query: &ListQuery) -> AppResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let table = tables
            .get(model)
            .ok_or_else(|| AppError::NotFound(format!("Unknown model {}", model)))?;

        let start = query.last.map(|last| last.saturating_add(1)).unwrap_or(i64::MIN);
        Ok(table
            .records
            .range(start..)
            .map(|(_, record)| record)
            .filter(|record| {
                query
                    .filters
                    .iter()
                    .all(|(key, expected)| record.get(key) == Some(expected))
            })
            .take(query.max)
            .cloned()
            .collect())
    }

    pub async fn get(&self, model: &str, id: i64) -> AppResult<Record> {
        let tables = self.tables.read().await;
        tables
            .get(model)
            .and_then(|table| table.records.get(&id))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", model, id)))
    }

    /// All records of a model, for lookups by the business rules
    pub async fn all(&self, model: &str) -> Vec<Record> {
        let tables = self.tables.read().await;
        tables
            .get(model)
            .map(|table| table.records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Merge `changes` into the record; `id` and `created_at` are kept
    pub async fn update(&self, model: &str, id: i64, changes: Record) -> AppResult<Record> {
        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut(model)
            .and_then(|table| table.records.get_mut(&id))
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", model, id)))?;

        for (key, value) in changes {
            if key == "id" || key == "created_at" {
                continue;
            }
            record.insert(key, value);
        }
        record.insert("updated_at".to_string(), json!(Utc::now().timestamp_millis()));
        Ok(record.clone())
    }

    pub async fn delete(&self, model: &str, id: i64) -> AppResult<Record> {
        let mut tables = self.tables.write().await;
        tables
            .get_mut(model)
            .and_then(|table| table.records.remove(&id))
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", model, id)))
    }

    pub async fn count(&self, model: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(model).map(|table| table.records.len()).unwrap_or(0)
    }
}

/// Read an id that may arrive as a number or numeric text
pub fn id_param(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
