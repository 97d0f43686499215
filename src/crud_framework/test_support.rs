// In-memory action transport shared by the screen tests

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::core::Record;
use crate::error::{AppError, AppResult};
use crate::infrastructure::action::{ActionRequest, ActionResponse};
use crate::infrastructure::traits::ActionTransport;

pub const OK: &str = "2000";
pub const NOT_FOUND: &str = "4004";

pub struct MemoryTransport {
    pub records: Mutex<BTreeMap<i64, Record>>,
    pub calls: Mutex<Vec<ActionRequest>>,
    /// Actions answered with a transport error
    pub offline: Mutex<Vec<String>>,
    /// Per-record latency of `details`
    pub details_delay: BTreeMap<i64, Duration>,
    /// Latency of every `delete`
    pub delete_delay: Option<Duration>,
}

impl MemoryTransport {
    pub fn with_records(records: Vec<Value>) -> Self {
        let records = records
            .into_iter()
            .filter_map(|value| value.as_object().cloned())
            .filter_map(|record| record.get("id").and_then(Value::as_i64).map(|id| (id, record)))
            .collect();
        Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            offline: Mutex::new(Vec::new()),
            details_delay: BTreeMap::new(),
            delete_delay: None,
        }
    }

    pub fn tickets(count: i64) -> Self {
        Self::with_records(
            (1..=count)
                .map(|id| {
                    json!({
                        "id": id,
                        "subject": format!("Ticket {}", id),
                        "status": if id % 2 == 0 { "closed" } else { "new" }
                    })
                })
                .collect(),
        )
    }

    pub async fn go_offline(&self, action: &str) {
        self.offline.lock().await.push(action.to_string());
    }

    pub async fn actions(&self) -> Vec<String> {
        self.calls.lock().await.iter().map(|call| call.action.clone()).collect()
    }
}

#[async_trait]
impl ActionTransport for MemoryTransport {
    async fn execute(&self, request: ActionRequest) -> AppResult<ActionResponse> {
        self.calls.lock().await.push(request.clone());
        if self.offline.lock().await.contains(&request.action) {
            return Err(AppError::Transport("connection reset".to_string()));
        }

        let id = request.params.get("id").and_then(Value::as_i64);
        match request.action.as_str() {
            "list" => {
                let max = request.params.get("max").and_then(Value::as_u64).unwrap_or(20) as usize;
                let after = request.params.get("last").and_then(Value::as_i64).unwrap_or(i64::MIN);
                let records = self.records.lock().await;
                let page: Vec<Value> = records
                    .range(after.saturating_add(1)..)
                    .take(max)
                    .map(|(_, record)| Value::Object(record.clone()))
                    .collect();
                Ok(ActionResponse::success(OK, Value::Array(page)))
            }
            "details" => {
                let id = id.unwrap_or_default();
                if let Some(delay) = self.details_delay.get(&id) {
                    tokio::time::sleep(*delay).await;
                }
                match self.records.lock().await.get(&id) {
                    Some(record) => Ok(ActionResponse::success(OK, Value::Object(record.clone()))),
                    None => Ok(ActionResponse::failure(NOT_FOUND, "NOT_FOUND", "missing")),
                }
            }
            "delete" => {
                if let Some(delay) = self.delete_delay {
                    tokio::time::sleep(delay).await;
                }
                match self.records.lock().await.remove(&id.unwrap_or_default()) {
                    Some(_) => Ok(ActionResponse::success(OK, json!({"deleted": true}))),
                    None => Ok(ActionResponse::failure(NOT_FOUND, "NOT_FOUND", "missing")),
                }
            }
            "create" | "update" => {
                let mut records = self.records.lock().await;
                let id = id.unwrap_or_else(|| records.keys().next_back().copied().unwrap_or(0) + 1);
                let mut record = request.params.clone();
                record.insert("id".to_string(), json!(id));
                records.insert(id, record.clone());
                Ok(ActionResponse::success(OK, Value::Object(record)))
            }
            _ => Ok(ActionResponse::failure("4040", "UNKNOWN_ACTION", "unknown action")),
        }
    }
}

/// Ticket screen used across the screen tests
pub fn ticket_config() -> crate::crud_framework::ScreenConfig {
    let json = r#"{
        "list": {
            "model": "tickets",
            "action": "list",
            "pageSize": 2,
            "columns": [
                {"name": "Subject", "path": "subject", "searchable": true},
                {"name": "Status", "path": "status", "searchable": true}
            ],
            "toolbar": {"search": true, "export": true, "add": true},
            "responseCodes": {"successCode": "2000"},
            "deleteItem": {
                "model": "tickets",
                "action": "delete",
                "responseCodes": {
                    "successCode": "2000",
                    "errorCodes": {"4004": [{"error": "NOT_FOUND", "message": "Ticket was already removed"}]}
                }
            }
        },
        "add": {
            "model": "tickets",
            "action": "create",
            "responseCodes": {"successCode": "2000"},
            "formStructure": [
                {"name": "subject", "label": "Subject", "type": "text", "validate": {"required": true, "minLength": 5}}
            ]
        },
        "edit": {
            "model": "tickets",
            "action": "update",
            "responseCodes": {"successCode": "2000"},
            "formStructure": [
                {"name": "subject", "label": "Subject", "type": "text", "validate": {"required": true}},
                {"name": "status", "label": "Status", "type": "select",
                 "options": [{"label": "New", "value": "new"}, {"label": "Closed", "value": "closed"}]}
            ],
            "getDetails": {
                "model": "tickets",
                "action": "details",
                "responseCodes": {
                    "successCode": "2000",
                    "errorCodes": {"4004": [{"error": "NOT_FOUND", "message": "Ticket not found"}]}
                }
            }
        },
        "roles": {"delete": ["admin"]}
    }"#;
    match crate::crud_framework::ScreenConfig::from_json(json) {
        Ok(config) => config,
        Err(e) => panic!("ticket config: {}", e),
    }
}
