// Support tickets screen

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::core::Record;
use crate::crud_framework::{ScreenConfig, ScreenHooks};
use crate::error::AppResult;
use crate::list::{RecordFilter, RecordMapper};
use crate::screens::ScreenDefinition;

pub const MODEL: &str = "tickets";

const CONFIG: &str = r#"{
    "list": {
        "model": "tickets",
        "action": "list",
        "pageSize": 25,
        "columns": [
            {"name": "Subject", "path": "subject", "searchable": true},
            {"name": "Requester", "path": "requester.email", "searchable": true},
            {"name": "Priority", "path": "priority"},
            {"name": "Status", "path": "status", "searchable": true},
            {"name": "Opened", "path": "opened"}
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
        "responseCodes": {
            "successCode": "2000",
            "errorCodes": {"4000": [{"error": "MISSING_FIELD", "message": "Some required information is missing"}]}
        },
        "formStructure": [
            {"name": "subject", "label": "Subject", "type": "text",
             "validate": {"required": true, "minLength": 5, "maxLength": 120}},
            {"name": "description", "label": "Description", "type": "text", "multiline": true,
             "validate": {"required": true}},
            {"name": "priority", "label": "Priority", "type": "select", "value": "normal",
             "options": [
                {"label": "Low", "value": "low"},
                {"label": "Normal", "value": "normal"},
                {"label": "Urgent", "value": "urgent"}
             ]},
            {"name": "penalty_id", "label": "Related penalty", "type": "number",
             "validate": {"allowZeros": true}}
        ],
        "params": {"status": "new"}
    },
    "edit": {
        "model": "tickets",
        "action": "update",
        "responseCodes": {
            "successCode": "2000",
            "errorCodes": {"4004": [{"error": "NOT_FOUND", "message": "Ticket was already removed"}]}
        },
        "formStructure": [
            {"name": "subject", "label": "Subject", "type": "readonly"},
            {"name": "status", "label": "Status", "type": "select",
             "validate": {"required": true},
             "options": [
                {"label": "New", "value": "new"},
                {"label": "Open", "value": "open"},
                {"label": "Closed", "value": "closed"}
             ]},
            {"name": "resolution", "label": "Resolution", "type": "text", "multiline": true}
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
    "roles": {
        "edit": ["support", "admin"],
        "delete": ["admin"]
    },
    "actions": {"delete": true}
}"#;

/// Adds a readable `opened` date from the `created_at` epoch millis
pub fn opened_mapper() -> RecordMapper {
    Arc::new(|mut record: Record| {
        let opened = record
            .get("created_at")
            .and_then(Value::as_i64)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|at| at.format("%Y-%m-%d").to_string());
        if let Some(opened) = opened {
            record.insert("opened".to_string(), Value::String(opened));
        }
        record
    })
}

/// Archived tickets stay out of the console list
pub fn hide_archived() -> RecordFilter {
    Arc::new(|record: &Record| record.get("status").and_then(Value::as_str) != Some("archived"))
}

pub fn definition() -> AppResult<ScreenDefinition> {
    let config = ScreenConfig::from_json(CONFIG)?;
    let mut hooks = ScreenHooks::default();
    hooks.list = hooks.list.map_action_data(opened_mapper()).filter_data(hide_archived());

    Ok(ScreenDefinition {
        name: MODEL,
        config,
        hooks,
    })
}
