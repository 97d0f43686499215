// Violation types screen - the catalogue penalties are issued against

use crate::crud_framework::{ScreenConfig, ScreenHooks};
use crate::error::AppResult;
use crate::screens::ScreenDefinition;

pub const MODEL: &str = "violation_types";

const CONFIG: &str = r#"{
    "list": {
        "model": "violation_types",
        "action": "list",
        "pageSize": 50,
        "columns": [
            {"name": "Code", "path": "code", "searchable": true, "width": 80},
            {"name": "Name", "path": "name", "searchable": true},
            {"name": "Default amount", "path": "amount"},
            {"name": "Active", "path": "active"}
        ],
        "toolbar": {"search": true, "add": true},
        "responseCodes": {"successCode": "2000"}
    },
    "add": {
        "model": "violation_types",
        "action": "create",
        "responseCodes": {
            "successCode": "2000",
            "errorCodes": {"4090": [{"error": "DUPLICATE_CODE", "message": "A violation type with this code already exists"}]}
        },
        "formStructure": [
            {"name": "code", "label": "Code", "type": "text",
             "validate": {"required": true, "maxLength": 8, "pattern": "^[A-Z]{1,4}[0-9]{0,4}$"}},
            {"name": "name", "label": "Name", "type": "text", "validate": {"required": true, "minLength": 3}},
            {"name": "amount", "label": "Default amount", "type": "number",
             "validate": {"required": true, "minVal": 1, "maxVal": 10000}},
            {"name": "active", "label": "Active", "type": "checkbox", "value": true}
        ]
    },
    "edit": {
        "model": "violation_types",
        "action": "update",
        "responseCodes": {"successCode": "2000"},
        "formStructure": [
            {"name": "code", "label": "Code", "type": "readonly"},
            {"name": "name", "label": "Name", "type": "text", "validate": {"required": true, "minLength": 3}},
            {"name": "amount", "label": "Default amount", "type": "number",
             "validate": {"required": true, "minVal": 1, "maxVal": 10000}},
            {"name": "active", "label": "Active", "type": "checkbox"}
        ],
        "getDetails": {
            "model": "violation_types",
            "action": "details",
            "responseCodes": {"successCode": "2000"}
        }
    },
    "roles": {
        "add": ["admin"],
        "edit": ["admin"]
    },
    "actions": {"delete": false}
}"#;

pub fn definition() -> AppResult<ScreenDefinition> {
    Ok(ScreenDefinition {
        name: MODEL,
        config: ScreenConfig::from_json(CONFIG)?,
        hooks: ScreenHooks::default(),
    })
}
