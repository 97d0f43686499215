// Penalties screen - parking violations issued to a plate

use std::sync::Arc;

use serde_json::Value;

use crate::core::{display_text, Record};
use crate::crud_framework::{ScreenConfig, ScreenHooks};
use crate::error::AppResult;
use crate::forms::interpreter::number_value;
use crate::forms::{ChangeReducer, FieldDefinition, FieldKind, FormValues, SelectOption};
use crate::screens::ScreenDefinition;

pub const MODEL: &str = "penalties";
pub const VIOLATION_FIELD: &str = "violation_type_id";
pub const AMOUNT_FIELD: &str = "amount";

const CONFIG: &str = r#"{
    "list": {
        "model": "penalties",
        "action": "list",
        "itemId": "id",
        "pageSize": 20,
        "columns": [
            {"name": "Plate", "path": "plate_number", "searchable": true},
            {"name": "Violation", "path": "violation.name", "searchable": true},
            {"name": "Amount", "path": "amount"},
            {"name": "Issued", "path": "issued_on"},
            {"name": "Status", "path": "status", "searchable": true}
        ],
        "toolbar": {"search": true, "export": true, "print": true, "add": true},
        "responseCodes": {"successCode": "2000"},
        "exportColumns": [
            {"field": "id", "header": "Penalty #"},
            {"field": "plate_number", "header": "Plate Number"},
            {"field": "violation.name", "header": "Violation"},
            {"field": "amount", "header": "Amount"},
            {"field": "issued_on", "header": "Issued On"},
            {"field": "status", "header": "Status"}
        ],
        "deleteItem": {
            "model": "penalties",
            "action": "delete",
            "responseCodes": {
                "successCode": "2000",
                "errorCodes": {
                    "4004": [{"error": "NOT_FOUND", "message": "Penalty no longer exists"}],
                    "4090": [{"error": "PENALTY_PAID", "message": "Paid penalties cannot be deleted"}]
                }
            }
        }
    },
    "add": {
        "model": "penalties",
        "action": "create",
        "responseCodes": {
            "successCode": "2000",
            "errorCodes": {
                "4000": [
                    {"error": "MISSING_FIELD", "message": "Some required information is missing"},
                    {"error": "UNKNOWN_VIOLATION", "message": "Selected violation type does not exist"}
                ]
            }
        },
        "formStructure": [],
        "params": {"issued_by": "console"}
    },
    "edit": {
        "model": "penalties",
        "action": "update",
        "responseCodes": {
            "successCode": "2000",
            "errorCodes": {
                "4004": [{"error": "NOT_FOUND", "message": "Penalty no longer exists"}],
                "4000": [{"error": "UNKNOWN_VIOLATION", "message": "Selected violation type does not exist"}]
            }
        },
        "formStructure": [],
        "getDetails": {
            "model": "penalties",
            "action": "details",
            "responseCodes": {
                "successCode": "2000",
                "errorCodes": {"4004": [{"error": "NOT_FOUND", "message": "Penalty no longer exists"}]}
            }
        }
    },
    "roles": {
        "add": ["officer", "admin"],
        "edit": ["admin"],
        "delete": ["admin"]
    }
}"#;

const FIELDS: &str = r#"[
    {"name": "plate_number", "label": "Plate Number", "type": "text",
     "validate": {"required": true, "minLength": 2, "maxLength": 10, "pattern": "^[A-Z0-9-]+$"}},
    {"name": "violation_type_id", "label": "Violation", "type": "select",
     "validate": {"required": true}},
    {"name": "amount", "label": "Amount", "type": "number",
     "validate": {"required": true, "minVal": 1}},
    {"name": "issued_on", "label": "Issued On", "type": "date", "validate": {"required": true}},
    {"name": "issued_at", "label": "Issued At", "type": "time"},
    {"name": "location", "label": "Location", "type": "map_location", "mode": "point"},
    {"name": "evidence", "label": "Evidence", "type": "attachment",
     "accept": ["image/*", ".pdf"], "max_bytes": 5242880},
    {"name": "notes", "label": "Notes", "type": "text", "multiline": true,
     "validate": {"maxLength": 500}},
    {"name": "paid", "label": "Paid", "type": "checkbox"}
]"#;

/// Select options for every violation type record, carrying its default amount
pub fn violation_options(violation_types: &[Record]) -> Vec<SelectOption> {
    violation_types
        .iter()
        .filter(|record| record.get("active").and_then(Value::as_bool).unwrap_or(true))
        .filter_map(|record| {
            let id = record.get("id")?.clone();
            let label = record.get("name").map(display_text).unwrap_or_default();
            let mut option = SelectOption::new(&label, id);
            if let Some(amount) = record.get("amount") {
                option = option.with_extra(serde_json::json!({ "amount": amount }));
            }
            Some(option)
        })
        .collect()
}

/// Pick a new violation type and the amount follows its default.
/// A manual edit of the amount alone is left alone.
pub fn apply_violation_amount(options: &[SelectOption], previous: &FormValues, mut next: FormValues) -> FormValues {
    let chosen = next.get(VIOLATION_FIELD).cloned().unwrap_or(Value::Null);
    if previous.get(VIOLATION_FIELD) == Some(&chosen) {
        return next;
    }

    let default_amount = options
        .iter()
        .find(|option| option.value == chosen)
        .and_then(|option| option.extra.as_ref())
        .and_then(|extra| extra.get("amount"))
        .and_then(Value::as_f64);

    if let Some(amount) = default_amount {
        next.insert(AMOUNT_FIELD.to_string(), number_value(amount));
    }
    next
}

pub fn amount_reducer(options: Vec<SelectOption>) -> ChangeReducer {
    Arc::new(move |previous: &FormValues, next: FormValues| apply_violation_amount(&options, previous, next))
}

fn fields(options: &[SelectOption]) -> AppResult<Vec<FieldDefinition>> {
    let mut fields: Vec<FieldDefinition> = serde_json::from_str(FIELDS)?;
    for field in fields.iter_mut().filter(|field| field.name == VIOLATION_FIELD) {
        field.kind = FieldKind::select(options.to_vec());
    }
    Ok(fields)
}

pub fn definition(violation_types: &[Record]) -> AppResult<ScreenDefinition> {
    let options = violation_options(violation_types);
    let mut config: ScreenConfig = serde_json::from_str(CONFIG)?;
    config.add.form_structure = fields(&options)?;
    config.edit.form.form_structure = fields(&options)?;
    config.check()?;

    let mut hooks = ScreenHooks::default();
    hooks.add = hooks.add.on_change(amount_reducer(options.clone()));
    hooks.edit = hooks.edit.on_change(amount_reducer(options));

    Ok(ScreenDefinition {
        name: MODEL,
        config,
        hooks,
    })
}
