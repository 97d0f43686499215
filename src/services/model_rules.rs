// Per-model business rules applied by the action backend before writes

use serde_json::{json, Value};

use crate::core::{is_truthy, Record};
use crate::services::record_store::{id_param, RecordStore};
use crate::services::ActionFailure;

pub const PENALTIES: &str = "penalties";
pub const TICKETS: &str = "tickets";
pub const VIOLATION_TYPES: &str = "violation_types";
pub const MODELS: [&str; 3] = [PENALTIES, TICKETS, VIOLATION_TYPES];

fn required_fields(model: &str) -> &'static [&'static str] {
    match model {
        PENALTIES => &["plate_number", "violation_type_id"],
        TICKETS => &["subject"],
        VIOLATION_TYPES => &["code", "name", "amount"],
        _ => &[],
    }
}

fn missing(record: &Record, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// Validate and complete a record about to be created or updated.
/// `existing` is the stored record on update.
pub async fn prepare_write(
    store: &RecordStore,
    model: &str,
    record: &mut Record,
    existing: Option<&Record>,
) -> Result<(), ActionFailure> {
    if existing.is_none() {
        if let Some(field) = required_fields(model).iter().find(|field| missing(record, field)) {
            return Err(ActionFailure::bad_request(
                "MISSING_FIELD",
                &format!("{} is required", field),
            ));
        }
    }

    match model {
        PENALTIES => prepare_penalty(store, record, existing).await,
        TICKETS => {
            if existing.is_none() {
                record.entry("status").or_insert_with(|| json!("new"));
            }
            Ok(())
        }
        VIOLATION_TYPES => prepare_violation_type(store, record, existing).await,
        _ => Ok(()),
    }
}

async fn prepare_penalty(
    store: &RecordStore,
    record: &mut Record,
    existing: Option<&Record>,
) -> Result<(), ActionFailure> {
    if let Some(plate) = record.get("plate_number").and_then(Value::as_str) {
        let normalized = plate.trim().to_ascii_uppercase();
        record.insert("plate_number".to_string(), json!(normalized));
    }

    let violation_id = record
        .get("violation_type_id")
        .or_else(|| existing.and_then(|e| e.get("violation_type_id")));
    if let Some(violation_id) = violation_id {
        let id = id_param(Some(violation_id))
            .ok_or_else(|| ActionFailure::bad_request("UNKNOWN_VIOLATION", "violation_type_id is not an id"))?;
        let violation = store
            .get(VIOLATION_TYPES, id)
            .await
            .map_err(|_| ActionFailure::bad_request("UNKNOWN_VIOLATION", "Selected violation type does not exist"))?;

        record.insert("violation_type_id".to_string(), json!(id));
        record.insert(
            "violation".to_string(),
            json!({"id": id, "name": violation.get("name").cloned().unwrap_or(Value::Null)}),
        );
        let amount_missing = record.get("amount").map(|amount| !is_truthy(amount)).unwrap_or(true);
        if amount_missing && existing.is_none() {
            if let Some(amount) = violation.get("amount") {
                record.insert("amount".to_string(), amount.clone());
            }
        }
    }

    let paid = record
        .get("paid")
        .or_else(|| existing.and_then(|e| e.get("paid")))
        .map(is_paid)
        .unwrap_or(false);
    record.insert("paid".to_string(), json!(paid));
    record.insert("status".to_string(), json!(if paid { "paid" } else { "unpaid" }));
    Ok(())
}

async fn prepare_violation_type(
    store: &RecordStore,
    record: &mut Record,
    existing: Option<&Record>,
) -> Result<(), ActionFailure> {
    let Some(code) = record.get("code").and_then(Value::as_str).map(|c| c.trim().to_ascii_uppercase()) else {
        return Ok(());
    };
    let own_id = existing.and_then(|e| id_param(e.get("id")));

    let taken = store.all(VIOLATION_TYPES).await.iter().any(|other| {
        other.get("code").and_then(Value::as_str) == Some(code.as_str()) && id_param(other.get("id")) != own_id
    });
    if taken {
        return Err(ActionFailure::conflict(
            "DUPLICATE_CODE",
            "A violation type with this code already exists",
        ));
    }
    record.insert("code".to_string(), json!(code));
    record.entry("active").or_insert_with(|| json!(true));
    Ok(())
}

/// Deleting a paid penalty is refused
pub fn check_delete(model: &str, record: &Record) -> Result<(), ActionFailure> {
    if model == PENALTIES && record.get("paid").map(is_paid).unwrap_or(false) {
        return Err(ActionFailure::conflict(
            "PENALTY_PAID",
            "Paid penalties cannot be deleted",
        ));
    }
    Ok(())
}

/// Form payloads may carry booleans as text
fn is_paid(value: &Value) -> bool {
    match value {
        Value::String(text) => matches!(text.as_str(), "true" | "1" | "yes"),
        other => is_truthy(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn store() -> RecordStore {
        let store = RecordStore::new();
        for model in MODELS {
            store.register(model).await;
        }
        store
            .insert(VIOLATION_TYPES, record(json!({"code": "HYD", "name": "Fire hydrant", "amount": 150})))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_penalty_takes_violation_defaults() {
        let store = store().await;
        let mut penalty = record(json!({"plate_number": " abc-12 ", "violation_type_id": "1", "amount": 0}));

        prepare_write(&store, PENALTIES, &mut penalty, None).await.unwrap();
        assert_eq!(penalty["plate_number"], json!("ABC-12"));
        assert_eq!(penalty["amount"], json!(150));
        assert_eq!(penalty["violation"]["name"], json!("Fire hydrant"));
        assert_eq!(penalty["status"], json!("unpaid"));
    }

    #[tokio::test]
    async fn test_unknown_violation_and_missing_field() {
        let store = store().await;

        let mut unknown = record(json!({"plate_number": "X1", "violation_type_id": 9}));
        let err = prepare_write(&store, PENALTIES, &mut unknown, None).await.unwrap_err();
        assert_eq!(err.error, "UNKNOWN_VIOLATION");

        let mut blank = record(json!({"plate_number": "  ", "violation_type_id": 1}));
        let err = prepare_write(&store, PENALTIES, &mut blank, None).await.unwrap_err();
        assert_eq!(err.error, "MISSING_FIELD");
        assert_eq!(err.code, "4000");
    }

    #[tokio::test]
    async fn test_duplicate_violation_code() {
        let store = store().await;
        let mut duplicate = record(json!({"code": "hyd", "name": "Hydrant again", "amount": 10}));
        let err = prepare_write(&store, VIOLATION_TYPES, &mut duplicate, None).await.unwrap_err();
        assert_eq!(err.error, "DUPLICATE_CODE");

        // Re-saving the same record keeps its own code
        let existing = store.get(VIOLATION_TYPES, 1).await.unwrap();
        let mut same = record(json!({"code": "HYD", "name": "Fire hydrant"}));
        prepare_write(&store, VIOLATION_TYPES, &mut same, Some(&existing)).await.unwrap();
    }

    #[test]
    fn test_paid_penalty_cannot_be_deleted() {
        let paid = record(json!({"paid": "true"}));
        assert_eq!(check_delete(PENALTIES, &paid).unwrap_err().error, "PENALTY_PAID");
        assert!(check_delete(TICKETS, &paid).is_ok());
    }
}
