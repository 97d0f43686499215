// Sample data for the demo backend

use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::{json, Value};
use tracing::info;

use crate::core::Record;
use crate::error::{AppError, AppResult};
use crate::services::model_rules::{prepare_write, PENALTIES, TICKETS, VIOLATION_TYPES};
use crate::services::RecordStore;

const VIOLATIONS: [(&str, &str, u32); 6] = [
    ("MTR", "Expired meter", 40),
    ("HYD", "Fire hydrant", 150),
    ("DBL", "Double parking", 90),
    ("DIS", "Disabled bay without permit", 250),
    ("LZ", "Loading zone", 75),
    ("NOP", "No parking zone", 60),
];

const SUBJECTS: [&str; 6] = [
    "Appeal against penalty",
    "Meter did not accept card",
    "Wrong plate recorded",
    "Request for payment plan",
    "Evidence photo is unclear",
    "Refund for double payment",
];

const PRIORITIES: [&str; 3] = ["low", "normal", "urgent"];
const STATUSES: [&str; 4] = ["new", "open", "closed", "archived"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub violation_types: usize,
    pub penalties: usize,
    pub tickets: usize,
}

fn as_record(value: Value) -> Record {
    match value {
        Value::Object(record) => record,
        _ => Record::new(),
    }
}

fn random_plate(rng: &mut impl Rng) -> String {
    let letters: String = (0..3).map(|_| char::from(b'A' + rng.random_range(0..26u8))).collect();
    format!("{}-{}", letters, rng.random_range(100..10000))
}

fn penalty_records(count: usize, violation_ids: &[i64]) -> Vec<Record> {
    let mut rng = rand::rng();
    let today = Utc::now().date_naive();
    (0..count)
        .map(|_| {
            let issued_on = today - Duration::days(rng.random_range(0..90));
            as_record(json!({
                "plate_number": random_plate(&mut rng),
                "violation_type_id": violation_ids[rng.random_range(0..violation_ids.len())],
                "issued_on": issued_on.format("%Y-%m-%d").to_string(),
                "issued_at": format!("{:02}:{:02}", rng.random_range(7..22), rng.random_range(0..60)),
                "location": {
                    "kind": "point",
                    "point": {
                        "lat": 51.5072 + rng.random_range(-0.05..0.05),
                        "lng": -0.1276 + rng.random_range(-0.05..0.05)
                    }
                },
                "paid": rng.random_bool(0.3),
                "notes": ""
            }))
        })
        .collect()
}

fn ticket_records(count: usize) -> Vec<Record> {
    let mut rng = rand::rng();
    let now = Utc::now();
    (0..count)
        .map(|n| {
            let opened = now - Duration::hours(rng.random_range(1..24 * 60));
            as_record(json!({
                "subject": SUBJECTS[rng.random_range(0..SUBJECTS.len())],
                "description": format!("Submitted through the citizen portal (#{})", n + 1),
                "requester": {"email": format!("driver{}@example.com", rng.random_range(1..500))},
                "priority": PRIORITIES[rng.random_range(0..PRIORITIES.len())],
                "status": STATUSES[rng.random_range(0..STATUSES.len())],
                "created_at": opened.timestamp_millis()
            }))
        })
        .collect()
}

async fn insert_checked(store: &RecordStore, model: &str, mut record: Record) -> AppResult<Record> {
    prepare_write(store, model, &mut record, None)
        .await
        .map_err(|failure| AppError::Internal(format!("seed {} rejected: {}", model, failure.message)))?;
    store.insert(model, record).await
}

/// Fill an empty store with violation types, penalties and tickets
pub async fn seed_console_data(store: &RecordStore, penalties: usize, tickets: usize) -> AppResult<SeedSummary> {
    let mut violation_ids = Vec::new();
    for (code, name, amount) in VIOLATIONS {
        let record = as_record(json!({"code": code, "name": name, "amount": amount, "active": true}));
        let stored = insert_checked(store, VIOLATION_TYPES, record).await?;
        if let Some(id) = stored.get("id").and_then(Value::as_i64) {
            violation_ids.push(id);
        }
    }

    for record in penalty_records(penalties, &violation_ids) {
        insert_checked(store, PENALTIES, record).await?;
    }
    for record in ticket_records(tickets) {
        insert_checked(store, TICKETS, record).await?;
    }

    let summary = SeedSummary {
        violation_types: violation_ids.len(),
        penalties,
        tickets,
    };
    info!(
        "Seeded {} violation types, {} penalties, {} tickets",
        summary.violation_types, summary.penalties, summary.tickets
    );
    Ok(summary)
}
