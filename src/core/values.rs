// Helpers over untyped records returned by remote actions

use serde_json::{Map, Value};

/// Untyped key/value bag as returned by the list and details actions
pub type Record = Map<String, Value>;

/// Truthiness as the console treats it: null, false, 0 and "" are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Look up a dotted value-path such as `violation.name` or `photos.0.url`
pub fn resolve_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Text form of a value used for searching, pattern checks and plain cells
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(" ")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(-3)));
    }

    #[test]
    fn test_resolve_nested_path() {
        let rec = record(json!({
            "violation": {"name": "Expired meter"},
            "photos": [{"url": "a.jpg"}, {"url": "b.jpg"}]
        }));

        assert_eq!(resolve_path(&rec, "violation.name"), Some(&json!("Expired meter")));
        assert_eq!(resolve_path(&rec, "photos.1.url"), Some(&json!("b.jpg")));
        assert_eq!(resolve_path(&rec, "photos.7.url"), None);
        assert_eq!(resolve_path(&rec, "violation.name.first"), None);
        assert_eq!(resolve_path(&rec, "missing"), None);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(display_text(&json!(null)), "");
        assert_eq!(display_text(&json!("open")), "open");
        assert_eq!(display_text(&json!(12)), "12");
        assert_eq!(display_text(&json!({"a": 1})), "{\"a\":1}");
    }
}
