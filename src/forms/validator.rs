// Field Validator - pure check of one value against its field's constraints

use serde_json::Value;

use crate::core::{display_text, is_truthy};
use crate::forms::field::{FieldDefinition, FieldKind, ValidationRules};
use crate::forms::location::LocationValue;

/// Message kept verbatim; existing screens and their users match on it
pub const ZERO_NOT_ALLOWED: &str = "Value must be grater than 0";
pub const INVALID_VALUE: &str = "Invalid value";

/// Outcome of validating one field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid { error: String },
}

impl Validity {
    pub fn invalid(error: impl Into<String>) -> Self {
        Validity::Invalid {
            error: error.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Validity::Valid => None,
            Validity::Invalid { error } => Some(error),
        }
    }
}

/// Validate `value` against the constraints declared on `field`
pub fn validate(field: &FieldDefinition, value: &Value) -> Validity {
    if let Some(rules) = &field.validate {
        // A custom predicate owns the decision entirely
        if let Some(custom) = &rules.custom {
            return custom.check(value);
        }

        if rules.required {
            let outcome = check_required(field, rules, value);
            if !outcome.is_valid() {
                return outcome;
            }
        }

        if let Some(pattern) = &rules.pattern {
            if is_truthy(value) && !pattern.is_match(&display_text(value)) {
                return Validity::invalid(INVALID_VALUE);
            }
        }
    }

    check_shape(field, value)
}

fn check_required(field: &FieldDefinition, rules: &ValidationRules, value: &Value) -> Validity {
    let required_message = || Validity::invalid(format!("{} is required", field.label));

    match value {
        Value::Null | Value::Bool(false) => required_message(),
        Value::Array(items) if items.is_empty() => required_message(),
        Value::Number(number) => match number.as_f64() {
            Some(n) => check_number(rules, n),
            None => Validity::Valid,
        },
        Value::String(text) => {
            // Number inputs may hand over their raw text
            if field.kind == FieldKind::Number {
                if let Ok(n) = text.trim().parse::<f64>() {
                    return check_number(rules, n);
                }
            }
            check_text(field, rules, text)
        }
        _ => Validity::Valid,
    }
}

fn check_text(field: &FieldDefinition, rules: &ValidationRules, text: &str) -> Validity {
    let trimmed = text.trim();
    let len = trimmed.chars().count();

    if len == 0 {
        return if rules.allow_empty_string {
            Validity::Valid
        } else {
            Validity::invalid(format!("{} is required", field.label))
        };
    }

    if let Some(min) = rules.min_length {
        if len < min {
            return Validity::invalid(format!(
                "{} must be at least {} characters",
                field.label, min
            ));
        }
    }

    if let Some(max) = rules.max_length {
        if len > max {
            return Validity::invalid(format!(
                "{} must be at most {} characters",
                field.label, max
            ));
        }
    }

    Validity::Valid
}

fn check_number(rules: &ValidationRules, n: f64) -> Validity {
    if n == 0.0 && !rules.allow_zeros {
        return Validity::invalid(ZERO_NOT_ALLOWED);
    }

    if let Some(min) = rules.min_val {
        if n < min {
            return Validity::invalid(format!(
                "Value must be greater than or equal to {}",
                format_number(min)
            ));
        }
    }

    if let Some(max) = rules.max_val {
        if n > max {
            return Validity::invalid(format!(
                "Value must be less than or equal to {}",
                format_number(max)
            ));
        }
    }

    Validity::Valid
}

/// Kind-specific structure checks that apply with or without rules
fn check_shape(field: &FieldDefinition, value: &Value) -> Validity {
    match &field.kind {
        FieldKind::Number => match value {
            Value::String(text) if !text.trim().is_empty() && text.trim().parse::<f64>().is_err() => {
                Validity::invalid(INVALID_VALUE)
            }
            _ => Validity::Valid,
        },
        FieldKind::MapLocation { mode } if is_truthy(value) => match LocationValue::from_value(value) {
            Some(location) if location.mode() == *mode && location.is_well_formed() => {
                Validity::Valid
            }
            _ => Validity::invalid(INVALID_VALUE),
        },
        _ => Validity::Valid,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
