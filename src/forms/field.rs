// Field definitions - declarative description of one form input

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::forms::location::LocationMode;
use crate::forms::validator::Validity;

/// One selectable choice of a select field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
    /// Auxiliary data carried with the choice (e.g. a violation type's default amount)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl SelectOption {
    pub fn new(label: &str, value: impl Into<Value>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// Field kinds understood by the form interpreter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text {
        #[serde(default)]
        multiline: bool,
    },
    Number,
    #[serde(rename = "checkbox", alias = "toggle")]
    Toggle,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
        #[serde(default)]
        multiple: bool,
    },
    Date,
    Time,
    #[serde(alias = "map")]
    MapLocation {
        #[serde(default)]
        mode: LocationMode,
    },
    #[serde(alias = "file")]
    Attachment {
        #[serde(default)]
        accept: Vec<String>,
        #[serde(default)]
        max_bytes: Option<u64>,
    },
    #[serde(alias = "readonly")]
    ReadOnly,
    Computed,
}

impl FieldKind {
    pub fn text() -> Self {
        FieldKind::Text { multiline: false }
    }

    pub fn select(options: Vec<SelectOption>) -> Self {
        FieldKind::Select {
            options,
            multiple: false,
        }
    }

    /// Kinds the user cannot edit directly
    pub fn is_locked(&self) -> bool {
        matches!(self, FieldKind::ReadOnly | FieldKind::Computed)
    }
}

/// Compiled regex pattern usable in serde-described validators
#[derive(Clone)]
pub struct FieldPattern(Regex);

impl FieldPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for FieldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldPattern({})", self.0.as_str())
    }
}

impl PartialEq for FieldPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for FieldPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldPattern::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Custom predicate replacing every built-in rule when present
#[derive(Clone)]
pub struct CustomCheck(Arc<dyn Fn(&Value) -> Validity + Send + Sync>);

impl CustomCheck {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Validity + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    pub fn check(&self, value: &Value) -> Validity {
        (self.0)(value)
    }
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCheck")
    }
}

/// Constraint set attached to a field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationRules {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_val: Option<f64>,
    pub max_val: Option<f64>,
    pub pattern: Option<FieldPattern>,
    pub allow_empty_string: bool,
    pub allow_zeros: bool,
    #[serde(skip)]
    pub custom: Option<CustomCheck>,
}

impl ValidationRules {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_val = min;
        self.max_val = max;
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(FieldPattern::new(pattern)?);
        Ok(self)
    }

    pub fn allow_empty_string(mut self) -> Self {
        self.allow_empty_string = true;
        self
    }

    pub fn allow_zeros(mut self) -> Self {
        self.allow_zeros = true;
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Validity + Send + Sync + 'static,
    {
        self.custom = Some(CustomCheck::new(check));
        self
    }
}

/// Field definition consumed by the dynamic form interpreter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<ValidationRules>,
}

impl FieldDefinition {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            value: None,
            validate: None,
        }
    }

    /// Initial value (server-populated on edit screens)
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn validate(mut self, rules: ValidationRules) -> Self {
        self.validate = Some(rules);
        self
    }

    pub fn is_required(&self) -> bool {
        self.validate.as_ref().map(|rules| rules.required).unwrap_or(false)
    }

    /// Options of a select field, empty for every other kind
    pub fn options(&self) -> &[SelectOption] {
        match &self.kind {
            FieldKind::Select { options, .. } => options,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_field_list() {
        let fields: Vec<FieldDefinition> = serde_json::from_value(json!([
            {"name": "amount", "label": "Amount", "type": "number", "validate": {"required": true}},
            {"name": "paid", "label": "Paid", "type": "checkbox"},
            {"name": "notify", "label": "Notify", "type": "toggle"},
            {"name": "plate", "label": "Plate", "type": "text",
             "validate": {"required": true, "minLength": 5, "pattern": "^[A-Z0-9-]+$"}},
            {"name": "status", "label": "Status", "type": "select",
             "options": [{"label": "Open", "value": "open"}]},
            {"name": "zone", "label": "Zone", "type": "map_location", "mode": "polygon"},
            {"name": "evidence", "label": "Evidence", "type": "attachment"}
        ]))
        .unwrap();

        assert_eq!(fields[0].kind, FieldKind::Number);
        assert!(fields[0].is_required());
        assert_eq!(fields[1].kind, FieldKind::Toggle);
        assert_eq!(fields[2].kind, FieldKind::Toggle);
        let rules = fields[3].validate.as_ref().unwrap();
        assert_eq!(rules.min_length, Some(5));
        assert!(rules.pattern.as_ref().unwrap().is_match("AB-123"));
        assert_eq!(fields[4].options().len(), 1);
        assert_eq!(
            fields[5].kind,
            FieldKind::MapLocation {
                mode: LocationMode::Polygon
            }
        );
        assert!(matches!(fields[6].kind, FieldKind::Attachment { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result: Result<FieldDefinition, _> = serde_json::from_value(json!({
            "name": "plate", "label": "Plate", "type": "text",
            "validate": {"pattern": "([unclosed"}
        }));
        assert!(result.is_err());
    }
}
