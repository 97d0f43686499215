// Dynamic Form Interpreter - turns a field list into an editable value bag
// and mediates submission to a remote collaborator

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::{Number, Value};
use tracing::debug;

use crate::core::Record;
use crate::error::{AppError, AppResult};
use crate::forms::field::{FieldDefinition, FieldKind};
use crate::forms::location::LocationValue;
use crate::forms::validator::{validate, Validity};
use crate::infrastructure::chunked_upload::{FileReference, UploadSource};
use crate::infrastructure::traits::AttachmentUploader;

/// Current value of every field, keyed by field name
pub type FormValues = BTreeMap<String, Value>;

/// Cross-field reducer: (previous, tentative) -> authoritative next values
pub type ChangeReducer = Arc<dyn Fn(&FormValues, FormValues) -> FormValues + Send + Sync>;

/// Remote collaborator receiving the serialized payload
#[async_trait]
pub trait FormSubmitter: Send + Sync {
    async fn submit(&self, payload: Record) -> AppResult<Value>;
}

/// Values plus active validation errors (absent = valid)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub values: FormValues,
    pub errors: BTreeMap<String, String>,
}

pub struct DynamicForm {
    fields: Vec<FieldDefinition>,
    state: FormState,
    reducer: Option<ChangeReducer>,
}

impl fmt::Debug for DynamicForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicForm")
            .field("fields", &self.fields.len())
            .field("state", &self.state)
            .field("reducer", &self.reducer.is_some())
            .finish()
    }
}

impl DynamicForm {
    pub fn new(fields: Vec<FieldDefinition>) -> AppResult<Self> {
        let mut form = Self {
            fields: Vec::new(),
            state: FormState::default(),
            reducer: None,
        };
        form.reset(fields)?;
        Ok(form)
    }

    pub fn with_reducer(mut self, reducer: ChangeReducer) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// Replace the field list and rebuild state from its initial values
    pub fn reset(&mut self, fields: Vec<FieldDefinition>) -> AppResult<()> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(AppError::ConfigurationError(format!(
                    "Duplicate field name '{}'",
                    field.name
                )));
            }
        }

        self.state = FormState {
            values: fields
                .iter()
                .map(|field| (field.name.clone(), coerce_initial(&field.kind, field.value.as_ref())))
                .collect(),
            errors: BTreeMap::new(),
        };
        self.fields = fields;
        Ok(())
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn values(&self) -> &FormValues {
        &self.state.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.state.values.get(name)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.state.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.state.errors.get(name).map(String::as_str)
    }

    /// Apply a user edit; only the changed field is re-validated
    pub fn on_change(&mut self, name: &str, value: Value) -> AppResult<Validity> {
        let field = self
            .field(name)
            .ok_or_else(|| AppError::NotFound(format!("Unknown field '{}'", name)))?;
        if field.kind.is_locked() {
            return Err(AppError::Validation(format!("{} cannot be edited", field.label)));
        }
        let value = coerce_change(&field.kind, value);
        self.apply_change(name, value)
    }

    fn apply_change(&mut self, name: &str, value: Value) -> AppResult<Validity> {
        let mut tentative = self.state.values.clone();
        tentative.insert(name.to_string(), value);

        let next = match &self.reducer {
            Some(reducer) => reducer(&self.state.values, tentative),
            None => tentative,
        };
        self.state.values = next;

        let field = self
            .field(name)
            .ok_or_else(|| AppError::NotFound(format!("Unknown field '{}'", name)))?;
        let current = self.state.values.get(name).cloned().unwrap_or(Value::Null);
        let validity = validate(field, &current);

        match validity.error() {
            Some(error) => {
                self.state.errors.insert(name.to_string(), error.to_string());
            }
            None => {
                self.state.errors.remove(name);
            }
        }
        Ok(validity)
    }

    /// Re-validate every field; returns the aggregated errors when any fail
    pub fn validate_all(&mut self) -> Result<(), BTreeMap<String, String>> {
        let errors: BTreeMap<String, String> = self
            .fields
            .iter()
            .filter_map(|field| {
                let value = self.state.values.get(&field.name).unwrap_or(&Value::Null);
                validate(field, value)
                    .error()
                    .map(|error| (field.name.clone(), error.to_string()))
            })
            .collect();

        self.state.errors = errors.clone();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Submit-ready payload: nested values are flattened to JSON text
    pub fn payload(&self) -> Record {
        serialize_values(&self.state.values)
    }

    /// Validate, then hand the payload to `submitter`.
    ///
    /// A rejected submit leaves the form untouched so the user can retry.
    pub async fn submit(&mut self, submitter: &dyn FormSubmitter) -> AppResult<Value> {
        if let Err(errors) = self.validate_all() {
            debug!("Form submit blocked by {} invalid field(s)", errors.len());
            return Err(AppError::FieldErrors(errors));
        }
        submitter.submit(self.payload()).await
    }

    pub fn cancel(&self, hook: &dyn Fn()) {
        hook();
    }

    /// Store a map-location value on a location field
    pub fn set_location(&mut self, name: &str, location: LocationValue) -> AppResult<Validity> {
        let is_location = match self.field(name) {
            Some(field) => matches!(field.kind, FieldKind::MapLocation { .. }),
            None => return Err(AppError::NotFound(format!("Unknown field '{}'", name))),
        };
        if !is_location {
            return Err(AppError::Validation(format!("'{}' is not a location field", name)));
        }
        self.on_change(name, location.to_value())
    }

    /// Upload a file for an attachment field and store its reference
    pub async fn attach_file(
        &mut self,
        name: &str,
        uploader: &dyn AttachmentUploader,
        source: &UploadSource,
    ) -> AppResult<FileReference> {
        let field = self
            .field(name)
            .ok_or_else(|| AppError::NotFound(format!("Unknown field '{}'", name)))?;
        let FieldKind::Attachment { accept, max_bytes } = &field.kind else {
            return Err(AppError::Validation(format!("'{}' is not an attachment field", name)));
        };

        if let Some(max) = max_bytes {
            if source.size() > *max {
                return Err(AppError::UploadError(format!(
                    "{} exceeds the {} byte limit",
                    source.file_name, max
                )));
            }
        }
        if !accept.is_empty() && !accepts(accept, source) {
            return Err(AppError::UploadError(format!(
                "{} is not an accepted file type",
                source.file_name
            )));
        }

        let reference = uploader.upload(source).await?;
        let value = serde_json::to_value(&reference)?;
        self.apply_change(name, value)?;
        Ok(reference)
    }
}

/// `accept` entries are MIME types (`image/*` allowed) or `.ext` suffixes
fn accepts(accept: &[String], source: &UploadSource) -> bool {
    accept.iter().any(|rule| {
        if let Some(ext) = rule.strip_prefix('.') {
            source
                .extension()
                .map(|actual| actual.eq_ignore_ascii_case(ext))
                .unwrap_or(false)
        } else if let Some(family) = rule.strip_suffix("/*") {
            source.content_type.split('/').next() == Some(family)
        } else {
            source.content_type.eq_ignore_ascii_case(rule)
        }
    })
}

/// Flatten values for the wire; primitives pass through unchanged
pub fn serialize_values(values: &FormValues) -> Record {
    values
        .iter()
        .map(|(name, value)| {
            let flat = match value {
                Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
                primitive => primitive.clone(),
            };
            (name.clone(), flat)
        })
        .collect()
}

pub(crate) fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Mount-time coercion: numbers default to 0, toggles to false, others to ""
pub fn coerce_initial(kind: &FieldKind, value: Option<&Value>) -> Value {
    let value = match value {
        None | Some(Value::Null) => {
            return match kind {
                FieldKind::Number => Value::from(0),
                FieldKind::Toggle => Value::Bool(false),
                _ => Value::String(String::new()),
            }
        }
        Some(value) => value,
    };

    match kind {
        FieldKind::Number => match value {
            Value::Number(_) => value.clone(),
            Value::String(text) => text.trim().parse::<f64>().map(number_value).unwrap_or(Value::from(0)),
            _ => Value::from(0),
        },
        FieldKind::Toggle => Value::Bool(match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Value::String(text) => matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
            _ => false,
        }),
        FieldKind::Date => coerce_date(value),
        FieldKind::Time => coerce_time(value),
        FieldKind::MapLocation { .. } | FieldKind::Attachment { .. } => parse_embedded_json(value),
        _ => value.clone(),
    }
}

/// Change-time coercion keeps raw text the validator can still reject
fn coerce_change(kind: &FieldKind, value: Value) -> Value {
    match (kind, &value) {
        (FieldKind::Number, Value::String(text)) => match text.trim().parse::<f64>() {
            Ok(n) => number_value(n),
            Err(_) => value,
        },
        (FieldKind::Date, _) => coerce_date(&value),
        (FieldKind::Time, _) => coerce_time(&value),
        _ => value,
    }
}

fn coerce_date(value: &Value) -> Value {
    let date = match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.date_naive())
            .ok()
            .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()),
        _ => None,
    };

    match date {
        Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
        None => value.clone(),
    }
}

fn coerce_time(value: &Value) -> Value {
    let time = match value {
        Value::String(text) => NaiveTime::parse_from_str(text, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.time())),
        _ => None,
    };

    match time {
        Some(time) => Value::String(time.format("%H:%M").to_string()),
        None => value.clone(),
    }
}

/// Edit screens receive nested values back as the text they were sent as
fn parse_embedded_json(value: &Value) -> Value {
    match value {
        Value::String(text) if text.trim_start().starts_with('{') => {
            serde_json::from_str(text).unwrap_or_else(|_| value.clone())
        }
        _ => value.clone(),
    }
}
