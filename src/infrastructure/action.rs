// Remote action convention - every network operation funnels through one shape

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";
pub const TRANSPORT_FAILURE: &str = "Unable to reach the server, please try again";
pub const INVALID_RESPONSE: &str = "Invalid Response";

/// A named, server-executed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub model: String,
    pub action: String,
    pub params: Map<String, Value>,
}

impl ActionRequest {
    pub fn new(model: &str, action: &str) -> Self {
        Self {
            model: model.to_string(),
            action: action.to_string(),
            params: Map::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn params(mut self, params: &Map<String, Value>) -> Self {
        for (key, value) in params {
            self.params.insert(key.clone(), value.clone());
        }
        self
    }
}

/// Status-coded response of a remote action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(deserialize_with = "code_from_string_or_number")]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn success(code: &str, data: Value) -> Self {
        Self {
            code: code.to_string(),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(code: &str, error: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            data: None,
            error: Some(error.to_string()),
            message: Some(message.to_string()),
        }
    }
}

fn code_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(code) => Ok(code),
        Value::Number(code) => Ok(code.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid response code: {}", other))),
    }
}

/// One known failure for a status code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub error: String,
    pub message: String,
}

/// Success code plus the user-facing messages of known failure codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCodes {
    pub success_code: String,
    #[serde(default)]
    pub error_codes: HashMap<String, Vec<ErrorEntry>>,
}

impl ResponseCodes {
    pub fn new(success_code: &str) -> Self {
        Self {
            success_code: success_code.to_string(),
            error_codes: HashMap::new(),
        }
    }

    pub fn error(mut self, code: &str, error: &str, message: &str) -> Self {
        self.error_codes
            .entry(code.to_string())
            .or_default()
            .push(ErrorEntry {
                error: error.to_string(),
                message: message.to_string(),
            });
        self
    }

    pub fn is_valid(&self, response: &ActionResponse) -> bool {
        response.code == self.success_code
    }

    /// Decode a response into its `data` payload or a user-facing failure
    pub fn decode(&self, response: ActionResponse) -> AppResult<Value> {
        if self.is_valid(&response) {
            return response.data.ok_or_else(|| {
                warn!("Response carried success code {} but no data", response.code);
                AppError::InvalidResponse(INVALID_RESPONSE.to_string())
            });
        }

        let message = self.message_for(&response);
        debug!("Action failed with code {}: {}", response.code, message);
        Err(AppError::ActionFailed {
            code: response.code,
            message,
        })
    }

    fn message_for(&self, response: &ActionResponse) -> String {
        let Some(entries) = self.error_codes.get(&response.code) else {
            return GENERIC_FAILURE.to_string();
        };

        let matching = response
            .error
            .as_ref()
            .and_then(|error| entries.iter().find(|entry| &entry.error == error));

        matching
            .or_else(|| entries.first())
            .map(|entry| entry.message.clone())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    }
}

/// Render any failure of a remote round trip for display
pub fn user_message(error: &AppError) -> String {
    match error {
        AppError::ActionFailed { message, .. } => message.clone(),
        AppError::InvalidResponse(_) => INVALID_RESPONSE.to_string(),
        AppError::Transport(_) => TRANSPORT_FAILURE.to_string(),
        AppError::Validation(msg)
        | AppError::Forbidden(msg)
        | AppError::NotFound(msg)
        | AppError::UploadError(msg)
        | AppError::Busy(msg)
        | AppError::Stale(msg) => msg.clone(),
        _ => GENERIC_FAILURE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codes() -> ResponseCodes {
        ResponseCodes::new("2000")
            .error("4004", "PENALTY_NOT_FOUND", "Penalty no longer exists")
            .error("4000", "MISSING_PLATE", "Plate number is missing")
            .error("4000", "BAD_AMOUNT", "Amount is not accepted")
    }

    #[test]
    fn test_decode_success() {
        let response = ActionResponse::success("2000", json!({"id": 7}));
        assert_eq!(codes().decode(response).unwrap(), json!({"id": 7}));
    }

    #[test]
    fn test_success_without_data_is_invalid_response() {
        let response = ActionResponse {
            code: "2000".to_string(),
            data: None,
            error: None,
            message: None,
        };
        assert!(matches!(
            codes().decode(response),
            Err(AppError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_known_code_selects_matching_entry() {
        let response = ActionResponse::failure("4000", "BAD_AMOUNT", "amount < 0");
        let err = codes().decode(response).unwrap_err();
        assert_eq!(
            err,
            AppError::ActionFailed {
                code: "4000".to_string(),
                message: "Amount is not accepted".to_string()
            }
        );

        let response = ActionResponse::failure("4000", "SOMETHING_ELSE", "");
        assert_eq!(
            user_message(&codes().decode(response).unwrap_err()),
            "Plate number is missing"
        );
    }

    #[test]
    fn test_unknown_code_falls_back_to_generic_message() {
        let response = ActionResponse::failure("5000", "BOOM", "boom");
        assert_eq!(user_message(&codes().decode(response).unwrap_err()), GENERIC_FAILURE);
    }

    #[test]
    fn test_numeric_code_deserializes() {
        let response: ActionResponse =
            serde_json::from_value(json!({"code": 2000, "data": []})).unwrap();
        assert_eq!(response.code, "2000");
    }
}
