use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    // Remote action failures
    Transport(String),
    InvalidResponse(String),
    ActionFailed { code: String, message: String },
    // Local failures
    Validation(String),
    FieldErrors(BTreeMap<String, String>),
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    Busy(String),
    Stale(String),
    ConfigurationError(String),
    SerializationError(String),
    UploadError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::InvalidResponse(msg) => write!(f, "Invalid Response: {}", msg),
            AppError::ActionFailed { code, message } => {
                write!(f, "Action failed ({}): {}", code, message)
            }
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::FieldErrors(errors) => {
                let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                write!(f, "Invalid fields: {}", fields.join(", "))
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Busy(msg) => write!(f, "Busy: {}", msg),
            AppError::Stale(msg) => write!(f, "Stale: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::UploadError(msg) => write!(f, "Upload error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::FieldErrors(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Busy(msg) | AppError::Stale(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::SerializationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UploadError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Transport(msg)
            | AppError::InvalidResponse(msg)
            | AppError::ConfigurationError(msg)
            | AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::ActionFailed { message, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message.clone())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
