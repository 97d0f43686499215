// Services - storage and business rules behind the action backend

pub mod model_rules;
pub mod record_store;
pub mod upload_store;

pub use record_store::{id_param, ListQuery, RecordStore};
pub use upload_store::{StoredFile, UploadStore};

use crate::error::AppError;
use crate::infrastructure::action::ActionResponse;

pub const SUCCESS_CODE: &str = "2000";
pub const BAD_REQUEST_CODE: &str = "4000";
pub const NOT_FOUND_CODE: &str = "4004";
pub const UNKNOWN_ACTION_CODE: &str = "4040";
pub const CONFLICT_CODE: &str = "4090";
pub const INTERNAL_CODE: &str = "5000";

/// A failed action as carried on the wire: `{code, error, message}`
#[derive(Debug, Clone, PartialEq)]
pub struct ActionFailure {
    pub code: String,
    pub error: String,
    pub message: String,
}

impl ActionFailure {
    pub fn new(code: &str, error: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            error: error.to_string(),
            message: message.to_string(),
        }
    }

    pub fn bad_request(error: &str, message: &str) -> Self {
        Self::new(BAD_REQUEST_CODE, error, message)
    }

    pub fn conflict(error: &str, message: &str) -> Self {
        Self::new(CONFLICT_CODE, error, message)
    }

    pub fn into_response(self) -> ActionResponse {
        ActionResponse::failure(&self.code, &self.error, &self.message)
    }
}

impl From<AppError> for ActionFailure {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(msg) => Self::new(NOT_FOUND_CODE, "NOT_FOUND", &msg),
            AppError::BadRequest(msg) | AppError::Validation(msg) | AppError::SerializationError(msg) => {
                Self::bad_request("BAD_REQUEST", &msg)
            }
            AppError::UploadError(msg) => Self::bad_request("UPLOAD_FAILED", &msg),
            AppError::Busy(msg) | AppError::Stale(msg) => Self::conflict("CONFLICT", &msg),
            other => {
                tracing::error!("Action failed internally: {}", other);
                Self::new(INTERNAL_CODE, "INTERNAL", "Internal server error")
            }
        }
    }
}
