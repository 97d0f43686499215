// Action Interface - the `{model, action, params}` backend the console talks to
// Every call answers HTTP 200 with a `{code, data, error, message}` body

use axum::{
    extract::{Path as AxumPath, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::core::Record;
use crate::error::AppError;
use crate::infrastructure::action::{ActionRequest, ActionResponse};
use crate::services::model_rules::{check_delete, prepare_write, MODELS};
use crate::services::{
    id_param, ActionFailure, ListQuery, RecordStore, UploadStore, SUCCESS_CODE, UNKNOWN_ACTION_CODE,
};

#[derive(Debug, Clone)]
pub struct ActionInterface {
    store: RecordStore,
    uploads: UploadStore,
    default_page_size: usize,
}

impl ActionInterface {
    pub fn new(store: RecordStore, uploads: UploadStore, default_page_size: usize) -> Self {
        Self {
            store,
            uploads,
            default_page_size: default_page_size.max(1),
        }
    }

    /// Store with every console model registered
    pub async fn with_console_models(default_page_size: usize) -> Self {
        let store = RecordStore::new();
        for model in MODELS {
            store.register(model).await;
        }
        Self::new(store, UploadStore::new(), default_page_size)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub async fn dispatch(&self, request: ActionRequest) -> ActionResponse {
        debug!("Dispatching {}.{}", request.model, request.action);
        match self.run(&request).await {
            Ok(data) => ActionResponse::success(SUCCESS_CODE, data),
            Err(failure) => {
                warn!(
                    "{}.{} failed with {} {}: {}",
                    request.model, request.action, failure.code, failure.error, failure.message
                );
                failure.into_response()
            }
        }
    }

    async fn run(&self, request: &ActionRequest) -> Result<Value, ActionFailure> {
        let model = request.model.as_str();
        let params = &request.params;

        match request.action.as_str() {
            "list" => self.list(model, params).await,
            "details" => {
                let id = required_id(params)?;
                Ok(Value::Object(self.store.get(model, id).await?))
            }
            "create" => {
                let mut record = params.clone();
                record.remove("id");
                prepare_write(&self.store, model, &mut record, None).await?;
                Ok(Value::Object(self.store.insert(model, record).await?))
            }
            "update" => {
                let id = required_id(params)?;
                let existing = self.store.get(model, id).await?;
                let mut changes = params.clone();
                changes.remove("id");
                prepare_write(&self.store, model, &mut changes, Some(&existing)).await?;
                Ok(Value::Object(self.store.update(model, id, changes).await?))
            }
            "delete" => {
                let id = required_id(params)?;
                let existing = self.store.get(model, id).await?;
                check_delete(model, &existing)?;
                self.store.delete(model, id).await?;
                Ok(json!({"id": id, "deleted": true}))
            }
            "checkChunk" => {
                let identifier = str_param(params, "identifier")?;
                let chunk = usize_param(params, "chunkNumber")?;
                Ok(json!({"exists": self.uploads.has_chunk(identifier, chunk).await}))
            }
            "uploadChunk" => {
                let identifier = str_param(params, "identifier")?;
                let chunk = usize_param(params, "chunkNumber")?;
                let size = self
                    .uploads
                    .store_chunk(identifier, chunk, str_param(params, "data")?)
                    .await?;
                Ok(json!({"stored": size}))
            }
            "completeUpload" => {
                let reference = self
                    .uploads
                    .complete(
                        str_param(params, "identifier")?,
                        str_param(params, "fileName")?,
                        params
                            .get("contentType")
                            .and_then(Value::as_str)
                            .unwrap_or("application/octet-stream"),
                        usize_param(params, "totalChunks")?,
                    )
                    .await?;
                serde_json::to_value(reference).map_err(|e| ActionFailure::from(AppError::from(e)))
            }
            other => Err(ActionFailure::new(
                UNKNOWN_ACTION_CODE,
                "UNKNOWN_ACTION",
                &format!("Unknown action {}.{}", model, other),
            )),
        }
    }

    async fn list(&self, model: &str, params: &Record) -> Result<Value, ActionFailure> {
        let max = match params.get("max") {
            Some(_) => usize_param(params, "max")?,
            None => self.default_page_size,
        };
        let last = match params.get("last") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                id_param(Some(value))
                    .ok_or_else(|| ActionFailure::bad_request("BAD_CURSOR", "last is not a record id"))?,
            ),
        };
        let filters: Record = params
            .iter()
            .filter(|(key, value)| key.as_str() != "max" && key.as_str() != "last" && !value.is_object())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let query = ListQuery { max, last, filters };
        let records = self.store.list(model, &query).await?;
        Ok(Value::Array(records.into_iter().map(Value::Object).collect()))
    }
}

fn str_param<'a>(params: &'a Record, key: &str) -> Result<&'a str, ActionFailure> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ActionFailure::bad_request("MISSING_FIELD", &format!("{} is required", key)))
}

fn usize_param(params: &Record, key: &str) -> Result<usize, ActionFailure> {
    id_param(params.get(key))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| ActionFailure::bad_request("MISSING_FIELD", &format!("{} must be a positive number", key)))
}

fn required_id(params: &Record) -> Result<i64, ActionFailure> {
    id_param(params.get("id")).ok_or_else(|| ActionFailure::bad_request("MISSING_FIELD", "id is required"))
}

// HTTP Handlers

pub async fn action_handler(
    State(interface): State<ActionInterface>,
    AxumPath((model, action)): AxumPath<(String, String)>,
    Json(params): Json<Record>,
) -> Json<ActionResponse> {
    let request = ActionRequest {
        model,
        action,
        params,
    };
    Json(interface.dispatch(request).await)
}

pub async fn file_handler(
    State(interface): State<ActionInterface>,
    AxumPath(id): AxumPath<String>,
) -> Result<Response, AppError> {
    let file = interface.uploads.file(&id).await?;
    Ok(([(header::CONTENT_TYPE, file.reference.content_type)], file.bytes).into_response())
}

pub async fn health_handler(State(interface): State<ActionInterface>) -> Json<Value> {
    Json(json!({"status": "ok", "models": interface.store.models().await}))
}

pub fn create_action_router(interface: ActionInterface) -> Router {
    Router::new()
        .route("/actions/{model}/{action}", post(action_handler))
        .route("/files/{id}", get(file_handler))
        .route("/health", get(health_handler))
        .with_state(interface)
}
