use crate::error::AppResult;
use crate::infrastructure::action::{ActionRequest, ActionResponse};
use crate::infrastructure::chunked_upload::{FileReference, UploadSource};
use async_trait::async_trait;
use std::collections::BTreeSet;

#[async_trait]
pub trait ActionTransport: Send + Sync {
    /// Execute a named remote action; `Err` only for transport-level failures
    async fn execute(&self, request: ActionRequest) -> AppResult<ActionResponse>;
}

#[async_trait]
pub trait RoleChecker: Send + Sync {
    async fn has_any_role(&self, roles: &BTreeSet<String>) -> AppResult<bool>;
}

#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    async fn upload(&self, source: &UploadSource) -> AppResult<FileReference>;
}
