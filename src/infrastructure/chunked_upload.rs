// Chunked attachment upload with resume support
// Each chunk is probed first so an interrupted upload only sends what is missing

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::action::{ActionRequest, ResponseCodes};
use crate::infrastructure::traits::{ActionTransport, AttachmentUploader};

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// File picked by the user
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSource {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Last-modified time in epoch millis, part of the resume identifier
    pub last_modified: i64,
}

impl UploadSource {
    pub fn new(file_name: &str, content_type: &str, bytes: Vec<u8>, last_modified: i64) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
            last_modified,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Stable identifier so a retried upload finds its earlier chunks
    pub fn identifier(&self) -> String {
        let name: String = self
            .file_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' })
            .collect();
        format!("{}-{}-{}", self.size(), name, self.last_modified)
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// Opaque server reference stored in an attachment field's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub url: String,
}

pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

pub struct ChunkedUploader {
    transport: Arc<dyn ActionTransport>,
    model: String,
    chunk_size: usize,
    codes: ResponseCodes,
    on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for ChunkedUploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedUploader")
            .field("model", &self.model)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl ChunkedUploader {
    pub fn new(transport: Arc<dyn ActionTransport>, model: &str, codes: ResponseCodes) -> Self {
        Self {
            transport,
            model: model.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            codes,
            on_progress: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Called with (chunks done, total chunks) after every chunk
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn total_chunks(&self, size: usize) -> usize {
        size.div_ceil(self.chunk_size).max(1)
    }

    async fn call(&self, request: ActionRequest) -> AppResult<Value> {
        let response = self.transport.execute(request).await?;
        self.codes.decode(response)
    }

    async fn chunk_exists(&self, identifier: &str, chunk_number: usize) -> AppResult<bool> {
        let data = self
            .call(
                ActionRequest::new(&self.model, "checkChunk")
                    .param("identifier", identifier)
                    .param("chunkNumber", chunk_number),
            )
            .await?;
        Ok(data.get("exists").and_then(Value::as_bool).unwrap_or(false))
    }
}

#[async_trait]
impl AttachmentUploader for ChunkedUploader {
    async fn upload(&self, source: &UploadSource) -> AppResult<FileReference> {
        if source.bytes.is_empty() {
            return Err(AppError::UploadError(format!("{} is empty", source.file_name)));
        }

        let identifier = source.identifier();
        let total = self.total_chunks(source.bytes.len());
        info!("Uploading {} in {} chunk(s) as {}", source.file_name, total, identifier);

        for (index, chunk) in source.bytes.chunks(self.chunk_size).enumerate() {
            let chunk_number = index + 1;

            if self.chunk_exists(&identifier, chunk_number).await? {
                debug!("Chunk {}/{} of {} already uploaded", chunk_number, total, identifier);
            } else {
                let encoded = base64::engine::general_purpose::STANDARD.encode(chunk);
                self.call(
                    ActionRequest::new(&self.model, "uploadChunk")
                        .param("identifier", identifier.as_str())
                        .param("chunkNumber", chunk_number)
                        .param("totalChunks", total)
                        .param("chunkSize", self.chunk_size)
                        .param("totalSize", source.size())
                        .param("fileName", source.file_name.as_str())
                        .param("data", encoded),
                )
                .await?;
            }

            if let Some(progress) = &self.on_progress {
                progress(chunk_number, total);
            }
        }

        let data = self
            .call(
                ActionRequest::new(&self.model, "completeUpload")
                    .param("identifier", identifier.as_str())
                    .param("fileName", source.file_name.as_str())
                    .param("contentType", source.content_type.as_str())
                    .param("totalChunks", total)
                    .param("totalSize", source.size()),
            )
            .await?;

        serde_json::from_value(data)
            .map_err(|e| AppError::InvalidResponse(format!("bad file reference: {}", e)))
    }
}
