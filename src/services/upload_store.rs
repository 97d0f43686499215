// Chunk staging for resumable uploads, plus the assembled files

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use base64::Engine;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::chunked_upload::FileReference;

#[derive(Debug, Default)]
struct PendingUpload {
    chunks: BTreeMap<usize, Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub reference: FileReference,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadStore {
    pending: Arc<Mutex<HashMap<String, PendingUpload>>>,
    files: Arc<RwLock<HashMap<String, StoredFile>>>,
}

impl UploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_chunk(&self, identifier: &str, chunk_number: usize) -> bool {
        self.pending
            .lock()
            .await
            .get(identifier)
            .map(|upload| upload.chunks.contains_key(&chunk_number))
            .unwrap_or(false)
    }

    /// Stage one base64 chunk; chunk numbers start at 1
    pub async fn store_chunk(&self, identifier: &str, chunk_number: usize, encoded: &str) -> AppResult<usize> {
        if chunk_number == 0 {
            return Err(AppError::BadRequest("chunkNumber starts at 1".to_string()));
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AppError::UploadError(format!("chunk {} is not base64: {}", chunk_number, e)))?;
        let size = bytes.len();

        let mut pending = self.pending.lock().await;
        pending
            .entry(identifier.to_string())
            .or_default()
            .chunks
            .insert(chunk_number, bytes);
        Ok(size)
    }

    /// Assemble chunks `1..=total_chunks` into a stored file
    pub async fn complete(
        &self,
        identifier: &str,
        file_name: &str,
        content_type: &str,
        total_chunks: usize,
    ) -> AppResult<FileReference> {
        let mut pending = self.pending.lock().await;
        let upload = pending
            .get(identifier)
            .ok_or_else(|| AppError::UploadError(format!("No chunks received for {}", identifier)))?;

        let missing: Vec<usize> = (1..=total_chunks)
            .filter(|n| !upload.chunks.contains_key(n))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::UploadError(format!(
                "{} is missing chunk(s) {:?}",
                identifier, missing
            )));
        }

        let bytes: Vec<u8> = upload
            .chunks
            .range(1..=total_chunks)
            .flat_map(|(_, chunk)| chunk.iter().copied())
            .collect();
        pending.remove(identifier);
        drop(pending);

        let id = Uuid::new_v4().to_string();
        let reference = FileReference {
            id: id.clone(),
            name: file_name.to_string(),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
            url: format!("/files/{}", id),
        };
        info!("Stored upload {} as {} ({} bytes)", identifier, id, bytes.len());

        self.files.write().await.insert(
            id,
            StoredFile {
                reference: reference.clone(),
                bytes,
            },
        );
        Ok(reference)
    }

    pub async fn file(&self, id: &str) -> AppResult<StoredFile> {
        self.files
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[tokio::test]
    async fn test_chunks_assemble_in_order() {
        let store = UploadStore::new();
        store.store_chunk("u1", 2, &encode(b"world")).await.unwrap();
        assert!(!store.has_chunk("u1", 1).await);
        store.store_chunk("u1", 1, &encode(b"hello ")).await.unwrap();
        assert!(store.has_chunk("u1", 2).await);

        let reference = store.complete("u1", "note.txt", "text/plain", 2).await.unwrap();
        assert_eq!(reference.size, 11);
        assert_eq!(store.file(&reference.id).await.unwrap().bytes, b"hello world".to_vec());
        assert!(!store.has_chunk("u1", 1).await);
    }

    #[tokio::test]
    async fn test_complete_with_missing_chunk_fails() {
        let store = UploadStore::new();
        store.store_chunk("u2", 1, &encode(b"a")).await.unwrap();

        let err = store.complete("u2", "a.bin", "application/octet-stream", 3).await.unwrap_err();
        assert!(matches!(err, AppError::UploadError(_)));
        assert!(store.has_chunk("u2", 1).await);
    }

    #[tokio::test]
    async fn test_bad_chunks_are_rejected() {
        let store = UploadStore::new();
        assert!(matches!(store.store_chunk("u3", 0, "AA==").await, Err(AppError::BadRequest(_))));
        assert!(matches!(store.store_chunk("u3", 1, "%%%").await, Err(AppError::UploadError(_))));
    }
}
