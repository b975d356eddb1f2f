use async_trait::async_trait;
use uuid::Uuid;

use crate::error::LeaveResult;

/// Stable reference to a stored attachment. The core persists only this
/// reference (on the request's doctor-note field), never the bytes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AttachmentRef {
    pub id: Uuid,
    pub path: String,
    pub size_bytes: u64,
    pub etag: String,
}

/// External attachment-storage collaborator.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn put(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> LeaveResult<AttachmentRef>;

    /// Resolve a stored attachment id to a fetchable URL, if it exists.
    async fn url(&self, id: Uuid) -> LeaveResult<Option<String>>;
}

/// Store for deployments without attachment storage wired up: uploads are
/// rejected by never being offered, and lookups resolve to nothing.
#[derive(Debug, Default)]
pub struct NullAttachmentStore;

#[async_trait]
impl AttachmentStore for NullAttachmentStore {
    async fn put(
        &self,
        file_name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> LeaveResult<AttachmentRef> {
        tracing::warn!(file_name, size = bytes.len(), "attachment storage not configured");
        Err(crate::error::LeaveError::Internal(
            "attachment storage is not configured".to_string(),
        ))
    }

    async fn url(&self, _id: Uuid) -> LeaveResult<Option<String>> {
        Ok(None)
    }
}
