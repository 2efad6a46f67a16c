//! External collaborator contracts: content persistence, file storage and
//! outbound notifications.
//!
//! The assistant core only ever talks to these traits. `MemoryStore` backs
//! tests and local runs; `SupabaseStore` speaks to the hosted platform
//! (PostgREST, storage API, edge-function email sender).

pub mod memory;
pub mod supabase;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use makershub_schema::{
    is_allowed_upload_mime, EventPatch, EventRecord, NewEvent, NewFeedback, NewPost, NewResource,
    Notification, PostPatch, PostRecord, ProfilePatch, ResourcePatch, ResourceRecord,
    UploadPurpose, MAX_UPLOAD_BYTES,
};

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// CRUD against the hosted content collections. Errors carry the
/// platform's own message text; callers surface it verbatim.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Recent events, newest `event_date` first.
    async fn list_recent_events(&self, limit: usize) -> Result<Vec<EventRecord>>;
    /// Recent posts, newest creation first.
    async fn list_recent_posts(&self, limit: usize) -> Result<Vec<PostRecord>>;
    /// Recent resources, newest creation first.
    async fn list_recent_resources(&self, limit: usize) -> Result<Vec<ResourceRecord>>;

    async fn insert_event(&self, event: NewEvent) -> Result<()>;
    /// Batch insert for recurring series; all-or-nothing at the platform.
    async fn insert_events(&self, events: Vec<NewEvent>) -> Result<()>;
    async fn update_event(&self, id: i64, patch: EventPatch) -> Result<()>;
    async fn delete_event(&self, id: i64) -> Result<()>;

    async fn insert_post(&self, post: NewPost) -> Result<()>;
    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<()>;
    async fn delete_post(&self, id: i64) -> Result<()>;

    async fn insert_resource(&self, resource: NewResource) -> Result<()>;
    async fn update_resource(&self, id: i64, patch: ResourcePatch) -> Result<()>;
    async fn delete_resource(&self, id: i64) -> Result<()>;

    async fn upsert_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<()>;
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<()>;
}

/// A file the user picked in the chat surface.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File is too large. Attachments must be 5MB or smaller.")]
    TooLarge,
    #[error("Only image and video files can be attached.")]
    UnsupportedType,
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Validation shared by every storage backend; rejected files never leave
/// the process.
pub fn validate_upload(file: &UploadFile) -> Result<(), UploadError> {
    if file.bytes.len() as u64 > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }
    if !is_allowed_upload_mime(&file.mime_type) {
        return Err(UploadError::UnsupportedType);
    }
    Ok(())
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store the file and return its public URL.
    async fn upload(
        &self,
        owner: Uuid,
        file: UploadFile,
        purpose: UploadPurpose,
    ) -> Result<String, UploadError>;
}

/// Outbound email. Best-effort: callers log failures and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(len: usize, mime: &str) -> UploadFile {
        UploadFile {
            file_name: "pic.png".into(),
            mime_type: mime.into(),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn upload_validation_limits() {
        assert!(validate_upload(&file(1024, "image/png")).is_ok());
        assert!(validate_upload(&file(1024, "video/mp4")).is_ok());
        assert!(matches!(
            validate_upload(&file(6 * 1024 * 1024, "image/png")),
            Err(UploadError::TooLarge)
        ));
        assert!(matches!(
            validate_upload(&file(10, "application/zip")),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[test]
    fn upload_error_messages_are_user_facing() {
        assert_eq!(
            UploadError::TooLarge.to_string(),
            "File is too large. Attachments must be 5MB or smaller."
        );
        assert_eq!(
            UploadError::UnsupportedType.to_string(),
            "Only image and video files can be attached."
        );
    }
}
