use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod records;

pub use records::*;

/// One user turn as delivered by the chat surface: free text plus an
/// optional already-uploaded attachment URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

impl Utterance {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment_url: None,
        }
    }

    pub fn with_attachment(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment_url: Some(url.into()),
        }
    }
}

/// The signed-in caller. Content mutations require one; questions do not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Edit,
    Delete,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Event,
    Post,
    Resource,
    Profile,
    Feedback,
    None,
}

/// Weekly repetition: a weekday plus the last admissible date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub day_of_week: Weekday,
    pub end_date: NaiveDate,
}

/// Classifier output for a single utterance. Stateless; recomputed every
/// turn while no flow is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    pub content_type: ContentType,
    #[serde(default)]
    pub recurring: Option<RecurringPattern>,
    #[serde(default)]
    pub extracted_title: Option<String>,
    #[serde(default)]
    pub extracted_date: Option<NaiveDate>,
    #[serde(default)]
    pub extracted_time: Option<String>,
}

impl Intent {
    pub fn none() -> Self {
        Self {
            action: Action::None,
            content_type: ContentType::None,
            recurring: None,
            extracted_title: None,
            extracted_date: None,
            extracted_time: None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.action == Action::None && self.content_type == ContentType::None
    }
}

/// Upload constraints enforced before anything leaves the client.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPurpose {
    Avatar,
    ChatAttachment,
}

impl UploadPurpose {
    /// Storage path prefix; avatars live apart from ad-hoc chat uploads.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Self::Avatar => "avatars",
            Self::ChatAttachment => "chat-uploads",
        }
    }
}

/// Only images and video may be attached in chat.
pub fn is_allowed_upload_mime(mime: &str) -> bool {
    mime.starts_with("image/") || mime.starts_with("video/")
}
