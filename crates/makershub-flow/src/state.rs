//! Serializable flow state.
//!
//! One variant per flow, each with a typed step marker and a typed partial
//! draft. The host keeps at most one `DialogFlow` per session and passes it
//! back in on the next turn; everything here round-trips through serde so
//! sessions can live outside the process.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use makershub_nlu::EventChanges;
use makershub_schema::{
    EventRecord, FeedbackCategory, PostPatch, PostRecord, PostType, ProfilePatch, RecurringPattern,
    ResourcePatch, ResourceRecord,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum DialogFlow {
    CreateEvent(EventDraft),
    CreateRecurringEvents(RecurringDraft),
    CreatePost(PostDraft),
    CreateResource(ResourceDraft),
    EditProfile(ProfileDraft),
    SubmitFeedback(FeedbackDraft),
    EditEvent(EditEventFlow),
    EditPost(EditPostFlow),
    EditResource(EditResourceFlow),
    DeleteEvent(DeleteEventFlow),
    DeletePost(DeletePostFlow),
    DeleteResource(DeleteResourceFlow),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStep {
    Title,
    Date,
    Url,
    Description,
    Summary,
}

/// Partial event. `time` never becomes a column; the commit folds it into
/// the description as `" | Time: <t>"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub step: EventStep,
    pub title: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub time: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringStep {
    Title,
    Description,
    Summary,
}

/// A weekly series. The dates are expanded when the flow starts so the
/// summary can show the real count and range before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringDraft {
    pub step: RecurringStep,
    pub pattern: RecurringPattern,
    pub dates: Vec<NaiveDate>,
    pub title: Option<String>,
    pub time: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStep {
    Kind,
    Title,
    Content,
    Excerpt,
    VideoUrl,
    Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDraft {
    pub step: PostStep,
    pub post_type: Option<PostType>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStep {
    Title,
    Description,
    Url,
    Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDraft {
    pub step: ResourceStep,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStep {
    Username,
    FirstName,
    LastName,
    Title,
    Bio,
    Avatar,
    Summary,
}

/// Every slot is optional; whatever the user skips stays untouched by the
/// upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub step: ProfileStep,
    pub patch: ProfilePatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStep {
    Category,
    Message,
    Email,
    Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub step: FeedbackStep,
    pub category: Option<FeedbackCategory>,
    pub message: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditStep {
    Select,
    Describe,
    Confirm,
}

/// Edit flows cache the listing shown to the user so the numbered
/// selection stays stable even if the collection changes underneath.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditEventFlow {
    pub step: EditStep,
    pub options: Vec<EventRecord>,
    pub selected: Option<EventRecord>,
    pub changes: Option<EventChanges>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPostFlow {
    pub step: EditStep,
    pub options: Vec<PostRecord>,
    pub selected: Option<PostRecord>,
    pub changes: Option<PostPatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResourceFlow {
    pub step: EditStep,
    pub options: Vec<ResourceRecord>,
    pub selected: Option<ResourceRecord>,
    pub changes: Option<ResourcePatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStep {
    Select,
    Confirm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEventFlow {
    pub step: DeleteStep,
    pub options: Vec<EventRecord>,
    pub selected: Option<EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePostFlow {
    pub step: DeleteStep,
    pub options: Vec<PostRecord>,
    pub selected: Option<PostRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResourceFlow {
    pub step: DeleteStep,
    pub options: Vec<ResourceRecord>,
    pub selected: Option<ResourceRecord>,
}
