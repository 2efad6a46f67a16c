//! The content-management tool set offered to the model, executed against
//! the store traits.
//!
//! Results are JSON strings in the `{"success": ...}` shape the model is
//! prompted to expect; store failures come back as tool errors so the
//! model can relay them instead of the request aborting.

use std::sync::Arc;

use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use serde_json::{json, Value};

use makershub_nlu::generate;
use makershub_schema::{
    EventPatch, FeedbackCategory, NewEvent, NewFeedback, NewPost, NewResource, Notification,
    PostPatch, PostType, ProfilePatch, ResourcePatch, UserContext,
};
use makershub_store::{ContentStore, Notifier};

use crate::provider::ToolDef;

pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn ok(value: Value) -> Self {
        Self {
            content: value.to_string(),
            is_error: false,
        }
    }

    fn message(text: impl Into<String>) -> Self {
        Self::ok(json!({"success": true, "message": text.into()}))
    }

    fn err(text: impl Into<String>) -> Self {
        Self {
            content: json!({"success": false, "error": text.into()}).to_string(),
            is_error: true,
        }
    }
}

/// Write tools flip the `data_changed` flag when they succeed.
pub fn is_write_tool(name: &str) -> bool {
    matches!(
        name,
        "create_event"
            | "create_recurring_events"
            | "update_event"
            | "delete_event"
            | "create_post"
            | "update_post"
            | "delete_post"
            | "create_resource"
            | "update_resource"
            | "delete_resource"
            | "update_profile"
            | "submit_feedback"
    )
}

/// 0 = Sunday, matching the wire convention in the tool schema.
fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

#[derive(Deserialize)]
struct CreateEventArgs {
    title: String,
    event_date: NaiveDate,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct CreateRecurringArgs {
    title: String,
    day_of_week: u8,
    end_date: NaiveDate,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct UpdateEventArgs {
    event_id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    event_date: Option<NaiveDate>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct DeleteEventArgs {
    event_id: i64,
}

#[derive(Deserialize)]
struct CreatePostArgs {
    #[serde(rename = "type")]
    post_type: String,
    title: String,
    content: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
}

#[derive(Deserialize)]
struct UpdatePostArgs {
    post_id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
}

#[derive(Deserialize)]
struct DeletePostArgs {
    post_id: i64,
}

#[derive(Deserialize)]
struct CreateResourceArgs {
    title: String,
    description: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct UpdateResourceArgs {
    resource_id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct DeleteResourceArgs {
    resource_id: i64,
}

#[derive(Deserialize)]
struct SubmitFeedbackArgs {
    message: String,
    #[serde(default)]
    category: Option<String>,
}

pub struct ToolExecutor {
    store: Arc<dyn ContentStore>,
    notifier: Arc<dyn Notifier>,
}

impl ToolExecutor {
    pub fn new(store: Arc<dyn ContentStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn execute(
        &self,
        name: &str,
        input: &Value,
        user: &UserContext,
        today: NaiveDate,
    ) -> ToolOutput {
        match self.try_execute(name, input, user, today).await {
            Ok(output) => output,
            Err(e) => ToolOutput::err(e.to_string()),
        }
    }

    async fn try_execute(
        &self,
        name: &str,
        input: &Value,
        user: &UserContext,
        today: NaiveDate,
    ) -> anyhow::Result<ToolOutput> {
        let output = match name {
            "create_event" => {
                let args: CreateEventArgs = parse_args(name, input)?;
                self.store
                    .insert_event(NewEvent {
                        title: args.title.clone(),
                        description: args.description,
                        event_date: args.event_date,
                        url: args.url,
                        created_by: Some(user.user_id),
                    })
                    .await?;
                ToolOutput::message(format!(
                    "Event \"{}\" created for {}.",
                    args.title, args.event_date
                ))
            }
            "create_recurring_events" => {
                let args: CreateRecurringArgs = parse_args(name, input)?;
                let Some(day) = weekday_from_index(args.day_of_week) else {
                    return Ok(ToolOutput::err("day_of_week must be 0-6 (0=Sunday)."));
                };
                let dates = generate(day, args.end_date, today);
                if dates.is_empty() {
                    return Ok(ToolOutput::err("No dates found in that range."));
                }
                let first = dates[0];
                let last = *dates.last().unwrap_or(&first);
                let count = dates.len();
                let events = dates
                    .into_iter()
                    .map(|event_date| NewEvent {
                        title: args.title.clone(),
                        description: args.description.clone(),
                        event_date,
                        url: None,
                        created_by: Some(user.user_id),
                    })
                    .collect();
                self.store.insert_events(events).await?;
                ToolOutput::message(format!(
                    "Created {count} \"{}\" events from {first} through {last}.",
                    args.title
                ))
            }
            "list_events" => {
                let args: ListArgs = parse_args(name, input)?;
                let events = self.store.list_recent_events(args.limit.unwrap_or(10)).await?;
                ToolOutput::ok(json!({"success": true, "events": events}))
            }
            "update_event" => {
                let args: UpdateEventArgs = parse_args(name, input)?;
                self.store
                    .update_event(
                        args.event_id,
                        EventPatch {
                            title: args.title,
                            description: args.description,
                            event_date: args.event_date,
                            url: args.url,
                        },
                    )
                    .await?;
                ToolOutput::message("Event updated successfully.")
            }
            "delete_event" => {
                let args: DeleteEventArgs = parse_args(name, input)?;
                self.store.delete_event(args.event_id).await?;
                ToolOutput::message("Event deleted.")
            }
            "create_post" => {
                let args: CreatePostArgs = parse_args(name, input)?;
                let Some(post_type) = PostType::parse(&args.post_type) else {
                    return Ok(ToolOutput::err(
                        "type must be one of: announcement, news, video.",
                    ));
                };
                // A video URL only makes sense on video posts.
                let video_url = (post_type == PostType::Video)
                    .then_some(args.video_url)
                    .flatten();
                self.store
                    .insert_post(NewPost {
                        post_type,
                        title: args.title.clone(),
                        content: args.content,
                        excerpt: args.excerpt,
                        video_url,
                        author_id: Some(user.user_id),
                    })
                    .await?;
                ToolOutput::message(format!("Post \"{}\" published.", args.title))
            }
            "list_posts" => {
                let args: ListArgs = parse_args(name, input)?;
                let posts = self.store.list_recent_posts(args.limit.unwrap_or(10)).await?;
                ToolOutput::ok(json!({"success": true, "posts": posts}))
            }
            "update_post" => {
                let args: UpdatePostArgs = parse_args(name, input)?;
                self.store
                    .update_post(
                        args.post_id,
                        PostPatch {
                            title: args.title,
                            content: args.content,
                            excerpt: args.excerpt,
                            video_url: args.video_url,
                        },
                    )
                    .await?;
                ToolOutput::message("Post updated successfully.")
            }
            "delete_post" => {
                let args: DeletePostArgs = parse_args(name, input)?;
                self.store.delete_post(args.post_id).await?;
                ToolOutput::message("Post deleted.")
            }
            "create_resource" => {
                let args: CreateResourceArgs = parse_args(name, input)?;
                self.store
                    .insert_resource(NewResource {
                        title: args.title.clone(),
                        description: args.description,
                        url: args.url,
                        submitted_by: Some(user.user_id),
                    })
                    .await?;
                ToolOutput::message(format!("Resource \"{}\" added to the wiki.", args.title))
            }
            "list_resources" => {
                let args: ListArgs = parse_args(name, input)?;
                let resources = self
                    .store
                    .list_recent_resources(args.limit.unwrap_or(10))
                    .await?;
                ToolOutput::ok(json!({"success": true, "resources": resources}))
            }
            "update_resource" => {
                let args: UpdateResourceArgs = parse_args(name, input)?;
                self.store
                    .update_resource(
                        args.resource_id,
                        ResourcePatch {
                            title: args.title,
                            description: args.description,
                            url: args.url,
                        },
                    )
                    .await?;
                ToolOutput::message("Resource updated successfully.")
            }
            "delete_resource" => {
                let args: DeleteResourceArgs = parse_args(name, input)?;
                self.store.delete_resource(args.resource_id).await?;
                ToolOutput::message("Resource deleted.")
            }
            "update_profile" => {
                let patch: ProfilePatch = parse_args(name, input)?;
                self.store.upsert_profile(user.user_id, patch).await?;
                ToolOutput::message("Profile updated.")
            }
            "submit_feedback" => {
                let args: SubmitFeedbackArgs = parse_args(name, input)?;
                let category = args
                    .category
                    .as_deref()
                    .and_then(FeedbackCategory::parse)
                    .unwrap_or(FeedbackCategory::Feedback);
                self.store
                    .insert_feedback(NewFeedback {
                        user_id: user.user_id,
                        user_email: user.email.clone(),
                        category,
                        message: args.message.clone(),
                    })
                    .await?;
                let note = Notification::FeedbackToAdmin {
                    category,
                    message: args.message,
                    user_email: user.email.clone(),
                    user_id: user.user_id,
                };
                if let Err(e) = self.notifier.send(note).await {
                    tracing::warn!(error = %e, "feedback email failed");
                }
                ToolOutput::message("Feedback submitted. The admin team will review it.")
            }
            _ => ToolOutput::err(format!("Unknown tool: {name}")),
        };
        Ok(output)
    }
}

fn parse_args<'a, T: Deserialize<'a>>(name: &str, input: &'a Value) -> anyhow::Result<T> {
    T::deserialize(input).map_err(|e| anyhow::anyhow!("invalid arguments for {name}: {e}"))
}

/// JSON-schema definitions for every tool above.
pub fn tool_defs() -> Vec<ToolDef> {
    fn def(name: &str, description: &str, input_schema: Value) -> ToolDef {
        ToolDef {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    vec![
        def(
            "create_event",
            "Create a new event on the community calendar. Always confirm details with the user before calling this.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Event title"},
                    "description": {"type": "string", "description": "Event description (include time, location, etc.)"},
                    "event_date": {"type": "string", "description": "Event date in YYYY-MM-DD format"},
                    "url": {"type": "string", "description": "Optional URL for the event"}
                },
                "required": ["title", "event_date"]
            }),
        ),
        def(
            "create_recurring_events",
            "Create multiple recurring events on a specific day of the week through an end date. Always show the count and date range to the user before calling this.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Event title for all occurrences"},
                    "description": {"type": "string", "description": "Event description for all occurrences"},
                    "day_of_week": {"type": "integer", "description": "Day of week (0=Sunday, 1=Monday, 2=Tuesday, ..., 6=Saturday)"},
                    "end_date": {"type": "string", "description": "Last possible date in YYYY-MM-DD format"}
                },
                "required": ["title", "day_of_week", "end_date"]
            }),
        ),
        def(
            "list_events",
            "List recent events from the calendar. Use this when the user wants to edit or delete an event, or wants to see what's scheduled.",
            json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "description": "Number of events to return (default 10)"}
                }
            }),
        ),
        def(
            "update_event",
            "Update an existing event. Always confirm changes with the user before calling this.",
            json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "integer", "description": "The ID of the event to update"},
                    "title": {"type": "string", "description": "New title"},
                    "description": {"type": "string", "description": "New description"},
                    "event_date": {"type": "string", "description": "New date in YYYY-MM-DD format"},
                    "url": {"type": "string", "description": "New URL"}
                },
                "required": ["event_id"]
            }),
        ),
        def(
            "delete_event",
            "Delete an event. Always confirm with the user before calling this. Deletions cannot be undone.",
            json!({
                "type": "object",
                "properties": {
                    "event_id": {"type": "integer", "description": "The ID of the event to delete"}
                },
                "required": ["event_id"]
            }),
        ),
        def(
            "create_post",
            "Create a new post (article, news, announcement, or video). Always confirm details with the user before calling this.",
            json!({
                "type": "object",
                "properties": {
                    "type": {"type": "string", "enum": ["announcement", "news", "video"], "description": "Post type"},
                    "title": {"type": "string", "description": "Post title"},
                    "content": {"type": "string", "description": "Full post content"},
                    "excerpt": {"type": "string", "description": "Short summary or excerpt"},
                    "video_url": {"type": "string", "description": "Video URL (required for video type)"}
                },
                "required": ["type", "title", "content"]
            }),
        ),
        def(
            "list_posts",
            "List recent posts. Use this when the user wants to edit or delete a post.",
            json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "description": "Number of posts to return (default 10)"}
                }
            }),
        ),
        def(
            "update_post",
            "Update an existing post. Always confirm changes with the user before calling this.",
            json!({
                "type": "object",
                "properties": {
                    "post_id": {"type": "integer", "description": "The ID of the post to update"},
                    "title": {"type": "string", "description": "New title"},
                    "content": {"type": "string", "description": "New content"},
                    "excerpt": {"type": "string", "description": "New excerpt"},
                    "video_url": {"type": "string", "description": "New video URL"}
                },
                "required": ["post_id"]
            }),
        ),
        def(
            "delete_post",
            "Delete a post. Always confirm with the user before calling this. Deletions cannot be undone.",
            json!({
                "type": "object",
                "properties": {
                    "post_id": {"type": "integer", "description": "The ID of the post to delete"}
                },
                "required": ["post_id"]
            }),
        ),
        def(
            "create_resource",
            "Add a resource to the community wiki. Always confirm details with the user before calling this.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Resource title"},
                    "description": {"type": "string", "description": "What the resource is and why it's useful"},
                    "url": {"type": "string", "description": "Optional link to the resource"}
                },
                "required": ["title", "description"]
            }),
        ),
        def(
            "list_resources",
            "List recent resources. Use this when the user wants to edit or delete a resource.",
            json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "description": "Number of resources to return (default 10)"}
                }
            }),
        ),
        def(
            "update_resource",
            "Update an existing resource. Always confirm changes with the user before calling this.",
            json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "integer", "description": "The ID of the resource to update"},
                    "title": {"type": "string", "description": "New title"},
                    "description": {"type": "string", "description": "New description"},
                    "url": {"type": "string", "description": "New URL"}
                },
                "required": ["resource_id"]
            }),
        ),
        def(
            "delete_resource",
            "Delete a resource. Always confirm with the user before calling this. Deletions cannot be undone.",
            json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "integer", "description": "The ID of the resource to delete"}
                },
                "required": ["resource_id"]
            }),
        ),
        def(
            "update_profile",
            "Update the signed-in user's profile. Only include the fields being changed.",
            json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string", "description": "New username"},
                    "first_name": {"type": "string", "description": "First name"},
                    "last_name": {"type": "string", "description": "Last name"},
                    "title": {"type": "string", "description": "Headline title"},
                    "bio": {"type": "string", "description": "Short bio"},
                    "avatar_url": {"type": "string", "description": "Avatar image URL"}
                }
            }),
        ),
        def(
            "submit_feedback",
            "Submit feedback to the admin team. Always confirm the message with the user before calling this.",
            json!({
                "type": "object",
                "properties": {
                    "category": {"type": "string", "enum": ["feature_request", "suggestion", "feedback", "critique", "query"], "description": "Feedback category"},
                    "message": {"type": "string", "description": "The feedback message"}
                },
                "required": ["message"]
            }),
        ),
    ]
}
