//! In-memory store for tests and local runs.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use makershub_schema::{
    EventPatch, EventRecord, NewEvent, NewFeedback, NewPost, NewResource, Notification, PostPatch,
    PostRecord, ProfilePatch, ResourcePatch, ResourceRecord, UploadPurpose,
};

use crate::{validate_upload, ContentStore, FileStorage, Notifier, UploadError, UploadFile};

#[derive(Default)]
struct Inner {
    events: Vec<EventRecord>,
    posts: Vec<PostRecord>,
    resources: Vec<ResourceRecord>,
    profiles: Vec<(Uuid, ProfilePatch)>,
    feedback: Vec<NewFeedback>,
    notifications: Vec<Notification>,
    uploads: Vec<String>,
    next_id: i64,
    fail_writes: Option<String>,
}

/// All three collaborator traits in one process-local store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with the given message. Mirrors a
    /// platform-side error for commit-failure tests.
    pub async fn fail_writes(&self, message: impl Into<String>) {
        self.inner.lock().await.fail_writes = Some(message.into());
    }

    pub async fn events(&self) -> Vec<EventRecord> {
        self.inner.lock().await.events.clone()
    }

    pub async fn posts(&self) -> Vec<PostRecord> {
        self.inner.lock().await.posts.clone()
    }

    pub async fn resources(&self) -> Vec<ResourceRecord> {
        self.inner.lock().await.resources.clone()
    }

    pub async fn profiles(&self) -> Vec<(Uuid, ProfilePatch)> {
        self.inner.lock().await.profiles.clone()
    }

    pub async fn feedback(&self) -> Vec<NewFeedback> {
        self.inner.lock().await.feedback.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().await.notifications.clone()
    }

    pub async fn seed_event(&self, title: &str, date: chrono::NaiveDate) -> i64 {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.events.push(EventRecord {
            id,
            title: title.to_string(),
            description: None,
            event_date: date,
            url: None,
        });
        id
    }

    pub async fn seed_post(&self, title: &str) -> i64 {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.posts.push(PostRecord {
            id,
            post_type: makershub_schema::PostType::News,
            title: title.to_string(),
            content: String::new(),
            excerpt: None,
            video_url: None,
            created_at: Some(Utc::now()),
        });
        id
    }

    pub async fn seed_resource(&self, title: &str) -> i64 {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.resources.push(ResourceRecord {
            id,
            title: title.to_string(),
            description: String::new(),
            url: None,
            created_at: Some(Utc::now()),
        });
        id
    }
}

impl Inner {
    fn check_writes(&self) -> Result<()> {
        match &self.fail_writes {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }

    fn bump_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_recent_events(&self, limit: usize) -> Result<Vec<EventRecord>> {
        let inner = self.inner.lock().await;
        let mut events = inner.events.clone();
        events.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        events.truncate(limit);
        Ok(events)
    }

    async fn list_recent_posts(&self, limit: usize) -> Result<Vec<PostRecord>> {
        let inner = self.inner.lock().await;
        let mut posts = inner.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn list_recent_resources(&self, limit: usize) -> Result<Vec<ResourceRecord>> {
        let inner = self.inner.lock().await;
        let mut resources = inner.resources.clone();
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        resources.truncate(limit);
        Ok(resources)
    }

    async fn insert_event(&self, event: NewEvent) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        let id = inner.bump_id();
        inner.events.push(EventRecord {
            id,
            title: event.title,
            description: event.description,
            event_date: event.event_date,
            url: event.url,
        });
        Ok(())
    }

    async fn insert_events(&self, events: Vec<NewEvent>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        for event in events {
            let id = inner.bump_id();
            inner.events.push(EventRecord {
                id,
                title: event.title,
                description: event.description,
                event_date: event.event_date,
                url: event.url,
            });
        }
        Ok(())
    }

    async fn update_event(&self, id: i64, patch: EventPatch) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        let event = inner
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow!("event not found: {id}"))?;
        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = Some(description);
        }
        if let Some(date) = patch.event_date {
            event.event_date = date;
        }
        if let Some(url) = patch.url {
            event.url = Some(url);
        }
        Ok(())
    }

    async fn delete_event(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        inner.events.retain(|e| e.id != id);
        Ok(())
    }

    async fn insert_post(&self, post: NewPost) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        let id = inner.bump_id();
        inner.posts.push(PostRecord {
            id,
            post_type: post.post_type,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            video_url: post.video_url,
            created_at: Some(Utc::now()),
        });
        Ok(())
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        let post = inner
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("post not found: {id}"))?;
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(excerpt) = patch.excerpt {
            post.excerpt = Some(excerpt);
        }
        if let Some(video_url) = patch.video_url {
            post.video_url = Some(video_url);
        }
        Ok(())
    }

    async fn delete_post(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        inner.posts.retain(|p| p.id != id);
        Ok(())
    }

    async fn insert_resource(&self, resource: NewResource) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        let id = inner.bump_id();
        inner.resources.push(ResourceRecord {
            id,
            title: resource.title,
            description: resource.description,
            url: resource.url,
            created_at: Some(Utc::now()),
        });
        Ok(())
    }

    async fn update_resource(&self, id: i64, patch: ResourcePatch) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        let resource = inner
            .resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow!("resource not found: {id}"))?;
        if let Some(title) = patch.title {
            resource.title = title;
        }
        if let Some(description) = patch.description {
            resource.description = description;
        }
        if let Some(url) = patch.url {
            resource.url = Some(url);
        }
        Ok(())
    }

    async fn delete_resource(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        inner.resources.retain(|r| r.id != id);
        Ok(())
    }

    async fn upsert_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        if let Some((_, existing)) = inner.profiles.iter_mut().find(|(id, _)| *id == user_id) {
            if patch.username.is_some() {
                existing.username = patch.username;
            }
            if patch.first_name.is_some() {
                existing.first_name = patch.first_name;
            }
            if patch.last_name.is_some() {
                existing.last_name = patch.last_name;
            }
            if patch.title.is_some() {
                existing.title = patch.title;
            }
            if patch.bio.is_some() {
                existing.bio = patch.bio;
            }
            if patch.avatar_url.is_some() {
                existing.avatar_url = patch.avatar_url;
            }
        } else {
            inner.profiles.push((user_id, patch));
        }
        Ok(())
    }

    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.check_writes()?;
        inner.feedback.push(feedback);
        Ok(())
    }
}

#[async_trait]
impl FileStorage for MemoryStore {
    async fn upload(
        &self,
        owner: Uuid,
        file: UploadFile,
        purpose: UploadPurpose,
    ) -> Result<String, UploadError> {
        validate_upload(&file)?;
        let url = format!(
            "memory://{}/{owner}/{}",
            purpose.path_prefix(),
            file.file_name
        );
        self.inner.lock().await.uploads.push(url.clone());
        Ok(url)
    }
}

#[async_trait]
impl Notifier for MemoryStore {
    async fn send(&self, notification: Notification) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(message) = &inner.fail_writes {
            return Err(anyhow!("{message}"));
        }
        inner.notifications.push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn events_list_newest_first_and_respect_limit() {
        let store = MemoryStore::new();
        store.seed_event("old", date(2026, 1, 1)).await;
        store.seed_event("new", date(2026, 6, 1)).await;
        store.seed_event("mid", date(2026, 3, 1)).await;

        let events = store.list_recent_events(2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "new");
        assert_eq!(events[1].title, "mid");
    }

    #[tokio::test]
    async fn event_update_applies_only_patched_fields() {
        let store = MemoryStore::new();
        let id = store.seed_event("before", date(2026, 2, 2)).await;
        store
            .update_event(
                id,
                EventPatch {
                    title: Some("after".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let events = store.events().await;
        assert_eq!(events[0].title, "after");
        assert_eq!(events[0].event_date, date(2026, 2, 2));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryStore::new();
        let id = store.seed_resource("gone soon").await;
        store.delete_resource(id).await.unwrap();
        assert!(store.resources().await.is_empty());
    }

    #[tokio::test]
    async fn failed_writes_surface_the_injected_message() {
        let store = MemoryStore::new();
        store.fail_writes("duplicate key value").await;
        let err = store
            .insert_resource(NewResource {
                title: "t".into(),
                description: "d".into(),
                url: None,
                submitted_by: None,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("duplicate key value"));
    }

    #[tokio::test]
    async fn profile_upsert_merges() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store
            .upsert_profile(
                user,
                ProfilePatch {
                    username: Some("maker".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .upsert_profile(
                user,
                ProfilePatch {
                    bio: Some("builds things".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profiles = store.profiles().await;
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].1.username.as_deref(), Some("maker"));
        assert_eq!(profiles[0].1.bio.as_deref(), Some("builds things"));
    }

    #[tokio::test]
    async fn upload_rejects_before_storing() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let err = store
            .upload(
                owner,
                UploadFile {
                    file_name: "notes.pdf".into(),
                    mime_type: "application/pdf".into(),
                    bytes: vec![0; 10],
                },
                makershub_schema::UploadPurpose::ChatAttachment,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType));

        let url = store
            .upload(
                owner,
                UploadFile {
                    file_name: "pic.png".into(),
                    mime_type: "image/png".into(),
                    bytes: vec![0; 10],
                },
                makershub_schema::UploadPurpose::ChatAttachment,
            )
            .await
            .unwrap();
        assert!(url.starts_with("memory://chat-uploads/"));
    }
}
