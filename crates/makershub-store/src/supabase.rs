//! Hosted-platform adapter: PostgREST for the content collections, the
//! storage API for uploads, and an edge function for outbound email.
//!
//! Platform error bodies are passed through verbatim — commit failures
//! show the user exactly what the backend said.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use makershub_schema::{
    EventPatch, EventRecord, NewEvent, NewFeedback, NewPost, NewResource, Notification, PostPatch,
    PostRecord, ProfilePatch, ResourcePatch, ResourceRecord, UploadPurpose,
};

use crate::{validate_upload, ContentStore, FileStorage, Notifier, UploadError, UploadFile};

#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    storage_bucket: String,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            storage_bucket: "uploads".to_string(),
        }
    }

    pub fn with_storage_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.storage_bucket = bucket.into();
        self
    }

    fn rest_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{collection}", self.base_url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
    }

    async fn expect_ok(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(platform_error(status, &body))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        collection: &str,
        order: &str,
        limit: usize,
    ) -> Result<Vec<T>> {
        let req = self
            .client
            .get(self.rest_url(collection))
            .query(&[
                ("select", "*"),
                ("order", order),
                ("limit", &limit.to_string()),
            ]);
        let resp = Self::expect_ok(self.authed(req).send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn insert<T: Serialize>(&self, collection: &str, rows: &[T]) -> Result<()> {
        let req = self
            .client
            .post(self.rest_url(collection))
            .header("prefer", "return=minimal")
            .json(rows);
        Self::expect_ok(self.authed(req).send().await?).await?;
        Ok(())
    }

    async fn patch<T: Serialize>(&self, collection: &str, id: i64, patch: &T) -> Result<()> {
        let req = self
            .client
            .patch(self.rest_url(collection))
            .query(&[("id", format!("eq.{id}"))])
            .header("prefer", "return=minimal")
            .json(patch);
        Self::expect_ok(self.authed(req).send().await?).await?;
        Ok(())
    }

    async fn delete_row(&self, collection: &str, id: i64) -> Result<()> {
        let req = self
            .client
            .delete(self.rest_url(collection))
            .query(&[("id", format!("eq.{id}"))]);
        Self::expect_ok(self.authed(req).send().await?).await?;
        Ok(())
    }
}

/// Prefer the platform's own `message` field when the body is JSON.
fn platform_error(status: StatusCode, body: &str) -> anyhow::Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    if message.is_empty() {
        anyhow!("platform error: HTTP {status}")
    } else {
        anyhow!("{message}")
    }
}

#[async_trait]
impl ContentStore for SupabaseStore {
    async fn list_recent_events(&self, limit: usize) -> Result<Vec<EventRecord>> {
        self.select("events", "event_date.desc", limit).await
    }

    async fn list_recent_posts(&self, limit: usize) -> Result<Vec<PostRecord>> {
        self.select("posts", "created_at.desc", limit).await
    }

    async fn list_recent_resources(&self, limit: usize) -> Result<Vec<ResourceRecord>> {
        self.select("resources", "created_at.desc", limit).await
    }

    async fn insert_event(&self, event: NewEvent) -> Result<()> {
        self.insert("events", &[event]).await
    }

    async fn insert_events(&self, events: Vec<NewEvent>) -> Result<()> {
        self.insert("events", &events).await
    }

    async fn update_event(&self, id: i64, patch: EventPatch) -> Result<()> {
        self.patch("events", id, &patch).await
    }

    async fn delete_event(&self, id: i64) -> Result<()> {
        self.delete_row("events", id).await
    }

    async fn insert_post(&self, post: NewPost) -> Result<()> {
        self.insert("posts", &[post]).await
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<()> {
        self.patch("posts", id, &patch).await
    }

    async fn delete_post(&self, id: i64) -> Result<()> {
        self.delete_row("posts", id).await
    }

    async fn insert_resource(&self, resource: NewResource) -> Result<()> {
        self.insert("resources", &[resource]).await
    }

    async fn update_resource(&self, id: i64, patch: ResourcePatch) -> Result<()> {
        self.patch("resources", id, &patch).await
    }

    async fn delete_resource(&self, id: i64) -> Result<()> {
        self.delete_row("resources", id).await
    }

    async fn upsert_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<()> {
        let mut row = serde_json::to_value(&patch)?;
        row["id"] = serde_json::json!(user_id);
        row["updated_at"] = serde_json::json!(Utc::now());
        let req = self
            .client
            .post(self.rest_url("profiles"))
            .header("prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        Self::expect_ok(self.authed(req).send().await?).await?;
        Ok(())
    }

    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<()> {
        self.insert("feedback_messages", &[feedback]).await
    }
}

#[async_trait]
impl FileStorage for SupabaseStore {
    async fn upload(
        &self,
        owner: Uuid,
        file: UploadFile,
        purpose: UploadPurpose,
    ) -> Result<String, UploadError> {
        validate_upload(&file)?;

        let object_path = format!(
            "{}/{owner}/{}_{}",
            purpose.path_prefix(),
            Uuid::new_v4(),
            file.file_name
        );
        let url = format!(
            "{}/storage/v1/object/{}/{object_path}",
            self.base_url, self.storage_bucket
        );
        let req = self
            .client
            .post(&url)
            .header("content-type", &file.mime_type)
            .body(file.bytes);
        let resp = self
            .authed(req)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.into()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Transport(platform_error(status, &body)));
        }

        Ok(format!(
            "{}/storage/v1/object/public/{}/{object_path}",
            self.base_url, self.storage_bucket
        ))
    }
}

#[async_trait]
impl Notifier for SupabaseStore {
    async fn send(&self, notification: Notification) -> Result<()> {
        let url = format!("{}/functions/v1/send-email", self.base_url);
        let req = self.client.post(&url).json(&notification);
        Self::expect_ok(self.authed(req).send().await?).await?;
        Ok(())
    }
}
