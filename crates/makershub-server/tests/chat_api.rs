//! HTTP-level turns through the chat and upload endpoints with the flow
//! backend.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use makershub_flow::FlowEngine;
use makershub_server::state::{AppState, ChatBackend};
use makershub_store::MemoryStore;

fn app_state(store: &Arc<MemoryStore>) -> AppState {
    let engine = FlowEngine::new(store.clone(), store.clone())
        .with_reference_date(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
    AppState::new(ChatBackend::Flow(engine), store.clone())
}

fn app(store: &Arc<MemoryStore>) -> Router {
    makershub_server::create_router(app_state(store))
}

async fn post_chat(app: &Router, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

const BOUNDARY: &str = "makershub-test-boundary";

/// Hand-rolled multipart body: text parts carry no filename, file parts
/// carry filename and content type.
fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_info, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_info {
            Some((filename, mime)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: {mime}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_upload(
    app: &Router,
    parts: &[(&str, Option<(&str, &str)>, &[u8])],
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn healthz_responds() {
    let store = Arc::new(MemoryStore::new());
    let response = app(&store)
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn flow_state_persists_across_turns_in_a_session() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);
    let user_id = uuid::Uuid::new_v4();

    let (status, body) = post_chat(
        &app,
        json!({
            "session": "s1",
            "text": "add a resource",
            "user_id": user_id,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["messages"][0].as_str().unwrap().contains("resource"));
    assert_eq!(body["data_changed"], false);

    // Same session: the active flow is still there to cancel.
    let (_, body) = post_chat(
        &app,
        json!({"session": "s1", "text": "cancel", "user_id": user_id}),
    )
    .await;
    assert!(body["messages"][0].as_str().unwrap().contains("cancelled"));

    // A different session never had a flow, so "cancel" gets a normal answer.
    let (_, body) = post_chat(&app, json!({"session": "s2", "text": "cancel"})).await;
    assert!(!body["messages"][0].as_str().unwrap().contains("cancelled"));
}

#[tokio::test]
async fn concurrent_turns_on_one_session_serialize() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);
    let user_id = uuid::Uuid::new_v4();

    post_chat(
        &app,
        json!({"session": "s1", "text": "add a resource", "user_id": user_id}),
    )
    .await;

    // Both turns race on one session key; only the one that observes the
    // active flow may cancel it.
    let cancel = json!({"session": "s1", "text": "cancel", "user_id": user_id});
    let (first, second) = tokio::join!(post_chat(&app, cancel.clone()), post_chat(&app, cancel));
    let cancelled = [first.1, second.1]
        .iter()
        .filter(|body| body["messages"][0].as_str().unwrap().contains("cancelled"))
        .count();
    assert_eq!(cancelled, 1);
}

#[tokio::test]
async fn idle_sessions_are_evicted() {
    let store = Arc::new(MemoryStore::new());
    let state = app_state(&store);
    let app = makershub_server::create_router(state.clone());
    let user_id = uuid::Uuid::new_v4();

    post_chat(
        &app,
        json!({"session": "s1", "text": "add a resource", "user_id": user_id}),
    )
    .await;
    assert!(state.sessions.lock().await.contains_key("s1"));

    // Cancelling ends the flow; the now-empty entry is dropped.
    post_chat(
        &app,
        json!({"session": "s1", "text": "cancel", "user_id": user_id}),
    )
    .await;
    assert!(!state.sessions.lock().await.contains_key("s1"));
}

#[tokio::test]
async fn unauthenticated_writes_are_refused() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);

    let (status, body) = post_chat(
        &app,
        json!({"session": "anon", "text": "add an event called Demo Night"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["messages"][0].as_str().unwrap().contains("sign in"));
}

#[tokio::test]
async fn blank_requests_are_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);

    let (status, body) = post_chat(&app, json!({"session": "s1", "text": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "text is required");

    let (status, _) = post_chat(&app, json!({"session": "", "text": "hi"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_stores_the_file_and_returns_its_url() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);
    let user_id = uuid::Uuid::new_v4().to_string();

    let (status, body) = post_upload(
        &app,
        &[
            ("user_id", None, user_id.as_bytes()),
            ("file", Some(("pic.png", "image/png")), b"\x89PNG fake bytes"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["url"].as_str().unwrap();
    assert!(url.contains("chat-uploads"));
    assert!(url.ends_with("pic.png"));
}

#[tokio::test]
async fn avatar_uploads_land_under_their_own_prefix() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);
    let user_id = uuid::Uuid::new_v4().to_string();

    let (status, body) = post_upload(
        &app,
        &[
            ("user_id", None, user_id.as_bytes()),
            ("purpose", None, b"avatar"),
            ("file", Some(("me.jpg", "image/jpeg")), b"jpeg bytes"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["url"].as_str().unwrap().contains("avatars"));
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_the_size_message() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);
    let user_id = uuid::Uuid::new_v4().to_string();
    let big = vec![0u8; 6 * 1024 * 1024];

    let (status, body) = post_upload(
        &app,
        &[
            ("user_id", None, user_id.as_bytes()),
            ("file", Some(("movie.mp4", "video/mp4")), &big),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("5MB or smaller"));
}

#[tokio::test]
async fn non_media_upload_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);
    let user_id = uuid::Uuid::new_v4().to_string();

    let (status, body) = post_upload(
        &app,
        &[
            ("user_id", None, user_id.as_bytes()),
            ("file", Some(("notes.pdf", "application/pdf")), b"%PDF-1.7"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Only image and video files"));
}

#[tokio::test]
async fn anonymous_uploads_are_refused() {
    let store = Arc::new(MemoryStore::new());
    let app = app(&store);

    let (status, body) = post_upload(
        &app,
        &[("file", Some(("pic.png", "image/png")), b"bytes" as &[u8])],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sign in"));
}
