//! HTTP-level tests for the Supabase adapter against a mock platform.

use chrono::NaiveDate;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use makershub_schema::{EventPatch, NewEvent, Notification, ProfilePatch, UploadPurpose};
use makershub_store::{ContentStore, FileStorage, Notifier, SupabaseStore, UploadFile};

fn store_for(server: &MockServer) -> SupabaseStore {
    SupabaseStore::new(server.uri(), "service-key")
}

#[tokio::test]
async fn list_recent_events_orders_by_date_desc() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/events"))
        .and(query_param("order", "event_date.desc"))
        .and(query_param("limit", "10"))
        .and(header("apikey", "service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 2, "title": "Demo Night", "event_date": "2026-06-02"},
            {"id": 1, "title": "Film Bar AI", "event_date": "2026-05-26", "description": "weekly"}
        ])))
        .mount(&server)
        .await;

    let events = store_for(&server).list_recent_events(10).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Demo Night");
    assert_eq!(events[1].description.as_deref(), Some("weekly"));
}

#[tokio::test]
async fn insert_event_posts_a_row_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/events"))
        .and(body_partial_json(serde_json::json!([
            {"title": "Hack Night", "event_date": "2026-03-10"}
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .insert_event(NewEvent {
            title: "Hack Night".into(),
            description: None,
            event_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            url: None,
            created_by: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn update_event_patches_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/events"))
        .and(query_param("id", "eq.7"))
        .and(body_partial_json(serde_json::json!({"title": "Renamed"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .update_event(
            7,
            EventPatch {
                title: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_resource_targets_the_row() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/resources"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server).delete_resource(3).await.unwrap();
}

#[tokio::test]
async fn upsert_profile_merges_duplicates() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(headers(
            "prefer",
            vec!["resolution=merge-duplicates", "return=minimal"],
        ))
        .and(body_partial_json(serde_json::json!([
            {"id": user_id, "username": "gheri"}
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .upsert_profile(
            user_id,
            ProfilePatch {
                username: Some("gheri".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn platform_error_message_passes_through_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/events"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .insert_event(NewEvent {
            title: "dup".into(),
            description: None,
            event_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            url: None,
            created_by: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "duplicate key value violates unique constraint"
    );
}

#[tokio::test]
async fn upload_returns_public_url_under_purpose_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let owner = Uuid::new_v4();
    let url = store_for(&server)
        .upload(
            owner,
            UploadFile {
                file_name: "pic.png".into(),
                mime_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            },
            UploadPurpose::Avatar,
        )
        .await
        .unwrap();
    assert!(url.contains("/storage/v1/object/public/uploads/avatars/"));
    assert!(url.ends_with("pic.png"));
}

#[tokio::test]
async fn oversized_upload_never_reaches_the_server() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would fail the test via connect 404.
    let err = store_for(&server)
        .upload(
            Uuid::new_v4(),
            UploadFile {
                file_name: "movie.mp4".into(),
                mime_type: "video/mp4".into(),
                bytes: vec![0; 6 * 1024 * 1024],
            },
            UploadPurpose::ChatAttachment,
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("5MB or smaller"));
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn feedback_email_invokes_edge_function() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/send-email"))
        .and(body_partial_json(
            serde_json::json!({"kind": "feedback_to_admin", "category": "critique"}),
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .send(Notification::FeedbackToAdmin {
            category: makershub_schema::FeedbackCategory::Critique,
            message: "too many tabs".into(),
            user_email: None,
            user_id: Uuid::new_v4(),
        })
        .await
        .unwrap();
}
