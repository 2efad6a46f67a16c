//! End-to-end conversations against the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use makershub_flow::{DialogFlow, FlowEngine, TurnOutcome};
use makershub_schema::{Utterance, UserContext};
use makershub_store::MemoryStore;

// Monday.
fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine(store: &Arc<MemoryStore>) -> FlowEngine {
    FlowEngine::new(store.clone(), store.clone()).with_reference_date(reference())
}

fn maker() -> UserContext {
    UserContext {
        user_id: Uuid::new_v4(),
        email: Some("maker@example.org".into()),
    }
}

async fn say(
    engine: &FlowEngine,
    flow: Option<DialogFlow>,
    text: &str,
    user: Option<&UserContext>,
) -> TurnOutcome {
    engine
        .advance(flow, &Utterance::text(text), user)
        .await
        .expect("turn failed")
}

fn all_text(out: &TurnOutcome) -> String {
    out.messages.join("\n")
}

#[tokio::test]
async fn recurring_series_lands_in_one_confirmation() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);
    let user = maker();

    let out = say(
        &engine,
        None,
        "schedule Film Bar AI every Tuesday until December 2026",
        Some(&user),
    )
    .await;
    assert!(all_text(&out).contains("52 events"));
    assert!(out.flow.is_some());

    let out = say(&engine, out.flow, "skip", Some(&user)).await;
    assert!(all_text(&out).contains("\"Film Bar AI\""));
    assert!(all_text(&out).contains("52"));

    let out = say(&engine, out.flow, "yes", Some(&user)).await;
    assert!(out.data_changed);
    assert!(out.flow.is_none());

    let events = store.events().await;
    assert_eq!(events.len(), 52);
    assert_eq!(events[0].event_date, date(2026, 1, 6));
    assert_eq!(events[51].event_date, date(2026, 12, 29));
    assert!(events.iter().all(|e| e.title == "Film Bar AI"));
}

#[tokio::test]
async fn smart_shortcut_skips_filled_event_slots() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);
    let user = maker();

    let out = say(
        &engine,
        None,
        "create a meetup called Hack Night tomorrow from 6-10pm",
        Some(&user),
    )
    .await;
    // Title and date came from the utterance, so the first question is the
    // link.
    let text = all_text(&out);
    assert!(text.contains("\"Hack Night\" on January 6, 2026"));
    assert!(text.contains("link"));

    let out = say(&engine, out.flow, "skip", Some(&user)).await;
    assert!(all_text(&out).contains("description"));

    let out = say(&engine, out.flow, "Monthly open hack session", Some(&user)).await;
    let text = all_text(&out);
    assert!(text.contains("at 6-10pm"));
    assert!(text.contains("(yes/no)"));

    let out = say(&engine, out.flow, "yes", Some(&user)).await;
    assert!(out.data_changed);

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Hack Night");
    assert_eq!(events[0].event_date, date(2026, 1, 6));
    assert_eq!(
        events[0].description.as_deref(),
        Some("Monthly open hack session | Time: 6-10pm")
    );
}

#[tokio::test]
async fn edit_flow_selects_parses_and_applies_a_title_change() {
    let store = Arc::new(MemoryStore::new());
    store.seed_event("Film Bar AI", date(2026, 1, 6)).await;
    store.seed_event("Hack Night", date(2026, 2, 3)).await;
    store.seed_event("Demo Day", date(2026, 3, 1)).await;
    let engine = engine(&store);
    let user = maker();

    let out = say(&engine, None, "edit an event", Some(&user)).await;
    let text = all_text(&out);
    assert!(text.contains("1. Demo Day"));
    assert!(text.contains("3. Film Bar AI"));

    let out = say(&engine, out.flow, "3", Some(&user)).await;
    assert!(all_text(&out).contains("Editing \"Film Bar AI\""));

    let out = say(
        &engine,
        out.flow,
        "change the title to AI Film Night",
        Some(&user),
    )
    .await;
    assert!(all_text(&out).contains("\"Film Bar AI\" → \"AI Film Night\""));

    let out = say(&engine, out.flow, "yes", Some(&user)).await;
    assert!(out.data_changed);

    let events = store.events().await;
    assert!(events.iter().any(|e| e.title == "AI Film Night"));
    assert!(!events.iter().any(|e| e.title == "Film Bar AI"));
}

#[tokio::test]
async fn out_of_range_selection_reprompts_without_advancing() {
    let store = Arc::new(MemoryStore::new());
    for i in 1..=8 {
        store
            .seed_event(&format!("Event {i}"), date(2026, 1, i as u32))
            .await;
    }
    let engine = engine(&store);
    let user = maker();

    let out = say(&engine, None, "edit an event", Some(&user)).await;
    let out = say(&engine, out.flow, "12", Some(&user)).await;
    assert_eq!(
        all_text(&out),
        "Please enter a number between 1 and 8."
    );
    assert!(out.flow.is_some());

    // The cached list is still live; a valid number now works.
    let out = say(&engine, out.flow, "3", Some(&user)).await;
    assert!(all_text(&out).contains("Editing"));
}

#[tokio::test]
async fn cancel_with_no_flow_falls_through_to_the_knowledge_base() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let out = say(&engine, None, "cancel", None).await;
    assert!(out.flow.is_none());
    assert!(!all_text(&out).contains("cancelled"));
    assert!(all_text(&out).contains("events"));
}

#[tokio::test]
async fn cancel_interrupts_an_active_flow() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);
    let user = maker();

    let out = say(&engine, None, "add a resource", Some(&user)).await;
    assert!(out.flow.is_some());

    let out = say(&engine, out.flow, "cancel", Some(&user)).await;
    assert!(out.flow.is_none());
    assert!(all_text(&out).contains("cancelled"));
    assert!(store.resources().await.is_empty());
}

#[tokio::test]
async fn mutations_require_a_signed_in_user() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let out = say(&engine, None, "add an event called Demo Night", None).await;
    assert!(out.flow.is_none());
    assert!(all_text(&out).contains("sign in"));
}

#[tokio::test]
async fn commit_failure_surfaces_the_store_error_and_clears_the_flow() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);
    let user = maker();

    let out = say(
        &engine,
        None,
        "create a meetup called Oops Night tomorrow",
        Some(&user),
    )
    .await;
    let out = say(&engine, out.flow, "skip", Some(&user)).await;
    let out = say(&engine, out.flow, "skip", Some(&user)).await;

    store.fail_writes("duplicate key value").await;
    let out = say(&engine, out.flow, "yes", Some(&user)).await;
    assert!(out.flow.is_none());
    assert!(!out.data_changed);
    assert!(all_text(&out).contains("duplicate key value"));
}

#[tokio::test]
async fn declining_a_summary_discards_the_draft() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);
    let user = maker();

    let out = say(
        &engine,
        None,
        "create a meetup called Maybe Night tomorrow",
        Some(&user),
    )
    .await;
    let out = say(&engine, out.flow, "skip", Some(&user)).await;
    let out = say(&engine, out.flow, "skip", Some(&user)).await;
    let out = say(&engine, out.flow, "actually no", Some(&user)).await;

    assert!(out.flow.is_none());
    assert!(!out.data_changed);
    assert!(store.events().await.is_empty());
}

#[tokio::test]
async fn feedback_flow_validates_email_and_notifies_admins() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);
    let user = maker();

    let out = say(&engine, None, "I have some feedback", Some(&user)).await;
    assert!(all_text(&out).contains("feature request"));

    let out = say(&engine, out.flow, "critique", Some(&user)).await;
    let out = say(&engine, out.flow, "Too many tabs on the site", Some(&user)).await;
    assert!(all_text(&out).contains("email"));

    let out = say(&engine, out.flow, "not-an-email", Some(&user)).await;
    assert!(all_text(&out).contains("doesn't look like an email"));
    assert!(out.flow.is_some());

    let out = say(&engine, out.flow, "skip", Some(&user)).await;
    let out = say(&engine, out.flow, "yes", Some(&user)).await;
    assert!(out.data_changed);

    let feedback = store.feedback().await;
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0].message, "Too many tabs on the site");
    // "skip" falls back to the account email.
    assert_eq!(feedback[0].user_email.as_deref(), Some("maker@example.org"));

    let notifications = store.notifications().await;
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn profile_flow_skips_fields_and_takes_an_attached_avatar() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);
    let user = maker();

    let out = say(&engine, None, "update my profile", Some(&user)).await;
    let out = say(&engine, out.flow, "makerdan", Some(&user)).await;
    let out = say(&engine, out.flow, "Dana", Some(&user)).await;
    let out = say(&engine, out.flow, "skip", Some(&user)).await;
    let out = say(&engine, out.flow, "Hardware tinkerer", Some(&user)).await;
    let out = say(&engine, out.flow, "skip", Some(&user)).await;

    let out = engine
        .advance(
            out.flow,
            &Utterance::with_attachment("", "https://cdn.example.org/pic.png"),
            Some(&user),
        )
        .await
        .unwrap();
    let text = all_text(&out);
    assert!(text.contains("username \"makerdan\""));
    assert!(text.contains("a new picture"));

    let out = say(&engine, out.flow, "yes", Some(&user)).await;
    assert!(out.data_changed);

    let profiles = store.profiles().await;
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].0, user.user_id);
    assert_eq!(profiles[0].1.username.as_deref(), Some("makerdan"));
    assert_eq!(profiles[0].1.last_name, None);
    assert_eq!(
        profiles[0].1.avatar_url.as_deref(),
        Some("https://cdn.example.org/pic.png")
    );
}

#[tokio::test]
async fn video_post_flow_collects_the_video_url_and_thanks_the_author() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);
    let user = maker();

    let out = say(&engine, None, "publish a video", Some(&user)).await;
    assert!(all_text(&out).contains("announcement, news, or video"));

    let out = say(&engine, out.flow, "video", Some(&user)).await;
    let out = say(&engine, out.flow, "Robot arm build", Some(&user)).await;
    let out = say(&engine, out.flow, "Full build walkthrough", Some(&user)).await;
    let out = say(&engine, out.flow, "skip", Some(&user)).await;
    assert!(all_text(&out).contains("video URL"));

    let out = say(&engine, out.flow, "https://youtu.be/abc123", Some(&user)).await;
    let out = say(&engine, out.flow, "yes", Some(&user)).await;
    assert!(out.data_changed);

    let posts = store.posts().await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Robot arm build");
    assert_eq!(posts[0].video_url.as_deref(), Some("https://youtu.be/abc123"));

    let notifications = store.notifications().await;
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn delete_flow_confirms_before_removing() {
    let store = Arc::new(MemoryStore::new());
    store.seed_resource("Old guide").await;
    let engine = engine(&store);
    let user = maker();

    let out = say(&engine, None, "delete a resource", Some(&user)).await;
    assert!(all_text(&out).contains("1. Old guide"));

    let out = say(&engine, out.flow, "1", Some(&user)).await;
    assert!(all_text(&out).contains("permanently"));
    assert_eq!(store.resources().await.len(), 1);

    let out = say(&engine, out.flow, "yes", Some(&user)).await;
    assert!(out.data_changed);
    assert!(store.resources().await.is_empty());
}

#[tokio::test]
async fn questions_answer_from_the_knowledge_base_without_a_flow() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(&store);

    let out = say(&engine, None, "what events are coming up", None).await;
    assert!(out.flow.is_none());
    assert!(!out.data_changed);
    assert!(all_text(&out).contains("calendar"));
}
