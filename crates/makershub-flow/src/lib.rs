//! Multi-turn dialog flows for the community assistant.
//!
//! The engine is stateless between calls: the host passes the session's
//! current `DialogFlow` (if any) into [`FlowEngine::advance`] and stores
//! whatever comes back. A turn either continues the active flow, starts a
//! new one from the classified intent, or falls through to the static
//! knowledge base.

pub mod kb;
pub mod state;

mod create;
mod modify;

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc, Weekday};

use makershub_nlu::classify;
use makershub_schema::{Action, ContentType, Intent, Utterance, UserContext};
use makershub_store::{ContentStore, Notifier};

pub use state::DialogFlow;

/// Records shown in one list-then-select screen.
pub(crate) const MAX_LISTED: usize = 10;

/// What one turn produced: the next flow state (None when the flow ended
/// or never started), the assistant's messages in order, and whether a
/// write landed (hosts refresh their views on `data_changed`).
#[derive(Debug)]
pub struct TurnOutcome {
    pub flow: Option<DialogFlow>,
    pub messages: Vec<String>,
    pub data_changed: bool,
}

impl TurnOutcome {
    pub(crate) fn reply(flow: Option<DialogFlow>, message: impl Into<String>) -> Self {
        Self {
            flow,
            messages: vec![message.into()],
            data_changed: false,
        }
    }

    pub(crate) fn committed(message: impl Into<String>) -> Self {
        Self {
            flow: None,
            messages: vec![message.into()],
            data_changed: true,
        }
    }
}

pub struct FlowEngine {
    pub(crate) store: Arc<dyn ContentStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
    reference: Option<NaiveDate>,
}

impl FlowEngine {
    pub fn new(store: Arc<dyn ContentStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            reference: None,
        }
    }

    /// Pin "today" for deterministic tests. Production uses the wall clock.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference = Some(date);
        self
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.reference.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Process one user turn against the session's current flow state.
    pub async fn advance(
        &self,
        flow: Option<DialogFlow>,
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();

        // "cancel" interrupts any flow before step logic runs. With no
        // active flow it falls through and gets a normal answer.
        if text.eq_ignore_ascii_case("cancel") && flow.is_some() {
            return Ok(TurnOutcome::reply(
                None,
                "Okay, I've cancelled that. What else can I help you with?",
            ));
        }

        match flow {
            Some(DialogFlow::CreateEvent(draft)) => self.advance_event(draft, turn, user).await,
            Some(DialogFlow::CreateRecurringEvents(draft)) => {
                self.advance_recurring(draft, turn, user).await
            }
            Some(DialogFlow::CreatePost(draft)) => self.advance_post(draft, turn, user).await,
            Some(DialogFlow::CreateResource(draft)) => {
                self.advance_resource(draft, turn, user).await
            }
            Some(DialogFlow::EditProfile(draft)) => self.advance_profile(draft, turn, user).await,
            Some(DialogFlow::SubmitFeedback(draft)) => {
                self.advance_feedback(draft, turn, user).await
            }
            Some(DialogFlow::EditEvent(flow)) => self.advance_edit_event(flow, turn).await,
            Some(DialogFlow::EditPost(flow)) => self.advance_edit_post(flow, turn).await,
            Some(DialogFlow::EditResource(flow)) => self.advance_edit_resource(flow, turn).await,
            Some(DialogFlow::DeleteEvent(flow)) => self.advance_delete_event(flow, turn).await,
            Some(DialogFlow::DeletePost(flow)) => self.advance_delete_post(flow, turn).await,
            Some(DialogFlow::DeleteResource(flow)) => {
                self.advance_delete_resource(flow, turn).await
            }
            None => self.route_new_turn(turn, user).await,
        }
    }

    /// No active flow: classify the utterance and either start a flow or
    /// answer from the knowledge base.
    async fn route_new_turn(
        &self,
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let intent = classify(&turn.text, self.today());
        if intent.action == Action::None {
            return Ok(TurnOutcome::reply(None, kb::answer(&turn.text)));
        }

        // All mutations require a signed-in user; no flow is created
        // otherwise.
        if user.is_none() {
            return Ok(TurnOutcome::reply(
                None,
                "Please sign in to add or manage community content.",
            ));
        }

        match (intent.action, intent.content_type) {
            (Action::Create, ContentType::Event) => Ok(self.start_event(intent)),
            (Action::Create, ContentType::Post) => Ok(self.start_post()),
            (Action::Create, ContentType::Resource) => Ok(self.start_resource()),
            (_, ContentType::Profile) => Ok(self.start_profile()),
            (_, ContentType::Feedback) => Ok(self.start_feedback()),
            (Action::Edit, ContentType::Event) => self.start_edit_event().await,
            (Action::Edit, ContentType::Post) => self.start_edit_post().await,
            (Action::Edit, ContentType::Resource) => self.start_edit_resource().await,
            (Action::Delete, ContentType::Event) => self.start_delete_event().await,
            (Action::Delete, ContentType::Post) => self.start_delete_post().await,
            (Action::Delete, ContentType::Resource) => self.start_delete_resource().await,
            _ => Ok(TurnOutcome::reply(None, kb::answer(&turn.text))),
        }
    }

    fn start_event(&self, intent: Intent) -> TurnOutcome {
        if let Some(pattern) = intent.recurring.clone() {
            return self.start_recurring(intent, pattern);
        }
        self.start_single_event(intent)
    }
}

pub(crate) fn is_affirmative(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "yes" | "y")
}

pub(crate) fn is_skip(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "skip" | "none")
}

/// 1-based selection against a numbered list. The error is the re-prompt.
pub(crate) fn parse_selection(text: &str, len: usize) -> Result<usize, String> {
    match text.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Ok(n),
        _ => Err(format!("Please enter a number between 1 and {len}.")),
    }
}

pub(crate) fn valid_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

pub(crate) fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
