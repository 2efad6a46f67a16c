//! Creation flows: single event, recurring event series, post, resource,
//! profile and feedback.
//!
//! Each handler owns one step transition. Validation failures re-prompt
//! without advancing; summaries accept only "yes"/"y" and anything else
//! discards the draft.

use anyhow::Result;

use makershub_nlu::{generate, human_date, parse_date};
use makershub_schema::{
    FeedbackCategory, Intent, NewEvent, NewFeedback, NewPost, NewResource, Notification, PostType,
    ProfilePatch, RecurringPattern, Utterance, UserContext,
};

use crate::state::{
    DialogFlow, EventDraft, EventStep, FeedbackDraft, FeedbackStep, PostDraft, PostStep,
    ProfileDraft, ProfileStep, RecurringDraft, RecurringStep, ResourceDraft, ResourceStep,
};
use crate::{is_affirmative, is_skip, valid_email, weekday_name, FlowEngine, TurnOutcome};

const DATE_REPROMPT: &str =
    "I couldn't read that as a date. Try something like \"next Tuesday\", \"March 5\" or \"2026-03-05\".";

/// Fold the side-channel time into the description column.
fn fold_time(description: Option<String>, time: Option<&str>) -> Option<String> {
    match (description, time) {
        (description, None) => description,
        (Some(description), Some(time)) => Some(format!("{description} | Time: {time}")),
        (None, Some(time)) => Some(format!("Time: {time}")),
    }
}

impl FlowEngine {
    // ---- single event -------------------------------------------------

    /// Smart shortcut: slots the initiating utterance already filled are
    /// skipped, so "create Hack Night tomorrow" jumps straight to the URL
    /// question.
    pub(crate) fn start_single_event(&self, intent: Intent) -> TurnOutcome {
        let mut draft = EventDraft {
            step: EventStep::Title,
            title: intent.extracted_title,
            event_date: intent.extracted_date,
            time: intent.extracted_time,
            url: None,
            description: None,
        };
        let mut messages = Vec::new();
        match (&draft.title, draft.event_date) {
            (Some(title), Some(date)) => {
                messages.push(format!("Adding \"{title}\" on {}.", human_date(date)));
                draft.step = EventStep::Url;
            }
            (Some(title), None) => {
                messages.push(format!("Adding \"{title}\"."));
                draft.step = EventStep::Date;
            }
            (None, _) => {
                messages.push("Let's add a new event.".to_string());
                draft.step = EventStep::Title;
            }
        }
        messages.push(event_prompt(draft.step));
        TurnOutcome {
            flow: Some(DialogFlow::CreateEvent(draft)),
            messages,
            data_changed: false,
        }
    }

    pub(crate) async fn advance_event(
        &self,
        mut draft: EventDraft,
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match draft.step {
            EventStep::Title => {
                if text.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::CreateEvent(draft)),
                        event_prompt(EventStep::Title),
                    ));
                }
                draft.title = Some(text.to_string());
                draft.step = EventStep::Date;
            }
            EventStep::Date => match parse_date(text, self.today()) {
                Some(date) => {
                    draft.event_date = Some(date);
                    draft.step = EventStep::Url;
                }
                None => {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::CreateEvent(draft)),
                        DATE_REPROMPT,
                    ));
                }
            },
            EventStep::Url => {
                if let Some(url) = &turn.attachment_url {
                    draft.url = Some(url.clone());
                } else if !is_skip(text) && !text.is_empty() {
                    draft.url = Some(text.to_string());
                }
                draft.step = EventStep::Description;
            }
            EventStep::Description => {
                if !is_skip(text) && !text.is_empty() {
                    draft.description = Some(text.to_string());
                }
                draft.step = EventStep::Summary;
                let summary = event_summary(&draft);
                return Ok(TurnOutcome::reply(
                    Some(DialogFlow::CreateEvent(draft)),
                    summary,
                ));
            }
            EventStep::Summary => {
                if is_affirmative(text) {
                    return self.commit_event(draft, user).await;
                }
                return Ok(TurnOutcome::reply(
                    None,
                    "No problem, I've discarded that. What else can I help you with?",
                ));
            }
        }
        let prompt = event_prompt(draft.step);
        Ok(TurnOutcome::reply(
            Some(DialogFlow::CreateEvent(draft)),
            prompt,
        ))
    }

    async fn commit_event(
        &self,
        draft: EventDraft,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let (Some(title), Some(event_date)) = (draft.title, draft.event_date) else {
            return Ok(TurnOutcome::reply(
                None,
                "I lost track of that event. Let's start over — what would you like to add?",
            ));
        };
        let event = NewEvent {
            title: title.clone(),
            description: fold_time(draft.description, draft.time.as_deref()),
            event_date,
            url: draft.url,
            created_by: user.map(|u| u.user_id),
        };
        match self.store.insert_event(event).await {
            Ok(()) => Ok(TurnOutcome::committed(format!(
                "Done — \"{title}\" is on the calendar for {}. What else can I help you with?",
                human_date(event_date)
            ))),
            Err(e) => Ok(TurnOutcome::reply(
                None,
                format!("Something went wrong saving that: {e}"),
            )),
        }
    }

    // ---- recurring series ---------------------------------------------

    pub(crate) fn start_recurring(
        &self,
        intent: Intent,
        pattern: RecurringPattern,
    ) -> TurnOutcome {
        let dates = generate(pattern.day_of_week, pattern.end_date, self.today());
        if dates.is_empty() {
            return TurnOutcome::reply(
                None,
                "That schedule has no upcoming dates before its end date, so there's nothing to create.",
            );
        }
        let mut draft = RecurringDraft {
            step: RecurringStep::Title,
            pattern,
            dates,
            title: intent.extracted_title,
            time: intent.extracted_time,
            description: None,
        };
        let mut messages = vec![format!(
            "That's {} events, every {} from {} through {}.",
            draft.dates.len(),
            weekday_name(draft.pattern.day_of_week),
            human_date(draft.dates[0]),
            human_date(*draft.dates.last().unwrap_or(&draft.dates[0])),
        )];
        if draft.title.is_some() {
            draft.step = RecurringStep::Description;
            messages.push("Add a short description for the series, or \"skip\".".to_string());
        } else {
            messages.push("What should these events be called?".to_string());
        }
        TurnOutcome {
            flow: Some(DialogFlow::CreateRecurringEvents(draft)),
            messages,
            data_changed: false,
        }
    }

    pub(crate) async fn advance_recurring(
        &self,
        mut draft: RecurringDraft,
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match draft.step {
            RecurringStep::Title => {
                if text.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::CreateRecurringEvents(draft)),
                        "What should these events be called?",
                    ));
                }
                draft.title = Some(text.to_string());
                draft.step = RecurringStep::Description;
                Ok(TurnOutcome::reply(
                    Some(DialogFlow::CreateRecurringEvents(draft)),
                    "Add a short description for the series, or \"skip\".",
                ))
            }
            RecurringStep::Description => {
                if !is_skip(text) && !text.is_empty() {
                    draft.description = Some(text.to_string());
                }
                draft.step = RecurringStep::Summary;
                let title = draft.title.clone().unwrap_or_default();
                let summary = format!(
                    "I'll create {} events titled \"{title}\", every {} from {} through {}. Shall I go ahead? (yes/no)",
                    draft.dates.len(),
                    weekday_name(draft.pattern.day_of_week),
                    human_date(draft.dates[0]),
                    human_date(*draft.dates.last().unwrap_or(&draft.dates[0])),
                );
                Ok(TurnOutcome::reply(
                    Some(DialogFlow::CreateRecurringEvents(draft)),
                    summary,
                ))
            }
            RecurringStep::Summary => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(
                        None,
                        "No problem, I've discarded that. What else can I help you with?",
                    ));
                }
                self.commit_recurring(draft, user).await
            }
        }
    }

    async fn commit_recurring(
        &self,
        draft: RecurringDraft,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let Some(title) = draft.title else {
            return Ok(TurnOutcome::reply(
                None,
                "I lost track of that series. Let's start over — what would you like to add?",
            ));
        };
        let description = fold_time(draft.description, draft.time.as_deref());
        let count = draft.dates.len();
        let events: Vec<NewEvent> = draft
            .dates
            .into_iter()
            .map(|event_date| NewEvent {
                title: title.clone(),
                description: description.clone(),
                event_date,
                url: None,
                created_by: user.map(|u| u.user_id),
            })
            .collect();
        match self.store.insert_events(events).await {
            Ok(()) => Ok(TurnOutcome::committed(format!(
                "Done — I've added {count} \"{title}\" events. What else can I help you with?"
            ))),
            Err(e) => Ok(TurnOutcome::reply(
                None,
                format!("Something went wrong saving that: {e}"),
            )),
        }
    }

    // ---- post ----------------------------------------------------------

    pub(crate) fn start_post(&self) -> TurnOutcome {
        TurnOutcome::reply(
            Some(DialogFlow::CreatePost(PostDraft {
                step: PostStep::Kind,
                post_type: None,
                title: None,
                content: None,
                excerpt: None,
                video_url: None,
            })),
            "What kind of post is it — announcement, news, or video?",
        )
    }

    pub(crate) async fn advance_post(
        &self,
        mut draft: PostDraft,
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match draft.step {
            PostStep::Kind => match PostType::parse(text) {
                Some(post_type) => {
                    draft.post_type = Some(post_type);
                    draft.step = PostStep::Title;
                }
                None => {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::CreatePost(draft)),
                        "Please pick one of: announcement, news, or video.",
                    ));
                }
            },
            PostStep::Title => {
                if text.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::CreatePost(draft)),
                        post_prompt(PostStep::Title),
                    ));
                }
                draft.title = Some(text.to_string());
                draft.step = PostStep::Content;
            }
            PostStep::Content => {
                if text.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::CreatePost(draft)),
                        post_prompt(PostStep::Content),
                    ));
                }
                draft.content = Some(text.to_string());
                draft.step = PostStep::Excerpt;
            }
            PostStep::Excerpt => {
                if !is_skip(text) && !text.is_empty() {
                    draft.excerpt = Some(text.to_string());
                }
                draft.step = if draft.post_type == Some(PostType::Video) {
                    PostStep::VideoUrl
                } else {
                    PostStep::Summary
                };
            }
            PostStep::VideoUrl => {
                if let Some(url) = &turn.attachment_url {
                    draft.video_url = Some(url.clone());
                } else if !is_skip(text) && !text.is_empty() {
                    draft.video_url = Some(text.to_string());
                }
                draft.step = PostStep::Summary;
            }
            PostStep::Summary => {
                if is_affirmative(text) {
                    return self.commit_post(draft, user).await;
                }
                return Ok(TurnOutcome::reply(
                    None,
                    "No problem, I've discarded that. What else can I help you with?",
                ));
            }
        }
        if draft.step == PostStep::Summary {
            let summary = post_summary(&draft);
            return Ok(TurnOutcome::reply(
                Some(DialogFlow::CreatePost(draft)),
                summary,
            ));
        }
        let prompt = post_prompt(draft.step);
        Ok(TurnOutcome::reply(
            Some(DialogFlow::CreatePost(draft)),
            prompt,
        ))
    }

    async fn commit_post(
        &self,
        draft: PostDraft,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let (Some(post_type), Some(title), Some(content)) =
            (draft.post_type, draft.title, draft.content)
        else {
            return Ok(TurnOutcome::reply(
                None,
                "I lost track of that post. Let's start over — what would you like to publish?",
            ));
        };
        let post = NewPost {
            post_type,
            title: title.clone(),
            content,
            excerpt: draft.excerpt,
            video_url: draft.video_url,
            author_id: user.map(|u| u.user_id),
        };
        match self.store.insert_post(post).await {
            Ok(()) => {
                self.thank_contributor(&title, user).await;
                Ok(TurnOutcome::committed(format!(
                    "Published \"{title}\". What else can I help you with?"
                )))
            }
            Err(e) => Ok(TurnOutcome::reply(
                None,
                format!("Something went wrong saving that: {e}"),
            )),
        }
    }

    // ---- resource -------------------------------------------------------

    pub(crate) fn start_resource(&self) -> TurnOutcome {
        TurnOutcome::reply(
            Some(DialogFlow::CreateResource(ResourceDraft {
                step: ResourceStep::Title,
                title: None,
                description: None,
                url: None,
            })),
            "What's the resource called?",
        )
    }

    pub(crate) async fn advance_resource(
        &self,
        mut draft: ResourceDraft,
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match draft.step {
            ResourceStep::Title => {
                if text.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::CreateResource(draft)),
                        "What's the resource called?",
                    ));
                }
                draft.title = Some(text.to_string());
                draft.step = ResourceStep::Description;
                Ok(TurnOutcome::reply(
                    Some(DialogFlow::CreateResource(draft)),
                    "Give me a short description of it.",
                ))
            }
            ResourceStep::Description => {
                if text.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::CreateResource(draft)),
                        "Give me a short description of it.",
                    ));
                }
                draft.description = Some(text.to_string());
                draft.step = ResourceStep::Url;
                Ok(TurnOutcome::reply(
                    Some(DialogFlow::CreateResource(draft)),
                    "Where can people find it? Reply with a URL or \"skip\".",
                ))
            }
            ResourceStep::Url => {
                if let Some(url) = &turn.attachment_url {
                    draft.url = Some(url.clone());
                } else if !is_skip(text) && !text.is_empty() {
                    draft.url = Some(text.to_string());
                }
                draft.step = ResourceStep::Summary;
                let title = draft.title.clone().unwrap_or_default();
                let summary = format!(
                    "I'll add \"{title}\" to the resource library{}. Shall I go ahead? (yes/no)",
                    draft
                        .url
                        .as_deref()
                        .map(|u| format!(" with the link {u}"))
                        .unwrap_or_default(),
                );
                Ok(TurnOutcome::reply(
                    Some(DialogFlow::CreateResource(draft)),
                    summary,
                ))
            }
            ResourceStep::Summary => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(
                        None,
                        "No problem, I've discarded that. What else can I help you with?",
                    ));
                }
                self.commit_resource(draft, user).await
            }
        }
    }

    async fn commit_resource(
        &self,
        draft: ResourceDraft,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let (Some(title), Some(description)) = (draft.title, draft.description) else {
            return Ok(TurnOutcome::reply(
                None,
                "I lost track of that resource. Let's start over — what would you like to add?",
            ));
        };
        let resource = NewResource {
            title: title.clone(),
            description,
            url: draft.url,
            submitted_by: user.map(|u| u.user_id),
        };
        match self.store.insert_resource(resource).await {
            Ok(()) => {
                self.thank_contributor(&title, user).await;
                Ok(TurnOutcome::committed(format!(
                    "Added \"{title}\" to the resource library. What else can I help you with?"
                )))
            }
            Err(e) => Ok(TurnOutcome::reply(
                None,
                format!("Something went wrong saving that: {e}"),
            )),
        }
    }

    /// Thank-you emails are best-effort. A failure never blocks or rolls
    /// back the contribution.
    async fn thank_contributor(&self, title: &str, user: Option<&UserContext>) {
        let Some(email) = user.and_then(|u| u.email.clone()) else {
            return;
        };
        let note = Notification::ContributionThanks {
            title: title.to_string(),
            user_email: email,
        };
        if let Err(e) = self.notifier.send(note).await {
            tracing::warn!(error = %e, "contribution thank-you email failed");
        }
    }

    // ---- profile --------------------------------------------------------

    pub(crate) fn start_profile(&self) -> TurnOutcome {
        TurnOutcome::reply(
            Some(DialogFlow::EditProfile(ProfileDraft {
                step: ProfileStep::Username,
                patch: ProfilePatch::default(),
            })),
            "Let's update your profile. Say \"skip\" for anything you want to leave as-is. What username would you like?",
        )
    }

    pub(crate) async fn advance_profile(
        &self,
        mut draft: ProfileDraft,
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        let value = (!is_skip(text) && !text.is_empty()).then(|| text.to_string());
        match draft.step {
            ProfileStep::Username => {
                draft.patch.username = value;
                draft.step = ProfileStep::FirstName;
            }
            ProfileStep::FirstName => {
                draft.patch.first_name = value;
                draft.step = ProfileStep::LastName;
            }
            ProfileStep::LastName => {
                draft.patch.last_name = value;
                draft.step = ProfileStep::Title;
            }
            ProfileStep::Title => {
                draft.patch.title = value;
                draft.step = ProfileStep::Bio;
            }
            ProfileStep::Bio => {
                draft.patch.bio = value;
                draft.step = ProfileStep::Avatar;
            }
            ProfileStep::Avatar => {
                // An uploaded picture beats whatever was typed.
                if let Some(url) = &turn.attachment_url {
                    draft.patch.avatar_url = Some(url.clone());
                } else {
                    draft.patch.avatar_url = value;
                }
                draft.step = ProfileStep::Summary;
                let summary = profile_summary(&draft.patch);
                return Ok(TurnOutcome::reply(
                    Some(DialogFlow::EditProfile(draft)),
                    summary,
                ));
            }
            ProfileStep::Summary => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(
                        None,
                        "No problem, I've discarded that. What else can I help you with?",
                    ));
                }
                let Some(user) = user else {
                    return Ok(TurnOutcome::reply(
                        None,
                        "Please sign in to update your profile.",
                    ));
                };
                return match self.store.upsert_profile(user.user_id, draft.patch).await {
                    Ok(()) => Ok(TurnOutcome::committed(
                        "Your profile is updated. What else can I help you with?",
                    )),
                    Err(e) => Ok(TurnOutcome::reply(
                        None,
                        format!("Something went wrong saving that: {e}"),
                    )),
                };
            }
        }
        let prompt = profile_prompt(draft.step);
        Ok(TurnOutcome::reply(
            Some(DialogFlow::EditProfile(draft)),
            prompt,
        ))
    }

    // ---- feedback -------------------------------------------------------

    pub(crate) fn start_feedback(&self) -> TurnOutcome {
        TurnOutcome::reply(
            Some(DialogFlow::SubmitFeedback(FeedbackDraft {
                step: FeedbackStep::Category,
                category: None,
                message: None,
                email: None,
            })),
            "What kind of feedback is it — feature request, suggestion, feedback, critique, or query?",
        )
    }

    pub(crate) async fn advance_feedback(
        &self,
        mut draft: FeedbackDraft,
        turn: &Utterance,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match draft.step {
            FeedbackStep::Category => match FeedbackCategory::parse(text) {
                Some(category) => {
                    draft.category = Some(category);
                    draft.step = FeedbackStep::Message;
                    Ok(TurnOutcome::reply(
                        Some(DialogFlow::SubmitFeedback(draft)),
                        "Go ahead, I'm listening.",
                    ))
                }
                None => Ok(TurnOutcome::reply(
                    Some(DialogFlow::SubmitFeedback(draft)),
                    "Please pick one of: feature request, suggestion, feedback, critique, or query.",
                )),
            },
            FeedbackStep::Message => {
                if text.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::SubmitFeedback(draft)),
                        "Go ahead, I'm listening.",
                    ));
                }
                draft.message = Some(turn.text.trim().to_string());
                draft.step = FeedbackStep::Email;
                Ok(TurnOutcome::reply(
                    Some(DialogFlow::SubmitFeedback(draft)),
                    "What's a contact email for follow-up? (or \"skip\")",
                ))
            }
            FeedbackStep::Email => {
                if is_skip(text) {
                    draft.email = user.and_then(|u| u.email.clone());
                } else if valid_email(text) {
                    draft.email = Some(text.to_string());
                } else {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::SubmitFeedback(draft)),
                        "That doesn't look like an email address. Try again, or say \"skip\".",
                    ));
                }
                draft.step = FeedbackStep::Summary;
                let category = draft
                    .category
                    .map(|c| c.as_str().replace('_', " "))
                    .unwrap_or_default();
                let message = draft.message.clone().unwrap_or_default();
                let summary = format!(
                    "I'll pass this along as a {category}: \"{message}\". Shall I send it? (yes/no)"
                );
                Ok(TurnOutcome::reply(
                    Some(DialogFlow::SubmitFeedback(draft)),
                    summary,
                ))
            }
            FeedbackStep::Summary => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(
                        None,
                        "No problem, I've discarded that. What else can I help you with?",
                    ));
                }
                self.commit_feedback(draft, user).await
            }
        }
    }

    async fn commit_feedback(
        &self,
        draft: FeedbackDraft,
        user: Option<&UserContext>,
    ) -> Result<TurnOutcome> {
        let (Some(category), Some(message), Some(user)) = (draft.category, draft.message, user)
        else {
            return Ok(TurnOutcome::reply(
                None,
                "I lost track of that feedback. Let's start over — what did you want to tell us?",
            ));
        };
        let feedback = NewFeedback {
            user_id: user.user_id,
            user_email: draft.email.clone(),
            category,
            message: message.clone(),
        };
        match self.store.insert_feedback(feedback).await {
            Ok(()) => {
                let note = Notification::FeedbackToAdmin {
                    category,
                    message,
                    user_email: draft.email,
                    user_id: user.user_id,
                };
                if let Err(e) = self.notifier.send(note).await {
                    tracing::warn!(error = %e, "feedback email failed");
                }
                Ok(TurnOutcome::committed(format!(
                    "Thanks — your {} has been passed along. What else can I help you with?",
                    category.as_str().replace('_', " ")
                )))
            }
            Err(e) => Ok(TurnOutcome::reply(
                None,
                format!("Something went wrong saving that: {e}"),
            )),
        }
    }
}

fn event_prompt(step: EventStep) -> String {
    match step {
        EventStep::Title => "What's the event called?".to_string(),
        EventStep::Date => {
            "When is it? Try something like \"next Tuesday\" or \"March 5\".".to_string()
        }
        EventStep::Url => "Is there a link for the event? Reply with a URL or \"skip\".".to_string(),
        EventStep::Description => "Add a short description, or \"skip\".".to_string(),
        EventStep::Summary => String::new(),
    }
}

fn event_summary(draft: &EventDraft) -> String {
    let title = draft.title.as_deref().unwrap_or("(untitled)");
    let date = draft
        .event_date
        .map(human_date)
        .unwrap_or_else(|| "(no date)".to_string());
    let mut summary = format!("Here's what I have: \"{title}\" on {date}");
    if let Some(time) = &draft.time {
        summary.push_str(&format!(" at {time}"));
    }
    if let Some(url) = &draft.url {
        summary.push_str(&format!(", link {url}"));
    }
    if let Some(description) = &draft.description {
        summary.push_str(&format!(". Description: {description}"));
    }
    summary.push_str(". Shall I add it? (yes/no)");
    summary
}

fn post_prompt(step: PostStep) -> String {
    match step {
        PostStep::Kind => "What kind of post is it — announcement, news, or video?".to_string(),
        PostStep::Title => "What's the headline?".to_string(),
        PostStep::Content => "What's the body of the post?".to_string(),
        PostStep::Excerpt => "Add a one-line excerpt, or \"skip\".".to_string(),
        PostStep::VideoUrl => "What's the video URL? (or \"skip\")".to_string(),
        PostStep::Summary => String::new(),
    }
}

fn post_summary(draft: &PostDraft) -> String {
    let kind = draft.post_type.map(|t| t.as_str()).unwrap_or("post");
    let title = draft.title.as_deref().unwrap_or("(untitled)");
    let mut summary = format!("I'll publish the {kind} \"{title}\"");
    if let Some(url) = &draft.video_url {
        summary.push_str(&format!(" with the video {url}"));
    }
    summary.push_str(". Shall I go ahead? (yes/no)");
    summary
}

fn profile_prompt(step: ProfileStep) -> String {
    match step {
        ProfileStep::Username => "What username would you like?".to_string(),
        ProfileStep::FirstName => "What's your first name?".to_string(),
        ProfileStep::LastName => "And your last name?".to_string(),
        ProfileStep::Title => "What's your headline title? (e.g. \"Hardware tinkerer\")".to_string(),
        ProfileStep::Bio => "Write a short bio, or \"skip\".".to_string(),
        ProfileStep::Avatar => {
            "Attach a profile picture, paste an image URL, or say \"skip\".".to_string()
        }
        ProfileStep::Summary => String::new(),
    }
}

fn profile_summary(patch: &ProfilePatch) -> String {
    let mut parts = Vec::new();
    if let Some(v) = &patch.username {
        parts.push(format!("username \"{v}\""));
    }
    if let Some(v) = &patch.first_name {
        parts.push(format!("first name \"{v}\""));
    }
    if let Some(v) = &patch.last_name {
        parts.push(format!("last name \"{v}\""));
    }
    if let Some(v) = &patch.title {
        parts.push(format!("title \"{v}\""));
    }
    if patch.bio.is_some() {
        parts.push("a new bio".to_string());
    }
    if patch.avatar_url.is_some() {
        parts.push("a new picture".to_string());
    }
    if parts.is_empty() {
        return "You skipped everything, so there's nothing to update. Say \"yes\" anyway to confirm, or anything else to cancel.".to_string();
    }
    format!(
        "I'll update your profile with {}. Shall I go ahead? (yes/no)",
        parts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_folds_into_description() {
        assert_eq!(fold_time(None, None), None);
        assert_eq!(
            fold_time(Some("Bring a laptop".into()), None).as_deref(),
            Some("Bring a laptop")
        );
        assert_eq!(
            fold_time(Some("Bring a laptop".into()), Some("6-10pm")).as_deref(),
            Some("Bring a laptop | Time: 6-10pm")
        );
        assert_eq!(fold_time(None, Some("7pm")).as_deref(), Some("Time: 7pm"));
    }

    #[test]
    fn profile_summary_lists_only_set_fields() {
        let patch = ProfilePatch {
            username: Some("makerdan".into()),
            bio: Some("builds things".into()),
            ..Default::default()
        };
        let summary = profile_summary(&patch);
        assert!(summary.contains("username \"makerdan\""));
        assert!(summary.contains("a new bio"));
        assert!(!summary.contains("last name"));
    }
}
