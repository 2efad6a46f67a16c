//! Edit and delete flows: list recent records, select by number, then
//! either describe the change in free text or confirm the deletion.
//!
//! The listing shown to the user is cached in the flow state; a selection
//! always refers to the list the user actually saw.

use anyhow::Result;

use makershub_nlu::{
    human_date, parse_event_changes, parse_post_changes, parse_resource_changes, EventChanges,
};
use makershub_schema::{
    EventPatch, EventRecord, PostPatch, PostRecord, ResourcePatch, ResourceRecord, Utterance,
};

use crate::state::{
    DeleteEventFlow, DeletePostFlow, DeleteResourceFlow, DeleteStep, DialogFlow, EditEventFlow,
    EditPostFlow, EditResourceFlow, EditStep,
};
use crate::{is_affirmative, parse_selection, FlowEngine, TurnOutcome, MAX_LISTED};

const CHANGE_EXAMPLES: &str = "Tell me what to change. For example: \"change the title to AI Film Night\" or \"date: next Friday\".";
const DECLINED: &str = "No problem — I left it as it was. What else can I help you with?";

fn numbered<T>(items: &[T], line: impl Fn(&T) -> String) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, line(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn event_line(event: &EventRecord) -> String {
    format!("{} — {}", event.title, human_date(event.event_date))
}

fn post_line(post: &PostRecord) -> String {
    format!("[{}] {}", post.post_type.as_str(), post.title)
}

fn resource_line(resource: &ResourceRecord) -> String {
    resource.title.clone()
}

/// Fold the event `time` pseudo-field into a real column patch. A new time
/// appends to whichever description will be current after the update.
fn event_patch_from(selected: &EventRecord, changes: EventChanges) -> EventPatch {
    let mut patch = EventPatch {
        title: changes.title,
        description: changes.description,
        event_date: changes.event_date,
        url: changes.url,
    };
    if let Some(time) = changes.time {
        let base = patch
            .description
            .clone()
            .or_else(|| selected.description.clone())
            .unwrap_or_default();
        patch.description = Some(if base.is_empty() {
            format!("Time: {time}")
        } else {
            format!("{base} | Time: {time}")
        });
    }
    patch
}

fn event_change_summary(selected: &EventRecord, changes: &EventChanges) -> String {
    let mut lines = vec![format!("Here's what I'll change for \"{}\":", selected.title)];
    if let Some(title) = &changes.title {
        lines.push(format!("- title: \"{}\" → \"{title}\"", selected.title));
    }
    if let Some(date) = changes.event_date {
        lines.push(format!(
            "- date: {} → {}",
            human_date(selected.event_date),
            human_date(date)
        ));
    }
    if let Some(description) = &changes.description {
        lines.push(format!(
            "- description: \"{}\" → \"{description}\"",
            selected.description.as_deref().unwrap_or("")
        ));
    }
    if let Some(url) = &changes.url {
        lines.push(format!(
            "- link: \"{}\" → \"{url}\"",
            selected.url.as_deref().unwrap_or("")
        ));
    }
    if let Some(time) = &changes.time {
        lines.push(format!("- time: \"{time}\" (added to the description)"));
    }
    lines.push("Apply these changes? (yes/no)".to_string());
    lines.join("\n")
}

fn post_change_summary(selected: &PostRecord, changes: &PostPatch) -> String {
    let mut lines = vec![format!("Here's what I'll change for \"{}\":", selected.title)];
    if let Some(title) = &changes.title {
        lines.push(format!("- title: \"{}\" → \"{title}\"", selected.title));
    }
    if changes.content.is_some() {
        lines.push("- content: replaced".to_string());
    }
    if let Some(excerpt) = &changes.excerpt {
        lines.push(format!(
            "- excerpt: \"{}\" → \"{excerpt}\"",
            selected.excerpt.as_deref().unwrap_or("")
        ));
    }
    if let Some(url) = &changes.video_url {
        lines.push(format!(
            "- video: \"{}\" → \"{url}\"",
            selected.video_url.as_deref().unwrap_or("")
        ));
    }
    lines.push("Apply these changes? (yes/no)".to_string());
    lines.join("\n")
}

fn resource_change_summary(selected: &ResourceRecord, changes: &ResourcePatch) -> String {
    let mut lines = vec![format!("Here's what I'll change for \"{}\":", selected.title)];
    if let Some(title) = &changes.title {
        lines.push(format!("- title: \"{}\" → \"{title}\"", selected.title));
    }
    if let Some(description) = &changes.description {
        lines.push(format!(
            "- description: \"{}\" → \"{description}\"",
            selected.description
        ));
    }
    if let Some(url) = &changes.url {
        lines.push(format!(
            "- link: \"{}\" → \"{url}\"",
            selected.url.as_deref().unwrap_or("")
        ));
    }
    lines.push("Apply these changes? (yes/no)".to_string());
    lines.join("\n")
}

impl FlowEngine {
    // ---- edit ----------------------------------------------------------

    pub(crate) async fn start_edit_event(&self) -> Result<TurnOutcome> {
        let options = self.store.list_recent_events(MAX_LISTED).await?;
        if options.is_empty() {
            return Ok(TurnOutcome::reply(None, "There are no events to edit yet."));
        }
        let message = format!(
            "Which event would you like to edit?\n{}\nReply with its number.",
            numbered(&options, event_line)
        );
        Ok(TurnOutcome::reply(
            Some(DialogFlow::EditEvent(EditEventFlow {
                step: EditStep::Select,
                options,
                selected: None,
                changes: None,
            })),
            message,
        ))
    }

    pub(crate) async fn advance_edit_event(
        &self,
        mut flow: EditEventFlow,
        turn: &Utterance,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match flow.step {
            EditStep::Select => match parse_selection(text, flow.options.len()) {
                Ok(n) => {
                    let selected = flow.options[n - 1].clone();
                    let message = format!("Editing \"{}\". {CHANGE_EXAMPLES}", selected.title);
                    flow.selected = Some(selected);
                    flow.step = EditStep::Describe;
                    Ok(TurnOutcome::reply(Some(DialogFlow::EditEvent(flow)), message))
                }
                Err(reprompt) => Ok(TurnOutcome::reply(
                    Some(DialogFlow::EditEvent(flow)),
                    reprompt,
                )),
            },
            EditStep::Describe => {
                let changes = parse_event_changes(text, self.today());
                if changes.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::EditEvent(flow)),
                        format!("I couldn't find a change in that. {CHANGE_EXAMPLES}"),
                    ));
                }
                let Some(selected) = &flow.selected else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                let summary = event_change_summary(selected, &changes);
                flow.changes = Some(changes);
                flow.step = EditStep::Confirm;
                Ok(TurnOutcome::reply(Some(DialogFlow::EditEvent(flow)), summary))
            }
            EditStep::Confirm => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                }
                let (Some(selected), Some(changes)) = (flow.selected, flow.changes) else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                let patch = event_patch_from(&selected, changes);
                match self.store.update_event(selected.id, patch).await {
                    Ok(()) => Ok(TurnOutcome::committed(format!(
                        "Updated \"{}\". What else can I help you with?",
                        selected.title
                    ))),
                    Err(e) => Ok(TurnOutcome::reply(
                        None,
                        format!("Something went wrong saving that: {e}"),
                    )),
                }
            }
        }
    }

    pub(crate) async fn start_edit_post(&self) -> Result<TurnOutcome> {
        let options = self.store.list_recent_posts(MAX_LISTED).await?;
        if options.is_empty() {
            return Ok(TurnOutcome::reply(None, "There are no posts to edit yet."));
        }
        let message = format!(
            "Which post would you like to edit?\n{}\nReply with its number.",
            numbered(&options, post_line)
        );
        Ok(TurnOutcome::reply(
            Some(DialogFlow::EditPost(EditPostFlow {
                step: EditStep::Select,
                options,
                selected: None,
                changes: None,
            })),
            message,
        ))
    }

    pub(crate) async fn advance_edit_post(
        &self,
        mut flow: EditPostFlow,
        turn: &Utterance,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match flow.step {
            EditStep::Select => match parse_selection(text, flow.options.len()) {
                Ok(n) => {
                    let selected = flow.options[n - 1].clone();
                    let message = format!("Editing \"{}\". {CHANGE_EXAMPLES}", selected.title);
                    flow.selected = Some(selected);
                    flow.step = EditStep::Describe;
                    Ok(TurnOutcome::reply(Some(DialogFlow::EditPost(flow)), message))
                }
                Err(reprompt) => Ok(TurnOutcome::reply(
                    Some(DialogFlow::EditPost(flow)),
                    reprompt,
                )),
            },
            EditStep::Describe => {
                let changes = parse_post_changes(text);
                if changes.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::EditPost(flow)),
                        format!("I couldn't find a change in that. {CHANGE_EXAMPLES}"),
                    ));
                }
                let Some(selected) = &flow.selected else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                let summary = post_change_summary(selected, &changes);
                flow.changes = Some(changes);
                flow.step = EditStep::Confirm;
                Ok(TurnOutcome::reply(Some(DialogFlow::EditPost(flow)), summary))
            }
            EditStep::Confirm => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                }
                let (Some(selected), Some(changes)) = (flow.selected, flow.changes) else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                match self.store.update_post(selected.id, changes).await {
                    Ok(()) => Ok(TurnOutcome::committed(format!(
                        "Updated \"{}\". What else can I help you with?",
                        selected.title
                    ))),
                    Err(e) => Ok(TurnOutcome::reply(
                        None,
                        format!("Something went wrong saving that: {e}"),
                    )),
                }
            }
        }
    }

    pub(crate) async fn start_edit_resource(&self) -> Result<TurnOutcome> {
        let options = self.store.list_recent_resources(MAX_LISTED).await?;
        if options.is_empty() {
            return Ok(TurnOutcome::reply(
                None,
                "There are no resources to edit yet.",
            ));
        }
        let message = format!(
            "Which resource would you like to edit?\n{}\nReply with its number.",
            numbered(&options, resource_line)
        );
        Ok(TurnOutcome::reply(
            Some(DialogFlow::EditResource(EditResourceFlow {
                step: EditStep::Select,
                options,
                selected: None,
                changes: None,
            })),
            message,
        ))
    }

    pub(crate) async fn advance_edit_resource(
        &self,
        mut flow: EditResourceFlow,
        turn: &Utterance,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match flow.step {
            EditStep::Select => match parse_selection(text, flow.options.len()) {
                Ok(n) => {
                    let selected = flow.options[n - 1].clone();
                    let message = format!("Editing \"{}\". {CHANGE_EXAMPLES}", selected.title);
                    flow.selected = Some(selected);
                    flow.step = EditStep::Describe;
                    Ok(TurnOutcome::reply(
                        Some(DialogFlow::EditResource(flow)),
                        message,
                    ))
                }
                Err(reprompt) => Ok(TurnOutcome::reply(
                    Some(DialogFlow::EditResource(flow)),
                    reprompt,
                )),
            },
            EditStep::Describe => {
                let changes = parse_resource_changes(text);
                if changes.is_empty() {
                    return Ok(TurnOutcome::reply(
                        Some(DialogFlow::EditResource(flow)),
                        format!("I couldn't find a change in that. {CHANGE_EXAMPLES}"),
                    ));
                }
                let Some(selected) = &flow.selected else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                let summary = resource_change_summary(selected, &changes);
                flow.changes = Some(changes);
                flow.step = EditStep::Confirm;
                Ok(TurnOutcome::reply(
                    Some(DialogFlow::EditResource(flow)),
                    summary,
                ))
            }
            EditStep::Confirm => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                }
                let (Some(selected), Some(changes)) = (flow.selected, flow.changes) else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                match self.store.update_resource(selected.id, changes).await {
                    Ok(()) => Ok(TurnOutcome::committed(format!(
                        "Updated \"{}\". What else can I help you with?",
                        selected.title
                    ))),
                    Err(e) => Ok(TurnOutcome::reply(
                        None,
                        format!("Something went wrong saving that: {e}"),
                    )),
                }
            }
        }
    }

    // ---- delete --------------------------------------------------------

    pub(crate) async fn start_delete_event(&self) -> Result<TurnOutcome> {
        let options = self.store.list_recent_events(MAX_LISTED).await?;
        if options.is_empty() {
            return Ok(TurnOutcome::reply(
                None,
                "There are no events to delete.",
            ));
        }
        let message = format!(
            "Which event should I delete?\n{}\nReply with its number.",
            numbered(&options, event_line)
        );
        Ok(TurnOutcome::reply(
            Some(DialogFlow::DeleteEvent(DeleteEventFlow {
                step: DeleteStep::Select,
                options,
                selected: None,
            })),
            message,
        ))
    }

    pub(crate) async fn advance_delete_event(
        &self,
        mut flow: DeleteEventFlow,
        turn: &Utterance,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match flow.step {
            DeleteStep::Select => match parse_selection(text, flow.options.len()) {
                Ok(n) => {
                    let selected = flow.options[n - 1].clone();
                    let message = format!(
                        "This will permanently delete \"{}\" ({}). Are you sure? (yes/no)",
                        selected.title,
                        human_date(selected.event_date)
                    );
                    flow.selected = Some(selected);
                    flow.step = DeleteStep::Confirm;
                    Ok(TurnOutcome::reply(
                        Some(DialogFlow::DeleteEvent(flow)),
                        message,
                    ))
                }
                Err(reprompt) => Ok(TurnOutcome::reply(
                    Some(DialogFlow::DeleteEvent(flow)),
                    reprompt,
                )),
            },
            DeleteStep::Confirm => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                }
                let Some(selected) = flow.selected else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                match self.store.delete_event(selected.id).await {
                    Ok(()) => Ok(TurnOutcome::committed(format!(
                        "Deleted \"{}\". What else can I help you with?",
                        selected.title
                    ))),
                    Err(e) => Ok(TurnOutcome::reply(
                        None,
                        format!("Something went wrong deleting that: {e}"),
                    )),
                }
            }
        }
    }

    pub(crate) async fn start_delete_post(&self) -> Result<TurnOutcome> {
        let options = self.store.list_recent_posts(MAX_LISTED).await?;
        if options.is_empty() {
            return Ok(TurnOutcome::reply(None, "There are no posts to delete."));
        }
        let message = format!(
            "Which post should I delete?\n{}\nReply with its number.",
            numbered(&options, post_line)
        );
        Ok(TurnOutcome::reply(
            Some(DialogFlow::DeletePost(DeletePostFlow {
                step: DeleteStep::Select,
                options,
                selected: None,
            })),
            message,
        ))
    }

    pub(crate) async fn advance_delete_post(
        &self,
        mut flow: DeletePostFlow,
        turn: &Utterance,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match flow.step {
            DeleteStep::Select => match parse_selection(text, flow.options.len()) {
                Ok(n) => {
                    let selected = flow.options[n - 1].clone();
                    let message = format!(
                        "This will permanently delete \"{}\". Are you sure? (yes/no)",
                        selected.title
                    );
                    flow.selected = Some(selected);
                    flow.step = DeleteStep::Confirm;
                    Ok(TurnOutcome::reply(
                        Some(DialogFlow::DeletePost(flow)),
                        message,
                    ))
                }
                Err(reprompt) => Ok(TurnOutcome::reply(
                    Some(DialogFlow::DeletePost(flow)),
                    reprompt,
                )),
            },
            DeleteStep::Confirm => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                }
                let Some(selected) = flow.selected else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                match self.store.delete_post(selected.id).await {
                    Ok(()) => Ok(TurnOutcome::committed(format!(
                        "Deleted \"{}\". What else can I help you with?",
                        selected.title
                    ))),
                    Err(e) => Ok(TurnOutcome::reply(
                        None,
                        format!("Something went wrong deleting that: {e}"),
                    )),
                }
            }
        }
    }

    pub(crate) async fn start_delete_resource(&self) -> Result<TurnOutcome> {
        let options = self.store.list_recent_resources(MAX_LISTED).await?;
        if options.is_empty() {
            return Ok(TurnOutcome::reply(
                None,
                "There are no resources to delete.",
            ));
        }
        let message = format!(
            "Which resource should I delete?\n{}\nReply with its number.",
            numbered(&options, resource_line)
        );
        Ok(TurnOutcome::reply(
            Some(DialogFlow::DeleteResource(DeleteResourceFlow {
                step: DeleteStep::Select,
                options,
                selected: None,
            })),
            message,
        ))
    }

    pub(crate) async fn advance_delete_resource(
        &self,
        mut flow: DeleteResourceFlow,
        turn: &Utterance,
    ) -> Result<TurnOutcome> {
        let text = turn.text.trim();
        match flow.step {
            DeleteStep::Select => match parse_selection(text, flow.options.len()) {
                Ok(n) => {
                    let selected = flow.options[n - 1].clone();
                    let message = format!(
                        "This will permanently delete \"{}\". Are you sure? (yes/no)",
                        selected.title
                    );
                    flow.selected = Some(selected);
                    flow.step = DeleteStep::Confirm;
                    Ok(TurnOutcome::reply(
                        Some(DialogFlow::DeleteResource(flow)),
                        message,
                    ))
                }
                Err(reprompt) => Ok(TurnOutcome::reply(
                    Some(DialogFlow::DeleteResource(flow)),
                    reprompt,
                )),
            },
            DeleteStep::Confirm => {
                if !is_affirmative(text) {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                }
                let Some(selected) = flow.selected else {
                    return Ok(TurnOutcome::reply(None, DECLINED));
                };
                match self.store.delete_resource(selected.id).await {
                    Ok(()) => Ok(TurnOutcome::committed(format!(
                        "Deleted \"{}\". What else can I help you with?",
                        selected.title
                    ))),
                    Err(e) => Ok(TurnOutcome::reply(
                        None,
                        format!("Something went wrong deleting that: {e}"),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event() -> EventRecord {
        EventRecord {
            id: 1,
            title: "Film Bar AI".into(),
            description: Some("Weekly screening".into()),
            event_date: NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(),
            url: None,
        }
    }

    #[test]
    fn time_change_appends_to_existing_description() {
        let changes = EventChanges {
            time: Some("7pm".into()),
            ..Default::default()
        };
        let patch = event_patch_from(&event(), changes);
        assert_eq!(
            patch.description.as_deref(),
            Some("Weekly screening | Time: 7pm")
        );
    }

    #[test]
    fn time_change_appends_to_new_description_when_both_given() {
        let changes = EventChanges {
            description: Some("Now monthly".into()),
            time: Some("7pm".into()),
            ..Default::default()
        };
        let patch = event_patch_from(&event(), changes);
        assert_eq!(patch.description.as_deref(), Some("Now monthly | Time: 7pm"));
    }

    #[test]
    fn change_summary_shows_old_and_new() {
        let changes = EventChanges {
            title: Some("AI Film Night".into()),
            ..Default::default()
        };
        let summary = event_change_summary(&event(), &changes);
        assert!(summary.contains("\"Film Bar AI\" → \"AI Film Night\""));
        assert!(summary.ends_with("Apply these changes? (yes/no)"));
    }

    #[test]
    fn numbered_list_is_one_based() {
        let list = numbered(&["a", "b"], |s| s.to_string());
        assert_eq!(list, "1. a\n2. b");
    }
}
