//! Free-text edit instructions ("change the title to X") broken into
//! field-level changes.
//!
//! Each field tries an ordered list of extractors — a verb form
//! (`change/set/update ... <field> to/as <value>`) and a `field: value`
//! shorthand — first hit wins for that field. Only fields explicitly
//! mentioned appear in the result; an empty result tells the flow to
//! re-prompt with examples.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use makershub_schema::{PostPatch, ResourcePatch};

use crate::dates::parse_date;

/// Field changes for an event. `time` never maps to a column: the flow
/// appends it to the description as `" | Time: <value>"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventChanges {
    pub title: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub time: Option<String>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.event_date.is_none()
            && self.description.is_none()
            && self.url.is_none()
            && self.time.is_none()
    }
}

fn field_patterns(aliases: &[&str]) -> Vec<Regex> {
    let mut patterns = Vec::new();
    for alias in aliases {
        let alias = alias.replace(' ', r"\s+");
        patterns.push(
            Regex::new(&format!(
                r"(?i)\b(?:change|set|update|make|rename|modify|move|reschedule|adjust|fix)\s+(?:the\s+|my\s+|its\s+)?(?:{alias})\s+(?:to|as)\s+(.+)$"
            ))
            .expect("verb pattern"),
        );
        patterns.push(
            Regex::new(&format!(r"(?i)\b(?:{alias})\s*:\s*(.+)$")).expect("shorthand pattern"),
        );
    }
    patterns
}

macro_rules! field {
    ($name:ident, $($alias:literal),+) => {
        static $name: LazyLock<Vec<Regex>> =
            LazyLock::new(|| field_patterns(&[$($alias),+]));
    };
}

field!(EVENT_TITLE, "title", "name");
field!(EVENT_DATE, "event date", "date", "day");
field!(EVENT_DESCRIPTION, "description", "details");
field!(EVENT_URL, "url", "link");
field!(EVENT_TIME, "time");

field!(POST_TITLE, "title", "headline");
field!(POST_CONTENT, "content", "body", "text");
field!(POST_EXCERPT, "excerpt", "summary");
field!(POST_VIDEO_URL, "video url", "video link", "video");

field!(RESOURCE_TITLE, "title", "name");
field!(RESOURCE_DESCRIPTION, "description", "details");
field!(RESOURCE_URL, "url", "link");

/// A follow-up clause chained with "and" belongs to the next instruction,
/// not to this value.
static RE_AND_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s+and\s+(?:change|set|update|add|make|rename|modify|move|reschedule|adjust|fix|the)\b.*$",
    )
    .expect("and-clause regex")
});

fn clean_value(raw: &str) -> Option<String> {
    let cut = RE_AND_CLAUSE.replace(raw, "");
    let mut value = cut.trim().trim_end_matches('.').trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            value = value[1..value.len() - 1].trim();
        }
    }
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn extract(text: &str, patterns: &[Regex]) -> Option<String> {
    for re in patterns {
        if let Some(caps) = re.captures(text) {
            if let Some(value) = clean_value(&caps[1]) {
                return Some(value);
            }
        }
    }
    None
}

pub fn parse_event_changes(text: &str, reference: NaiveDate) -> EventChanges {
    EventChanges {
        title: extract(text, &EVENT_TITLE),
        // Date changes only count when the value actually parses.
        event_date: extract(text, &EVENT_DATE).and_then(|v| parse_date(&v, reference)),
        description: extract(text, &EVENT_DESCRIPTION),
        url: extract(text, &EVENT_URL),
        time: extract(text, &EVENT_TIME),
    }
}

pub fn parse_post_changes(text: &str) -> PostPatch {
    PostPatch {
        title: extract(text, &POST_TITLE),
        content: extract(text, &POST_CONTENT),
        excerpt: extract(text, &POST_EXCERPT),
        video_url: extract(text, &POST_VIDEO_URL),
    }
}

pub fn parse_resource_changes(text: &str) -> ResourcePatch {
    ResourcePatch {
        title: extract(text, &RESOURCE_TITLE),
        description: extract(text, &RESOURCE_DESCRIPTION),
        url: extract(text, &RESOURCE_URL),
    }
}
