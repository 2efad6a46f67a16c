//! Keyword and pattern based intent detection.
//!
//! An ordered cascade, first match wins: the recurring-event pattern short
//! circuits everything, then action keywords, then content-type keywords,
//! then the default-to-create rule for non-questions. Date/time phrases are
//! only extracted for event intents.

use chrono::NaiveDate;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use makershub_schema::{Action, ContentType, Intent, RecurringPattern};

use crate::dates::{parse_date, parse_weekday};

static RE_RECURRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bevery\s+([a-z]+)\s+(?:through|until|thru|til|up\s+to)\s+(.+?)\s*$")
        .expect("recurring regex")
});

static RE_CREATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(add|new|create|make|set\s+up|schedule|publish|write)\b")
        .expect("create regex")
});

static RE_EDIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(edit|update|change|modify|rename|reschedule|move|fix|adjust)\b")
        .expect("edit regex")
});

static RE_DELETE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(delete|remove|drop|get\s+rid\s+of|take\s+down)\b").expect("delete regex")
});

static RE_EVENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(events?|meetups?|gatherings?|sessions?|happenings?|film\s+bar\s+ai)\b")
        .expect("event regex")
});

static RE_POST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(articles?|posts?|news|announcements?|videos?|stories|story)\b")
        .expect("post regex")
});

static RE_RESOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(resources?|tools?|wiki|ai\s+tools?)\b").expect("resource regex")
});

static RE_PROFILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(profiles?|usernames?|avatars?|bio)\b").expect("profile regex")
});

static RE_FEEDBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(feedback|suggestions?|feature\s+requests?|critiques?|contact\s+admin)\b")
        .expect("feedback regex")
});

static RE_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(who|what|when|where|why|how|tell|about|is|are|does|do)\b")
        .expect("question regex")
});

/// Date phrase candidates, tried in order against the whole utterance.
static RE_DATE_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:on|for)\s+((?:next|this(?:\s+coming)?)\s+[a-z]+)\b",
        r"(?i)\b(day\s+after\s+tomorrow|today|tomorrow)\b",
        r"(?i)\b((?:next|this(?:\s+coming)?)\s+(?:sun|mon|tue|wed|thu|fri|sat)[a-z]*)\b",
        r"(?i)\b(?:on|for)\s+([a-z]+\s+\d{1,2}(?:st|nd|rd|th)?(?:,?\s+\d{4})?)\b",
        r"(?i)\b(in\s+(?:\d+|an?)\s+(?:days?|weeks?|months?))\b",
        r"(?i)\b(?:on|for)\s+((?:sun|mon|tue|wed|thu|fri|sat)[a-z]*)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("date phrase regex"))
    .collect()
});

static RE_TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:at\s+|from\s+)?(\d{1,2}(?::\d{2})?\s*(?:am|pm)?\s*(?:-|–|to|until)\s*\d{1,2}(?::\d{2})?\s*(?:am|pm))\b",
    )
    .expect("time range regex")
});

static RE_TIME_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:at\s+)?(\d{1,2}(?::\d{2})?\s*(?:am|pm))\b").expect("time regex")
});

static RE_TITLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:a|an|the)\s+)?(?:new\s+)?(?:event|meetup|gathering|session)\b\s*(?:called|named|titled|for)?\s*:?\s*",
    )
    .expect("title prefix regex")
});

static RE_TITLE_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:on|for|at|called|named)\s*$").expect("title trailer regex")
});

pub fn classify(text: &str, reference: NaiveDate) -> Intent {
    if let Some(caps) = RE_RECURRING.captures(text) {
        let day = parse_weekday(&caps[1]);
        let end = parse_date(&caps[2], reference);
        if let (Some(day_of_week), Some(end_date)) = (day, end) {
            let mut stripped: Vec<Range<usize>> = Vec::new();
            if let Some(m) = caps.get(0) {
                stripped.push(m.range());
            }
            if let Some(m) = action_match_range(text) {
                stripped.push(m);
            }
            let extracted_title = extract_title(text, &stripped);
            return Intent {
                action: Action::Create,
                content_type: ContentType::Event,
                recurring: Some(RecurringPattern {
                    day_of_week,
                    end_date,
                }),
                extracted_title,
                extracted_date: None,
                extracted_time: extract_time(text).map(|(_, t)| t),
            };
        }
    }

    let mut action = detect_action(text);
    let content_type = detect_content(text);

    // Default-to-create: a content noun without an action word or a
    // question word reads as a creation request. Known false-positive
    // source for sentences that merely mention a content noun.
    if action == Action::None && content_type != ContentType::None && !RE_QUESTION.is_match(text) {
        action = Action::Create;
    }

    let mut intent = Intent {
        action,
        content_type,
        recurring: None,
        extracted_title: None,
        extracted_date: None,
        extracted_time: None,
    };

    if content_type == ContentType::Event {
        let date_match = extract_date(text, reference);
        let time_match = extract_time(text);
        if let Some((_, date)) = &date_match {
            intent.extracted_date = Some(*date);
        }
        if let Some((_, time)) = &time_match {
            intent.extracted_time = Some(time.clone());
        }
        if action == Action::Create {
            let mut stripped: Vec<Range<usize>> = Vec::new();
            if let Some(m) = action_match_range(text) {
                stripped.push(m);
            }
            if let Some((range, _)) = date_match {
                stripped.push(range);
            }
            if let Some((range, _)) = time_match {
                stripped.push(range);
            }
            intent.extracted_title = extract_title(text, &stripped);
        }
    }

    intent
}

fn detect_action(text: &str) -> Action {
    if RE_CREATE.is_match(text) {
        Action::Create
    } else if RE_EDIT.is_match(text) {
        Action::Edit
    } else if RE_DELETE.is_match(text) {
        Action::Delete
    } else {
        Action::None
    }
}

fn detect_content(text: &str) -> ContentType {
    if RE_EVENT.is_match(text) {
        ContentType::Event
    } else if RE_POST.is_match(text) {
        ContentType::Post
    } else if RE_RESOURCE.is_match(text) {
        ContentType::Resource
    } else if RE_PROFILE.is_match(text) {
        ContentType::Profile
    } else if RE_FEEDBACK.is_match(text) {
        ContentType::Feedback
    } else {
        ContentType::None
    }
}

fn action_match_range(text: &str) -> Option<Range<usize>> {
    for re in [&*RE_CREATE, &*RE_EDIT, &*RE_DELETE] {
        if let Some(m) = re.find(text) {
            return Some(m.range());
        }
    }
    None
}

/// First date phrase that actually parses, with the full matched range
/// (preposition included) so title stripping can remove it.
fn extract_date(text: &str, reference: NaiveDate) -> Option<(Range<usize>, NaiveDate)> {
    for re in RE_DATE_PHRASES.iter() {
        if let Some(caps) = re.captures(text) {
            let phrase = caps.get(1)?;
            if let Some(date) = parse_date(phrase.as_str(), reference) {
                let whole = caps.get(0)?;
                return Some((whole.range(), date));
            }
        }
    }
    None
}

fn extract_time(text: &str) -> Option<(Range<usize>, String)> {
    for re in [&*RE_TIME_RANGE, &*RE_TIME_SINGLE] {
        if let Some(caps) = re.captures(text) {
            let phrase = caps.get(1)?;
            let whole = caps.get(0)?;
            return Some((whole.range(), phrase.as_str().trim().to_string()));
        }
    }
    None
}

/// Best-effort title: drop the given fragments from the utterance, peel
/// leading "a new event called ..." noise, and reject anything shorter
/// than 3 characters.
fn extract_title(text: &str, stripped: &[Range<usize>]) -> Option<String> {
    let mut remainder = String::new();
    for (i, ch) in text.char_indices() {
        if stripped.iter().any(|r| r.contains(&i)) {
            continue;
        }
        remainder.push(ch);
    }

    let mut title = remainder.trim().to_string();
    title = RE_TITLE_PREFIX.replace(&title, "").to_string();
    loop {
        let trimmed = RE_TITLE_TRAILER.replace(&title, "").to_string();
        if trimmed == title {
            break;
        }
        title = trimmed;
    }
    let title = title
        .trim()
        .trim_matches(['"', '\'', ',', ':', '.'])
        .trim()
        .to_string();

    if title.chars().count() < 3 {
        None
    } else {
        Some(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        // Monday.
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[test]
    fn recurring_pattern_short_circuits() {
        let intent = classify("every tuesday through december 2026", reference());
        assert_eq!(intent.action, Action::Create);
        assert_eq!(intent.content_type, ContentType::Event);
        let pattern = intent.recurring.unwrap();
        assert_eq!(pattern.day_of_week, chrono::Weekday::Tue);
        assert_eq!(
            pattern.end_date,
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
        );
        assert!(intent.extracted_title.is_none());
    }

    #[test]
    fn recurring_pattern_keeps_leading_title() {
        let intent = classify("Film Bar AI every Tuesday until March 2026", reference());
        let pattern = intent.recurring.expect("recurring");
        assert_eq!(pattern.day_of_week, chrono::Weekday::Tue);
        assert_eq!(intent.extracted_title.as_deref(), Some("Film Bar AI"));
    }

    #[test]
    fn recurring_with_bad_date_falls_through() {
        let intent = classify("every tuesday through whenever", reference());
        assert!(intent.recurring.is_none());
        // Still an event creation via keywords? "every tuesday through
        // whenever" has no action/content keywords at all.
        assert!(intent.is_none());
    }

    #[test]
    fn action_and_content_keywords() {
        let intent = classify("delete the old announcement", reference());
        assert_eq!(intent.action, Action::Delete);
        assert_eq!(intent.content_type, ContentType::Post);

        let intent = classify("update my profile", reference());
        assert_eq!(intent.action, Action::Edit);
        assert_eq!(intent.content_type, ContentType::Profile);

        let intent = classify("add a resource to the wiki", reference());
        assert_eq!(intent.action, Action::Create);
        assert_eq!(intent.content_type, ContentType::Resource);
    }

    #[test]
    fn default_to_create_for_non_questions() {
        let intent = classify("feedback: the calendar looks great", reference());
        assert_eq!(intent.action, Action::Create);
        assert_eq!(intent.content_type, ContentType::Feedback);
    }

    #[test]
    fn questions_do_not_default_to_create() {
        let intent = classify("what events are coming up", reference());
        assert_eq!(intent.action, Action::None);
        assert_eq!(intent.content_type, ContentType::Event);

        let intent = classify("tell me about film bar ai", reference());
        assert_eq!(intent.action, Action::None);
    }

    #[test]
    fn smart_event_extraction() {
        let intent = classify("schedule Film Bar AI for next Tuesday", reference());
        assert_eq!(intent.action, Action::Create);
        assert_eq!(intent.content_type, ContentType::Event);
        assert_eq!(
            intent.extracted_date,
            Some(NaiveDate::from_ymd_opt(2026, 1, 6).unwrap())
        );
        assert_eq!(intent.extracted_title.as_deref(), Some("Film Bar AI"));
        assert!(intent.extracted_time.is_none());
    }

    #[test]
    fn event_time_range_extraction() {
        let intent = classify(
            "create a meetup called Hack Night tomorrow from 6-10pm",
            reference(),
        );
        assert_eq!(
            intent.extracted_date,
            Some(NaiveDate::from_ymd_opt(2026, 1, 6).unwrap())
        );
        assert_eq!(intent.extracted_time.as_deref(), Some("6-10pm"));
        assert_eq!(intent.extracted_title.as_deref(), Some("Hack Night"));
    }

    #[test]
    fn short_title_leftover_is_rejected() {
        let intent = classify("schedule an event tomorrow", reference());
        assert_eq!(intent.action, Action::Create);
        assert_eq!(intent.content_type, ContentType::Event);
        assert!(intent.extracted_title.is_none());
    }

    #[test]
    fn no_keywords_yields_none() {
        let intent = classify("hello there", reference());
        assert!(intent.is_none());
        let intent = classify("cancel", reference());
        assert!(intent.is_none(), "bare cancel is not an intent");
    }

    #[test]
    fn classification_is_idempotent() {
        let a = classify("publish a news story about the demo", reference());
        let b = classify("publish a news story about the demo", reference());
        assert_eq!(a, b);
        assert_eq!(a.action, Action::Create);
        assert_eq!(a.content_type, ContentType::Post);
    }
}
