//! Free-text date expression parsing.
//!
//! `parse_date` recognizes, in priority order: exact literals ("today",
//! "tomorrow", "day after tomorrow"), qualified or bare weekday names
//! ("next tuesday", "friday"), relative offsets ("in 2 weeks", "in a
//! month"), "Month Day[, Year]" with past dates rolling into next year,
//! "[end of] Month Year", and finally literal `YYYY-MM-DD` / `M/D/YYYY`
//! strings. Anything else is `None`; callers re-prompt instead of failing.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use regex::Regex;
use std::sync::LazyLock;

static RE_IN_N: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^in\s+(\d+|an?)\s+(day|week|month)s?$").expect("in-n regex"));

static RE_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:next|this(?:\s+coming)?)\s+)?([a-z]+)$").expect("weekday regex")
});

static RE_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?$")
        .expect("month-day regex")
});

static RE_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:end\s+of\s+)?([a-z]+)\.?\s+(\d{4})$").expect("month-year regex")
});

/// Next future occurrence of `day`, never the reference date itself.
pub fn next_occurrence(day: Weekday, reference: NaiveDate) -> NaiveDate {
    let current = reference.weekday().num_days_from_sunday() as i64;
    let target = day.num_days_from_sunday() as i64;
    let mut days_until = target - current;
    if days_until <= 0 {
        days_until += 7;
    }
    reference + Days::new(days_until as u64)
}

/// Accepts full weekday names and common prefixes ("tue", "tues", "thurs").
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    let s = s.trim().to_lowercase();
    // get() handles multibyte input where ..3 is not a char boundary.
    let day = match s.get(..3)? {
        "sun" => Weekday::Sun,
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        _ => return None,
    };
    Some(day)
}

fn month_from_name(s: &str) -> Option<u32> {
    let month = match s.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))
}

pub fn parse_date(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let normalized = text
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    match normalized.as_str() {
        "today" => return Some(reference),
        "tomorrow" => return reference.checked_add_days(Days::new(1)),
        "day after tomorrow" => return reference.checked_add_days(Days::new(2)),
        _ => {}
    }

    if let Some(caps) = RE_WEEKDAY.captures(&normalized) {
        if let Some(day) = parse_weekday(&caps[1]) {
            return Some(next_occurrence(day, reference));
        }
    }

    if let Some(caps) = RE_IN_N.captures(&normalized) {
        let n: u32 = match &caps[1] {
            "a" | "an" => 1,
            digits => digits.parse().ok()?,
        };
        return match &caps[2] {
            "day" => reference.checked_add_days(Days::new(n as u64)),
            "week" => reference.checked_add_days(Days::new(n as u64 * 7)),
            // Calendar month arithmetic: day-of-month clamps at month end.
            "month" => reference.checked_add_months(Months::new(n)),
            _ => None,
        };
    }

    if let Some(caps) = RE_MONTH_DAY.captures(&normalized) {
        if let Some(month) = month_from_name(&caps[1]) {
            let day: u32 = caps[2].parse().ok()?;
            if let Some(year_str) = caps.get(3) {
                let year: i32 = year_str.as_str().parse().ok()?;
                return NaiveDate::from_ymd_opt(year, month, day);
            }
            // No year given: this year if still ahead, else roll forward.
            let this_year = NaiveDate::from_ymd_opt(reference.year(), month, day)?;
            return if this_year >= reference {
                Some(this_year)
            } else {
                NaiveDate::from_ymd_opt(reference.year() + 1, month, day)
            };
        }
    }

    if let Some(caps) = RE_MONTH_YEAR.captures(&normalized) {
        if let Some(month) = month_from_name(&caps[1]) {
            let year: i32 = caps[2].parse().ok()?;
            return last_day_of_month(year, month);
        }
    }

    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, format) {
            return Some(date);
        }
    }

    None
}

/// Render a date the way summaries show it ("March 5, 2026"). The output
/// feeds back through `parse_date` unchanged.
pub fn human_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Monday.
    const REF: (i32, u32, u32) = (2026, 1, 5);

    fn reference() -> NaiveDate {
        date(REF.0, REF.1, REF.2)
    }

    #[test]
    fn literals() {
        assert_eq!(parse_date("today", reference()), Some(date(2026, 1, 5)));
        assert_eq!(parse_date("Tomorrow", reference()), Some(date(2026, 1, 6)));
        assert_eq!(
            parse_date("day after tomorrow", reference()),
            Some(date(2026, 1, 7))
        );
    }

    #[test]
    fn next_occurrence_is_strictly_future_and_within_a_week() {
        let all = [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ];
        for offset in 0..14u64 {
            let from = reference() + Days::new(offset);
            for day in all {
                let next = next_occurrence(day, from);
                assert!(next > from);
                assert!((next - from).num_days() <= 7);
                assert_eq!(next.weekday(), day);
            }
        }
    }

    #[test]
    fn bare_weekday_never_resolves_to_today() {
        // Reference is a Monday; "monday" means next week's Monday.
        assert_eq!(parse_date("monday", reference()), Some(date(2026, 1, 12)));
        assert_eq!(parse_date("tuesday", reference()), Some(date(2026, 1, 6)));
    }

    #[test]
    fn qualified_weekdays() {
        assert_eq!(
            parse_date("next Tuesday", reference()),
            Some(date(2026, 1, 6))
        );
        assert_eq!(
            parse_date("this coming friday", reference()),
            Some(date(2026, 1, 9))
        );
        assert_eq!(parse_date("this sat", reference()), Some(date(2026, 1, 10)));
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(parse_date("in 3 days", reference()), Some(date(2026, 1, 8)));
        assert_eq!(
            parse_date("in 2 weeks", reference()),
            Some(date(2026, 1, 19))
        );
        assert_eq!(parse_date("in a week", reference()), Some(date(2026, 1, 12)));
        assert_eq!(
            parse_date("in an hour", reference()),
            None,
            "unknown unit is not a date"
        );
    }

    #[test]
    fn month_arithmetic_clamps_at_month_end() {
        assert_eq!(
            parse_date("in 1 month", date(2026, 1, 31)),
            Some(date(2026, 2, 28))
        );
    }

    #[test]
    fn month_day_rolls_past_dates_forward() {
        assert_eq!(
            parse_date("March 15", reference()),
            Some(date(2026, 3, 15))
        );
        // January 2 already passed relative to January 5.
        assert_eq!(parse_date("january 2", reference()), Some(date(2027, 1, 2)));
        assert_eq!(
            parse_date("March 15, 2027", reference()),
            Some(date(2027, 3, 15))
        );
        assert_eq!(parse_date("june 3rd", reference()), Some(date(2026, 6, 3)));
    }

    #[test]
    fn month_year_resolves_to_last_day() {
        assert_eq!(
            parse_date("december 2026", reference()),
            Some(date(2026, 12, 31))
        );
        assert_eq!(
            parse_date("end of February 2028", reference()),
            Some(date(2028, 2, 29))
        );
    }

    #[test]
    fn literal_fallbacks() {
        assert_eq!(
            parse_date("2026-07-04", reference()),
            Some(date(2026, 7, 4))
        );
        assert_eq!(
            parse_date("7/4/2026", reference()),
            Some(date(2026, 7, 4))
        );
    }

    #[test]
    fn unparseable_returns_none() {
        assert_eq!(parse_date("whenever works", reference()), None);
        assert_eq!(parse_date("", reference()), None);
        assert_eq!(parse_date("the 32nd of marchtober", reference()), None);
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        assert_eq!(parse_weekday("éé"), None);
        assert_eq!(parse_weekday("år"), None);
        assert_eq!(parse_date("ééé 2026", reference()), None);
        assert_eq!(parse_date("ééé 15", reference()), None);
    }

    #[test]
    fn human_date_round_trips() {
        for d in [date(2026, 3, 5), date(2026, 12, 31), date(2027, 1, 1)] {
            let rendered = human_date(d);
            assert_eq!(parse_date(&rendered, reference()), Some(d), "{rendered}");
        }
    }
}
