//! Weekly schedule expansion for recurring events.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::dates::next_occurrence;

/// Expand a weekday + end-date pattern into concrete dates: the next
/// occurrence strictly after `reference`, then every 7 days through
/// `end_date` inclusive. Empty when the first occurrence already falls
/// past the end date.
pub fn generate(day_of_week: Weekday, end_date: NaiveDate, reference: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = next_occurrence(day_of_week, reference);
    while current <= end_date {
        dates.push(current);
        current = current + Days::new(7);
    }
    dates
}
