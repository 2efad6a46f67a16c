//! Natural-language parsing for the community assistant.
//!
//! Everything in this crate is pure: free text in, structured values out,
//! `None` on failure. No I/O, no clocks — callers pass the reference date.

pub mod changes;
pub mod dates;
pub mod intent;
pub mod recurring;

pub use changes::{parse_event_changes, parse_post_changes, parse_resource_changes, EventChanges};
pub use dates::{human_date, next_occurrence, parse_date, parse_weekday};
pub use intent::classify;
pub use recurring::generate;
