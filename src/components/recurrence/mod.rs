//! Recurrence expansion: turns one CSV template into dated event instances.

mod colors;
mod expander;
pub mod models;
mod weekdays;

pub use colors::ColorTable;
pub use expander::{is_valid_email, Instances, OccurrenceDates, RecurrenceExpander};
pub use models::{
    Attendee, EventInstance, EventTemplate, RecurrenceEnd, Reminder, ReminderMethod,
    DEFAULT_REMINDERS,
};
pub use weekdays::{parse_weekday, WeekdaySet};
