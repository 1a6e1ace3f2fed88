use super::weekdays::WeekdaySet;
use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;

/// How a recurring template is bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceEnd {
    /// Last date that may hold an occurrence, inclusive
    Until(NaiveDate),
    /// Requested number of occurrences, approximated in whole weeks
    Count(u32),
}

/// One input row describing a recurring event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end: RecurrenceEnd,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub weekdays: WeekdaySet,
    pub attendees: Vec<String>,
    pub category: String,
    pub map_link: Option<String>,
}

impl EventTemplate {
    /// Template with the scheduling fields set and every text field empty
    pub fn new(
        summary: impl Into<String>,
        start_date: NaiveDate,
        end: RecurrenceEnd,
        start_time: NaiveTime,
        end_time: NaiveTime,
        weekdays: WeekdaySet,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: String::new(),
            location: String::new(),
            start_date,
            end,
            start_time,
            end_time,
            weekdays,
            attendees: Vec::new(),
            category: String::new(),
            map_link: None,
        }
    }
}

/// An invited guest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub email: String,
    pub display_name: String,
    pub response_status: String,
}

impl Attendee {
    /// New invitee awaiting a response, named after the address local part
    pub fn invite(email: &str) -> Self {
        let display_name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            email: email.to_string(),
            display_name,
            response_status: "needsAction".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderMethod {
    Email,
    Popup,
}

impl ReminderMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderMethod::Email => "email",
            ReminderMethod::Popup => "popup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reminder {
    pub method: ReminderMethod,
    pub minutes: u32,
}

/// Reminder overrides attached to every created event
pub const DEFAULT_REMINDERS: [Reminder; 2] = [
    Reminder {
        method: ReminderMethod::Email,
        minutes: 60,
    },
    Reminder {
        method: ReminderMethod::Popup,
        minutes: 30,
    },
];

/// One concrete occurrence of a template
#[derive(Debug, Clone, PartialEq)]
pub struct EventInstance {
    pub date: NaiveDate,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub attendees: Vec<Attendee>,
    pub color_id: Option<String>,
    pub reminders: Vec<Reminder>,
}
