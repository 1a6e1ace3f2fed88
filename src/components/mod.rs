use crate::error::{config_error, SchedulerResult};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

// Export components
pub mod csv_input;
pub mod google_calendar;
pub mod recurrence;

// Re-export Google Calendar handle
pub use google_calendar::{CalendarEvent, GoogleCalendarHandle};
use recurrence::EventInstance;

/// Inclusive range of calendar days, read in the calendar's timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> SchedulerResult<Self> {
        if end < start {
            return Err(config_error(&format!(
                "Date range ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering a single day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }
}

/// Result of creating one remote event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: String,
}

/// Remote calendar operations used by the workflows.
///
/// Authentication and token refresh are the implementation's concern; callers
/// only see success or an error per call.
#[async_trait]
pub trait EventService: Send + Sync {
    /// Create one event and return its remote id and link
    async fn create_event(&self, instance: &EventInstance) -> SchedulerResult<CreatedEvent>;

    /// All single events starting inside `range`, ordered by start time
    async fn list_events(&self, range: DateRange) -> SchedulerResult<Vec<CalendarEvent>>;

    /// Move an event so it starts at `new_date new_time`, keeping its duration
    async fn update_event(
        &self,
        event_id: &str,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> SchedulerResult<CalendarEvent>;
}
