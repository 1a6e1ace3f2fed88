use crate::error::{google_calendar_error, SchedulerResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use super::models::CalendarEvent;

/// Default length for an event whose original duration is unknown
pub const FALLBACK_DURATION_MINUTES: i64 = 60;

fn parse_point(date_time: Option<&str>, date: Option<&str>) -> SchedulerResult<Option<NaiveDateTime>> {
    if let Some(date_time) = date_time {
        let dt = DateTime::parse_from_rfc3339(date_time)
            .map_err(|e| google_calendar_error(&format!("Failed to parse datetime: {}", e)))?;
        Ok(Some(dt.naive_local()))
    } else if let Some(date) = date {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| google_calendar_error(&format!("Failed to parse date: {}", e)))?;
        Ok(Some(date.and_time(NaiveTime::MIN)))
    } else {
        Ok(None)
    }
}

/// Event start as wall-clock time in the offset the API returned it in;
/// all-day events start at midnight
pub fn get_event_start(event: &CalendarEvent) -> SchedulerResult<Option<NaiveDateTime>> {
    parse_point(event.start_date_time.as_deref(), event.start_date.as_deref())
}

/// Event end, read the same way as the start
pub fn get_event_end(event: &CalendarEvent) -> SchedulerResult<Option<NaiveDateTime>> {
    parse_point(event.end_date_time.as_deref(), event.end_date.as_deref())
}

/// Duration kept when an event is moved. All-day events and events with
/// unreadable bounds fall back to one hour.
pub fn reschedule_duration(event: &CalendarEvent) -> Duration {
    let fallback = Duration::minutes(FALLBACK_DURATION_MINUTES);
    if event.start_date_time.is_none() || event.end_date_time.is_none() {
        return fallback;
    }
    match (get_event_start(event), get_event_end(event)) {
        (Ok(Some(start)), Ok(Some(end))) if end >= start => end - start,
        _ => fallback,
    }
}
