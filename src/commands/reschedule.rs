use crate::components::csv_input::read_reschedule_requests_from_path;
use crate::components::google_calendar::time::get_event_start;
use crate::components::{CalendarEvent, DateRange, EventService};
use crate::error::{Error, SchedulerResult};
use chrono::NaiveDate;
use inquire::Select;
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

/// Picks which of a day's events to move
pub trait EventChooser {
    /// Index into `events`, or `None` to leave the day alone
    fn choose(&mut self, date: NaiveDate, events: &[CalendarEvent]) -> SchedulerResult<Option<usize>>;
}

/// "09:00 AM - Summary" line shown for an event
pub fn describe_event(event: &CalendarEvent) -> String {
    let time = match get_event_start(event) {
        Ok(Some(start)) if event.start_date_time.is_some() => start.format("%I:%M %p").to_string(),
        Ok(Some(_)) => "All day".to_string(),
        _ => "--:--".to_string(),
    };
    format!("{} - {}", time, event.summary.as_deref().unwrap_or("(no title)"))
}

enum Choice {
    Event(usize, String),
    Skip,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Event(index, label) => write!(f, "{}. {}", index + 1, label),
            Choice::Skip => write!(f, "Skip this date"),
        }
    }
}

/// Asks on the terminal
#[derive(Debug, Default)]
pub struct PromptChooser;

impl EventChooser for PromptChooser {
    fn choose(&mut self, date: NaiveDate, events: &[CalendarEvent]) -> SchedulerResult<Option<usize>> {
        let mut options: Vec<Choice> = events
            .iter()
            .enumerate()
            .map(|(index, event)| Choice::Event(index, describe_event(event)))
            .collect();
        options.push(Choice::Skip);

        let choice = Select::new(&format!("Which event on {} should move?", date), options).prompt()?;
        Ok(match choice {
            Choice::Event(index, _) => Some(index),
            Choice::Skip => None,
        })
    }
}

/// Counts reported after a reschedule run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescheduleSummary {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub rescheduled: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Work through the reschedule file one row at a time
pub async fn reschedule_events(
    service: &dyn EventService,
    input: &Path,
    chooser: &mut dyn EventChooser,
) -> SchedulerResult<RescheduleSummary> {
    let requests = read_reschedule_requests_from_path(input)?;
    let mut summary = RescheduleSummary {
        rows_read: requests.len(),
        ..Default::default()
    };

    for request in requests {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                warn!("Skipping row: {}", e);
                summary.rows_rejected += 1;
                continue;
            }
        };

        let events = match service.list_events(DateRange::day(request.old_date)).await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to fetch events for {}: {}", request.old_date, e);
                summary.failed += 1;
                continue;
            }
        };

        if events.is_empty() {
            info!(
                "No events found for the date {}. Skipping to the next entry.",
                request.old_date
            );
            summary.skipped += 1;
            continue;
        }

        let choice = match chooser.choose(request.old_date, &events) {
            Ok(choice) => choice,
            // A cancelled picker only skips this row
            Err(e @ Error::Prompt(_)) => {
                warn!("No event chosen for {}: {}", request.old_date, e);
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let index = match choice {
            Some(index) if index < events.len() => index,
            Some(index) => {
                warn!("Ignoring out-of-range choice {} for {}", index + 1, request.old_date);
                summary.skipped += 1;
                continue;
            }
            None => {
                summary.skipped += 1;
                continue;
            }
        };

        let event = &events[index];
        match service
            .update_event(&event.id, request.new_date, request.new_time)
            .await
        {
            Ok(updated) => {
                info!(
                    "Event '{}' rescheduled successfully on {} at {}",
                    updated.summary.as_deref().unwrap_or(&event.id),
                    request.new_date,
                    request.new_time.format("%I:%M %p")
                );
                summary.rescheduled += 1;
            }
            Err(e) => {
                error!("Failed to reschedule event {}: {}", event.id, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Reschedule finished: {} moved, {} skipped, {} rejected, {} failed",
        summary.rescheduled, summary.skipped, summary.rows_rejected, summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_event() {
        let timed = CalendarEvent {
            summary: Some("Wash".to_string()),
            start_date_time: Some("2024-01-01T16:30:00+05:30".to_string()),
            ..Default::default()
        };
        assert_eq!(describe_event(&timed), "04:30 PM - Wash");

        let all_day = CalendarEvent {
            start_date: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert_eq!(describe_event(&all_day), "All day - (no title)");
    }
}
