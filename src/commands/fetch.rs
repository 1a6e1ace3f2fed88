use crate::components::google_calendar::time::{get_event_end, get_event_start};
use crate::components::{CalendarEvent, DateRange, EventService};
use crate::error::SchedulerResult;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

const HEADER: [&str; 8] = [
    "date",
    "start_time",
    "end_time",
    "weekday",
    "summary",
    "description",
    "attendees",
    "location",
];

/// Write events as CSV rows. Events without a readable start are skipped.
/// Returns the number of rows written.
pub fn write_events_csv<W: Write>(events: &[CalendarEvent], output: W) -> SchedulerResult<usize> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(HEADER)?;

    let mut written = 0;
    for event in events {
        let start = match get_event_start(event) {
            Ok(Some(start)) => start,
            Ok(None) => {
                warn!("Event {} has no start, skipping", event.id);
                continue;
            }
            Err(e) => {
                warn!("Event {} skipped: {}", event.id, e);
                continue;
            }
        };
        let end = get_event_end(event).ok().flatten().unwrap_or(start);

        writer.write_record([
            start.format("%Y-%m-%d").to_string(),
            start.format("%H:%M").to_string(),
            end.format("%H:%M").to_string(),
            start.format("%A").to_string(),
            event.summary.clone().unwrap_or_default(),
            event
                .description
                .clone()
                .unwrap_or_else(|| "No description provided".to_string()),
            event.attendees.join(", "),
            event
                .location
                .clone()
                .unwrap_or_else(|| "No location provided".to_string()),
        ])?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}

/// Fetch all events in `range` and write them to `output`
pub async fn export_events(
    service: &dyn EventService,
    range: DateRange,
    output: &Path,
) -> SchedulerResult<usize> {
    let events = service.list_events(range).await?;

    let mut buffer = Vec::new();
    let written = write_events_csv(&events, &mut buffer)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, buffer).await?;

    info!("Events written to {} ({} rows)", output.display(), written);
    Ok(written)
}
