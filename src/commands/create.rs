use crate::components::csv_input::read_templates_from_path;
use crate::components::recurrence::RecurrenceExpander;
use crate::components::EventService;
use crate::error::SchedulerResult;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

/// Counts reported after a create run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateSummary {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub events_created: usize,
    pub events_failed: usize,
}

/// Create every instance of every template in `input`, logging each created
/// event to `output_log`. Bad rows and failed API calls are logged and skipped.
pub async fn create_events(
    service: &dyn EventService,
    expander: &RecurrenceExpander,
    input: &Path,
    output_log: &Path,
) -> SchedulerResult<CreateSummary> {
    let rows = read_templates_from_path(input)?;
    let mut summary = CreateSummary {
        rows_read: rows.len(),
        ..Default::default()
    };

    if let Some(parent) = output_log.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_log)
        .await?;

    for row in rows {
        let template = match row {
            Ok(template) => template,
            Err(e) => {
                warn!("Skipping row: {}", e);
                summary.rows_rejected += 1;
                continue;
            }
        };

        info!("Creating events for '{}'", template.summary);
        for instance in expander.expand(&template) {
            match service.create_event(&instance).await {
                Ok(created) => {
                    let line = format!("Event created for {}: {}\n", instance.date, created.html_link);
                    log.write_all(line.as_bytes()).await?;
                    summary.events_created += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to create '{}' on {}: {}",
                        instance.summary, instance.date, e
                    );
                    summary.events_failed += 1;
                }
            }
        }
    }

    log.flush().await?;
    info!(
        "Create finished: {} rows, {} rejected, {} events created, {} failed",
        summary.rows_read, summary.rows_rejected, summary.events_created, summary.events_failed
    );
    Ok(summary)
}
