use super::{open_csv, row_number, split_list};
use crate::components::recurrence::{parse_weekday, EventTemplate, RecurrenceEnd, WeekdaySet};
use crate::error::{input_format_error, SchedulerResult};
use crate::utils::time::{parse_date, parse_time};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Raw template row as it appears in the CSV file
#[derive(Debug, Default, Deserialize)]
pub struct TemplateRow {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    #[serde(alias = "end_date/number_of_washes", alias = "end_date")]
    pub end_date_or_count: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub weekdays: Option<String>,
    pub attendees: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
    #[serde(alias = "gmap_link")]
    pub map_link: Option<String>,
}

fn required<'a>(row: usize, value: &'a Option<String>, column: &str) -> SchedulerResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(input_format_error(row, format!("missing required column '{}'", column))),
    }
}

fn parse_end(row: usize, value: &str) -> SchedulerResult<RecurrenceEnd> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        let count = value
            .parse::<u32>()
            .map_err(|_| input_format_error(row, format!("occurrence count '{}' is too large", value)))?;
        if count == 0 {
            return Err(input_format_error(row, "occurrence count must be at least 1"));
        }
        return Ok(RecurrenceEnd::Count(count));
    }

    parse_date(value)
        .map(RecurrenceEnd::Until)
        .ok_or_else(|| {
            input_format_error(
                row,
                format!("'{}' is neither an end date (YYYY-MM-DD) nor an occurrence count", value),
            )
        })
}

/// Validate one raw row and turn it into a template
pub fn parse_template(row: usize, raw: &TemplateRow) -> SchedulerResult<EventTemplate> {
    let summary = required(row, &raw.summary, "summary")?;

    let start_str = required(row, &raw.start_date, "start_date")?;
    let start_date = parse_date(start_str)
        .ok_or_else(|| input_format_error(row, format!("invalid start_date '{}'", start_str)))?;

    let end = parse_end(row, required(row, &raw.end_date_or_count, "end_date_or_count")?)?;
    if let RecurrenceEnd::Until(end_date) = end {
        if end_date < start_date {
            return Err(input_format_error(
                row,
                format!("end date {} is before start date {}", end_date, start_date),
            ));
        }
    }

    let start_str = required(row, &raw.start_time, "start_time")?;
    let start_time = parse_time(start_str)
        .ok_or_else(|| input_format_error(row, format!("invalid start_time '{}'", start_str)))?;
    let end_str = required(row, &raw.end_time, "end_time")?;
    let end_time = parse_time(end_str)
        .ok_or_else(|| input_format_error(row, format!("invalid end_time '{}'", end_str)))?;

    let mut weekdays = WeekdaySet::empty();
    for code in split_list(required(row, &raw.weekdays, "weekdays")?) {
        let day = parse_weekday(code)
            .ok_or_else(|| input_format_error(row, format!("unrecognized weekday code '{}'", code)))?;
        weekdays.insert(day);
    }
    if weekdays.is_empty() {
        return Err(input_format_error(row, "no weekdays given"));
    }

    let attendees = raw
        .attendees
        .as_deref()
        .map(|list| split_list(list).into_iter().map(str::to_string).collect())
        .unwrap_or_default();

    // Only the first of several '|'-separated types selects the color
    let category = raw
        .category
        .as_deref()
        .and_then(|types| types.split('|').map(str::trim).next())
        .unwrap_or_default()
        .to_string();

    let map_link = raw
        .map_link
        .as_deref()
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(str::to_string);

    Ok(EventTemplate {
        summary: summary.to_string(),
        description: raw.description.clone().unwrap_or_default(),
        location: raw.location.clone().unwrap_or_default(),
        start_date,
        end,
        start_time,
        end_time,
        weekdays,
        attendees,
        category,
        map_link,
    })
}

/// Read every template row; one result per data row so that a bad row does
/// not stop the rest of the batch
pub fn read_templates<R: Read>(input: R) -> SchedulerResult<Vec<SchedulerResult<EventTemplate>>> {
    let mut reader = open_csv(input);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let result = match record {
            Ok(record) => {
                let row = row_number(&record, index);
                record
                    .deserialize::<TemplateRow>(Some(&headers))
                    .map_err(|e| input_format_error(row, e.to_string()))
                    .and_then(|raw| parse_template(row, &raw))
            }
            Err(e) => Err(input_format_error(index + 2, e.to_string())),
        };
        rows.push(result);
    }

    debug!("Read {} template rows", rows.len());
    Ok(rows)
}

/// Read templates from a CSV file on disk
pub fn read_templates_from_path(path: &Path) -> SchedulerResult<Vec<SchedulerResult<EventTemplate>>> {
    let file = std::fs::File::open(path)?;
    read_templates(file)
}
