//! CSV input: template rows for the create workflow and rows for the
//! reschedule workflow.

mod reschedule;
mod templates;

pub use reschedule::{read_reschedule_requests, read_reschedule_requests_from_path, RescheduleRequest};
pub use templates::{parse_template, read_templates, read_templates_from_path, TemplateRow};

use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::io::Read;

fn open_csv<R: Read>(input: R) -> Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input)
}

/// File line of a record, falling back to its position after the header
fn row_number(record: &StringRecord, index: usize) -> usize {
    record
        .position()
        .map(|pos| pos.line() as usize)
        .unwrap_or(index + 2)
}

/// Split a multi-value cell on '|' if present, otherwise on ','
pub fn split_list(cell: &str) -> Vec<&str> {
    let separator = if cell.contains('|') { '|' } else { ',' };
    cell.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}
