use super::{open_csv, row_number};
use crate::error::{input_format_error, SchedulerResult};
use crate::utils::time::{parse_date, parse_time};
use chrono::{NaiveDate, NaiveTime};
use std::io::Read;
use std::path::Path;

const OLD_DATE: &str = "Old Date";
const NEW_DATE: &str = "New Date";
const NEW_TIME: &str = "New Time";

/// Move whatever event the user picks on `old_date` to `new_date` at `new_time`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescheduleRequest {
    pub row: usize,
    pub old_date: NaiveDate,
    pub new_date: NaiveDate,
    pub new_time: NaiveTime,
}

/// Read reschedule rows. A missing header rejects the whole file; bad
/// values only reject their own row.
pub fn read_reschedule_requests<R: Read>(
    input: R,
) -> SchedulerResult<Vec<SchedulerResult<RescheduleRequest>>> {
    let mut reader = open_csv(input);
    let headers = reader.headers()?.clone();

    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            input_format_error(
                1,
                format!(
                    "missing header '{}'; expected '{}', '{}' and '{}'",
                    name, OLD_DATE, NEW_DATE, NEW_TIME
                ),
            )
        })
    };
    let old_col = column(OLD_DATE)?;
    let new_col = column(NEW_DATE)?;
    let time_col = column(NEW_TIME)?;

    let mut requests = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                requests.push(Err(input_format_error(index + 2, e.to_string())));
                continue;
            }
        };
        let row = row_number(&record, index);
        let field = |col: usize| record.get(col).unwrap_or("");

        let request = parse_date(field(old_col))
            .zip(parse_date(field(new_col)))
            .ok_or_else(|| input_format_error(row, "invalid date format"))
            .and_then(|(old_date, new_date)| {
                let new_time = parse_time(field(time_col))
                    .ok_or_else(|| input_format_error(row, "invalid time format"))?;
                Ok(RescheduleRequest {
                    row,
                    old_date,
                    new_date,
                    new_time,
                })
            });
        requests.push(request);
    }

    Ok(requests)
}

/// Read reschedule rows from a CSV file on disk
pub fn read_reschedule_requests_from_path(
    path: &Path,
) -> SchedulerResult<Vec<SchedulerResult<RescheduleRequest>>> {
    let file = std::fs::File::open(path)?;
    read_reschedule_requests(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_reads_requests() {
        let csv = "Old Date,New Date,New Time\n\
                   2024-01-08,2024-01-09,4:30 PM\n\
                   2024/01/08,2024-01-09,4:30 PM\n\
                   2024-01-08,2024-01-09,teatime\n";
        let requests = read_reschedule_requests(csv.as_bytes()).unwrap();

        assert_eq!(requests.len(), 3);
        let first = requests[0].as_ref().unwrap();
        assert_eq!(first.old_date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(first.new_date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(first.new_time, NaiveTime::from_hms_opt(16, 30, 0).unwrap());
        assert_eq!(first.row, 2);

        match &requests[1] {
            Err(Error::InputFormat { row, message }) => {
                assert_eq!(*row, 3);
                assert_eq!(message, "invalid date format");
            }
            other => panic!("unexpected {:?}", other),
        }
        match &requests[2] {
            Err(Error::InputFormat { message, .. }) => assert_eq!(message, "invalid time format"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_header_rejects_file() {
        let csv = "Old Date,New Date\n2024-01-08,2024-01-09\n";
        let err = read_reschedule_requests(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InputFormat { row: 1, .. }));
    }
}
