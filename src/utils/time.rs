use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Date layout used in every CSV file
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time layouts accepted in CSV files, tried in order
const TIME_FORMATS: [&str; 3] = ["%I:%M %p", "%I:%M%p", "%H:%M"];

/// Parse a date in YYYY-MM-DD format
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT).ok()
}

/// Parse a clock time such as "9:30 AM", "9AM" or "21:30"
pub fn parse_time(time_str: &str) -> Option<NaiveTime> {
    let trimmed = time_str.trim();
    let parse = |candidate: &str| {
        TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(candidate, format).ok())
    };

    parse(trimmed).or_else(|| {
        // Hour-only forms like "9AM"; chrono always wants minutes
        let hour_len = trimmed.find(|c: char| !c.is_ascii_digit())?;
        if hour_len == 0 {
            return None;
        }
        let (hour, rest) = trimmed.split_at(hour_len);
        parse(&format!("{}:00{}", hour, rest))
    })
}

/// Resolve a local wall-clock time in `tz`, taking the earlier instant for
/// ambiguous times and skipping forward over DST gaps
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt,
        None => {
            let shifted = naive + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        }
    }
}

/// Midnight at the start of `date` in `tz`
pub fn start_of_day(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    localize(tz, date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-01"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            parse_date(" 2024-02-29 "),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );

        assert_eq!(parse_date("2023-02-29"), None); // Not a leap year
        assert_eq!(parse_date("01/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_time() {
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0);

        assert_eq!(parse_time("9:30 AM"), hm(9, 30));
        assert_eq!(parse_time("09:30 pm"), hm(21, 30));
        assert_eq!(parse_time("12:00 AM"), hm(0, 0));
        assert_eq!(parse_time("7:15PM"), hm(19, 15));
        assert_eq!(parse_time("9AM"), hm(9, 0));
        assert_eq!(parse_time("11 PM"), hm(23, 0));
        assert_eq!(parse_time("21:45"), hm(21, 45));

        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("13:00 PM"), None);
        assert_eq!(parse_time("noon"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn test_start_of_day() {
        let tz: Tz = "Asia/Kolkata".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let start = start_of_day(&tz, date);

        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+05:30");
        assert_eq!(start.hour(), 0);
    }

    #[test]
    fn test_localize_skips_dst_gap() {
        let tz: Tz = "Europe/Helsinki".parse().unwrap();
        // 03:30 does not exist on 2024-03-31 in Helsinki
        let naive = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(3, 30, 0)
            .unwrap();

        let resolved = localize(&tz, naive);
        assert_eq!(resolved.to_rfc3339(), "2024-03-31T04:30:00+03:00");
    }

    #[test]
    fn test_localize_takes_earlier_ambiguous_instant() {
        let tz: Tz = "Europe/Helsinki".parse().unwrap();
        // 03:30 happens twice on 2024-10-27 in Helsinki
        let naive = NaiveDate::from_ymd_opt(2024, 10, 27)
            .unwrap()
            .and_hms_opt(3, 30, 0)
            .unwrap();

        let resolved = localize(&tz, naive);
        assert_eq!(resolved.to_rfc3339(), "2024-10-27T03:30:00+03:00");
    }
}
