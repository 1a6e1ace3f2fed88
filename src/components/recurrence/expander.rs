use super::colors::ColorTable;
use super::models::{Attendee, EventInstance, EventTemplate, RecurrenceEnd, DEFAULT_REMINDERS};
use super::weekdays::WeekdaySet;
use crate::utils::time::localize;
use chrono::{Datelike, Days, NaiveDate};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use std::iter::FusedIterator;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern");
}

/// Whether `address` looks like `local@domain.tld`
pub fn is_valid_email(address: &str) -> bool {
    EMAIL.is_match(address)
}

/// Turns templates into dated event instances.
///
/// The expander holds only immutable lookup data, so one value can expand any
/// number of templates and every call is independent of the previous ones.
#[derive(Debug, Clone)]
pub struct RecurrenceExpander {
    timezone: Tz,
    colors: ColorTable,
}

impl RecurrenceExpander {
    pub fn new(timezone: Tz, colors: ColorTable) -> Self {
        Self { timezone, colors }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Last date that may hold an occurrence.
    ///
    /// A count is converted to whole weeks, `floor(count / |weekdays|)`, past the
    /// start date. When the count is not a multiple of the weekday count this
    /// can produce more or fewer occurrences than requested.
    /// Returns `None` when the template cannot produce anything.
    pub fn effective_end_date(template: &EventTemplate) -> Option<NaiveDate> {
        if template.weekdays.is_empty() {
            return None;
        }
        match template.end {
            RecurrenceEnd::Until(end) => Some(end),
            RecurrenceEnd::Count(0) => None,
            RecurrenceEnd::Count(count) => {
                let weeks = u64::from(count / template.weekdays.len());
                Some(
                    template
                        .start_date
                        .checked_add_days(Days::new(weeks * 7))
                        .unwrap_or(NaiveDate::MAX),
                )
            }
        }
    }

    /// Qualifying dates of a template in chronological order
    pub fn dates(template: &EventTemplate) -> OccurrenceDates {
        let (next, end) = match Self::effective_end_date(template) {
            Some(end) if template.start_date <= end => (Some(template.start_date), end),
            _ => (None, template.start_date),
        };
        OccurrenceDates {
            next,
            end,
            weekdays: template.weekdays,
        }
    }

    /// Lazily expand a template into its event instances
    pub fn expand<'a>(&'a self, template: &'a EventTemplate) -> Instances<'a> {
        Instances {
            expander: self,
            template,
            dates: Self::dates(template),
        }
    }

    /// Build the instance of `template` falling on `date`
    pub fn instantiate(&self, template: &EventTemplate, date: NaiveDate) -> EventInstance {
        let start = localize(&self.timezone, date.and_time(template.start_time));

        // An end time at or before the start time runs past midnight
        let end_date = if template.end_time <= template.start_time {
            date.succ_opt().unwrap_or(date)
        } else {
            date
        };
        let end = localize(&self.timezone, end_date.and_time(template.end_time));

        let description = match template.map_link.as_deref().map(str::trim) {
            Some(link) if !link.is_empty() => format!(
                "{} - View location on Google Maps: {}",
                template.description, link
            ),
            _ => template.description.clone(),
        };

        let attendees = template
            .attendees
            .iter()
            .map(|address| address.trim())
            .filter(|address| is_valid_email(address))
            .map(Attendee::invite)
            .collect();

        EventInstance {
            date,
            start,
            end,
            summary: template.summary.clone(),
            description,
            location: template.location.clone(),
            attendees,
            color_id: self.colors.lookup(&template.category).map(str::to_string),
            reminders: DEFAULT_REMINDERS.to_vec(),
        }
    }
}

/// Iterator over the dates in `[start, end]` whose weekday is in the set
#[derive(Debug, Clone)]
pub struct OccurrenceDates {
    next: Option<NaiveDate>,
    end: NaiveDate,
    weekdays: WeekdaySet,
}

impl Iterator for OccurrenceDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        while let Some(date) = self.next {
            self.next = date.succ_opt().filter(|next| *next <= self.end);
            if self.weekdays.contains(date.weekday()) {
                return Some(date);
            }
        }
        None
    }
}

impl FusedIterator for OccurrenceDates {}

/// Lazy sequence of instances produced by [`RecurrenceExpander::expand`]
#[derive(Debug, Clone)]
pub struct Instances<'a> {
    expander: &'a RecurrenceExpander,
    template: &'a EventTemplate,
    dates: OccurrenceDates,
}

impl Iterator for Instances<'_> {
    type Item = EventInstance;

    fn next(&mut self) -> Option<EventInstance> {
        let date = self.dates.next()?;
        Some(self.expander.instantiate(self.template, date))
    }
}

impl FusedIterator for Instances<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::recurrence::models::ReminderMethod;
    use chrono::{NaiveTime, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn template(end: RecurrenceEnd, days: &[Weekday]) -> EventTemplate {
        EventTemplate::new(
            "Car wash",
            date(2024, 1, 1),
            end,
            time(9, 0),
            time(10, 30),
            days.iter().copied().collect(),
        )
    }

    fn expander() -> RecurrenceExpander {
        RecurrenceExpander::new(chrono_tz::Asia::Kolkata, ColorTable::default())
    }

    fn dates_of(template: &EventTemplate) -> Vec<NaiveDate> {
        RecurrenceExpander::dates(template).collect()
    }

    #[test]
    fn test_end_date_scenario() {
        let t = template(
            RecurrenceEnd::Until(date(2024, 1, 14)),
            &[Weekday::Mon, Weekday::Wed],
        );
        assert_eq!(
            dates_of(&t),
            vec![
                date(2024, 1, 1),
                date(2024, 1, 3),
                date(2024, 1, 8),
                date(2024, 1, 10)
            ]
        );
    }

    #[test]
    fn test_count_is_approximated_in_whole_weeks() {
        let t = template(RecurrenceEnd::Count(4), &[Weekday::Mon, Weekday::Wed]);

        assert_eq!(
            RecurrenceExpander::effective_end_date(&t),
            Some(date(2024, 1, 15))
        );
        // Five dates for a count of four: the end bound lands on a Monday
        assert_eq!(
            dates_of(&t),
            vec![
                date(2024, 1, 1),
                date(2024, 1, 3),
                date(2024, 1, 8),
                date(2024, 1, 10),
                date(2024, 1, 15)
            ]
        );
    }

    #[test]
    fn test_count_smaller_than_weekday_count() {
        // floor(1 / 2) = 0 weeks, so only the start date is considered
        let t = template(RecurrenceEnd::Count(1), &[Weekday::Mon, Weekday::Wed]);
        assert_eq!(dates_of(&t), vec![date(2024, 1, 1)]);

        let t = template(RecurrenceEnd::Count(1), &[Weekday::Tue, Weekday::Wed]);
        assert!(dates_of(&t).is_empty());
    }

    #[test]
    fn test_single_day_range() {
        let t = template(RecurrenceEnd::Until(date(2024, 1, 1)), &[Weekday::Mon]);
        assert_eq!(dates_of(&t), vec![date(2024, 1, 1)]);

        let t = template(RecurrenceEnd::Until(date(2024, 1, 1)), &[Weekday::Tue]);
        assert!(dates_of(&t).is_empty());
    }

    #[test]
    fn test_degenerate_templates_yield_nothing() {
        let reversed = template(RecurrenceEnd::Until(date(2023, 12, 1)), &[Weekday::Mon]);
        assert!(dates_of(&reversed).is_empty());

        let no_days = template(RecurrenceEnd::Until(date(2024, 2, 1)), &[]);
        assert!(dates_of(&no_days).is_empty());

        let zero = template(RecurrenceEnd::Count(0), &[Weekday::Mon]);
        assert!(dates_of(&zero).is_empty());
    }

    #[test]
    fn test_range_ending_at_max_date_terminates() {
        let mut t = template(RecurrenceEnd::Until(NaiveDate::MAX), &[Weekday::Mon]);
        t.start_date = NaiveDate::MAX - Days::new(10);
        let dates = dates_of(&t);
        assert!(!dates.is_empty());
        assert!(dates.iter().all(|d| d.weekday() == Weekday::Mon));
    }

    #[test]
    fn test_every_matching_date_in_range_is_emitted() {
        let days = [Weekday::Tue, Weekday::Fri, Weekday::Sun];
        let end = date(2024, 3, 31);
        let t = template(RecurrenceEnd::Until(end), &days);

        let expected: Vec<NaiveDate> = t
            .start_date
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| days.contains(&d.weekday()))
            .collect();

        assert_eq!(dates_of(&t), expected);
    }

    #[test]
    fn test_expand_is_repeatable() {
        let e = expander();
        let t = template(RecurrenceEnd::Count(6), &[Weekday::Mon, Weekday::Thu]);

        let first: Vec<_> = e.expand(&t).collect();
        let second: Vec<_> = e.expand(&t).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
    }

    #[test]
    fn test_instance_fields() {
        let mut t = template(RecurrenceEnd::Until(date(2024, 1, 1)), &[Weekday::Mon]);
        t.description = "Full wash".to_string();
        t.location = "Block B".to_string();
        t.category = "ES".to_string();
        t.map_link = Some("https://maps.example/b".to_string());
        t.attendees = vec![
            "alice@example.com".to_string(),
            "".to_string(),
            "not-an-email".to_string(),
            " bob@example.org ".to_string(),
        ];

        let instances: Vec<_> = expander().expand(&t).collect();
        assert_eq!(instances.len(), 1);
        let instance = &instances[0];

        assert_eq!(instance.start.to_rfc3339(), "2024-01-01T09:00:00+05:30");
        assert_eq!(instance.end.to_rfc3339(), "2024-01-01T10:30:00+05:30");
        assert_eq!(
            instance.description,
            "Full wash - View location on Google Maps: https://maps.example/b"
        );
        assert_eq!(instance.location, "Block B");
        assert_eq!(instance.color_id.as_deref(), Some("10"));
        let emails: Vec<_> = instance.attendees.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, vec!["alice@example.com", "bob@example.org"]);
        assert_eq!(instance.reminders[0].method, ReminderMethod::Email);
        assert_eq!(instance.reminders[0].minutes, 60);
        assert_eq!(instance.reminders[1].method, ReminderMethod::Popup);
    }

    #[test]
    fn test_unknown_category_and_empty_map_link() {
        let mut t = template(RecurrenceEnd::Until(date(2024, 1, 1)), &[Weekday::Mon]);
        t.description = "Plain".to_string();
        t.category = "XYZ".to_string();
        t.map_link = Some("  ".to_string());

        let instance = expander().instantiate(&t, date(2024, 1, 1));
        assert_eq!(instance.color_id, None);
        assert_eq!(instance.description, "Plain");
    }

    #[test]
    fn test_overnight_event_ends_next_day() {
        let mut t = template(RecurrenceEnd::Until(date(2024, 1, 1)), &[Weekday::Mon]);
        t.start_time = time(22, 0);
        t.end_time = time(1, 0);

        let instance = expander().instantiate(&t, date(2024, 1, 1));
        assert_eq!(instance.end.to_rfc3339(), "2024-01-02T01:00:00+05:30");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
        assert!(!is_valid_email(""));
    }
}
