use crate::components::recurrence::EventInstance;
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use serde_json::{json, Value};

/// Simplified calendar event representation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub html_link: Option<String>,
    pub start_date_time: Option<String>,
    pub start_date: Option<String>,
    pub end_date_time: Option<String>,
    pub end_date: Option<String>,
    pub attendees: Vec<String>,
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn nested_str_field(value: &Value, outer: &str, inner: &str) -> Option<String> {
    value
        .get(outer)
        .and_then(|o| o.as_object())
        .and_then(|o| o.get(inner))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

impl CalendarEvent {
    /// Build from one item of an events resource
    pub fn from_json(event: &Value) -> Self {
        let attendees = event
            .get("attendees")
            .and_then(|a| a.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|attendee| str_field(attendee, "email"))
                    .collect()
            })
            .unwrap_or_default();

        CalendarEvent {
            id: str_field(event, "id").unwrap_or_default(),
            summary: str_field(event, "summary"),
            description: str_field(event, "description"),
            location: str_field(event, "location"),
            html_link: str_field(event, "htmlLink"),
            start_date_time: nested_str_field(event, "start", "dateTime"),
            start_date: nested_str_field(event, "start", "date"),
            end_date_time: nested_str_field(event, "end", "dateTime"),
            end_date: nested_str_field(event, "end", "date"),
            attendees,
        }
    }
}

/// Wall-clock time plus zone name, as the API expects for timed events
pub fn event_date_time(local: NaiveDateTime, timezone: Tz) -> Value {
    json!({
        "dateTime": local.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "timeZone": timezone.name(),
    })
}

/// Request body for inserting an instance
pub fn insert_body(instance: &EventInstance) -> Value {
    let timezone = instance.start.timezone();

    let attendees: Vec<Value> = instance
        .attendees
        .iter()
        .map(|a| {
            json!({
                "email": a.email,
                "displayName": a.display_name,
                "responseStatus": a.response_status,
            })
        })
        .collect();

    let overrides: Vec<Value> = instance
        .reminders
        .iter()
        .map(|r| json!({ "method": r.method.as_str(), "minutes": r.minutes }))
        .collect();

    let mut body = json!({
        "summary": instance.summary,
        "description": instance.description,
        "location": instance.location,
        "start": event_date_time(instance.start.naive_local(), timezone),
        "end": event_date_time(instance.end.naive_local(), timezone),
        "reminders": {
            "useDefault": false,
            "overrides": overrides,
        },
        "attendees": attendees,
    });

    if let Some(color_id) = &instance.color_id {
        body["colorId"] = json!(color_id);
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::recurrence::{
        ColorTable, EventTemplate, RecurrenceEnd, RecurrenceExpander,
    };
    use chrono::{NaiveDate, NaiveTime, Weekday};

    #[test]
    fn test_from_json() {
        let item = json!({
            "id": "abc",
            "summary": "Wash",
            "htmlLink": "https://calendar/abc",
            "start": { "dateTime": "2024-01-01T09:00:00+05:30" },
            "end": { "date": "2024-01-02" },
            "attendees": [{ "email": "a@x.com" }, { "displayName": "no email" }],
        });

        let event = CalendarEvent::from_json(&item);
        assert_eq!(event.id, "abc");
        assert_eq!(event.summary.as_deref(), Some("Wash"));
        assert_eq!(event.description, None);
        assert_eq!(event.html_link.as_deref(), Some("https://calendar/abc"));
        assert_eq!(
            event.start_date_time.as_deref(),
            Some("2024-01-01T09:00:00+05:30")
        );
        assert_eq!(event.end_date.as_deref(), Some("2024-01-02"));
        assert_eq!(event.attendees, vec!["a@x.com"]);
    }

    #[test]
    fn test_insert_body() {
        let mut template = EventTemplate::new(
            "Wash",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            RecurrenceEnd::Count(1),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            [Weekday::Mon].into_iter().collect(),
        );
        template.attendees = vec!["a@x.com".to_string()];
        template.category = "FLS".to_string();

        let expander = RecurrenceExpander::new(chrono_tz::Asia::Kolkata, ColorTable::default());
        let instance = expander.expand(&template).next().unwrap();
        let body = insert_body(&instance);

        assert_eq!(body["start"]["dateTime"], "2024-01-01T09:00:00");
        assert_eq!(body["start"]["timeZone"], "Asia/Kolkata");
        assert_eq!(body["end"]["dateTime"], "2024-01-01T10:00:00");
        assert_eq!(body["colorId"], "9");
        assert_eq!(body["reminders"]["useDefault"], false);
        assert_eq!(body["reminders"]["overrides"][1]["method"], "popup");
        assert_eq!(body["attendees"][0]["displayName"], "a");
    }

    #[test]
    fn test_insert_body_without_color() {
        let template = EventTemplate::new(
            "Wash",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            RecurrenceEnd::Count(1),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            [Weekday::Mon].into_iter().collect(),
        );
        let expander = RecurrenceExpander::new(chrono_tz::UTC, ColorTable::default());
        let instance = expander.expand(&template).next().unwrap();

        assert!(insert_body(&instance).get("colorId").is_none());
    }
}
