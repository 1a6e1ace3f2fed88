use super::models::{event_date_time, insert_body, CalendarEvent};
use super::time::reschedule_duration;
use super::token::TokenManager;
use crate::components::recurrence::EventInstance;
use crate::components::{CreatedEvent, DateRange};
use crate::config::Config;
use crate::error::{google_calendar_error, SchedulerResult};
use crate::utils::time::start_of_day;
use chrono::{Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

/// Base of the Calendar v3 REST API
pub const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const PAGE_SIZE: &str = "1000";

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    api: CalendarApi,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    CreateEvent(Box<EventInstance>, mpsc::Sender<SchedulerResult<CreatedEvent>>),
    ListEvents(DateRange, mpsc::Sender<SchedulerResult<Vec<CalendarEvent>>>),
    UpdateEvent {
        event_id: String,
        new_date: NaiveDate,
        new_time: NaiveTime,
        response_tx: mpsc::Sender<SchedulerResult<CalendarEvent>>,
    },
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<SchedulerResult<T>>) -> GoogleCalendarCommand,
    ) -> SchedulerResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Insert one event
    pub async fn create_event(&self, instance: EventInstance) -> SchedulerResult<CreatedEvent> {
        self.request(|tx| GoogleCalendarCommand::CreateEvent(Box::new(instance), tx))
            .await
    }

    /// List events in a date range
    pub async fn list_events(&self, range: DateRange) -> SchedulerResult<Vec<CalendarEvent>> {
        self.request(|tx| GoogleCalendarCommand::ListEvents(range, tx))
            .await
    }

    /// Move an event to a new start
    pub async fn update_event(
        &self,
        event_id: String,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> SchedulerResult<CalendarEvent> {
        self.request(|response_tx| GoogleCalendarCommand::UpdateEvent {
            event_id,
            new_date,
            new_time,
            response_tx,
        })
        .await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> SchedulerResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(config: Arc<Config>) -> SchedulerResult<(Self, GoogleCalendarActorHandle)> {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            api: CalendarApi::new(config)?,
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        Ok((actor, handle))
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        // Commands are handled one at a time, in arrival order
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::CreateEvent(instance, response_tx) => {
                    let result = self.api.create_event(&instance).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::ListEvents(range, response_tx) => {
                    let result = self.api.list_events(range).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::UpdateEvent {
                    event_id,
                    new_date,
                    new_time,
                    response_tx,
                } => {
                    let result = self.api.update_event(&event_id, new_date, new_time).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }
}

/// REST calls against one calendar
pub struct CalendarApi {
    calendar_id: String,
    timezone: Tz,
    base_url: String,
    token_manager: TokenManager,
    client: Client,
}

impl CalendarApi {
    pub fn new(config: Arc<Config>) -> SchedulerResult<Self> {
        Ok(Self {
            calendar_id: config.google_calendar_id.clone(),
            timezone: config.tz()?,
            base_url: API_BASE.to_string(),
            token_manager: TokenManager::new(config),
            client: Client::new(),
        })
    }

    /// URL of the calendar's events collection, or of one event in it
    pub fn events_url(&self, event_id: Option<&str>) -> SchedulerResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| google_calendar_error("API base URL cannot hold a path"))?;
            segments.extend(["calendars", self.calendar_id.as_str(), "events"]);
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }
        Ok(url)
    }

    /// Query parameters for listing `range`; the end day is inclusive
    pub fn list_query(&self, range: DateRange) -> Vec<(&'static str, String)> {
        let time_min = start_of_day(&self.timezone, range.start);
        let after_end = range.end.checked_add_days(Days::new(1)).unwrap_or(range.end);
        let time_max = start_of_day(&self.timezone, after_end);

        vec![
            ("timeMin", time_min.to_rfc3339()),
            ("timeMax", time_max.to_rfc3339()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
        ]
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> SchedulerResult<Value> {
        let access_token = self.token_manager.get_token().await?;

        let response = request
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse {} response: {}", action, e))
        })
    }

    pub async fn create_event(&self, instance: &EventInstance) -> SchedulerResult<CreatedEvent> {
        let url = self.events_url(None)?;
        let body = insert_body(instance);
        let created = self
            .send(self.client.post(url).json(&body), "create event")
            .await?;

        let event = CalendarEvent::from_json(&created);
        debug!("Created event {} on {}", event.id, instance.date);
        Ok(CreatedEvent {
            id: event.id,
            html_link: event.html_link.unwrap_or_default(),
        })
    }

    pub async fn list_events(&self, range: DateRange) -> SchedulerResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.events_url(None)?;
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in self.list_query(range) {
                    pairs.append_pair(key, &value);
                }
                if let Some(token) = &page_token {
                    pairs.append_pair("pageToken", token);
                }
            }

            let page = self.send(self.client.get(url), "fetch events").await?;
            let items = page
                .get("items")
                .and_then(|i| i.as_array())
                .ok_or_else(|| google_calendar_error("No items in response"))?;
            events.extend(items.iter().map(CalendarEvent::from_json));

            page_token = page
                .get("nextPageToken")
                .and_then(|t| t.as_str())
                .map(|t| t.to_string());
            if page_token.is_none() {
                break;
            }
        }

        debug!(
            "Fetched {} events between {} and {}",
            events.len(),
            range.start,
            range.end
        );
        Ok(events)
    }

    pub async fn update_event(
        &self,
        event_id: &str,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> SchedulerResult<CalendarEvent> {
        let url = self.events_url(Some(event_id))?;

        let current = self.send(self.client.get(url.clone()), "fetch event").await?;
        let duration = reschedule_duration(&CalendarEvent::from_json(&current));

        let start = new_date.and_time(new_time);
        let patch = json!({
            "start": event_date_time(start, self.timezone),
            "end": event_date_time(start + duration, self.timezone),
        });

        let updated = self
            .send(self.client.patch(url).json(&patch), "update event")
            .await?;
        Ok(CalendarEvent::from_json(&updated))
    }
}
