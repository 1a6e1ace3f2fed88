use super::actor::{GoogleCalendarActor, GoogleCalendarActorHandle};
use super::models::CalendarEvent;
use crate::components::recurrence::EventInstance;
use crate::components::{CreatedEvent, DateRange, EventService};
use crate::config::Config;
use crate::error::SchedulerResult;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    actor_handle: GoogleCalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(config: Arc<Config>) -> SchedulerResult<Self> {
        // Create the actor and get its handle
        let (mut actor, handle) = GoogleCalendarActor::new(config)?;

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Ok(Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        })
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> SchedulerResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl EventService for GoogleCalendarHandle {
    async fn create_event(&self, instance: &EventInstance) -> SchedulerResult<CreatedEvent> {
        self.actor_handle.create_event(instance.clone()).await
    }

    async fn list_events(&self, range: DateRange) -> SchedulerResult<Vec<CalendarEvent>> {
        self.actor_handle.list_events(range).await
    }

    async fn update_event(
        &self,
        event_id: &str,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> SchedulerResult<CalendarEvent> {
        self.actor_handle
            .update_event(event_id.to_string(), new_date, new_time)
            .await
    }
}
