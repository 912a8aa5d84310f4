//! The remote system of record, as the session sees it.

use chrono::{DateTime, Utc};

use crate::error::CalendarError;
use crate::types::{Event, EventDraft};

/// Parameters of an `events.list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Lower bound on event end time
    pub time_min: DateTime<Utc>,
    pub show_deleted: bool,
    /// Expand recurring events into single occurrences
    pub single_events: bool,
    pub order_by_start_time: bool,
    pub max_results: u32,
}

impl ListQuery {
    /// Upcoming single occurrences from `time_min`, ordered by start.
    pub fn upcoming(time_min: DateTime<Utc>, max_results: u32) -> Self {
        Self {
            time_min,
            show_deleted: false,
            single_events: true,
            order_by_start_time: true,
            max_results,
        }
    }
}

/// One page of `events.list`.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<Event>,
    /// Set when the server holds more results than were returned
    pub next_page_token: Option<String>,
}

/// Event CRUD keyed by calendar id and event id.
///
/// Each call is a single request/response; implementations do not retry.
pub trait RemoteCalendar: Send + Sync {
    async fn list_events(
        &self,
        calendar_id: &str,
        query: &ListQuery,
    ) -> Result<EventPage, CalendarError>;

    /// Fails with `CalendarError::NotFound` when the id is unknown.
    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<Event, CalendarError>;

    /// Returns the stored event including its server-assigned id.
    async fn insert_event(
        &self,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<Event, CalendarError>;

    /// Replaces the full representation of `event`.
    async fn update_event(&self, calendar_id: &str, event: &Event) -> Result<Event, CalendarError>;

    /// Fails with `CalendarError::NotFound` when the id is unknown or already deleted.
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError>;
}
