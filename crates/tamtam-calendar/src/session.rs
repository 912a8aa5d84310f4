//! Authenticated calendar session and its cached snapshot of upcoming events.
//!
//! The snapshot is only ever replaced whole, by [`CalendarSession::refresh`].
//! Searches read the snapshot and never touch the network. Mutations go to
//! the remote calendar; only `create_event` refreshes afterwards; update and
//! remove leave the snapshot as it was until the caller refreshes.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tamtam_auth::{Authenticator, CALENDAR_SCOPES};
use tamtam_core::CalendarConfig;

use crate::client::{CalendarClient, CALENDAR_API_BASE};
use crate::datetime::{parse_date_time, parse_time_zone};
use crate::error::CalendarError;
use crate::remote::{ListQuery, RemoteCalendar};
use crate::types::{non_empty, Event, EventDraft, EventField, EventTime, FieldUpdate};

/// What a session is bound to.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub calendar_id: String,
    /// Zone used to read date-time input and attached as its label
    pub time_zone: Tz,
    pub application_name: String,
    pub api_base_url: String,
    pub max_results: u32,
}

impl SessionSettings {
    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        Ok(Self {
            calendar_id: config.calendar_id.clone(),
            time_zone: parse_time_zone(&config.time_zone)?,
            application_name: config.application_name.clone(),
            api_base_url: config.api_base_url.clone(),
            max_results: config.max_results,
        })
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            time_zone: chrono_tz::Europe::Amsterdam,
            application_name: "TamTam reservation service".to_string(),
            api_base_url: CALENDAR_API_BASE.to_string(),
            max_results: 250,
        }
    }
}

pub struct CalendarSession<R = CalendarClient> {
    remote: R,
    settings: SessionSettings,
    snapshot: Vec<Event>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CalendarSession<CalendarClient> {
    /// Authenticate and bind a client to the configured calendar.
    ///
    /// The snapshot starts empty; call [`refresh`](Self::refresh) to fill it.
    pub async fn initialize<A: Authenticator>(
        settings: SessionSettings,
        authenticator: &A,
    ) -> Result<Self, CalendarError> {
        let token = authenticator.authorize(&CALENDAR_SCOPES).await?;
        let client = CalendarClient::with_base_url(
            &token.access_token,
            &settings.application_name,
            &settings.api_base_url,
        )?;

        tracing::info!(
            calendar_id = %settings.calendar_id,
            application = %settings.application_name,
            "Calendar session initialized"
        );
        Ok(Self::with_remote(client, settings))
    }
}

impl<R: RemoteCalendar> CalendarSession<R> {
    pub fn with_remote(remote: R, settings: SessionSettings) -> Self {
        Self {
            remote,
            settings,
            snapshot: Vec::new(),
            refreshed_at: None,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Replace the snapshot with the upcoming events as of now.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh(&mut self) -> Result<(), CalendarError> {
        let now = Utc::now();
        let query = ListQuery::upcoming(now, self.settings.max_results);
        let page = self
            .remote
            .list_events(&self.settings.calendar_id, &query)
            .await?;

        if page.next_page_token.is_some() {
            tracing::warn!(
                "More than {} upcoming events; snapshot holds the first page only",
                self.settings.max_results
            );
        }

        // The server also returns events already in progress
        let mut events: Vec<Event> = page
            .events
            .into_iter()
            .filter(|e| e.start.as_datetime() >= now)
            .collect();
        events.sort_by_key(|e| e.start.as_datetime());

        tracing::debug!("Snapshot refreshed with {} events", events.len());
        self.snapshot = events;
        self.refreshed_at = Some(now);
        Ok(())
    }

    /// Refresh, then return the new snapshot.
    pub async fn refresh_and_get(&mut self) -> Result<&[Event], CalendarError> {
        self.refresh().await?;
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> &[Event] {
        &self.snapshot
    }

    /// When the snapshot was last replaced, `None` before the first refresh.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Cached events whose summary contains `name` (case-sensitive), in snapshot order.
    pub fn search_by_name(&self, name: &str) -> Vec<&Event> {
        self.snapshot
            .iter()
            .filter(|e| e.summary.contains(name))
            .collect()
    }

    /// First cached event whose summary contains `name`.
    pub fn search_one_by_name(&self, name: &str) -> Option<&Event> {
        self.snapshot.iter().find(|e| e.summary.contains(name))
    }

    /// Insert a new event and refresh so it shows up in the snapshot.
    ///
    /// Both times are read in the session zone and carry its label. Empty
    /// location or description is sent as absent. Returns the server's copy.
    pub async fn create_event(
        &mut self,
        summary: &str,
        location: &str,
        description: &str,
        start: &str,
        end: &str,
    ) -> Result<Event, CalendarError> {
        let tz = self.settings.time_zone;
        let draft = EventDraft {
            summary: summary.to_string(),
            location: non_empty(location),
            description: non_empty(description),
            start: EventTime::zoned(parse_date_time(start, tz)?, tz.name()),
            end: EventTime::zoned(parse_date_time(end, tz)?, tz.name()),
        };

        let created = self
            .remote
            .insert_event(&self.settings.calendar_id, &draft)
            .await?;
        tracing::info!(event_id = %created.id, "Created event");

        self.refresh().await?;
        Ok(created)
    }

    /// Change exactly one field of a remote event.
    ///
    /// The snapshot is not refreshed.
    pub async fn update_event(
        &mut self,
        event_id: &str,
        field: EventField,
        replacement: &str,
    ) -> Result<Event, CalendarError> {
        let update = FieldUpdate::parse(field, replacement, self.settings.time_zone)?;

        let mut event = self
            .remote
            .get_event(&self.settings.calendar_id, event_id)
            .await?;
        event.apply(update);

        let updated = self
            .remote
            .update_event(&self.settings.calendar_id, &event)
            .await?;
        tracing::info!(event_id = %event_id, field = %field, "Updated event");
        Ok(updated)
    }

    /// Like [`update_event`](Self::update_event) with a textual or numeric
    /// selector. An unrecognized selector changes nothing and makes no
    /// remote call; it yields `Ok(None)`.
    pub async fn update_event_by_selector(
        &mut self,
        event_id: &str,
        selector: &str,
        replacement: &str,
    ) -> Result<Option<Event>, CalendarError> {
        let Ok(field) = selector.parse::<EventField>() else {
            tracing::warn!(event_id = %event_id, selector = %selector, "Ignoring update with unknown field selector");
            return Ok(None);
        };

        self.update_event(event_id, field, replacement)
            .await
            .map(Some)
    }

    /// Delete a remote event.
    ///
    /// The snapshot is not refreshed, so it may still list the event.
    pub async fn remove_event(&mut self, event_id: &str) -> Result<(), CalendarError> {
        self.remote
            .delete_event(&self.settings.calendar_id, event_id)
            .await?;
        tracing::info!(event_id = %event_id, "Removed event");
        Ok(())
    }
}
