//! Google Calendar API client.

use tracing::instrument;

use crate::error::CalendarError;
use crate::remote::{EventPage, ListQuery, RemoteCalendar};
use crate::types::*;

pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub struct CalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl CalendarClient {
    /// Client for the public API, identifying itself as `application_name`.
    pub fn new(access_token: &str, application_name: &str) -> Result<Self, CalendarError> {
        Self::with_base_url(access_token, application_name, CALENDAR_API_BASE)
    }

    pub fn with_base_url(
        access_token: &str,
        application_name: &str,
        base_url: &str,
    ) -> Result<Self, CalendarError> {
        // No request timeout: a hung call blocks its caller
        let client = reqwest::Client::builder()
            .user_agent(application_name)
            .build()?;

        Ok(Self {
            client,
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        )
    }

    /// Turn a non-success status into the matching error.
    async fn check_status(
        response: reqwest::Response,
        subject: &str,
    ) -> Result<reqwest::Response, CalendarError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = api_error_message(&text).unwrap_or(text);

        // A rejected token or a rate limit on an established session is a
        // failed call, not a fatal sign-in error
        Err(match status.as_u16() {
            404 | 410 => CalendarError::NotFound(subject.to_string()),
            code => CalendarError::remote(code, message),
        })
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        subject: &str,
    ) -> Result<T, CalendarError> {
        Self::check_status(response, subject)
            .await?
            .json()
            .await
            .map_err(|e| CalendarError::InvalidResponse(format!("JSON parse error: {}", e)))
    }
}

impl RemoteCalendar for CalendarClient {
    /// List events from a calendar.
    #[instrument(skip(self), level = "info")]
    async fn list_events(
        &self,
        calendar_id: &str,
        query: &ListQuery,
    ) -> Result<EventPage, CalendarError> {
        let mut url = format!(
            "{}?timeMin={}&showDeleted={}&singleEvents={}&maxResults={}",
            self.events_url(calendar_id),
            urlencoding::encode(&query.time_min.to_rfc3339()),
            query.show_deleted,
            query.single_events,
            query.max_results,
        );

        if query.order_by_start_time {
            url.push_str("&orderBy=startTime");
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let resp: EventListResponse = Self::handle_response(response, calendar_id).await?;
        let events = resp
            .items
            .into_iter()
            .map(Event::from_api)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Listed {} events", events.len());
        Ok(EventPage {
            events,
            next_page_token: resp.next_page_token,
        })
    }

    /// Get a single event.
    #[instrument(skip(self), level = "info")]
    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<Event, CalendarError> {
        let response = self
            .client
            .get(self.event_url(calendar_id, event_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let api_event: ApiEvent = Self::handle_response(response, event_id).await?;
        Event::from_api(api_event)
    }

    /// Create a new event.
    #[instrument(skip(self, draft), fields(summary = %draft.summary), level = "info")]
    async fn insert_event(
        &self,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<Event, CalendarError> {
        let response = self
            .client
            .post(self.events_url(calendar_id))
            .header("Authorization", self.auth_header())
            .json(&draft.to_api())
            .send()
            .await?;

        let api_event: ApiEvent = Self::handle_response(response, calendar_id).await?;
        Event::from_api(api_event)
    }

    /// Replace an existing event with the given representation.
    #[instrument(skip(self, event), fields(event_id = %event.id), level = "info")]
    async fn update_event(&self, calendar_id: &str, event: &Event) -> Result<Event, CalendarError> {
        let response = self
            .client
            .put(self.event_url(calendar_id, &event.id))
            .header("Authorization", self.auth_header())
            .json(&event.to_api())
            .send()
            .await?;

        let api_event: ApiEvent = Self::handle_response(response, &event.id).await?;
        Event::from_api(api_event)
    }

    /// Delete an event.
    #[instrument(skip(self), level = "info")]
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        let response = self
            .client
            .delete(self.event_url(calendar_id, event_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        // Delete returns 204 No Content on success
        Self::check_status(response, event_id).await?;
        Ok(())
    }
}

/// Pull `error.message` out of a Google error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
