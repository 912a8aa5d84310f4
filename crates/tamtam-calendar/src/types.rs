//! Calendar API types and data structures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::datetime::parse_date_time;
use crate::error::CalendarError;

/// Calendar event as held in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    /// Absent when the server sent none; left absent on write-back
    pub end: Option<EventTime>,
    pub status: EventStatus,
    pub recurring_event_id: Option<String>,
    pub html_link: Option<String>,
    pub etag: Option<String>,
    /// Server fields not modelled above, written back untouched on update.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Event time - can be a specific datetime or an all-day date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime {
        at: DateTime<Utc>,
        time_zone: Option<String>,
    },
    Date(NaiveDate),
}

impl EventTime {
    /// A precise instant carrying `time_zone` as its label.
    pub fn zoned(at: DateTime<Utc>, time_zone: &str) -> Self {
        EventTime::DateTime {
            at,
            time_zone: Some(time_zone.to_string()),
        }
    }

    /// Instant used for ordering; all-day dates count from UTC midnight.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime { at, .. } => *at,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    pub fn time_zone(&self) -> Option<&str> {
        match self {
            EventTime::DateTime { time_zone, .. } => time_zone.as_deref(),
            EventTime::Date(_) => None,
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    fn from_api(api: &ApiEventTime) -> Result<Self, CalendarError> {
        if let Some(dt_str) = &api.date_time {
            let at = DateTime::parse_from_rfc3339(dt_str).map_err(|e| {
                CalendarError::InvalidResponse(format!("bad dateTime '{}': {}", dt_str, e))
            })?;
            return Ok(EventTime::DateTime {
                at: at.with_timezone(&Utc),
                time_zone: api.time_zone.clone(),
            });
        }
        if let Some(date_str) = &api.date {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                CalendarError::InvalidResponse(format!("bad date '{}': {}", date_str, e))
            })?;
            return Ok(EventTime::Date(date));
        }
        Err(CalendarError::InvalidResponse(
            "event time has neither dateTime nor date".into(),
        ))
    }

    fn to_api(&self) -> ApiEventTime {
        match self {
            EventTime::DateTime { at, time_zone } => {
                let date_time = match time_zone.as_deref().and_then(|l| l.parse::<Tz>().ok()) {
                    Some(tz) => at.with_timezone(&tz).to_rfc3339(),
                    None => at.to_rfc3339(),
                };
                ApiEventTime {
                    date_time: Some(date_time),
                    date: None,
                    time_zone: time_zone.clone(),
                }
            }
            EventTime::Date(d) => ApiEventTime {
                date_time: None,
                date: Some(d.format("%Y-%m-%d").to_string()),
                time_zone: None,
            },
        }
    }
}

/// Event status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    fn from_api(status: Option<&str>) -> Self {
        match status {
            Some("tentative") => Self::Tentative,
            Some("cancelled") => Self::Cancelled,
            _ => Self::Confirmed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Tentative => "tentative",
            Self::Cancelled => "cancelled",
        }
    }
}

/// An event that has not been inserted yet; the server assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub summary: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
}

impl EventDraft {
    pub(crate) fn to_api(&self) -> ApiEvent {
        ApiEvent {
            summary: Some(self.summary.clone()),
            location: self.location.clone(),
            description: self.description.clone(),
            start: Some(self.start.to_api()),
            end: Some(self.end.to_api()),
            ..ApiEvent::default()
        }
    }
}

/// The single field an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Summary,
    Location,
    Description,
    StartTime,
    EndTime,
}

impl EventField {
    pub const ALL: [EventField; 5] = [
        EventField::Summary,
        EventField::Location,
        EventField::Description,
        EventField::StartTime,
        EventField::EndTime,
    ];

    /// Numeric selector used by older callers: 1 Summary through 5 EndTime.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Summary),
            2 => Some(Self::Location),
            3 => Some(Self::Description),
            4 => Some(Self::StartTime),
            5 => Some(Self::EndTime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Location => "location",
            Self::Description => "description",
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventField {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(field) = s.parse::<i64>().ok().and_then(Self::from_code) {
            return Ok(field);
        }
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "summary" => Ok(Self::Summary),
            "location" => Ok(Self::Location),
            "description" => Ok(Self::Description),
            "start" | "start_time" | "starttime" => Ok(Self::StartTime),
            "end" | "end_time" | "endtime" => Ok(Self::EndTime),
            _ => Err(CalendarError::InvalidArgument(format!(
                "unknown event field '{}'",
                s
            ))),
        }
    }
}

/// A parsed replacement for exactly one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Summary(String),
    Location(Option<String>),
    Description(Option<String>),
    Start(EventTime),
    End(EventTime),
}

impl FieldUpdate {
    /// Interpret `replacement` for `field`. Date-time replacements are read in
    /// `tz` and labelled with it; an empty location or description clears it.
    pub fn parse(field: EventField, replacement: &str, tz: Tz) -> Result<Self, CalendarError> {
        let update = match field {
            EventField::Summary => Self::Summary(replacement.to_string()),
            EventField::Location => Self::Location(non_empty(replacement)),
            EventField::Description => Self::Description(non_empty(replacement)),
            EventField::StartTime => {
                Self::Start(EventTime::zoned(parse_date_time(replacement, tz)?, tz.name()))
            }
            EventField::EndTime => {
                Self::End(EventTime::zoned(parse_date_time(replacement, tz)?, tz.name()))
            }
        };
        Ok(update)
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl Event {
    /// Convert API response to local Event.
    pub fn from_api(api: ApiEvent) -> Result<Self, CalendarError> {
        let start = api
            .start
            .as_ref()
            .ok_or_else(|| CalendarError::InvalidResponse(format!("event {} has no start", api.id)))
            .and_then(EventTime::from_api)?;

        let end = api.end.as_ref().map(EventTime::from_api).transpose()?;

        Ok(Self {
            status: EventStatus::from_api(api.status.as_deref()),
            id: api.id,
            summary: api.summary.unwrap_or_default(),
            description: api.description,
            location: api.location,
            start,
            end,
            recurring_event_id: api.recurring_event_id,
            html_link: api.html_link,
            etag: api.etag,
            extra: api.extra,
        })
    }

    /// Full representation for a write-back.
    pub(crate) fn to_api(&self) -> ApiEvent {
        ApiEvent {
            id: self.id.clone(),
            summary: Some(self.summary.clone()),
            description: self.description.clone(),
            location: self.location.clone(),
            start: Some(self.start.to_api()),
            end: self.end.as_ref().map(EventTime::to_api),
            status: Some(self.status.as_str().to_string()),
            recurring_event_id: self.recurring_event_id.clone(),
            html_link: self.html_link.clone(),
            etag: self.etag.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Replace exactly the field the update names.
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Summary(summary) => self.summary = summary,
            FieldUpdate::Location(location) => self.location = location,
            FieldUpdate::Description(description) => self.description = description,
            FieldUpdate::Start(start) => self.start = start,
            FieldUpdate::End(end) => self.end = Some(end),
        }
    }
}

// API Response Types

/// Google Calendar API event resource.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<ApiEventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<ApiEventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// API response for event list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn amsterdam() -> Tz {
        chrono_tz::Europe::Amsterdam
    }

    fn sample_event() -> Event {
        let json = r#"{
            "id": "event123",
            "summary": "Team Meeting",
            "description": "Weekly sync",
            "location": "Conference Room A",
            "start": {"dateTime": "2024-02-01T10:00:00+01:00", "timeZone": "Europe/Amsterdam"},
            "end": {"dateTime": "2024-02-01T11:00:00+01:00", "timeZone": "Europe/Amsterdam"},
            "status": "confirmed",
            "htmlLink": "https://calendar.google.com/event?id=123",
            "attendees": [{"email": "alice@example.com", "responseStatus": "accepted"}],
            "reminders": {"useDefault": true}
        }"#;
        Event::from_api(serde_json::from_str(json).unwrap()).unwrap()
    }

    #[test]
    fn test_event_from_api() {
        let event = sample_event();

        assert_eq!(event.id, "event123");
        assert_eq!(event.summary, "Team Meeting");
        assert_eq!(event.location, Some("Conference Room A".to_string()));
        assert_eq!(event.status, EventStatus::Confirmed);
        assert_eq!(event.start.time_zone(), Some("Europe/Amsterdam"));
        assert_eq!(
            event.start.as_datetime(),
            DateTime::parse_from_rfc3339("2024-02-01T09:00:00Z").unwrap()
        );
        assert!(!event.start.is_all_day());
    }

    #[test]
    fn test_unmodelled_fields_round_trip() {
        let event = sample_event();
        assert!(event.extra.contains_key("attendees"));
        assert!(event.extra.contains_key("reminders"));

        let body = serde_json::to_value(event.to_api()).unwrap();
        assert_eq!(body["attendees"][0]["email"], "alice@example.com");
        assert_eq!(body["reminders"]["useDefault"], true);
        assert_eq!(body["id"], "event123");
        assert_eq!(body["start"]["timeZone"], "Europe/Amsterdam");
        assert_eq!(body["start"]["dateTime"], "2024-02-01T10:00:00+01:00");
    }

    #[test]
    fn test_all_day_event() {
        let json = r#"{
            "id": "event456",
            "summary": "Holiday",
            "start": {"date": "2024-02-01"},
            "end": {"date": "2024-02-02"}
        }"#;

        let event = Event::from_api(serde_json::from_str(json).unwrap()).unwrap();

        assert!(event.start.is_all_day());
        assert_eq!(
            event.start,
            EventTime::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );
        let body = serde_json::to_value(event.to_api()).unwrap();
        assert_eq!(body["end"], serde_json::json!({"date": "2024-02-02"}));
    }

    #[test]
    fn test_missing_summary_reads_as_empty() {
        let json = r#"{"id": "e", "start": {"date": "2024-02-01"}}"#;
        let event = Event::from_api(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(event.summary, "");
    }

    #[test]
    fn test_missing_end_stays_absent_on_write_back() {
        let json = r#"{
            "id": "e",
            "summary": "Open ended",
            "start": {"dateTime": "2024-02-01T10:00:00+01:00", "timeZone": "Europe/Amsterdam"}
        }"#;
        let mut event = Event::from_api(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(event.end, None);

        event.apply(FieldUpdate::parse(EventField::Summary, "Renamed", amsterdam()).unwrap());
        let body = serde_json::to_value(event.to_api()).unwrap();
        assert!(body.get("end").is_none());
        assert_eq!(body["summary"], "Renamed");

        event.apply(FieldUpdate::parse(EventField::EndTime, "2024-02-01T12:00:00", amsterdam()).unwrap());
        let body = serde_json::to_value(event.to_api()).unwrap();
        assert_eq!(body["end"]["dateTime"], "2024-02-01T12:00:00+01:00");
    }

    #[test]
    fn test_malformed_time_is_invalid_response() {
        let json = r#"{"id": "e", "start": {"dateTime": "yesterday"}}"#;
        let err = Event::from_api(serde_json::from_str(json).unwrap()).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidResponse(_)));

        let json = r#"{"id": "e"}"#;
        let err = Event::from_api(serde_json::from_str(json).unwrap()).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidResponse(_)));
    }

    #[test]
    fn test_draft_body_omits_id_and_empty_fields() {
        let start = DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let draft = EventDraft {
            summary: "Lunch".into(),
            location: None,
            description: Some("Team lunch".into()),
            start: EventTime::zoned(start, "Europe/Amsterdam"),
            end: EventTime::zoned(start + chrono::Duration::hours(1), "Europe/Amsterdam"),
        };

        let body = serde_json::to_value(draft.to_api()).unwrap();
        assert!(body.get("id").is_none());
        assert!(body.get("location").is_none());
        assert_eq!(body["start"]["dateTime"], "2024-05-01T10:00:00+02:00");
        assert_eq!(body["end"]["timeZone"], "Europe/Amsterdam");
    }

    #[test]
    fn test_field_from_code_and_name() {
        for (code, field) in (1..=5).zip(EventField::ALL) {
            assert_eq!(EventField::from_code(code), Some(field));
            assert_eq!(code.to_string().parse::<EventField>().unwrap(), field);
            assert_eq!(field.as_str().parse::<EventField>().unwrap(), field);
        }
        assert_eq!(EventField::from_code(0), None);
        assert_eq!(EventField::from_code(6), None);
        assert_eq!("Start".parse::<EventField>().unwrap(), EventField::StartTime);
        assert_eq!("end-time".parse::<EventField>().unwrap(), EventField::EndTime);
        assert!("6".parse::<EventField>().is_err());
        assert!("colour".parse::<EventField>().is_err());
    }

    #[test]
    fn test_apply_changes_only_the_named_field() {
        let original = sample_event();
        let update =
            FieldUpdate::parse(EventField::StartTime, "2024-05-01T10:00:00", amsterdam()).unwrap();

        let mut event = original.clone();
        event.apply(update);

        assert_eq!(
            event.start,
            EventTime::zoned(
                DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
                "Europe/Amsterdam"
            )
        );
        assert_eq!(event.end, original.end);
        assert_eq!(event.summary, original.summary);
        assert_eq!(event.location, original.location);
        assert_eq!(event.description, original.description);
        assert_eq!(event.extra, original.extra);
    }

    #[test]
    fn test_empty_location_clears() {
        let mut event = sample_event();
        event.apply(FieldUpdate::parse(EventField::Location, "", amsterdam()).unwrap());
        assert_eq!(event.location, None);
    }

    #[test]
    fn test_field_update_rejects_bad_time() {
        let err = FieldUpdate::parse(EventField::EndTime, "soon", amsterdam()).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidArgument(_)));

        // Text fields take the replacement verbatim
        let update = FieldUpdate::parse(EventField::Summary, "soon", amsterdam()).unwrap();
        assert_eq!(update, FieldUpdate::Summary("soon".into()));
    }
}
