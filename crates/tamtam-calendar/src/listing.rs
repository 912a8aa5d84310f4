//! Plain-text rendering of a snapshot.

use std::fmt::Write;

use chrono_tz::Tz;

use crate::types::{Event, EventTime};

/// One line per event: `{summary} ({start})`.
pub fn upcoming_listing(events: &[Event]) -> String {
    let mut out = String::from("Upcoming events:\n");
    if events.is_empty() {
        out.push_str("No upcoming events found.\n");
        return out;
    }

    for event in events {
        let _ = writeln!(out, "{} ({})", event.summary, when(&event.start));
    }
    out
}

/// Start as the server would write it, in the event's own zone when labelled.
fn when(time: &EventTime) -> String {
    match time {
        EventTime::DateTime { at, time_zone } => {
            match time_zone.as_deref().and_then(|l| l.parse::<Tz>().ok()) {
                Some(tz) => at.with_timezone(&tz).to_rfc3339(),
                None => at.to_rfc3339(),
            }
        }
        EventTime::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::types::EventStatus;
    use chrono::{DateTime, NaiveDate, Utc};
    use serde_json::Map;

    fn event(summary: &str, start: EventTime) -> Event {
        Event {
            id: summary.to_lowercase(),
            summary: summary.to_string(),
            description: None,
            location: None,
            start,
            end: None,
            status: EventStatus::Confirmed,
            recurring_event_id: None,
            html_link: None,
            etag: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(
            upcoming_listing(&[]),
            "Upcoming events:\nNo upcoming events found.\n"
        );
    }

    #[test]
    fn test_listing_lines() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let events = vec![
            event("Standup", EventTime::zoned(at, "Europe/Amsterdam")),
            event(
                "Holiday",
                EventTime::Date(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
            ),
            event(
                "Call",
                EventTime::DateTime {
                    at,
                    time_zone: None,
                },
            ),
        ];

        assert_eq!(
            upcoming_listing(&events),
            "Upcoming events:\n\
             Standup (2024-05-01T10:00:00+02:00)\n\
             Holiday (2024-05-02)\n\
             Call (2024-05-01T08:00:00+00:00)\n"
        );
    }
}
