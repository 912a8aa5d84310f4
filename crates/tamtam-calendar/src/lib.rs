//! Google Calendar session for TamTam.
//!
//! Authenticates once, keeps a snapshot of upcoming events and exposes
//! search, create, single-field update and delete on top of it.

pub mod client;
pub mod datetime;
pub mod error;
pub mod listing;
pub mod remote;
pub mod session;
pub mod types;

pub use client::CalendarClient;
pub use error::{CalendarError, ErrorKind};
pub use listing::upcoming_listing;
pub use remote::{EventPage, ListQuery, RemoteCalendar};
pub use session::{CalendarSession, SessionSettings};
pub use types::{Event, EventDraft, EventField, EventStatus, EventTime, FieldUpdate};
