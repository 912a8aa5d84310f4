//! Calendar-specific error types.

use tamtam_core::{AppError, AuthError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Calendar API error ({status}): {message}")]
    RemoteService { status: u16, message: String },

    #[error("Invalid response from calendar API: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable credential; the session cannot continue.
    Authentication,
    /// Transport or server failure on a remote call.
    RemoteService,
    /// The event id does not exist server-side.
    NotFound,
    /// Caller input could not be interpreted.
    InvalidArgument,
}

impl CalendarError {
    pub(crate) fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteService {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::RemoteService { .. } | Self::InvalidResponse(_) | Self::Transport(_) => {
                ErrorKind::RemoteService
            }
        }
    }

    /// User-friendly error message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "Please sign in to your Google account again",
            Self::NotFound(_) => "Event not found",
            Self::InvalidArgument(_) => "Invalid input. Check the dates and field names you entered.",
            Self::RemoteService { status, .. } if *status >= 500 => {
                "Google Calendar is having trouble. Please try again later."
            }
            Self::RemoteService { .. } => "The calendar request was rejected.",
            Self::InvalidResponse(_) => "Received an unexpected response from Google Calendar.",
            Self::Transport(_) => "Network error. Check your connection.",
        }
    }
}

impl From<AuthError> for CalendarError {
    fn from(err: AuthError) -> Self {
        Self::Authentication(err.to_string())
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        AppError::Calendar {
            user_message: err.user_message(),
            details: err.to_string(),
        }
    }
}
