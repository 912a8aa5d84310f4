//! Centralized error types for TamTam.
//!
//! Errors shared across crates live here so that the authenticator and the
//! calendar session agree on one vocabulary. Every enum offers
//! `user_message()` for display next to the full `Display` text used in logs.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A failed calendar operation, flattened so this crate stays at the
    /// bottom of the dependency graph.
    #[error("Calendar error: {details}")]
    Calendar {
        details: String,
        user_message: &'static str,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Calendar { user_message, .. } => *user_message,
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Failed to write configuration: {0}")]
    SerializeError(String),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NoConfigDir => "No configuration directory found. Set HOME or XDG_CONFIG_HOME.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::SerializeError(_) => "Failed to save the configuration.",
            ConfigError::Io { .. } => "Configuration file could not be read or written.",
        }
    }
}

/// Authentication errors (client secret, tokens, OAuth consent).
///
/// All of these are fatal for a calendar session: without a credential no
/// remote call can be made.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Client secret file not found: {}", .0.display())]
    SecretNotFound(PathBuf),

    #[error("Client secret is invalid: {0}")]
    InvalidSecret(String),

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("OAuth flow cancelled by user")]
    OAuthCancelled,

    #[error("Token storage error: {0}")]
    StorageError(String),

    #[error("Port {0} already in use for OAuth callback")]
    PortInUse(u16),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::SecretNotFound(_) => {
                "Client secret file is missing. Download it from the Google Cloud console."
            }
            AuthError::InvalidSecret(_) => "Client secret file is malformed.",
            AuthError::OAuthFailed(_) => "Sign-in failed. Please try again.",
            AuthError::OAuthCancelled => "Sign-in was cancelled.",
            AuthError::StorageError(_) => "Failed to save credentials. Please try again.",
            AuthError::PortInUse(_) => "Sign-in port is busy. Close other apps and try again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let messages = [
            AuthError::SecretNotFound(PathBuf::from("client_secret.json")).user_message(),
            AuthError::InvalidSecret("x".into()).user_message(),
            AuthError::OAuthFailed("x".into()).user_message(),
            AuthError::OAuthCancelled.user_message(),
            AuthError::StorageError("x".into()).user_message(),
            AuthError::PortInUse(8080).user_message(),
            ConfigError::NoConfigDir.user_message(),
            ConfigError::Invalid("x".into()).user_message(),
            ConfigError::ParseError("x".into()).user_message(),
            ConfigError::SerializeError("x".into()).user_message(),
        ];

        for message in messages {
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let auth_err = AuthError::OAuthCancelled;
        let app_err: AppError = auth_err.into();
        assert!(matches!(app_err, AppError::Auth(AuthError::OAuthCancelled)));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Auth(AuthError::PortInUse(8080));
        assert_eq!(
            app_err.user_message(),
            "Sign-in port is busy. Close other apps and try again."
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let app_err: AppError = ConfigError::Invalid("calendar.time_zone: unknown".into()).into();
        assert!(app_err.to_string().contains("calendar.time_zone"));
        assert_eq!(
            app_err.user_message(),
            "Invalid configuration. Check your settings."
        );
    }

    #[test]
    fn test_config_io_error_names_path() {
        let err = ConfigError::Io {
            path: PathBuf::from("/etc/tamtam/config.toml"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/etc/tamtam/config.toml"));
    }

    #[test]
    fn test_secret_not_found_names_path() {
        let err = AuthError::SecretNotFound(PathBuf::from("/etc/tamtam/client_secret.json"));
        assert!(err.to_string().contains("/etc/tamtam/client_secret.json"));
    }
}
