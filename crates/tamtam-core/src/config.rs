use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Google's documented upper bound for `maxResults` on `events.list`.
pub const MAX_RESULTS_LIMIT: u32 = 2500;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Remote calendar binding
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Credential material and token cache
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Calendar the session is bound to
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// IANA zone label attached to every date-time the client writes
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Application identity sent with every API request
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Calendar v3 REST root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upper bound on events fetched by a single refresh
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_time_zone() -> String {
    "Europe/Amsterdam".to_string()
}

fn default_application_name() -> String {
    "TamTam reservation service".to_string()
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_max_results() -> u32 {
    250
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendar_id: default_calendar_id(),
            time_zone: default_time_zone(),
            application_name: default_application_name(),
            api_base_url: default_api_base_url(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth client secret downloaded from the Google Cloud console
    #[serde(default = "default_client_secret_path")]
    pub client_secret_path: PathBuf,

    /// Where granted tokens are cached between runs
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: PathBuf,

    /// Localhost port for the OAuth redirect
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
}

fn default_client_secret_path() -> PathBuf {
    PathBuf::from("client_secret.json")
}

fn default_token_cache_path() -> PathBuf {
    default_config_dir()
        .join("tokens")
        .join("calendar-auth.json")
}

fn default_callback_port() -> u16 {
    8080
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tamtam")
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_secret_path: default_client_secret_path(),
            token_cache_path: default_token_cache_path(),
            callback_port: default_callback_port(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            calendar: CalendarConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, writing defaults there when absent
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            tracing::info!("Writing default config to {}", config_path.display());
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        Self::load()?.into_validated()
    }

    /// Validate an already loaded configuration, failing on errors and
    /// logging warnings.
    pub fn into_validated(self) -> Result<(Self, ValidationResult), ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.calendar.calendar_id.trim().is_empty() {
            result.add_error("calendar.calendar_id", "Calendar id must not be empty");
        }

        if self.calendar.time_zone.parse::<chrono_tz::Tz>().is_err() {
            result.add_error(
                "calendar.time_zone",
                format!("Unknown IANA time zone: {}", self.calendar.time_zone),
            );
        }

        if self.calendar.application_name.trim().is_empty() {
            result.add_warning(
                "calendar.application_name",
                "No application name set; requests will be anonymous",
            );
        }

        self.validate_url(
            &self.calendar.api_base_url,
            "calendar.api_base_url",
            &mut result,
        );

        if self.calendar.max_results == 0 || self.calendar.max_results > MAX_RESULTS_LIMIT {
            result.add_error(
                "calendar.max_results",
                format!("Must be between 1 and {}", MAX_RESULTS_LIMIT),
            );
        }

        if self.auth.callback_port == 0 {
            result.add_error("auth.callback_port", "Port cannot be 0");
        }

        if !self.auth.client_secret_path.exists() {
            result.add_warning(
                "auth.client_secret_path",
                format!(
                    "Client secret not found: {}",
                    self.auth.client_secret_path.display()
                ),
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(config_path, contents).map_err(|source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("tamtam");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_default_calendar_binding() {
        let config = Config::default();
        assert_eq!(config.calendar.calendar_id, "primary");
        assert_eq!(config.calendar.time_zone, "Europe/Amsterdam");
        assert_eq!(config.calendar.application_name, "TamTam reservation service");
        assert!(config
            .auth
            .token_cache_path
            .ends_with("tokens/calendar-auth.json"));
    }

    #[test]
    fn test_unknown_time_zone() {
        let mut config = Config::default();
        config.calendar.time_zone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "calendar.time_zone"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.calendar.api_base_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_max_results_bounds() {
        let mut config = Config::default();
        config.calendar.max_results = 0;
        assert!(!config.validate().is_valid());

        config.calendar.max_results = MAX_RESULTS_LIMIT + 1;
        assert!(!config.validate().is_valid());

        config.calendar.max_results = MAX_RESULTS_LIMIT;
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_zero_callback_port() {
        let mut config = Config::default();
        config.auth.callback_port = 0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "auth.callback_port"));
    }

    #[test]
    fn test_missing_secret_is_only_a_warning() {
        let mut config = Config::default();
        config.auth.client_secret_path = PathBuf::from("/nonexistent/client_secret.json");
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "auth.client_secret_path"));
    }

    #[test]
    fn test_load_from_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.calendar.calendar_id, "primary");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/tamtam\"\n[calendar]\ntime_zone = \"Europe/London\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.calendar.time_zone, "Europe/London");
        assert_eq!(config.calendar.calendar_id, "primary");
        assert_eq!(config.auth.callback_port, 8080);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[calendar\ncalendar_id = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_unwritable_location_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let err = Config::load_from(&blocker.join("config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { ref path, .. } if path == &blocker));
    }

    #[test]
    fn test_invalid_config_fails_validation() {
        let mut config = Config::default();
        config.calendar.calendar_id = " ".to_string();
        config.auth.callback_port = 0;

        let err = config.into_validated().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ref summary)
                if summary.contains("calendar.calendar_id") && summary.contains("auth.callback_port")
        ));
    }

    #[test]
    fn test_valid_config_passes_validation() {
        let (config, validation) = Config::default().into_validated().unwrap();
        assert_eq!(config.calendar.calendar_id, "primary");
        assert!(validation.errors.is_empty());
    }

    #[test]
    fn test_error_summary_joins_errors() {
        let mut result = ValidationResult::default();
        result.add_error("a", "first");
        result.add_error("b", "second");
        assert_eq!(result.error_summary(), "a: first; b: second");
    }
}
