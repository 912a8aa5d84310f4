use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tamtam_core::AuthError;

/// Seconds before expiry at which a token is considered due for refresh
const REFRESH_MARGIN_SECS: i64 = 300;

/// Token set for OAuth2 authentication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: String,

    /// Optional refresh token for token renewal
    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,

    /// Scopes granted to this token
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Check if the token needs refresh (within 5 minutes of expiry)
    pub fn needs_refresh(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at - REFRESH_MARGIN_SECS
    }

    /// Whether every requested scope was granted
    pub fn covers(&self, requested: &[&str]) -> bool {
        requested
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }
}

/// File-backed token cache.
///
/// One JSON document per store; the parent directory is created on first
/// write. The file is opaque to everything except this module.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached token set, `None` when nothing has been stored yet
    pub fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::StorageError(format!(
                    "Failed to read token file {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let token_set: TokenSet = serde_json::from_str(&json).map_err(|e| {
            AuthError::StorageError(format!("Failed to deserialize token set: {}", e))
        })?;

        tracing::debug!("Loaded cached token from {:?}", self.path);
        Ok(Some(token_set))
    }

    /// Persist a token set, replacing whatever was cached
    pub fn store(&self, token_set: &TokenSet) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::StorageError(format!("Failed to create tokens directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(token_set).map_err(|e| {
            AuthError::StorageError(format!("Failed to serialize token set: {}", e))
        })?;

        fs::write(&self.path, json)
            .map_err(|e| AuthError::StorageError(format!("Failed to write token file: {}", e)))?;

        tracing::info!("Stored token at {:?}", self.path);
        Ok(())
    }

    /// Forget the cached token
    pub fn delete(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Deleted token at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::StorageError(format!(
                "Failed to delete token file: {}",
                e
            ))),
        }
    }
}
