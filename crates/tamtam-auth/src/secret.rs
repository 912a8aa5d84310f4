//! Application secret as downloaded from the Google Cloud console.

use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;

use tamtam_core::AuthError;

use crate::google::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL};

/// OAuth client credentials for this application.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

/// The console wraps the credentials in a section named after the client type.
#[derive(Debug, Deserialize)]
struct SecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Read and parse a `client_secret.json` file.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AuthError::SecretNotFound(path.to_path_buf())
            } else {
                AuthError::InvalidSecret(format!("{}: {}", path.display(), e))
            }
        })?;

        Self::parse(&contents)
    }

    /// Parse the JSON document; `installed` wins when both sections exist.
    pub fn parse(contents: &str) -> Result<Self, AuthError> {
        let file: SecretFile = serde_json::from_str(contents)
            .map_err(|e| AuthError::InvalidSecret(e.to_string()))?;

        let secret = file
            .installed
            .or(file.web)
            .ok_or_else(|| AuthError::InvalidSecret("no 'installed' or 'web' section".into()))?;

        if secret.client_id.trim().is_empty() {
            return Err(AuthError::InvalidSecret("client_id is empty".into()));
        }

        Ok(secret)
    }
}
