//! Google OAuth2 provider for Calendar access.

use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret as OAuthClientSecret, CsrfToken,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse,
    TokenUrl,
};

use tamtam_core::AuthError;

use crate::secret::ClientSecret;
use crate::storage::TokenSet;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Read-write access to calendars and events.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
/// Read-only access to calendars and events.
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Scope set requested by a calendar session.
pub const CALENDAR_SCOPES: [&str; 2] = [CALENDAR_SCOPE, CALENDAR_READONLY_SCOPE];

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Everything needed to finish a consent round-trip.
pub struct AuthorizationRequest {
    /// URL the user must open
    pub url: String,
    /// State value the callback must echo back
    pub csrf_state: CsrfToken,
    /// PKCE secret matching the challenge embedded in `url`
    pub pkce_verifier: PkceCodeVerifier,
}

pub struct GoogleOAuth2Provider {
    client: BasicClient,
}

impl GoogleOAuth2Provider {
    /// Build a provider that redirects to `http://localhost:{port}/callback`.
    pub fn new(secret: &ClientSecret, port: u16) -> Result<Self, AuthError> {
        let auth_url = AuthUrl::new(secret.auth_uri.clone())
            .map_err(|e| AuthError::InvalidSecret(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(secret.token_uri.clone())
            .map_err(|e| AuthError::InvalidSecret(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(format!("http://localhost:{}/callback", port))
            .map_err(|e| AuthError::OAuthFailed(format!("Invalid redirect URI: {}", e)))?;

        let client = BasicClient::new(
            ClientId::new(secret.client_id.clone()),
            Some(OAuthClientSecret::new(secret.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self { client })
    }

    /// Generate the consent URL for the given scopes.
    ///
    /// Offline access is requested so that a refresh token comes back and
    /// later runs can skip the browser.
    pub fn authorization_url(&self, scopes: &[&str]) -> AuthorizationRequest {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().map(|s| Scope::new(s.to_string())))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        AuthorizationRequest {
            url: url.to_string(),
            csrf_state,
            pkce_verifier,
        }
    }

    /// Exchange authorization code for tokens.
    #[tracing::instrument(skip(self, code, pkce_verifier), level = "info")]
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
        requested: &[&str],
    ) -> Result<TokenSet, AuthError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::OAuthFailed(format!("Token exchange failed: {}", e)))?;

        Ok(token_set_from(&response, None, requested))
    }

    /// Refresh an expired access token.
    ///
    /// Google usually omits the refresh token on refresh; the old one stays valid
    /// and is carried over.
    #[tracing::instrument(skip(self, refresh_token), level = "info")]
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        requested: &[&str],
    ) -> Result<TokenSet, AuthError> {
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::OAuthFailed(format!("Token refresh failed: {}", e)))?;

        Ok(token_set_from(
            &response,
            Some(refresh_token.to_string()),
            requested,
        ))
    }
}

fn token_set_from(
    response: &BasicTokenResponse,
    previous_refresh_token: Option<String>,
    requested: &[&str],
) -> TokenSet {
    let expires_in = response
        .expires_in()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

    // An absent scope field means the request was granted as asked
    let scopes = response
        .scopes()
        .map(|granted| granted.iter().map(|scope| scope.to_string()).collect())
        .unwrap_or_else(|| requested.iter().map(|s| s.to_string()).collect());

    TokenSet {
        access_token: response.access_token().secret().clone(),
        refresh_token: response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or(previous_refresh_token),
        expires_at: chrono::Utc::now().timestamp() + expires_in,
        scopes,
    }
}
