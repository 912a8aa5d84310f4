use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use warp::Filter;

use tamtam_core::{AuthConfig, AuthError};

use crate::google::GoogleOAuth2Provider;
use crate::secret::ClientSecret;
use crate::storage::{TokenSet, TokenStore};

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<HashMap<String, String>>>>>;

/// Produces credentials for the remote calendar.
///
/// Implementations decide how consent and caching work; callers only ask
/// for a token covering a scope set.
pub trait Authenticator: Send + Sync {
    /// Return a usable token for `scopes`, or fail.
    async fn authorize(&self, scopes: &[&str]) -> Result<TokenSet, AuthError>;
}

/// Hands out a token obtained elsewhere.
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    token: TokenSet,
}

impl StaticAuthenticator {
    pub fn new(token: TokenSet) -> Self {
        Self { token }
    }
}

impl Authenticator for StaticAuthenticator {
    async fn authorize(&self, scopes: &[&str]) -> Result<TokenSet, AuthError> {
        if !self.token.covers(scopes) {
            return Err(AuthError::OAuthFailed(format!(
                "Token does not grant requested scopes: {}",
                scopes.join(" ")
            )));
        }
        Ok(self.token.clone())
    }
}

/// Installed-application flow: cached token, then refresh, then browser consent.
pub struct InstalledAppAuthenticator {
    provider: GoogleOAuth2Provider,
    store: TokenStore,
    callback_port: u16,
}

impl InstalledAppAuthenticator {
    pub fn new(
        secret: &ClientSecret,
        store: TokenStore,
        callback_port: u16,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            provider: GoogleOAuth2Provider::new(secret, callback_port)?,
            store,
            callback_port,
        })
    }

    /// Build from configuration. The client secret is read here, so a missing
    /// or malformed secret fails before any token lookup.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let secret = ClientSecret::load(&config.client_secret_path)?;
        Self::new(
            &secret,
            TokenStore::new(&config.token_cache_path),
            config.callback_port,
        )
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Sign out (delete stored token)
    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.store.delete()
    }

    fn cached_token(&self) -> Option<TokenSet> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Ignoring unreadable token cache: {}", e);
                None
            }
        }
    }

    /// Perform full OAuth2 flow with browser and local callback server
    async fn authenticate(&self, scopes: &[&str]) -> Result<TokenSet, AuthError> {
        let request = self.provider.authorization_url(scopes);

        let (tx, rx) = oneshot::channel();
        let tx: CallbackSender = Arc::new(Mutex::new(Some(tx)));

        let routes = warp::get()
            .and(warp::path("callback"))
            .and(warp::path::end())
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::any().map(move || tx.clone()))
            .and_then(|params: HashMap<String, String>, tx: CallbackSender| async move {
                if let Some(sender) = tx.lock().await.take() {
                    let _ = sender.send(params);
                }

                Ok::<_, warp::Rejection>(warp::reply::html(
                    "<html><body><h1>Authorization complete</h1><p>You can close this window and return to TamTam.</p></body></html>",
                ))
            });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(([127, 0, 0, 1], self.callback_port), async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|_| AuthError::PortInUse(self.callback_port))?;
        let server = tokio::spawn(server);
        tracing::debug!("OAuth callback listening on {}", addr);

        tracing::info!("Opening browser for OAuth2 authorization...");
        tracing::info!("Auth URL: {}", request.url);
        if let Err(e) = webbrowser::open(&request.url) {
            tracing::warn!("Failed to open browser, open the URL above manually: {}", e);
        }

        let params = rx.await.map_err(|_| {
            AuthError::OAuthFailed("Callback server stopped before a redirect arrived".into())
        });

        let _ = shutdown_tx.send(());
        let _ = server.await;

        let code = parse_callback(&params?, request.csrf_state.secret())?;
        let token = self
            .provider
            .exchange_code(code, request.pkce_verifier, scopes)
            .await?;

        tracing::info!("OAuth2 flow completed");
        Ok(token)
    }
}

impl Authenticator for InstalledAppAuthenticator {
    async fn authorize(&self, scopes: &[&str]) -> Result<TokenSet, AuthError> {
        if let Some(cached) = self.cached_token() {
            if !cached.covers(scopes) {
                tracing::info!("Cached token lacks requested scopes, re-authorizing");
            } else if !cached.needs_refresh() {
                tracing::debug!("Using cached token");
                return Ok(cached);
            } else if let Some(refresh_token) = cached.refresh_token.as_deref() {
                match self.provider.refresh_token(refresh_token, scopes).await {
                    Ok(token) => {
                        self.store.store(&token)?;
                        return Ok(token);
                    }
                    Err(e) => tracing::warn!("Stored refresh token rejected: {}", e),
                }
            }
        }

        let token = self.authenticate(scopes).await?;
        self.store.store(&token)?;
        Ok(token)
    }
}

/// Validate the redirect query and pull out the authorization code.
fn parse_callback(
    params: &HashMap<String, String>,
    expected_state: &str,
) -> Result<String, AuthError> {
    if let Some(error) = params.get("error") {
        return Err(if error == "access_denied" {
            AuthError::OAuthCancelled
        } else {
            AuthError::OAuthFailed(error.clone())
        });
    }

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(AuthError::OAuthFailed("CSRF token mismatch".into()));
    }

    params
        .get("code")
        .filter(|code| !code.is_empty())
        .cloned()
        .ok_or_else(|| AuthError::OAuthFailed("Callback carried no authorization code".into()))
}
