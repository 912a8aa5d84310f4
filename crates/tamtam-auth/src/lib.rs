//! Credential acquisition for TamTam.
//!
//! Reads the application secret, caches granted tokens on disk and runs the
//! Google installed-app consent flow when nothing usable is cached.

pub mod authenticator;
pub mod google;
pub mod secret;
pub mod storage;

pub use authenticator::{Authenticator, InstalledAppAuthenticator, StaticAuthenticator};
pub use google::{GoogleOAuth2Provider, CALENDAR_READONLY_SCOPE, CALENDAR_SCOPE, CALENDAR_SCOPES};
pub use secret::ClientSecret;
pub use storage::{TokenSet, TokenStore};
