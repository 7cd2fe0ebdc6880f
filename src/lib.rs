//! # axum-tower-sessions-oauth2
//!
//! OAuth2 login for axum applications, with the authenticated state kept in a
//! server-side session managed by tower-sessions.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization code flow with a cookie-bound CSRF state token
//! - Google provider with verified-email enforcement
//! - Encrypted session cookies over any [`tower_sessions::SessionStore`]
//! - An access gate for single handlers or whole routers
//!
//! See the [docs](crate::docs) module for comprehensive documentation.

pub mod api;
pub mod authenticator;
pub mod config;
pub mod docs;
pub mod error;
pub mod provider;
pub mod router;
pub mod session;
pub mod session_storage;
pub mod utilities;

pub use crate::authenticator::{
    Authenticator, CallbackQuery, GoogleOAuth2Authenticator, OAuth2Authenticator, RedirectPolicy,
};
pub use crate::config::{AuthenticatorConfig, ConfigError, PostAuthContext};
pub use crate::error::AuthError;
pub use crate::provider::{GoogleCredentials, GoogleProvider, IdentityProvider, Profile};
pub use crate::router::{authenticated_routes, require_authentication};
pub use crate::session::SessionConfig;
pub use crate::session_storage::MemoryStore;

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a JSON formatted global subscriber filtered by `RUST_LOG`, `info` when unset.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
