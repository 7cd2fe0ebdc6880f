//! Session management for the authenticator.
//!
//! This module provides the session cookie configuration, the keys used to
//! encrypt the cookie, and the [`SessionManagerLayer`] construction shared by
//! every route that reads or writes authentication state.

use base64::Engine;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::PrivateCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::ConfigError;

/// Session key set to `true` only by a successful callback.
pub const AUTHENTICATED_KEY: &str = "authenticated";
/// Session key holding the provider display name.
pub const NAME_KEY: &str = "name";
/// Session key holding the provider email address.
pub const EMAIL_KEY: &str = "email";

/// Session configuration options
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// The name of the session cookie
    pub cookie_name: String,
    /// The expiry policy for the session
    pub expiry: Expiry,
    /// The domain for the session cookie, host-only when unset
    pub domain: Option<String>,
    /// The path for the session cookie
    pub path: String,
    /// Whether the session cookie should be secure
    pub secure: bool,
    /// The same-site policy for the session cookie
    pub same_site: SameSite,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            expiry: Expiry::OnSessionEnd,
            domain: None,
            path: "/".to_string(),
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

/// Create a session manager layer with the given configuration
///
/// # Arguments
///
/// * `session_store` - The session store, shared with any other holder of the same handle
/// * `session_config` - The session configuration
/// * `key` - The key used to encrypt and authenticate the session cookie
///
/// # Returns
///
/// A session manager layer
pub fn create_session_layer<S>(
    session_store: S,
    session_config: &SessionConfig,
    key: Key,
) -> SessionManagerLayer<S, PrivateCookie>
where
    S: SessionStore + Clone,
{
    let layer = SessionManagerLayer::new(session_store)
        .with_name(session_config.cookie_name.clone())
        .with_expiry(session_config.expiry)
        .with_same_site(session_config.same_site)
        .with_path(session_config.path.clone())
        .with_secure(session_config.secure)
        .with_http_only(true)
        .with_always_save(false);

    let layer = match &session_config.domain {
        Some(domain) => layer.with_domain(domain.clone()),
        None => layer,
    };

    layer.with_private(key)
}

/// Generate a fresh cookie key from the operating system RNG.
pub fn generate_key() -> Result<Key, ConfigError> {
    Key::try_generate().ok_or(ConfigError::KeyGeneration)
}

/// Decode a base64 encoded cookie key of at least 64 bytes.
pub fn key_from_base64(encoded: &str) -> Result<Key, ConfigError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|source| ConfigError::InvalidSessionKey(source.to_string()))?;

    Key::try_from(bytes.as_slice()).map_err(|source| ConfigError::InvalidSessionKey(source.to_string()))
}
