//! Configuration management for the authenticator.
//!
//! Every recognized option lives in [`AuthenticatorConfig`]. The whole struct is
//! validated once when the authenticator is built.

use http::HeaderMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tower_sessions::cookie::Key;
use tower_sessions::Session;

use crate::provider::Profile;
use crate::session::{key_from_base64, SessionConfig};
use crate::session_storage::MemoryStore;
use crate::utilities::Utilities;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type PostAuthFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

/// Hook run after a successful login has been committed to the session.
pub type PostAuthCallback = Arc<dyn Fn(PostAuthContext) -> PostAuthFuture + Send + Sync>;

/// What the post-authentication hook gets to see.
#[derive(Clone, Debug)]
pub struct PostAuthContext {
    /// The freshly authenticated session
    pub session: Session,
    /// The verified provider profile
    pub profile: Profile,
    /// Headers of the callback request
    pub headers: HeaderMap,
}

/// Authenticator configuration
pub struct AuthenticatorConfig<S = MemoryStore> {
    /// Where unauthenticated requests to gated routes are sent. `None` answers 404.
    pub auth_failure_redirect: Option<String>,
    /// Shorthand for redirecting unauthenticated requests to the login route.
    pub redirect_to_login_on_auth_failure: bool,
    /// Where a successful logout is sent. `None` redirects to `/`.
    pub logout_redirect: Option<String>,
    /// The session store backing the session cookie
    pub session_store: S,
    /// Session cookie options
    pub session_config: SessionConfig,
    /// Key encrypting the session cookie. A random key is generated when unset.
    pub session_key: Option<Key>,
    /// Hook run after the session has been authenticated and saved
    pub post_auth_callback: Option<PostAuthCallback>,
    /// Overrides the URL the provider redirects back to
    pub provider_redirect_url: Option<String>,
}

impl Default for AuthenticatorConfig<MemoryStore> {
    fn default() -> Self {
        Self {
            auth_failure_redirect: None,
            redirect_to_login_on_auth_failure: false,
            logout_redirect: None,
            session_store: MemoryStore::default(),
            session_config: SessionConfig::default(),
            session_key: None,
            post_auth_callback: None,
            provider_redirect_url: None,
        }
    }
}

impl AuthenticatorConfig<MemoryStore> {
    /// Create a configuration from environment variables
    ///
    /// Recognized variables: `AUTH_FAILURE_REDIRECT`, `AUTH_REDIRECT_TO_LOGIN`,
    /// `LOGOUT_REDIRECT`, `OAUTH_REDIRECT_URL`, `SESSION_KEY` (base64, at least
    /// 64 bytes) and `DEV_MODE` (disables secure cookies).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let non_empty = |name| lookup(name).filter(|value: &String| !value.is_empty());
        let flag = |name| {
            non_empty(name)
                .map(|value| value == "true" || value == "1")
                .unwrap_or(false)
        };

        let mut config = Self {
            auth_failure_redirect: non_empty("AUTH_FAILURE_REDIRECT"),
            redirect_to_login_on_auth_failure: flag("AUTH_REDIRECT_TO_LOGIN"),
            logout_redirect: non_empty("LOGOUT_REDIRECT"),
            provider_redirect_url: non_empty("OAUTH_REDIRECT_URL"),
            ..Self::default()
        };

        if let Some(encoded) = non_empty("SESSION_KEY") {
            config.session_key = Some(key_from_base64(&encoded)?);
        }

        config.session_config.secure = !flag("DEV_MODE");

        Ok(config)
    }
}

impl<S> AuthenticatorConfig<S> {
    /// Swaps in another session store, keeping every other option.
    pub fn with_session_store<T>(self, session_store: T) -> AuthenticatorConfig<T> {
        AuthenticatorConfig {
            auth_failure_redirect: self.auth_failure_redirect,
            redirect_to_login_on_auth_failure: self.redirect_to_login_on_auth_failure,
            logout_redirect: self.logout_redirect,
            session_store,
            session_config: self.session_config,
            session_key: self.session_key,
            post_auth_callback: self.post_auth_callback,
            provider_redirect_url: self.provider_redirect_url,
        }
    }

    pub fn with_post_auth_callback<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(PostAuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let callback: PostAuthCallback =
            Arc::new(move |context: PostAuthContext| -> PostAuthFuture { Box::pin(callback(context)) });
        self.post_auth_callback = Some(callback);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_failure_redirect.is_some() && self.redirect_to_login_on_auth_failure {
            return Err(ConfigError::ConflictingAuthFailureRedirect);
        }

        validate_redirect("auth_failure_redirect", self.auth_failure_redirect.as_deref())?;
        validate_redirect("logout_redirect", self.logout_redirect.as_deref())?;

        if let Some(redirect_url) = &self.provider_redirect_url {
            let parsed = url::Url::parse(redirect_url).map_err(|_| ConfigError::InvalidRedirect {
                option: "provider_redirect_url",
                value: redirect_url.clone(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidRedirect {
                    option: "provider_redirect_url",
                    value: redirect_url.clone(),
                });
            }
        }

        if self.session_config.cookie_name == crate::utilities::STATE_COOKIE_NAME {
            return Err(ConfigError::CookieNameCollision);
        }

        Ok(())
    }
}

fn validate_redirect(option: &'static str, value: Option<&str>) -> Result<(), ConfigError> {
    match value {
        Some(target) if !Utilities::is_valid_redirect_target(target) => {
            Err(ConfigError::InvalidRedirect {
                option,
                value: target.to_string(),
            })
        }
        _ => Ok(()),
    }
}

impl<S: Debug> Debug for AuthenticatorConfig<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatorConfig")
            .field("auth_failure_redirect", &self.auth_failure_redirect)
            .field(
                "redirect_to_login_on_auth_failure",
                &self.redirect_to_login_on_auth_failure,
            )
            .field("logout_redirect", &self.logout_redirect)
            .field("session_store", &self.session_store)
            .field("session_config", &self.session_config)
            .field("session_key", &self.session_key.as_ref().map(|_| "<redacted>"))
            .field("post_auth_callback", &self.post_auth_callback.is_some())
            .field("provider_redirect_url", &self.provider_redirect_url)
            .finish()
    }
}

/// Errors that can occur when loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration value is missing
    #[error("Missing required configuration value: {0}")]
    MissingValue(&'static str),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Invalid redirect target for {option}: {value}")]
    InvalidRedirect { option: &'static str, value: String },
    #[error("auth_failure_redirect and redirect_to_login_on_auth_failure are mutually exclusive")]
    ConflictingAuthFailureRedirect,
    #[error("the session cookie must not share its name with the state cookie")]
    CookieNameCollision,
    #[error("could not parse url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("the random source failed while generating the session key")]
    KeyGeneration,
    #[error("invalid session key: {0}")]
    InvalidSessionKey(String),
    #[error("could not build the http client: {0}")]
    HttpClient(String),
}
