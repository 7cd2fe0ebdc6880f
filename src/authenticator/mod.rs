//! The authentication state machine.
//!
//! [`Authenticator`] is the capability set every identity-provider variant
//! offers: starting the handshake, consuming the provider callback, logging out,
//! answering whether a session is authenticated and reading values from it, and
//! exposing its own routes. [`OAuth2Authenticator`] is the production variant.

use async_trait::async_trait;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Router;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tower_cookies::Cookies;
use tower_sessions::Session;

use crate::error::AuthError;

mod oauth;
pub mod state_token;

pub use self::oauth::{GoogleOAuth2Authenticator, OAuth2Authenticator};

/// Query parameters the provider appends to the callback URL.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
    /// Set by the provider when the user declined or the request was invalid.
    pub error: Option<String>,
}

/// Where unauthenticated and logged-out requests are sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub auth_failure: Option<String>,
    pub logout: Option<String>,
}

impl RedirectPolicy {
    /// Redirect to `auth_failure`, or a plain 404 so probes cannot tell gated routes exist.
    pub fn auth_failure_response(&self) -> Response {
        match &self.auth_failure {
            Some(target) => Redirect::temporary(target).into_response(),
            None => (StatusCode::NOT_FOUND, "404 page not found").into_response(),
        }
    }

    pub fn logout_response(&self) -> Response {
        Redirect::permanent(self.logout.as_deref().unwrap_or("/")).into_response()
    }
}

#[async_trait]
pub trait Authenticator: Clone + Send + Sync + 'static {
    /// Common prefix of the login, callback and logout routes, e.g. `/auth/google`.
    fn route_prefix(&self) -> &str;

    fn redirects(&self) -> &RedirectPolicy;

    /// Issues a fresh state token and redirects to the provider's authorization endpoint.
    async fn authenticate(&self, cookies: &Cookies) -> Result<Response, AuthError>;

    /// Validates the provider callback and, on success, authenticates the session.
    async fn callback(
        &self,
        session: &Session,
        cookies: &Cookies,
        query: CallbackQuery,
        headers: HeaderMap,
    ) -> Result<Response, AuthError>;

    /// Marks the session unauthenticated and expires it.
    async fn deauthenticate(&self, session: &Session) -> Result<Response, AuthError>;

    /// Fails closed: any session error reads as "not authenticated".
    async fn is_authenticated(&self, session: &Session) -> bool;

    /// Reads `key` from the session, but only when the session is authenticated.
    async fn read_session_value<T>(&self, session: &Session, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static;

    /// The login, callback and logout routes, ready to be merged into the host router.
    fn routes<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        crate::router::auth_routes(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::LOCATION;

    #[test]
    fn test_auth_failure_without_target_is_not_found() {
        let response = RedirectPolicy::default().auth_failure_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_failure_redirect() {
        let policy = RedirectPolicy {
            auth_failure: Some("/auth/google/login".to_string()),
            logout: None,
        };
        let response = policy.auth_failure_response();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/auth/google/login"
        );
    }

    #[test]
    fn test_logout_defaults_to_root() {
        let response = RedirectPolicy::default().logout_response();
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/");
    }

    #[test]
    fn test_logout_redirect() {
        let policy = RedirectPolicy {
            auth_failure: None,
            logout: Some("https://www.google.com/accounts/Logout".to_string()),
        };
        let response = policy.logout_response();
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://www.google.com/accounts/Logout"
        );
    }
}
