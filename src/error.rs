//! Error handling for the authentication routes.
//!
//! [`AuthError`] is what the handshake, callback and logout operations fail
//! with. Its [`IntoResponse`] implementation is the only place that decides what
//! a client gets to see: protocol violations and upstream failures never carry
//! detail, they are logged where they occur instead.

use axum::response::{IntoResponse, Redirect, Response};
use http::StatusCode;

use crate::authenticator::state_token::StateTokenError;
use crate::provider::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The callback arrived without the state cookie: an expired handshake or a forged request.
    #[error("state cookie missing from callback request")]
    MissingStateCookie,
    /// The `state` query parameter does not match the state cookie.
    #[error("oauth state mismatch")]
    StateMismatch,
    #[error("identity provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("the provider reports an unverified email address")]
    UnverifiedEmail,
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("post-authentication callback failed: {0}")]
    PostAuthCallback(String),
    #[error(transparent)]
    StateToken(#[from] StateTokenError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::StateMismatch | AuthError::Provider(_) => StatusCode::TEMPORARY_REDIRECT,
            AuthError::UnverifiedEmail => StatusCode::FORBIDDEN,
            AuthError::MissingStateCookie
            | AuthError::Session(_)
            | AuthError::PostAuthCallback(_)
            | AuthError::StateToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AuthError::StateMismatch | AuthError::Provider(_) => {
                Redirect::temporary("/").into_response()
            }
            AuthError::UnverifiedEmail => (status, "Forbidden").into_response(),
            AuthError::Session(_) => (status, "Session save failure").into_response(),
            AuthError::MissingStateCookie
            | AuthError::PostAuthCallback(_)
            | AuthError::StateToken(_) => (status, "Internal Server Error").into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::LOCATION;
    use http_body_util::BodyExt;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_state_mismatch_redirects_to_root() {
        let response = AuthError::StateMismatch.into_response();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn test_provider_error_hides_detail() {
        let response =
            AuthError::Provider(ProviderError::Exchange("invalid_grant: secret".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_unverified_email_is_forbidden() {
        let response = AuthError::UnverifiedEmail.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(LOCATION).is_none());
    }

    #[tokio::test]
    async fn test_missing_state_cookie_is_generic_500() {
        let response = AuthError::MissingStateCookie.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_post_auth_failure_is_generic_500() {
        let response = AuthError::PostAuthCallback("directory unavailable".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error");
    }
}
