use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use http::header::REFERER;
use http::HeaderMap;
use tower_cookies::Cookies;
use tower_sessions::Session;

use crate::authenticator::{state_token, Authenticator, CallbackQuery};
use crate::error::AuthError;

pub struct PublicApi;

impl PublicApi {
    pub async fn login<A: Authenticator>(
        State(auth): State<A>,
        cookies: Cookies,
        headers: HeaderMap,
    ) -> Response {
        let referer = headers
            .get(REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        tracing::info!(referer, "starting login");

        match auth.authenticate(&cookies).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }

    pub async fn callback<A: Authenticator>(
        State(auth): State<A>,
        session: Session,
        cookies: Cookies,
        query: Result<Query<CallbackQuery>, QueryRejection>,
        headers: HeaderMap,
    ) -> Response {
        // The state token is spent even when the query does not parse.
        let Query(query) = match query {
            Ok(query) => query,
            Err(rejection) => {
                tracing::warn!(error = %rejection, "malformed callback query");
                let err = match state_token::take(&cookies) {
                    Some(_) => AuthError::StateMismatch,
                    None => AuthError::MissingStateCookie,
                };
                return err.into_response();
            }
        };

        match auth.callback(&session, &cookies, query, headers).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }

    pub async fn logout<A: Authenticator>(State(auth): State<A>, session: Session) -> Response {
        match auth.deauthenticate(&session).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}
