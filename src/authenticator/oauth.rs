use async_trait::async_trait;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Router;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use oauth2::{AuthorizationCode, RedirectUrl};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_sessions::cookie::Key;
use tower_sessions::service::PrivateCookie;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};

use super::{state_token, Authenticator, CallbackQuery, RedirectPolicy};
use crate::config::{AuthenticatorConfig, ConfigError, PostAuthCallback, PostAuthContext};
use crate::error::AuthError;
use crate::provider::{GoogleCredentials, GoogleProvider, IdentityProvider, Profile, ProviderError};
use crate::session::{
    create_session_layer, generate_key, SessionConfig, AUTHENTICATED_KEY, EMAIL_KEY, NAME_KEY,
};
use crate::session_storage::MemoryStore;
use crate::utilities::Utilities;

/// Authenticator backed by an OAuth2 authorization-code flow.
///
/// Cloning is cheap: every clone shares the same immutable configuration and
/// the same session store handle.
pub struct OAuth2Authenticator<P, S = MemoryStore> {
    inner: Arc<Inner<P, S>>,
}

pub type GoogleOAuth2Authenticator<S = MemoryStore> = OAuth2Authenticator<GoogleProvider, S>;

struct Inner<P, S> {
    provider: P,
    route_prefix: String,
    session_store: S,
    session_config: SessionConfig,
    session_key: Key,
    redirects: RedirectPolicy,
    post_auth_callback: Option<PostAuthCallback>,
}

impl<P, S> Clone for OAuth2Authenticator<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: std::fmt::Debug, S: std::fmt::Debug> std::fmt::Debug for OAuth2Authenticator<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Authenticator")
            .field("provider", &self.inner.provider)
            .field("route_prefix", &self.inner.route_prefix)
            .field("session_store", &self.inner.session_store)
            .field("redirects", &self.inner.redirects)
            .finish_non_exhaustive()
    }
}

impl<S> OAuth2Authenticator<GoogleProvider, S>
where
    S: SessionStore + Clone,
{
    pub fn google(
        credentials: GoogleCredentials,
        config: AuthenticatorConfig<S>,
    ) -> Result<Self, ConfigError> {
        Self::new(GoogleProvider::new(credentials)?, config)
    }
}

impl<P, S> OAuth2Authenticator<P, S>
where
    P: IdentityProvider,
    S: SessionStore + Clone,
{
    /// Validates `config` and builds the authenticator around `provider`.
    pub fn new(mut provider: P, config: AuthenticatorConfig<S>) -> Result<Self, ConfigError> {
        config.validate()?;

        if let Some(redirect_url) = config.provider_redirect_url {
            provider.set_redirect_url(RedirectUrl::new(redirect_url)?);
        }

        let route_prefix = format!("/auth/{}", provider.name());

        let auth_failure = if config.redirect_to_login_on_auth_failure {
            Some(Utilities::login_path(&route_prefix))
        } else {
            config.auth_failure_redirect
        };

        let session_key = match config.session_key {
            Some(key) => key,
            None => generate_key()?,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                provider,
                route_prefix,
                session_store: config.session_store,
                session_config: config.session_config,
                session_key,
                redirects: RedirectPolicy {
                    auth_failure,
                    logout: config.logout_redirect,
                },
                post_auth_callback: config.post_auth_callback,
            }),
        })
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    pub fn session_store(&self) -> &S {
        &self.inner.session_store
    }

    /// Session layer over the injected store. Every route that reads
    /// authentication state, gated routes included, must sit behind it.
    pub fn session_layer(&self) -> SessionManagerLayer<S, PrivateCookie> {
        create_session_layer(
            self.inner.session_store.clone(),
            &self.inner.session_config,
            self.inner.session_key.clone(),
        )
    }

    /// Applies the session layer, the cookie manager needed by the state token
    /// and header redaction for traces.
    pub fn with_session_layers<St>(&self, router: Router<St>) -> Router<St>
    where
        St: Clone + Send + Sync + 'static,
    {
        router
            .layer(self.session_layer())
            .layer(CookieManagerLayer::new())
            .layer(SetSensitiveRequestHeadersLayer::new([COOKIE, AUTHORIZATION]))
    }

    async fn fetch_profile(&self, code: String) -> Result<Profile, ProviderError> {
        let token = self
            .inner
            .provider
            .exchange_code(AuthorizationCode::new(code))
            .await?;

        self.inner.provider.fetch_profile(&token).await
    }
}

fn session_error(err: tower_sessions::session::Error) -> AuthError {
    tracing::error!(error = %err, "session store failure");
    AuthError::Session(err)
}

#[async_trait]
impl<P, S> Authenticator for OAuth2Authenticator<P, S>
where
    P: IdentityProvider,
    S: SessionStore + Clone,
{
    fn route_prefix(&self) -> &str {
        &self.inner.route_prefix
    }

    fn redirects(&self) -> &RedirectPolicy {
        &self.inner.redirects
    }

    #[tracing::instrument(skip_all, fields(provider = self.inner.provider.name()))]
    async fn authenticate(&self, cookies: &Cookies) -> Result<Response, AuthError> {
        let state = state_token::issue(cookies, self.inner.session_config.secure).map_err(|err| {
            tracing::error!(error = %err, "refusing to issue a state token");
            err
        })?;

        let authorization_url = self.inner.provider.authorization_url(state);

        Ok(Redirect::temporary(authorization_url.as_str()).into_response())
    }

    #[tracing::instrument(skip_all, fields(provider = self.inner.provider.name()))]
    async fn callback(
        &self,
        session: &Session,
        cookies: &Cookies,
        query: CallbackQuery,
        headers: HeaderMap,
    ) -> Result<Response, AuthError> {
        let expected_state = state_token::take(cookies).ok_or_else(|| {
            tracing::warn!("callback without state cookie");
            AuthError::MissingStateCookie
        })?;

        if query.state.as_deref().unwrap_or_default() != expected_state {
            tracing::warn!("invalid oauth state");
            return Err(AuthError::StateMismatch);
        }

        if let Some(error) = query.error {
            tracing::warn!(error = %error, "provider denied the authorization request");
            return Err(ProviderError::Denied(error).into());
        }

        let code = query
            .code
            .filter(|code| !code.is_empty())
            .ok_or(ProviderError::MissingCode)?;

        let profile = self.fetch_profile(code).await.map_err(|err| {
            tracing::error!(error = %err, "could not obtain the provider profile");
            err
        })?;

        // never allow unverified emails to access the application
        if !profile.verified_email {
            tracing::warn!("rejected profile with unverified email");
            return Err(AuthError::UnverifiedEmail);
        }

        session.cycle_id().await.map_err(session_error)?;
        session
            .insert(AUTHENTICATED_KEY, true)
            .await
            .map_err(session_error)?;
        session
            .insert(NAME_KEY, &profile.name)
            .await
            .map_err(session_error)?;
        session
            .insert(EMAIL_KEY, &profile.email)
            .await
            .map_err(session_error)?;
        session.save().await.map_err(session_error)?;

        tracing::info!("authenticated");

        // The session stays authenticated even if the hook fails.
        if let Some(post_auth_callback) = &self.inner.post_auth_callback {
            let context = PostAuthContext {
                session: session.clone(),
                profile,
                headers,
            };
            post_auth_callback(context).await.map_err(|err| {
                tracing::error!(error = %err, "post-authentication callback failed");
                AuthError::PostAuthCallback(err.to_string())
            })?;
        }

        Ok(Redirect::permanent("/").into_response())
    }

    #[tracing::instrument(skip_all, fields(provider = self.inner.provider.name()))]
    async fn deauthenticate(&self, session: &Session) -> Result<Response, AuthError> {
        if let Err(err) = session.insert(AUTHENTICATED_KEY, false).await {
            tracing::warn!(error = %err, "could not load session, continuing with an empty one");
            session.clear().await;
            session
                .insert(AUTHENTICATED_KEY, false)
                .await
                .map_err(session_error)?;
        }

        session.set_expiry(Some(Expiry::AtDateTime(
            OffsetDateTime::now_utc() - Duration::seconds(1),
        )));
        session.save().await.map_err(session_error)?;

        tracing::info!("deauthenticated");

        Ok(self.inner.redirects.logout_response())
    }

    async fn is_authenticated(&self, session: &Session) -> bool {
        match session.get::<bool>(AUTHENTICATED_KEY).await {
            Ok(authenticated) => authenticated.unwrap_or(false),
            Err(err) => {
                tracing::debug!(error = %err, "session unreadable, treating as unauthenticated");
                false
            }
        }
    }

    async fn read_session_value<T>(&self, session: &Session, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        if !self.is_authenticated(session).await {
            return None;
        }

        session.get::<T>(key).await.ok().flatten()
    }
}
