//! # axum-tower-sessions-oauth2 Documentation
//!
//! This module is the central place for understanding how the crate fits
//! together and how to wire it into an application.
//!
//! ## Overview
//!
//! The crate authenticates users of an axum application against an OAuth 2.0
//! identity provider. A successful login marks a server-side session as
//! authenticated; the session cookie is encrypted and only carries the session
//! ID. Routes wrapped by the access gate are only reachable with such a session.
//!
//! ## Architecture
//!
//! - **authenticator**: the [`Authenticator`](crate::Authenticator) trait, the
//!   OAuth2 implementation and the CSRF state tokens
//! - **provider**: identity providers; Google is built in
//! - **api**: the login, callback and logout handlers and the gate middleware
//! - **router**: route construction and gating helpers
//! - **session** / **session_storage**: cookie options and the in-memory store
//! - **config**: options, environment loading and validation
//!
//! ## Usage
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use axum_tower_sessions_oauth2::{
//!     require_authentication, Authenticator, AuthenticatorConfig, GoogleCredentials,
//!     GoogleOAuth2Authenticator,
//! };
//!
//! # fn build() -> Result<Router, Box<dyn std::error::Error>> {
//! let auth = GoogleOAuth2Authenticator::google(
//!     GoogleCredentials::from_env()?,
//!     AuthenticatorConfig::from_env()?,
//! )?;
//!
//! let app = Router::new()
//!     .route("/", require_authentication(auth.clone(), get(|| async { "hello" })))
//!     .merge(auth.routes());
//!
//! Ok(auth.with_session_layers(app))
//! # }
//! ```
//!
//! ### Authentication Flow
//!
//! 1. The user requests a gated route and is denied (404, or a redirect when configured)
//! 2. `GET /auth/google/login` sets the `oauthstate` cookie and redirects to Google
//! 3. Google redirects back to `/auth/google/callback` with `state` and `code`
//! 4. The state is compared against the cookie, which is consumed
//! 5. The code is exchanged and the profile is fetched; unverified emails are refused
//! 6. The session ID is rotated and the session is marked authenticated
//! 7. The user is redirected to `/` and the gate now admits them
//!
//! `GET /auth/google/logout` marks the session unauthenticated and expires it.
//!
//! ## Configuration
//!
//! | Variable | Meaning |
//! |---|---|
//! | `GOOGLE_OAUTH_CLIENT_ID` | OAuth client ID (required) |
//! | `GOOGLE_OAUTH_CLIENT_SECRET` | OAuth client secret (required) |
//! | `GOOGLE_OAUTH_TIMEOUT_SECS` | Provider request timeout, 10 by default |
//! | `OAUTH_REDIRECT_URL` | Callback URL registered with the provider |
//! | `AUTH_FAILURE_REDIRECT` | Where denied requests go; 404 when unset |
//! | `AUTH_REDIRECT_TO_LOGIN` | `true` sends denied requests to the login route |
//! | `LOGOUT_REDIRECT` | Where logout goes; `/` when unset |
//! | `SESSION_KEY` | Base64 cookie key of at least 64 bytes; random when unset |
//! | `DEV_MODE` | `true` drops the `Secure` cookie attribute |
//!
//! A random session key invalidates every session on restart. Deployments with
//! more than one instance need a shared `SESSION_KEY` and a shared
//! [`SessionStore`](tower_sessions::SessionStore) instead of the in-memory one.
