//! Identity provider clients.
//!
//! An [`IdentityProvider`] builds the authorization URL, exchanges the
//! authorization code and fetches the profile document. [`google::GoogleProvider`]
//! is the production implementation.

use async_trait::async_trait;
use oauth2::{AccessToken, AuthorizationCode, CsrfToken, RedirectUrl};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use url::Url;

pub mod google;

pub use google::{GoogleCredentials, GoogleProvider};

/// Profile document returned by the provider's userinfo endpoint.
///
/// Absent fields decode to empty values, and an absent `verified_email`
/// counts as unverified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub verified_email: bool,
    pub name: String,
}

/// Errors raised while talking to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("the provider denied the authorization request: {0}")]
    Denied(String),
    #[error("the callback carried no authorization code")]
    MissingCode,
    #[error("code exchange failed: {0}")]
    Exchange(String),
    #[error("failed getting user info: {source}")]
    Userinfo {
        #[from]
        source: reqwest::Error,
    },
}

#[async_trait]
pub trait IdentityProvider: Debug + Send + Sync + 'static {
    /// Short provider name, used as the last segment of the route prefix.
    fn name(&self) -> &'static str;

    /// Replaces the URL the provider redirects back to after authorization.
    fn set_redirect_url(&mut self, redirect_url: RedirectUrl);

    /// Authorization endpoint URL carrying `state` and the requested scopes.
    fn authorization_url(&self, state: CsrfToken) -> Url;

    async fn exchange_code(&self, code: AuthorizationCode) -> Result<AccessToken, ProviderError>;

    async fn fetch_profile(&self, token: &AccessToken) -> Result<Profile, ProviderError>;
}
