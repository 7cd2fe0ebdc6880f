//! Google OAuth2 provider.
//!
//! References:
//! - <https://support.google.com/cloud/answer/6158849?hl=en>
//! - <https://developers.google.com/identity/protocols/oauth2/web-server>

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AccessToken, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use std::time::Duration;
use url::Url;

use super::{IdentityProvider, Profile, ProviderError};
use crate::config::ConfigError;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:8080/auth/google/callback";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Client credentials registered with the Google Cloud console.
#[derive(Clone, Debug)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    /// Upper bound for each call to the token and userinfo endpoints
    pub request_timeout: Duration,
    pub scopes: Vec<String>,
}

impl GoogleCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            scopes: vec!["email".to_string(), "profile".to_string()],
        }
    }

    /// Reads `GOOGLE_OAUTH_CLIENT_ID`, `GOOGLE_OAUTH_CLIENT_SECRET` and the
    /// optional `GOOGLE_OAUTH_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let client_id = lookup("GOOGLE_OAUTH_CLIENT_ID")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingValue("GOOGLE_OAUTH_CLIENT_ID"))?;

        let client_secret = lookup("GOOGLE_OAUTH_CLIENT_SECRET")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingValue("GOOGLE_OAUTH_CLIENT_SECRET"))?;

        let mut credentials = Self::new(client_id, client_secret);

        if let Some(raw) = lookup("GOOGLE_OAUTH_TIMEOUT_SECS") {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "GOOGLE_OAUTH_TIMEOUT_SECS",
                    value: raw,
                })?;
            credentials.request_timeout = Duration::from_secs(secs);
        }

        Ok(credentials)
    }
}

#[derive(Clone, Debug)]
pub struct GoogleProvider {
    client: GoogleClient,
    http: reqwest::Client,
    scopes: Vec<Scope>,
    userinfo_url: Url,
}

impl GoogleProvider {
    pub fn new(credentials: GoogleCredentials) -> Result<Self, ConfigError> {
        let client = BasicClient::new(ClientId::new(credentials.client_id))
            .set_client_secret(ClientSecret::new(credentials.client_secret))
            .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string())?)
            .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?)
            .set_redirect_uri(RedirectUrl::new(DEFAULT_REDIRECT_URL.to_string())?);

        // The token endpoint must never be followed through redirects.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(credentials.request_timeout)
            .build()
            .map_err(|source| ConfigError::HttpClient(source.to_string()))?;

        Ok(Self {
            client,
            http,
            scopes: credentials.scopes.into_iter().map(Scope::new).collect(),
            userinfo_url: Url::parse(GOOGLE_USERINFO_URL)?,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn set_redirect_url(&mut self, redirect_url: RedirectUrl) {
        self.client = self.client.clone().set_redirect_uri(redirect_url);
    }

    fn authorization_url(&self, state: CsrfToken) -> Url {
        let (url, _) = self
            .client
            .authorize_url(move || state)
            .add_scopes(self.scopes.iter().cloned())
            .url();
        url
    }

    async fn exchange_code(&self, code: AuthorizationCode) -> Result<AccessToken, ProviderError> {
        let token = self
            .client
            .exchange_code(code)
            .request_async(&self.http)
            .await
            .map_err(|err| ProviderError::Exchange(err.to_string()))?;

        Ok(token.access_token().clone())
    }

    async fn fetch_profile(&self, token: &AccessToken) -> Result<Profile, ProviderError> {
        let profile = self
            .http
            .get(self.userinfo_url.clone())
            .bearer_auth(token.secret())
            .send()
            .await?
            .error_for_status()?
            .json::<Profile>()
            .await?;

        Ok(profile)
    }
}
