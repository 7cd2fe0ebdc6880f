use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use oauth2::{AccessToken, AuthorizationCode, CsrfToken, RedirectUrl};
use tower::ServiceExt;
use tower_sessions::Session;
use url::Url;

use crate::authenticator::{Authenticator, OAuth2Authenticator};
use crate::config::AuthenticatorConfig;
use crate::provider::{IdentityProvider, Profile, ProviderError};
use crate::router::require_authentication;
use crate::session::NAME_KEY;
use crate::utilities::STATE_COOKIE_NAME;


pub(crate) const VALID_CODE: &str = "validcode";
const AUTHORIZE_URL: &str = "https://provider.example/authorize";

/// Provider double: accepts `validcode` and answers with a fixed profile.
#[derive(Clone, Debug)]
pub(crate) struct MockProvider {
    profile: Profile,
    redirect_url: Option<String>,
}

impl MockProvider {
    pub(crate) fn verified() -> Self {
        Self {
            profile: Profile {
                id: "1234".to_string(),
                email: "ada@example.com".to_string(),
                verified_email: true,
                name: "Ada".to_string(),
            },
            redirect_url: None,
        }
    }

    pub(crate) fn unverified() -> Self {
        let mut provider = Self::verified();
        provider.profile.verified_email = false;
        provider
    }

    pub(crate) fn redirect_url(&self) -> Option<String> {
        self.redirect_url.clone()
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn set_redirect_url(&mut self, redirect_url: RedirectUrl) {
        self.redirect_url = Some(redirect_url.url().as_str().to_string());
    }

    fn authorization_url(&self, state: CsrfToken) -> Url {
        Url::parse_with_params(AUTHORIZE_URL, &[("state", state.secret())]).unwrap()
    }

    async fn exchange_code(&self, code: AuthorizationCode) -> Result<AccessToken, ProviderError> {
        if code.secret() == VALID_CODE {
            Ok(AccessToken::new("mock-access-token".to_string()))
        } else {
            Err(ProviderError::Exchange("invalid_grant".to_string()))
        }
    }

    async fn fetch_profile(&self, _token: &AccessToken) -> Result<Profile, ProviderError> {
        Ok(self.profile.clone())
    }
}

type TestAuthenticator = OAuth2Authenticator<MockProvider>;

fn authenticator(provider: MockProvider, config: AuthenticatorConfig) -> TestAuthenticator {
    OAuth2Authenticator::new(provider, config).unwrap()
}

// `/hello` is gated, `/public` is not
fn test_app(auth: &TestAuthenticator) -> Router {
    let greeter = auth.clone();
    let hello = get(move |session: Session| async move {
        let name = greeter
            .read_session_value::<String>(&session, NAME_KEY)
            .await
            .unwrap_or_default();
        format!("hello {name}")
    });

    let app = Router::new()
        .route("/hello", require_authentication(auth.clone(), hello))
        .route("/public", get(|| async { "public route" }))
        .merge(auth.routes());

    auth.with_session_layers(app)
}

async fn send(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Value of a non-empty `Set-Cookie` for `name`.
fn set_cookie(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(cookie_name, value)| *cookie_name == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

/// Runs login and callback, returning the `Cookie` header of the authenticated session.
async fn login(app: &Router) -> String {
    let response = send(app, "/auth/mock/login", None).await;
    let state = set_cookie(&response, STATE_COOKIE_NAME).unwrap();

    let response = send(
        app,
        &format!("/auth/mock/callback?state={state}&code={VALID_CODE}"),
        Some(&format!("{STATE_COOKIE_NAME}={state}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);

    format!("session={}", set_cookie(&response, "session").unwrap())
}
