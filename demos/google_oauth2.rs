//! Hello-world page behind Google login.
//!
//! ```sh
//! GOOGLE_OAUTH_CLIENT_ID=... GOOGLE_OAUTH_CLIENT_SECRET=... DEV_MODE=true \
//!     cargo run --example google_oauth2
//! ```

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use axum_tower_sessions_oauth2::{
    init_tracing, require_authentication, Authenticator, AuthenticatorConfig, GoogleCredentials,
    GoogleOAuth2Authenticator,
};
use tower_http::trace::TraceLayer;
use tower_sessions::Session;

const GOOGLE_LOGOUT: &str = "https://www.google.com/accounts/Logout?continue=https://appengine.google.com/_ah/logout?continue=http://localhost:8080/";

async fn hello(State(auth): State<GoogleOAuth2Authenticator>, session: Session) -> Html<String> {
    tracing::info!("hit hello world");

    let name = auth
        .read_session_value::<String>(&session, "name")
        .await
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<meta charset="utf-8">
<body>
    Hello {}
    <a href="/auth/google/logout">Logout</a>
</body>
</html>
"#,
        escape(&name)
    ))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = AuthenticatorConfig::from_env()?;
    if config.auth_failure_redirect.is_none() {
        config.redirect_to_login_on_auth_failure = true;
    }
    if config.logout_redirect.is_none() {
        config.logout_redirect = Some(GOOGLE_LOGOUT.to_string());
    }
    let auth = GoogleOAuth2Authenticator::google(GoogleCredentials::from_env()?, config)?;

    let main_routes = Router::new()
        .route("/", require_authentication(auth.clone(), get(hello)))
        .with_state(auth.clone());

    let app = auth
        .with_session_layers(main_routes.merge(auth.routes()))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
