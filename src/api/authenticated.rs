use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;

use crate::authenticator::Authenticator;

pub struct AuthenticatedApi;

impl AuthenticatedApi {
    /// Runs the wrapped handler only for authenticated sessions.
    ///
    /// A request that reaches the gate without a session layer is treated as
    /// unauthenticated.
    pub async fn require_authentication<A: Authenticator>(
        State(auth): State<A>,
        request: Request,
        next: Next,
    ) -> Response {
        let session = request.extensions().get::<Session>().cloned();
        let authenticated = match session {
            Some(session) => auth.is_authenticated(&session).await,
            None => {
                tracing::warn!("no session layer in front of a gated route");
                false
            }
        };

        if !authenticated {
            tracing::debug!(path = %request.uri().path(), "denied unauthenticated request");
            return auth.redirects().auth_failure_response();
        }

        next.run(request).await
    }
}
