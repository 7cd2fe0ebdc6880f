//! Routing configuration for the authenticator.
//!
//! This module builds the login, callback and logout routes and wraps host
//! routes with the access gate.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, MethodRouter};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::authenticated::AuthenticatedApi;
use crate::api::public::PublicApi;
use crate::authenticator::Authenticator;
use crate::utilities::Utilities;

/// Create the auth routes for `auth`
///
/// Every response of these routes, denials included, carries the no-cache
/// headers. The routes are never gated.
pub fn auth_routes<A, S>(auth: A) -> Router<S>
where
    A: Authenticator,
    S: Clone + Send + Sync + 'static,
{
    let prefix = auth.route_prefix().to_string();
    let [cache_control, expires, pragma] = Utilities::no_cache_headers();

    Router::new()
        .route(&Utilities::login_path(&prefix), get(PublicApi::login::<A>))
        .route(
            &Utilities::callback_path(&prefix),
            get(PublicApi::callback::<A>),
        )
        .route(
            &Utilities::logout_path(&prefix),
            get(PublicApi::logout::<A>).post(PublicApi::logout::<A>),
        )
        .route_layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    cache_control.0,
                    cache_control.1,
                ))
                .layer(SetResponseHeaderLayer::overriding(expires.0, expires.1))
                .layer(SetResponseHeaderLayer::overriding(pragma.0, pragma.1)),
        )
        .with_state(auth)
}

/// Gate a single handler: it only runs for authenticated sessions.
pub fn require_authentication<A, S>(auth: A, handler: MethodRouter<S>) -> MethodRouter<S>
where
    A: Authenticator,
    S: Clone + Send + Sync + 'static,
{
    handler.route_layer(from_fn_with_state(
        auth,
        AuthenticatedApi::require_authentication::<A>,
    ))
}

/// Gate every route already registered on `router`.
///
/// Routes added afterwards and the fallback stay public.
pub fn authenticated_routes<A, S>(auth: A, router: Router<S>) -> Router<S>
where
    A: Authenticator,
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(from_fn_with_state(
        auth,
        AuthenticatedApi::require_authentication::<A>,
    ))
}
