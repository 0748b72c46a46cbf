//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - Auth endpoints (register, login, current user)
//! - User profile endpoint
//! - Post feed endpoints
//! - Post suggestion endpoint

pub mod auth;
pub mod middleware;
pub mod posts;
pub mod responses;
pub mod suggestions;
pub mod users;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser, AUTH_TOKEN_HEADER};

/// Build the API router (mounted under `/api` by [`build_router`])
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid token)
    let protected_routes = Router::new()
        .merge(auth::protected_router())
        .merge(users::protected_router())
        .merge(posts::protected_router())
        .merge(suggestions::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(auth::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let allow_origin = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) if cors_origin != "*" => AllowOrigin::exact(origin),
        _ => AllowOrigin::any(),
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(AUTH_TOKEN_HEADER),
        ]);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
