//! Route configuration and setup

use crate::auth::basic_auth_middleware;
use crate::error::error_details_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, put},
    Json, Router,
};
use shoebox_infra::{access_log_middleware, request_id_middleware};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Upload requests carry a few hundred bytes of JSON
const UPLOAD_REQUEST_BODY_LIMIT: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()));

    if state.local_receiver.is_some() {
        tracing::info!("Local object receiver enabled at /objects");
        app = app.merge(object_routes());
    }

    let is_production = state.is_production;

    // Outermost first: the request id must exist before the access log reads it
    app.with_state(state).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn(access_log_middleware))
            .layer(axum::middleware::from_fn_with_state(
                is_production,
                error_details_middleware,
            )),
    )
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

/// Routes behind basic authentication.
///
/// Registered for every method so that non-POST requests get a 405 from the handler,
/// after authentication. An oversized body fails JSON extraction and is answered like
/// any other malformed payload.
fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/upload_request",
            any(handlers::upload_request::request_upload),
        )
        .route_layer(DefaultBodyLimit::max(UPLOAD_REQUEST_BODY_LIMIT))
        .route_layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            basic_auth_middleware,
        ))
}

/// Capability writes for the local backend, authorized by signature only
fn object_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/objects/{*key}", put(handlers::objects::put_object))
        .layer(DefaultBodyLimit::disable())
}
