use crate::api::{handlers, AppState};
use axum::{
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health endpoint
        .route("/", get(handlers::health_check))
        // Incident management
        .route(
            "/incidents",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route(
            "/incidents/:id",
            get(handlers::get_incident).patch(handlers::update_incident),
        )
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(TimeoutLayer::new(request_timeout))
        // Browser client is served from another origin
        .layer(CorsLayer::permissive())
}
