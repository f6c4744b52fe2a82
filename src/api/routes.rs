//! API Routes
//!
//! Configures the Axum router with all lookup service endpoints.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::handlers::{config_handler, health_handler, metrics_handler, user_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /user?id=<id>` - Look up a user by id
/// - `GET /health` - Health check endpoint
/// - `GET /config` - Configuration in use
/// - `GET /metrics` - Plain-text metrics report
///
/// # Middleware
/// - HTTP metrics: records count and latency per matched route
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/user", get(user_handler))
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            track_http_metrics,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Records each routed request in the metrics collector and logs it.
///
/// Installed as a route layer, so only matched routes reach it.
async fn track_http_metrics(
    State(state): State<AppState>,
    matched: MatchedPath,
    request: Request,
    next: Next,
) -> Response {
    let endpoint = matched.as_str().to_string();
    let method = request.method().clone();

    let start = Instant::now();
    let response = next.run(request).await;
    state.metrics.record_http_request(&endpoint, start.elapsed());

    info!(
        component = "HTTP",
        "{} {} {}",
        method,
        endpoint,
        response.status().as_u16()
    );
    response
}
