//! API Routes
//!
//! Configures the Axum router with all FizzBuzz service endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::handlers::{
    fizz_buzz_handler, health_handler, metrics_handler, readiness_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /fizz-buzz` - FizzBuzz sequence, text or JSON
/// - `GET /health` - Health check endpoint
/// - `GET /readiness` - Readiness check endpoint
/// - `GET /stats` - Cache statistics
/// - `GET /metrics` - Request counts per parameter set
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
/// - Request ID: `X-Request-ID` is generated when missing and echoed back
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Layers run bottom to top on the request, so the ID is set before
    // tracing sees the request.
    Router::new()
        .route("/fizz-buzz", get(fizz_buzz_handler))
        .route("/health", get(health_handler))
        .route("/readiness", get(readiness_handler))
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
