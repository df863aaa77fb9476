/**
 * Router Configuration
 *
 * Combines all route configurations into a single Axum router.
 *
 * # Layers
 *
 * - `TraceLayer` traces every request
 * - `CorsLayer` lets browser `EventSource` clients on other origins connect
 */

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::routes::stream_routes::configure_stream_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// - `GET /health` - liveness, unauthenticated
/// - stream routes, see `stream_routes`
/// - fallback: 404
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", get(health));
    let router = configure_stream_routes(router, &app_state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    router
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health() -> &'static str {
    "ok"
}
