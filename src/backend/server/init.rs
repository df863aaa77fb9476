/**
 * Server Initialization
 *
 * # Initialization Process
 *
 * 1. Build `AppState` (broadcaster, producer, collaborators) from the config
 * 2. Create the router
 * 3. Start the periodic stale-listener sweep
 *
 * # Stale Sweep
 *
 * Every `sweep_interval` the sweep drops listeners whose transport already
 * closed or that saw neither a delivery nor a heartbeat for `stale_after`.
 * Live connections refresh themselves on each heartbeat, so only dead
 * entries are collected. The same tick forgets producer rate-limit buckets
 * that have refilled completely.
 */

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;

use crate::backend::middleware::RateLimiter;
use crate::backend::realtime::StreamBroadcaster;
use crate::backend::routes::router::create_router;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// Create and configure the Axum application
///
/// Must be called from within a tokio runtime.
pub async fn create_app(config: AppConfig) -> Router<()> {
    tracing::info!(
        heartbeat_secs = config.heartbeat_interval_secs,
        sink_buffer = config.sink_buffer,
        resources = config.resources.len(),
        "[Server] Initializing notestream backend"
    );

    let app_state = AppState::new(config);
    let sweep_every = app_state.config.sweep_interval();
    let stale_after = app_state.config.stale_after();
    let app = create_router(app_state.clone());

    spawn_stale_sweep(
        app_state.broadcaster.clone(),
        Arc::clone(app_state.rate_limiter()),
        sweep_every,
        stale_after,
    );
    tracing::info!("[Server] Router configured with periodic stale sweep");

    app
}

/// Periodically prune stale listeners and idle rate-limit state until the
/// runtime shuts down
pub fn spawn_stale_sweep(
    broadcaster: StreamBroadcaster,
    limiter: Arc<dyn RateLimiter>,
    every: Duration,
    stale_after: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let cleaned = broadcaster.prune_stale(stale_after);
            let forgotten = limiter.prune_idle();
            tracing::debug!(
                cleaned,
                forgotten,
                active_resources = broadcaster.stats().total_resources,
                "[Server] Stale sweep finished"
            );
        }
    })
}
