/**
 * Stream Routes
 *
 * # Routes
 *
 * - `GET  /api/v2/note/{ref}/stream` - SSE listen endpoint
 * - `POST /api/v2/note/{ref}/stream` - Producer push
 * - `GET  /api/v2/note/{ref}/listeners` - Live viewer count for one note
 * - `GET  /api/v2/stream/stats` - Registry totals over the notes the caller
 *   may read
 *
 * All of them sit behind the auth middleware.
 */

use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::backend::error::BackendError;
use crate::backend::middleware::{auth_middleware, AuthUser};
use crate::backend::producer::handle_stream_push;
use crate::backend::realtime::{handle_stream_listen, RegistryStats, ResourceId};
use crate::backend::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct ListenerCountResponse {
    pub resource_id: ResourceId,
    pub listeners: usize,
}

/// Configure the authenticated stream routes
pub fn configure_stream_routes(router: Router<AppState>, app_state: &AppState) -> Router<AppState> {
    let stream = Router::new()
        .route(
            "/api/v2/note/{reference}/stream",
            get(handle_stream_listen).post(handle_stream_push),
        )
        .route("/api/v2/note/{reference}/listeners", get(get_listener_count))
        .route("/api/v2/stream/stats", get(get_stream_stats))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware));

    router.merge(stream)
}

/// GET /api/v2/note/{ref}/listeners
pub async fn get_listener_count(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    AuthUser(user): AuthUser,
) -> Result<Json<ListenerCountResponse>, BackendError> {
    let resource = state.resolver.resolve(&reference, user.user_id).await?;
    let listeners = state.broadcaster.listener_count(&resource.id);
    Ok(Json(ListenerCountResponse {
        resource_id: resource.id,
        listeners,
    }))
}

/// GET /api/v2/stream/stats
///
/// Notes the resolver refuses the caller are left out of the totals.
pub async fn get_stream_stats(State(state): State<AppState>, AuthUser(user): AuthUser) -> Json<RegistryStats> {
    let mut visible = Vec::new();
    for resource in state.broadcaster.stats().resources {
        if state.resolver.resolve(resource.resource_id.as_str(), user.user_id).await.is_ok() {
            visible.push(resource);
        }
    }

    Json(RegistryStats {
        total_resources: visible.len(),
        total_listeners: visible.iter().map(|r| r.listeners).sum(),
        resources: visible,
    })
}
