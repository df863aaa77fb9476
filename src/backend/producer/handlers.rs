/**
 * Producer Push Handler
 *
 * `POST /api/v2/note/{ref}/stream` lets an out-of-process producer push a
 * batch of events into a note's channel.
 *
 * # Request
 *
 * ```json
 * { "events": [ { "type": "chunk", "data": "Hello" }, { "type": "end" } ] }
 * ```
 *
 * # Responses
 *
 * * `202 Accepted` - `{"accepted": true, "events": 2, "delivered": 4}` where
 *   `delivered` sums the listeners attempted per event
 * * `400 Bad Request` - malformed body, empty batch, too many events or an
 *   invalid event; nothing is broadcast
 * * `401` / `403` / `404` - see the listen handler
 * * `429 Too Many Requests` - with `Retry-After` and `X-RateLimit-*` headers
 */

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::session::ProducerError;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::StreamEvent;

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub events: Vec<StreamEvent>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushResponse {
    pub accepted: bool,
    pub events: usize,
    pub delivered: usize,
}

/// Handle a producer push (POST /api/v2/note/{ref}/stream)
pub async fn handle_stream_push(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Result<(StatusCode, Json<PushResponse>), BackendError> {
    let started = Instant::now();

    let request: PushRequest = serde_json::from_slice(&body)
        .map_err(|e| BackendError::bad_request(format!("malformed request body: {e}")))?;
    let max = state.config.max_events_per_request;
    if request.events.is_empty() || request.events.len() > max {
        return Err(BackendError::bad_request(format!(
            "expected between 1 and {max} events, got {}",
            request.events.len()
        )));
    }
    // Reject the whole batch before anything is broadcast
    let last = request.events.len() - 1;
    for (i, event) in request.events.iter().enumerate() {
        event.validate().map_err(ProducerError::from)?;
        if event.is_terminal() && i != last {
            return Err(BackendError::bad_request("`end` must be the last event of a batch"));
        }
    }

    let resource = state.resolver.resolve(&reference, user.user_id).await?;
    let mut session = state
        .producer
        .begin(user.user_id, resource.id)?
        .with_source("stream:push");

    let mut delivered = 0;
    for event in request.events {
        delivered += session.emit(event)?;
    }

    tracing::info!(
        resource_id = %session.resource_id(),
        events = session.emitted(),
        delivered,
        duration_ms = started.elapsed().as_millis() as u64,
        "[Producer] Push accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(PushResponse {
            accepted: true,
            events: session.emitted(),
            delivered,
        }),
    ))
}
