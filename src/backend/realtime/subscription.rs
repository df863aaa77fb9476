/**
 * Stream Listen Handler
 *
 * `GET /api/v2/note/{ref}/stream` opens a Server-Sent Events stream of every
 * event produced for one note.
 *
 * # Authentication
 *
 * `EventSource` cannot set headers, so the auth middleware accepts the token
 * either as `Authorization: Bearer <token>` or as `?token=<token>`.
 *
 * # Errors
 *
 * Authorization and resolution run before the response is upgraded to a
 * stream, so failures are ordinary JSON responses:
 *
 * * `401 Unauthorized` - missing or invalid token
 * * `403 Forbidden` - the user may not view this note
 * * `404 Not Found` - unknown note reference
 *
 * # Example Response
 *
 * ```http
 * HTTP/1.1 200 OK
 * Content-Type: text/event-stream
 * Cache-Control: no-cache, no-transform
 * Connection: keep-alive
 * X-Accel-Buffering: no
 *
 * event: start
 * data: {"type":"start","position":"end","metadata":{"timestamp":1700000000000,"source":"stream:listen"}}
 *
 * : ping
 *
 * event: chunk
 * data: {"type":"chunk","data":"Hello","position":"end"}
 * ```
 */
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::Response,
};

use super::transport::{SseStream, SseTransport};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

/// Handle a stream subscription (GET /api/v2/note/{ref}/stream)
pub async fn handle_stream_listen(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    AuthUser(user): AuthUser,
) -> Result<Response, BackendError> {
    tracing::info!(reference = %reference, user_id = %user.user_id, "[Realtime] Stream subscription requested");

    let resource = state.resolver.resolve(&reference, user.user_id).await?;
    let stream = SseTransport::open(&state.broadcaster, resource.id, user.user_id, &state.transport);

    Ok(sse_response(stream))
}

/// Wrap a connection stream in a `text/event-stream` response
pub fn sse_response(stream: SseStream) -> Response {
    let mut response = Response::new(Body::from_stream(stream));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    // Stop nginx from buffering the stream
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}
