/**
 * Error Conversion
 *
 * All backend errors implement `IntoResponse` from Axum, so handlers can
 * return them directly.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 429
 * }
 * ```
 *
 * Rate-limited producer errors additionally carry `Retry-After` (seconds,
 * rounded up), `X-RateLimit-Limit` and `X-RateLimit-Remaining`.
 */

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::BackendError;
use crate::backend::producer::ProducerError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "[Server] Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "[Server] Request rejected");
        }

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }));

        let mut headers = HeaderMap::new();
        if let BackendError::ProducerError(ProducerError::RateLimited {
            limit,
            remaining,
            retry_after,
        }) = &self
        {
            let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_secs.max(1)));
            headers.insert("x-ratelimit-limit", HeaderValue::from(*limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(*remaining));
        }

        (status, headers, body).into_response()
    }
}
