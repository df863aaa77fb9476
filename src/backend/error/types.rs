/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Types
 *
 * - `HandlerError` - Malformed requests rejected by a handler
 * - `RegistrationError` - A viewer could not be attached to a note
 * - `ProducerError` - A producer push was rejected
 * - `SharedError` - Validation and serialization errors from the shared module
 *
 * # Registration Errors
 *
 * Registration errors are raised before a response is upgraded to a stream,
 * so the client always receives a plain JSON error, never a half-open stream.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::producer::ProducerError;
use crate::shared::SharedError;

/// Failure to attach a viewer to a note
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Missing, malformed or expired token
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated, but not allowed on this note
    #[error("forbidden: user may not access '{reference}'")]
    Forbidden { reference: String },
    #[error("note '{reference}' not found")]
    NotFound { reference: String },
}

impl RegistrationError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(reference: impl Into<String>) -> Self {
        Self::Forbidden {
            reference: reference.into(),
        }
    }

    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::NotFound {
            reference: reference.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

/// Backend-specific error types
///
/// Each variant can be converted to an HTTP response.
///
/// # Usage
///
/// ```rust
/// use axum::http::StatusCode;
/// use notestream::backend::error::{BackendError, RegistrationError};
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let err: BackendError = RegistrationError::not_found("my-note").into();
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., malformed body, too many events)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    #[error(transparent)]
    RegistrationError(#[from] RegistrationError),

    #[error(transparent)]
    ProducerError(#[from] ProducerError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a 400 handler error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::BAD_REQUEST, message)
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `RegistrationError` - 401 / 403 / 404
    /// - `ProducerError` - 429 when rate limited, 400 for invalid events,
    ///   409 for a finished session
    /// - `SharedError` - 400 for validation, 500 for serialization
    /// - `SerializationError` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::RegistrationError(err) => err.status_code(),
            Self::ProducerError(err) => match err {
                ProducerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                ProducerError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
                ProducerError::SessionFinished => StatusCode::CONFLICT,
            },
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::RegistrationError(err) => err.to_string(),
            Self::ProducerError(err) => err.to_string(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}
