//! Backend Error Module
//!
//! Error types specific to the backend server. They are returned from HTTP
//! handlers and convert to JSON error responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # Error Types
//!
//! - `HandlerError` - Malformed requests
//! - `RegistrationError` - 401 / 403 / 404 before a stream opens
//! - `ProducerError` - Rate limiting and invalid producer events
//! - `SharedError` - Errors from the shared module
//! - `SerializationError` - JSON serialization errors
//!
//! Sink failures never appear here: they are contained by the broadcaster.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::{BackendError, RegistrationError};
