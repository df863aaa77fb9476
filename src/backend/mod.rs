//! Backend Module
//!
//! All server-side code: the streaming core, its HTTP surface and the
//! external collaborators it talks to.
//!
//! # Architecture
//!
//! - **`realtime`** - Listener registry, broadcaster, SSE transport
//! - **`producer`** - Rate-checked producer sessions and the push endpoint
//! - **`server`** - App state, configuration, initialization
//! - **`routes`** - Route configuration and router assembly
//! - **`auth`** - Bearer-token verification (`AuthGate`)
//! - **`resolver`** - Note reference → canonical id + permission
//! - **`sanitize`** - Chunk sanitization
//! - **`middleware`** - Authentication and rate limiting
//! - **`error`** - Backend error types
//!
//! # Control Flow
//!
//! A viewer opens `GET /api/v2/note/{ref}/stream`; the auth middleware and
//! resolver validate it and an `SseTransport` registers a listener. Producers
//! call `broadcast` once per increment and every listener's transport writes
//! the frame. On disconnect the transport unregisters itself.
//!
//! # Thread Safety
//!
//! The registry is the only shared mutable state. It sits behind one
//! `std::sync::Mutex` that is never held while a sink runs.

/// Authentication
pub mod auth;

/// Backend error types
pub mod error;

/// Middleware for request processing
pub mod middleware;

/// Producer sessions and push endpoint
pub mod producer;

/// Real-time streaming core
pub mod realtime;

/// Note resolution
pub mod resolver;

/// Route configuration
pub mod routes;

/// Chunk sanitization
pub mod sanitize;

/// Server setup and configuration
pub mod server;

pub use error::BackendError;
pub use realtime::StreamBroadcaster;
pub use server::create_app;
