//! Shared Module
//!
//! Types shared by the streaming core, the HTTP boundary and consumers of the
//! event stream. All types are designed for serialization over the wire.

/// Stream event model
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use event::{ChunkPosition, EventMetadata, StreamEvent, StreamEventType};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
