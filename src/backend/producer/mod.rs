//! Producer Module
//!
//! The write side of the stream: rate-checked sessions that push events into
//! a note's channel, and the HTTP push endpoint built on them.
//!
//! # Module Structure
//!
//! ```text
//! producer/
//! ├── mod.rs      - Module exports and documentation
//! ├── session.rs  - StreamProducer, ProducerSession, ProducerError
//! └── handlers.rs - POST /api/v2/note/{ref}/stream
//! ```

pub mod handlers;
pub mod session;

pub use handlers::{handle_stream_push, PushRequest, PushResponse};
pub use session::{ProducerError, ProducerSession, StreamProducer};
