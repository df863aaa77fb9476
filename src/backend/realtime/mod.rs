//! Real-time Streaming Module
//!
//! Fans incremental events (LLM text chunks, edit acknowledgements and
//! conflicts) scoped to one note out to every viewer currently connected to
//! that note, over Server-Sent Events.
//!
//! # Architecture
//!
//! - **`registry`** - resource id → registered listeners; the only shared
//!   mutable state
//! - **`broadcast`** - `StreamBroadcaster` façade with per-listener failure
//!   isolation and a presence feed
//! - **`sink`** - the `ListenerSink` capability a transport hands the registry
//! - **`frame`** - SSE wire encoding and a consumer-side decoder
//! - **`transport`** - one `SseTransport` per live connection (buffer,
//!   heartbeat, teardown)
//! - **`subscription`** - the HTTP listen handler
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── registry.rs     - ResourceChannelRegistry
//! ├── broadcast.rs    - StreamBroadcaster and presence
//! ├── sink.rs         - ListenerSink trait
//! ├── frame.rs        - SSE framing
//! ├── transport.rs    - SseTransport state machine
//! └── subscription.rs - GET /api/v2/note/{ref}/stream
//! ```
//!
//! # Delivery
//!
//! Delivery is best-effort. A listener whose buffer is full or whose peer is
//! gone is dropped; the producer never waits on a viewer.

pub mod broadcast;
pub mod frame;
pub mod registry;
pub mod sink;
pub mod subscription;
pub mod transport;

pub use broadcast::{PresenceChange, StreamBroadcaster};
pub use frame::{decode_frames, encode_event, FrameDecoder, HEARTBEAT_FRAME};
pub use registry::{ListenerHandle, ListenerId, RegistryStats, ResourceChannelRegistry, ResourceId, ResourceStats};
pub use sink::{ListenerSink, SinkError};
pub use subscription::{handle_stream_listen, sse_response};
pub use transport::{CloseReason, ConnectionState, SseStream, SseTransport, TransportConfig};
