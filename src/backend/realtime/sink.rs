/**
 * Listener Sink
 *
 * A sink is the capability a transport hands to the registry so events can
 * reach one live viewer. The registry only ever holds the handle; the
 * connection-level resources stay owned by the transport.
 */
use thiserror::Error;

use crate::shared::StreamEvent;

/// Failure to hand an event to one listener
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The peer is gone or the transport already tore down
    #[error("listener is closed")]
    Closed,
    /// The per-connection buffer is full; the consumer is too slow
    #[error("listener buffer is full")]
    Full,
    /// The event could not be encoded for this transport
    #[error("failed to encode event: {0}")]
    Encode(String),
}

/// Capability implemented per transport (SSE, WebSocket, long-poll, ...)
///
/// `send` must not block: the broadcaster calls it inline during fan-out.
pub trait ListenerSink: Send + Sync {
    /// Hand one event to the listener
    fn send(&self, event: &StreamEvent) -> Result<(), SinkError>;

    /// Tear the listener down; must be idempotent
    fn close(&self);

    /// Whether the sink has already closed
    fn is_closed(&self) -> bool {
        false
    }
}
