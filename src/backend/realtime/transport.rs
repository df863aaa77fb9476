/**
 * SSE Transport Adapter
 *
 * One `SseTransport` exists per live viewer connection. It implements
 * `ListenerSink` so the broadcaster can hand it events, encodes them as SSE
 * frames and queues them on a bounded per-connection channel that feeds the
 * HTTP response body.
 *
 * # Lifecycle
 *
 * ```text
 * CONNECTING ──open()──► OPEN ──abort / end / write failure──► CLOSED
 * ```
 *
 * Entering OPEN queues the initial `start` frame, registers the listener and
 * spawns the heartbeat task. Teardown stops the heartbeat, unregisters the
 * listener and drops the channel sender so the body ends once drained. One
 * atomic flag guards teardown, so a natural end racing a client abort still
 * cleans up exactly once.
 *
 * # Abort Signal
 *
 * Hyper drops the response body when the client disconnects. `SseStream`
 * owns a guard whose `Drop` is that abort signal.
 */
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use super::broadcast::StreamBroadcaster;
use super::frame::{encode_event, heartbeat_frame};
use super::registry::{ListenerHandle, ResourceId};
use super::sink::{ListenerSink, SinkError};
use crate::shared::{AppConfig, EventMetadata, StreamEvent};

/// Connection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Why a connection was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A terminal `end` event was written
    Completed,
    /// The client went away
    Aborted,
    /// A frame could not be queued for the peer
    DeliveryFailed,
    HeartbeatFailed,
    /// The registry dropped the listener
    Evicted,
}

/// Per-connection transport settings
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub heartbeat_interval: Duration,
    /// Frames buffered before the consumer counts as too slow
    pub buffer: usize,
    pub close_on_end: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for TransportConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            buffer: config.sink_buffer.max(1),
            close_on_end: config.close_on_end,
        }
    }
}

/// Transport adapter for one SSE connection
pub struct SseTransport {
    resource_id: ResourceId,
    user_id: Uuid,
    broadcaster: StreamBroadcaster,
    close_on_end: bool,
    closed: AtomicBool,
    state: Mutex<ConnectionState>,
    sender: Mutex<Option<mpsc::Sender<Bytes>>>,
    handle: OnceLock<ListenerHandle>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl SseTransport {
    /// Open a connection for an already-authorized viewer
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(
        broadcaster: &StreamBroadcaster,
        resource_id: ResourceId,
        user_id: Uuid,
        config: &TransportConfig,
    ) -> SseStream {
        let (tx, rx) = mpsc::channel(config.buffer.max(1));
        let transport = Arc::new(Self {
            resource_id: resource_id.clone(),
            user_id,
            broadcaster: broadcaster.clone(),
            close_on_end: config.close_on_end,
            closed: AtomicBool::new(false),
            state: Mutex::new(ConnectionState::Connecting),
            sender: Mutex::new(Some(tx)),
            handle: OnceLock::new(),
            heartbeat: Mutex::new(None),
        });

        // Queued before registration so it is always the first frame.
        let start = StreamEvent::start().with_metadata(EventMetadata::now("stream:listen"));
        if let Err(e) = encode_event(&start)
            .map_err(|e| SinkError::Encode(e.to_string()))
            .and_then(|frame| transport.try_write(frame))
        {
            tracing::error!(resource_id = %resource_id, error = %e, "[Transport] Failed to queue start event");
        }

        let sink: Arc<dyn ListenerSink> = transport.clone();
        let handle = broadcaster.register_listener(resource_id, sink, user_id);
        let handle = transport.handle.get_or_init(|| handle);
        if transport.is_closed() {
            // torn down before the handle was visible to teardown
            broadcaster.unregister_listener(handle);
        } else {
            transport.set_state(ConnectionState::Open);
            transport.spawn_heartbeat(config.heartbeat_interval);
        }

        SseStream {
            frames: ReceiverStream::new(rx),
            guard: TransportGuard(transport),
        }
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn handle(&self) -> Option<&ListenerHandle> {
        self.handle.get()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tear the connection down as if the client had disconnected
    pub fn abort(&self) {
        self.teardown(CloseReason::Aborted);
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn spawn_heartbeat(self: &Arc<Self>, period: Duration) {
        let transport = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !transport.write_heartbeat() {
                    break;
                }
            }
        });

        *self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        if self.is_closed() {
            self.stop_heartbeat();
        }
    }

    fn stop_heartbeat(&self) {
        if let Some(task) = self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
        }
    }

    /// Queue one heartbeat; returns false once the connection is closed
    fn write_heartbeat(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.try_write(heartbeat_frame()) {
            Ok(()) => {
                if let Some(handle) = self.handle.get() {
                    self.broadcaster.touch_listener(handle);
                }
                true
            }
            // frames are already pending for the peer
            Err(SinkError::Full) => true,
            Err(e) => {
                tracing::debug!(resource_id = %self.resource_id, error = %e, "[Transport] Heartbeat failed");
                self.teardown(CloseReason::HeartbeatFailed);
                false
            }
        }
    }

    fn try_write(&self, frame: Bytes) -> Result<(), SinkError> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            return Err(SinkError::Closed);
        };
        tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    fn teardown(&self, reason: CloseReason) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.set_state(ConnectionState::Closed);
        self.stop_heartbeat();
        if let Some(handle) = self.handle.get() {
            self.broadcaster.unregister_listener(handle);
        }
        // Buffered frames still drain; the body ends after the last one.
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();

        tracing::info!(
            resource_id = %self.resource_id,
            user_id = %self.user_id,
            reason = ?reason,
            "[Transport] Connection closed"
        );
    }
}

impl ListenerSink for SseTransport {
    fn send(&self, event: &StreamEvent) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        let frame = encode_event(event).map_err(|e| SinkError::Encode(e.to_string()))?;
        if let Err(e) = self.try_write(frame) {
            self.teardown(CloseReason::DeliveryFailed);
            return Err(e);
        }
        if event.is_terminal() && self.close_on_end {
            self.teardown(CloseReason::Completed);
        }
        Ok(())
    }

    fn close(&self) {
        self.teardown(CloseReason::Evicted);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

struct TransportGuard(Arc<SseTransport>);

impl Drop for TransportGuard {
    fn drop(&mut self) {
        self.0.teardown(CloseReason::Aborted);
    }
}

/// Response body stream of one SSE connection
pub struct SseStream {
    frames: ReceiverStream<Bytes>,
    guard: TransportGuard,
}

impl SseStream {
    pub fn transport(&self) -> &Arc<SseTransport> {
        &self.guard.0
    }
}

impl Stream for SseStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.frames.poll_next_unpin(cx) {
            Poll::Ready(Some(frame)) => Poll::Ready(Some(Ok(frame))),
            Poll::Ready(None) => {
                self.guard.0.teardown(CloseReason::Completed);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
