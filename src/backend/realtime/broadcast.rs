/**
 * Stream Broadcaster
 *
 * Façade over the `ResourceChannelRegistry`. Producers call `broadcast` once
 * per increment; every listener registered for the resource at that instant
 * receives the event through its sink.
 *
 * # Failure Isolation
 *
 * A sink that errors or panics is logged, dropped from the registry and
 * closed. Delivery to the remaining listeners of the same call always
 * continues, and nothing is ever propagated back to the producer.
 *
 * # Presence
 *
 * Registration and removal publish a `PresenceChange` on a
 * `tokio::sync::broadcast` channel. Publishing never blocks and is skipped
 * when nobody listens, so registration never waits on bookkeeping.
 */
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use uuid::Uuid;

use super::registry::{ListenerHandle, RegistryStats, RemovedListener, ResourceChannelRegistry, ResourceId};
use super::sink::ListenerSink;
use crate::shared::StreamEvent;

const PRESENCE_CAPACITY: usize = 256;

/// Change in the set of viewers of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceChange {
    Joined {
        resource_id: ResourceId,
        user_id: Uuid,
        listeners: usize,
    },
    Left {
        resource_id: ResourceId,
        user_id: Uuid,
        listeners: usize,
    },
}

/// Broadcaster shared by every handler; cheap to clone
#[derive(Clone)]
pub struct StreamBroadcaster {
    registry: Arc<ResourceChannelRegistry>,
    presence: broadcast::Sender<PresenceChange>,
}

impl Default for StreamBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamBroadcaster {
    /// Create a broadcaster over a fresh registry
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ResourceChannelRegistry::new()))
    }

    /// Create a broadcaster over an existing registry
    pub fn with_registry(registry: Arc<ResourceChannelRegistry>) -> Self {
        let (presence, _) = broadcast::channel(PRESENCE_CAPACITY);
        Self { registry, presence }
    }

    /// Register a listener for a resource
    ///
    /// The in-memory registration is complete when this returns: a
    /// `broadcast` issued afterwards reaches the new listener.
    pub fn register_listener(
        &self,
        resource_id: impl Into<ResourceId>,
        sink: Arc<dyn ListenerSink>,
        user_id: Uuid,
    ) -> ListenerHandle {
        let resource_id = resource_id.into();
        let (handle, listeners) = self.registry.insert(resource_id.clone(), sink, user_id);

        tracing::info!(
            resource_id = %resource_id,
            listener_id = %handle.id(),
            user_id = %user_id,
            listeners,
            "[Realtime] Listener registered"
        );

        self.publish(PresenceChange::Joined {
            resource_id,
            user_id,
            listeners,
        });
        handle
    }

    /// Unregister a listener
    ///
    /// Idempotent: unknown or already-removed handles are a no-op. Returns
    /// whether this call removed the listener.
    pub fn unregister_listener(&self, handle: &ListenerHandle) -> bool {
        match self.registry.remove(handle) {
            Some(removed) => {
                tracing::info!(
                    resource_id = %handle.resource_id(),
                    listener_id = %handle.id(),
                    remaining = removed.remaining,
                    "[Realtime] Listener unregistered"
                );
                self.publish_left(&removed);
                true
            }
            None => {
                tracing::debug!(
                    resource_id = %handle.resource_id(),
                    listener_id = %handle.id(),
                    "[Realtime] Listener already unregistered"
                );
                false
            }
        }
    }

    /// Fan an event out to every listener of a resource
    ///
    /// Works on a snapshot taken at call time; listeners registered while the
    /// fan-out runs may or may not see this event. Returns the number of
    /// listeners attempted.
    pub fn broadcast(&self, resource_id: &ResourceId, event: &StreamEvent) -> usize {
        let listeners = self.registry.snapshot(resource_id);
        if listeners.is_empty() {
            tracing::debug!(
                resource_id = %resource_id,
                event_type = %event.kind,
                "[Realtime] No listeners, event not delivered"
            );
            return 0;
        }

        let mut delivered = Vec::with_capacity(listeners.len());
        let mut failed = Vec::new();

        for (listener_id, sink) in &listeners {
            match catch_unwind(AssertUnwindSafe(|| sink.send(event))) {
                Ok(Ok(())) => delivered.push(*listener_id),
                Ok(Err(e)) => {
                    tracing::warn!(
                        resource_id = %resource_id,
                        listener_id = %listener_id,
                        error = %e,
                        "[Realtime] Failed to send to listener"
                    );
                    failed.push(*listener_id);
                }
                Err(_) => {
                    tracing::error!(
                        resource_id = %resource_id,
                        listener_id = %listener_id,
                        "[Realtime] Listener panicked during send"
                    );
                    failed.push(*listener_id);
                }
            }
        }

        let dropped = self.registry.record_delivery(resource_id, &delivered, &failed);
        self.close_removed(dropped);

        tracing::debug!(
            resource_id = %resource_id,
            event_type = %event.kind,
            reached = delivered.len(),
            failed = failed.len(),
            "[Realtime] Event broadcast"
        );
        listeners.len()
    }

    /// Number of listeners currently registered for a resource
    pub fn listener_count(&self, resource_id: &ResourceId) -> usize {
        self.registry.count(resource_id)
    }

    /// Refresh a listener's activity so the stale sweep keeps it
    pub fn touch_listener(&self, handle: &ListenerHandle) -> bool {
        self.registry.touch(handle)
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Drop listeners that closed or stayed idle longer than `max_idle`
    pub fn prune_stale(&self, max_idle: Duration) -> usize {
        let removed = self.registry.drain_stale(max_idle, Instant::now());
        let cleaned = removed.len();
        self.close_removed(removed);

        if cleaned > 0 {
            tracing::info!(
                cleaned,
                active_resources = self.registry.stats().total_resources,
                "[Realtime] Cleaned up stale listeners"
            );
        }
        cleaned
    }

    /// Subscribe to presence changes
    pub fn subscribe_presence(&self) -> broadcast::Receiver<PresenceChange> {
        self.presence.subscribe()
    }

    // Called with the registry lock released: closing a sink may re-enter
    // `unregister_listener`.
    fn close_removed(&self, removed: Vec<RemovedListener>) {
        for listener in removed {
            listener.sink.close();
            self.publish_left(&listener);
        }
    }

    fn publish_left(&self, removed: &RemovedListener) {
        self.publish(PresenceChange::Left {
            resource_id: removed.handle.resource_id().clone(),
            user_id: removed.user_id,
            listeners: removed.remaining,
        });
    }

    fn publish(&self, change: PresenceChange) {
        if self.presence.receiver_count() > 0 {
            let _ = self.presence.send(change);
        }
    }
}
