/**
 * Resource Channel Registry
 *
 * In-process map from resource id to the listeners currently registered for
 * that resource. This is the only shared mutable state of the streaming
 * core. A single coarse mutex guards it: per-resource fan-out sizes are
 * small, and no sink is ever invoked while the lock is held.
 *
 * Channels are created lazily on first registration and pruned as soon as
 * their last listener leaves.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sink::ListenerSink;

/// Canonical id of a resource (note, canvas, document)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque listener id, unique within a resource's channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle returned by registration, used to unregister later
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    id: ListenerId,
    resource_id: ResourceId,
}

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }
}

/// Listener count for one resource
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResourceStats {
    pub resource_id: ResourceId,
    pub listeners: usize,
}

/// Snapshot of the whole registry
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_resources: usize,
    pub total_listeners: usize,
    pub resources: Vec<ResourceStats>,
}

/// A listener removed from the registry
pub struct RemovedListener {
    pub handle: ListenerHandle,
    pub sink: Arc<dyn ListenerSink>,
    pub user_id: Uuid,
    /// Listeners left on the resource after removal
    pub remaining: usize,
}

struct ListenerEntry {
    sink: Arc<dyn ListenerSink>,
    user_id: Uuid,
    registered_at: DateTime<Utc>,
    last_activity: Instant,
}

#[derive(Default)]
struct Channel {
    listeners: HashMap<ListenerId, ListenerEntry>,
}

/// Map of resource id to registered listeners
#[derive(Default)]
pub struct ResourceChannelRegistry {
    channels: Mutex<HashMap<ResourceId, Channel>>,
}

impl ResourceChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking caller cannot leave the maps half-updated, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceId, Channel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a listener, creating the channel if needed
    ///
    /// Returns the handle and the resulting listener count.
    pub fn insert(
        &self,
        resource_id: ResourceId,
        sink: Arc<dyn ListenerSink>,
        user_id: Uuid,
    ) -> (ListenerHandle, usize) {
        let id = ListenerId::generate();
        let mut channels = self.lock();
        let channel = channels.entry(resource_id.clone()).or_default();
        channel.listeners.insert(
            id,
            ListenerEntry {
                sink,
                user_id,
                registered_at: Utc::now(),
                last_activity: Instant::now(),
            },
        );
        let count = channel.listeners.len();
        (ListenerHandle { id, resource_id }, count)
    }

    /// Remove a listener; `None` when the handle is unknown or already removed
    pub fn remove(&self, handle: &ListenerHandle) -> Option<RemovedListener> {
        let mut channels = self.lock();
        let channel = channels.get_mut(&handle.resource_id)?;
        let entry = channel.listeners.remove(&handle.id)?;
        let remaining = channel.listeners.len();
        if remaining == 0 {
            channels.remove(&handle.resource_id);
        }
        Some(RemovedListener {
            handle: handle.clone(),
            sink: entry.sink,
            user_id: entry.user_id,
            remaining,
        })
    }

    /// Copy out the sinks registered for a resource at this instant
    pub fn snapshot(&self, resource_id: &ResourceId) -> Vec<(ListenerId, Arc<dyn ListenerSink>)> {
        let channels = self.lock();
        match channels.get(resource_id) {
            Some(channel) => channel
                .listeners
                .iter()
                .map(|(id, entry)| (*id, Arc::clone(&entry.sink)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Apply the outcome of one fan-out pass
    ///
    /// Delivered listeners have their activity refreshed; failed listeners
    /// are removed and returned so the caller can close them unlocked.
    pub fn record_delivery(
        &self,
        resource_id: &ResourceId,
        delivered: &[ListenerId],
        failed: &[ListenerId],
    ) -> Vec<RemovedListener> {
        let now = Instant::now();
        let mut channels = self.lock();
        let Some(channel) = channels.get_mut(resource_id) else {
            return Vec::new();
        };

        for id in delivered {
            if let Some(entry) = channel.listeners.get_mut(id) {
                entry.last_activity = now;
            }
        }

        let mut removed = Vec::with_capacity(failed.len());
        for id in failed {
            if let Some(entry) = channel.listeners.remove(id) {
                removed.push(RemovedListener {
                    handle: ListenerHandle {
                        id: *id,
                        resource_id: resource_id.clone(),
                    },
                    sink: entry.sink,
                    user_id: entry.user_id,
                    remaining: 0,
                });
            }
        }

        let remaining = channel.listeners.len();
        for listener in &mut removed {
            listener.remaining = remaining;
        }
        if remaining == 0 {
            channels.remove(resource_id);
        }
        removed
    }

    /// Refresh a listener's activity timestamp
    pub fn touch(&self, handle: &ListenerHandle) -> bool {
        let mut channels = self.lock();
        match channels
            .get_mut(&handle.resource_id)
            .and_then(|channel| channel.listeners.get_mut(&handle.id))
        {
            Some(entry) => {
                entry.last_activity = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Number of listeners registered for a resource
    pub fn count(&self, resource_id: &ResourceId) -> usize {
        self.lock()
            .get(resource_id)
            .map(|channel| channel.listeners.len())
            .unwrap_or(0)
    }

    /// When a listener was registered
    pub fn registered_at(&self, handle: &ListenerHandle) -> Option<DateTime<Utc>> {
        self.lock()
            .get(&handle.resource_id)
            .and_then(|channel| channel.listeners.get(&handle.id))
            .map(|entry| entry.registered_at)
    }

    pub fn stats(&self) -> RegistryStats {
        let channels = self.lock();
        let mut resources: Vec<ResourceStats> = channels
            .iter()
            .map(|(resource_id, channel)| ResourceStats {
                resource_id: resource_id.clone(),
                listeners: channel.listeners.len(),
            })
            .collect();
        resources.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));

        RegistryStats {
            total_resources: resources.len(),
            total_listeners: resources.iter().map(|r| r.listeners).sum(),
            resources,
        }
    }

    /// Remove listeners whose sink has closed or that have been idle too long
    ///
    /// `is_closed` is called under the lock and must stay a cheap flag read.
    pub fn drain_stale(&self, max_idle: Duration, now: Instant) -> Vec<RemovedListener> {
        let mut channels = self.lock();
        let mut removed = Vec::new();

        for (resource_id, channel) in channels.iter_mut() {
            let stale: Vec<ListenerId> = channel
                .listeners
                .iter()
                .filter(|(_, entry)| {
                    entry.sink.is_closed()
                        || now.saturating_duration_since(entry.last_activity) > max_idle
                })
                .map(|(id, _)| *id)
                .collect();

            for id in stale {
                if let Some(entry) = channel.listeners.remove(&id) {
                    removed.push(RemovedListener {
                        handle: ListenerHandle {
                            id,
                            resource_id: resource_id.clone(),
                        },
                        sink: entry.sink,
                        user_id: entry.user_id,
                        remaining: channel.listeners.len(),
                    });
                }
            }
        }

        channels.retain(|_, channel| !channel.listeners.is_empty());
        removed
    }
}
