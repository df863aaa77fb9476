/**
 * Producer Rate Limiting
 *
 * Each producer request costs one token from the user's bucket. Buckets
 * refill continuously; an empty bucket yields a rejection with the time until
 * the next token is available. A bucket that has refilled completely carries
 * no information and is dropped by `prune_idle`.
 */

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::shared::config::RateLimitConfig;

/// Outcome of one rate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Zero when allowed
    pub retry_after: Duration,
}

/// Per-user admission check for producers
pub trait RateLimiter: Send + Sync {
    fn check(&self, user_id: Uuid) -> RateDecision;

    /// Forget users whose state matches a fresh one; returns how many
    fn prune_idle(&self) -> usize {
        0
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// In-memory token bucket per user
#[derive(Debug)]
pub struct TokenBucketLimiter {
    capacity: u32,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<Uuid, Bucket>>,
}

impl TokenBucketLimiter {
    pub fn new(capacity: u32, refill_per_minute: u32) -> Self {
        Self {
            capacity: capacity.max(1),
            refill_per_sec: f64::from(refill_per_minute.max(1)) / 60.0,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.capacity, config.refill_per_minute)
    }

    /// Users currently tracked
    pub fn tracked_users(&self) -> usize {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl RateLimiter for TokenBucketLimiter {
    fn check(&self, user_id: Uuid) -> RateDecision {
        let now = Instant::now();
        let capacity = f64::from(self.capacity);
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(user_id).or_insert(Bucket {
            tokens: capacity,
            refilled_at: now,
        });

        let elapsed = now.saturating_duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(capacity);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            RateDecision {
                allowed: true,
                limit: self.capacity,
                remaining: bucket.tokens.floor() as u32,
                retry_after: Duration::ZERO,
            }
        } else {
            let wait = (1.0 - bucket.tokens) / self.refill_per_sec;
            tracing::debug!(user_id = %user_id, retry_after_secs = wait, "[RateLimit] Bucket empty");
            RateDecision {
                allowed: false,
                limit: self.capacity,
                remaining: 0,
                retry_after: Duration::from_secs_f64(wait),
            }
        }
    }

    fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let capacity = f64::from(self.capacity);
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let before = buckets.len();
        buckets.retain(|_, bucket| {
            let elapsed = now.saturating_duration_since(bucket.refilled_at).as_secs_f64();
            bucket.tokens + elapsed * self.refill_per_sec < capacity
        });
        before - buckets.len()
    }
}
