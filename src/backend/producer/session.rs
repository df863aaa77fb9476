/**
 * Producer Sessions
 *
 * A producer (the LLM generation loop, the collaborative-edit handler)
 * obtains a `ProducerSession` from `StreamProducer::begin`, which applies the
 * per-user rate check. The session emits increments for one note and at most
 * one terminal `end`.
 *
 * ```rust,no_run
 * # use notestream::backend::producer::{ProducerError, StreamProducer};
 * # fn run(producer: &StreamProducer, user: uuid::Uuid) -> Result<(), ProducerError> {
 * let mut session = producer.begin(user, "note-1".into())?;
 * for token in ["Hel", "lo"] {
 *     session.chunk(token)?;
 * }
 * session.finish()?;
 * # Ok(())
 * # }
 * ```
 */

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::backend::middleware::RateLimiter;
use crate::backend::realtime::{ResourceId, StreamBroadcaster};
use crate::backend::sanitize::Sanitizer;
use crate::shared::{EventMetadata, SharedError, StreamEvent, StreamEventType};

#[derive(Debug, Error)]
pub enum ProducerError {
    /// Retryable; `retry_after` is the wait until the next token
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited {
        limit: u32,
        remaining: u32,
        retry_after: Duration,
    },
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] SharedError),
    #[error("stream already ended")]
    SessionFinished,
}

/// Entry point for everything that pushes events into a note's channel
#[derive(Clone)]
pub struct StreamProducer {
    broadcaster: StreamBroadcaster,
    limiter: Arc<dyn RateLimiter>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl StreamProducer {
    pub fn new(
        broadcaster: StreamBroadcaster,
        limiter: Arc<dyn RateLimiter>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Self {
        Self {
            broadcaster,
            limiter,
            sanitizer,
        }
    }

    /// Start producing for a note after passing the user's rate check
    pub fn begin(&self, user_id: Uuid, resource_id: ResourceId) -> Result<ProducerSession, ProducerError> {
        let decision = self.limiter.check(user_id);
        if !decision.allowed {
            tracing::warn!(
                user_id = %user_id,
                resource_id = %resource_id,
                retry_after_ms = decision.retry_after.as_millis() as u64,
                "[Producer] Rate limited"
            );
            return Err(ProducerError::RateLimited {
                limit: decision.limit,
                remaining: decision.remaining,
                retry_after: decision.retry_after,
            });
        }

        tracing::debug!(user_id = %user_id, resource_id = %resource_id, "[Producer] Session started");
        Ok(ProducerSession {
            broadcaster: self.broadcaster.clone(),
            sanitizer: Arc::clone(&self.sanitizer),
            resource_id,
            user_id,
            source: None,
            finished: false,
            emitted: 0,
        })
    }
}

/// One producer's stream of increments for one note
pub struct ProducerSession {
    broadcaster: StreamBroadcaster,
    sanitizer: Arc<dyn Sanitizer>,
    resource_id: ResourceId,
    user_id: Uuid,
    source: Option<String>,
    finished: bool,
    emitted: usize,
}

impl std::fmt::Debug for ProducerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerSession")
            .field("resource_id", &self.resource_id)
            .field("user_id", &self.user_id)
            .field("source", &self.source)
            .field("finished", &self.finished)
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}

impl ProducerSession {
    /// Stamp events without metadata with this source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Events emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Validate, sanitize and broadcast one event
    ///
    /// Returns the number of listeners attempted. Emitting `end` finishes the
    /// session.
    pub fn emit(&mut self, mut event: StreamEvent) -> Result<usize, ProducerError> {
        if self.finished {
            return Err(ProducerError::SessionFinished);
        }
        event.validate()?;

        if event.kind == StreamEventType::Chunk {
            if let Some(data) = event.data.take() {
                event.data = Some(self.sanitizer.sanitize(&data).into_owned());
            }
        }
        if event.metadata.is_none() {
            if let Some(source) = &self.source {
                event.metadata = Some(EventMetadata::now(source.clone()));
            }
        }

        let reached = self.broadcaster.broadcast(&self.resource_id, &event);
        self.emitted += 1;
        if event.is_terminal() {
            self.finished = true;
            tracing::debug!(
                resource_id = %self.resource_id,
                emitted = self.emitted,
                "[Producer] Stream ended"
            );
        }
        Ok(reached)
    }

    pub fn chunk(&mut self, text: impl Into<String>) -> Result<usize, ProducerError> {
        self.emit(StreamEvent::chunk(text))
    }

    pub fn ack(&mut self, op_id: &str, server_version: &str) -> Result<usize, ProducerError> {
        self.emit(StreamEvent::ack(op_id, server_version))
    }

    pub fn conflict(
        &mut self,
        op_id: &str,
        reason: &str,
        expected_version: Option<&str>,
    ) -> Result<usize, ProducerError> {
        self.emit(StreamEvent::conflict(op_id, reason, expected_version))
    }

    pub fn patch(&mut self, data: impl Into<String>) -> Result<usize, ProducerError> {
        self.emit(StreamEvent::patch(data))
    }

    /// Emit the terminal `end`
    pub fn finish(mut self) -> Result<usize, ProducerError> {
        self.emit(StreamEvent::end())
    }
}
