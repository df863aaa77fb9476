/**
 * Stream Event Model
 *
 * This module defines the unit of fan-out for the streaming broadcast core.
 * Events describe incremental changes to a single resource: LLM-generated
 * text chunks, stream boundaries, and collaborative-edit outcomes.
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Type of stream event
///
/// Unknown type strings fail deserialization, so malformed producer input is
/// rejected at the call boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// A stream of increments is starting
    Start,
    /// One increment of content
    Chunk,
    /// Terminal event of a stream
    End,
    /// A collaborative edit was applied
    Ack,
    /// A collaborative edit conflicted with the server version
    Conflict,
    /// Server-side correction to a resource
    Patch,
}

impl StreamEventType {
    /// Wire name used for the SSE `event:` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Chunk => "chunk",
            Self::End => "end",
            Self::Ack => "ack",
            Self::Conflict => "conflict",
            Self::Patch => "patch",
        }
    }
}

impl std::fmt::Display for StreamEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a chunk applies within the target document
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkPosition {
    Start,
    #[default]
    End,
    Cursor,
}

/// Optional metadata carried alongside an event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Component that emitted the event (e.g. `ops:listen`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl EventMetadata {
    /// Metadata stamped with the current time and an emitting component
    pub fn now(source: impl Into<String>) -> Self {
        Self {
            timestamp: Some(now_millis()),
            source: Some(source.into()),
            ..Self::default()
        }
    }
}

/// Stream event fanned out to every listener of a resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: StreamEventType,
    /// Payload, already sanitized by the producer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default)]
    pub position: ChunkPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
}

impl StreamEvent {
    /// Create a new event with no payload
    pub fn new(kind: StreamEventType) -> Self {
        Self {
            kind,
            data: None,
            position: ChunkPosition::default(),
            metadata: None,
        }
    }

    pub fn start() -> Self {
        Self::new(StreamEventType::Start)
    }

    pub fn end() -> Self {
        Self::new(StreamEventType::End)
    }

    /// Create a chunk event appended at the end of the document
    pub fn chunk(data: impl Into<String>) -> Self {
        Self::new(StreamEventType::Chunk).with_data(data)
    }

    /// Create an ack event for an applied collaborative operation
    pub fn ack(op_id: &str, server_version: &str) -> Self {
        let payload = serde_json::json!({
            "event": "ack",
            "op_id": op_id,
            "status": "applied",
            "server_version": server_version,
        });
        Self::new(StreamEventType::Ack).with_data(payload.to_string())
    }

    /// Create a conflict event for a rejected collaborative operation
    pub fn conflict(op_id: &str, reason: &str, expected_version: Option<&str>) -> Self {
        let payload = serde_json::json!({
            "event": "conflict",
            "op_id": op_id,
            "reason": reason,
            "expected_version": expected_version,
        });
        Self::new(StreamEventType::Conflict).with_data(payload.to_string())
    }

    pub fn patch(data: impl Into<String>) -> Self {
        Self::new(StreamEventType::Patch).with_data(data)
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_position(mut self, position: ChunkPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether this event terminates a stream
    pub fn is_terminal(&self) -> bool {
        self.kind == StreamEventType::End
    }

    /// Check structural invariants before the event may be broadcast
    ///
    /// A `chunk` must carry `data`.
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.kind == StreamEventType::Chunk && self.data.is_none() {
            return Err(SharedError::validation(
                "data",
                "chunk events must carry data",
            ));
        }
        Ok(())
    }
}

/// Current time as milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
