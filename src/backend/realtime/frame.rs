/**
 * SSE Wire Framing
 *
 * Every application event is written as one frame:
 *
 * ```text
 * event: chunk
 * data: {"type":"chunk","data":"Hello","position":"end"}
 *
 * ```
 *
 * Heartbeats are comment-only frames (`: ping`) that carry no event. A
 * conformant consumer ignores comment lines, so a heartbeat can never be
 * mistaken for a `StreamEvent`.
 */
use bytes::Bytes;

use crate::shared::{SharedError, StreamEvent};

/// Comment frame written on every heartbeat tick
pub const HEARTBEAT_FRAME: &[u8] = b": ping\n\n";

pub fn heartbeat_frame() -> Bytes {
    Bytes::from_static(HEARTBEAT_FRAME)
}

/// Encode one event as an SSE frame
///
/// serde_json escapes control characters, so the payload always fits on a
/// single `data:` line.
pub fn encode_event(event: &StreamEvent) -> Result<Bytes, SharedError> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("event: {}\ndata: {}\n\n", event.kind, json)))
}

/// Incremental decoder for the consumer side of the stream
///
/// Bytes may arrive split at arbitrary points; complete frames are decoded as
/// soon as their terminating blank line is seen. `\r\n`, `\r` and `\n` all
/// end a line, even when a `\r\n` pair is split between two reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
    /// Last read ended in `\r`; a leading `\n` of the next one is its pair
    after_cr: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received text and return every event completed by it
    pub fn push(&mut self, chunk: &str) -> Result<Vec<StreamEvent>, SharedError> {
        self.buffer.reserve(chunk.len());
        for c in chunk.chars() {
            let paired_lf = self.after_cr && c == '\n';
            self.after_cr = c == '\r';
            match c {
                _ if paired_lf => {}
                '\r' => self.buffer.push('\n'),
                c => self.buffer.push(c),
            }
        }

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..end + 2).collect();
            if let Some(event) = decode_block(&block)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Bytes received but not yet terminated by a blank line
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Decode a complete stream body into events, skipping comment frames
pub fn decode_frames(text: &str) -> Result<Vec<StreamEvent>, SharedError> {
    FrameDecoder::new().push(text)
}

fn decode_block(block: &str) -> Result<Option<StreamEvent>, SharedError> {
    let mut data_lines = Vec::new();
    for line in block.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.strip_prefix(' ').unwrap_or(data));
        }
    }

    if data_lines.is_empty() {
        return Ok(None);
    }
    let event = serde_json::from_str(&data_lines.join("\n"))?;
    Ok(Some(event))
}
