//! Reads `StreamEvent`s from a streaming response body.

use std::collections::VecDeque;
use std::time::Duration;

use axum::body::BodyDataStream;
use axum::response::Response;
use futures_util::StreamExt;

use notestream::backend::realtime::FrameDecoder;
use notestream::shared::StreamEvent;

const READ_TIMEOUT: Duration = Duration::from_secs(2);

pub struct SseReader {
    body: BodyDataStream,
    decoder: FrameDecoder,
    ready: VecDeque<StreamEvent>,
}

impl SseReader {
    pub fn new(response: Response) -> Self {
        Self {
            body: response.into_body().into_data_stream(),
            decoder: FrameDecoder::new(),
            ready: VecDeque::new(),
        }
    }

    /// Next decoded event; `None` once the stream ended
    ///
    /// Panics if nothing arrives within the read timeout.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(event);
            }
            let chunk = tokio::time::timeout(READ_TIMEOUT, self.body.next())
                .await
                .expect("timed out waiting for a stream frame")?
                .expect("body error");
            let text = std::str::from_utf8(&chunk).expect("utf-8 frame");
            self.ready.extend(self.decoder.push(text).expect("decodable frame"));
        }
    }
}
