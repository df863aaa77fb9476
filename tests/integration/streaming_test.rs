//! End-to-end streaming over the HTTP surface

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::assert_status;
use crate::common::*;
use notestream::backend::producer::PushResponse;
use notestream::shared::StreamEventType;

async fn push(app: &TestApp, token: &str, events: serde_json::Value) -> PushResponse {
    let response = assert_status!(
        app.push(NOTE_ID, token, json!({ "events": events })).await,
        StatusCode::ACCEPTED
    );
    serde_json::from_value(body_json(response).await).expect("push response")
}

#[tokio::test]
async fn test_single_viewer_receives_stream_in_order() {
    let app = TestApp::new();
    let token = app.owner_token();
    let mut viewer = SseReader::new(app.listen(NOTE_ID, &token).await);

    assert_eq!(push(&app, &token, json!([{"type": "chunk", "data": "Hello"}])).await.delivered, 1);
    assert_eq!(push(&app, &token, json!([{"type": "end"}])).await.delivered, 1);

    let start = viewer.next_event().await.unwrap();
    let chunk = viewer.next_event().await.unwrap();
    let end = viewer.next_event().await.unwrap();
    assert_eq!(start.kind, StreamEventType::Start);
    assert_eq!(chunk.kind, StreamEventType::Chunk);
    assert_eq!(chunk.data.as_deref(), Some("Hello"));
    assert_eq!(end.kind, StreamEventType::End);

    // `end` closes the stream and removes the listener
    assert!(viewer.next_event().await.is_none());
    assert_eq!(app.state.broadcaster.listener_count(&NOTE_ID.into()), 0);
    assert_eq!(push(&app, &token, json!([{"type": "chunk", "data": "late"}])).await.delivered, 0);
}

#[tokio::test]
async fn test_disconnected_viewer_stops_receiving() {
    let app = TestApp::new();
    let token = app.owner_token();
    let mut a = SseReader::new(app.listen(NOTE_ID, &token).await);
    let b = SseReader::new(app.listen(NOTE_ID, &token).await);

    assert_eq!(push(&app, &token, json!([{"type": "chunk", "data": "chunk1"}])).await.delivered, 2);

    drop(b);
    assert_eq!(app.state.broadcaster.listener_count(&NOTE_ID.into()), 1);
    assert_eq!(push(&app, &token, json!([{"type": "chunk", "data": "chunk2"}])).await.delivered, 1);

    let kinds_and_data: Vec<_> = [
        a.next_event().await.unwrap(),
        a.next_event().await.unwrap(),
        a.next_event().await.unwrap(),
    ]
    .into_iter()
    .map(|e| (e.kind, e.data))
    .collect();
    assert_eq!(kinds_and_data[0].0, StreamEventType::Start);
    assert_eq!(kinds_and_data[1].1.as_deref(), Some("chunk1"));
    assert_eq!(kinds_and_data[2].1.as_deref(), Some("chunk2"));
}

#[tokio::test]
async fn test_pushed_chunks_are_sanitized() {
    let app = TestApp::new();
    let token = app.owner_token();
    let mut viewer = SseReader::new(app.listen(NOTE_ID, &token).await);

    push(&app, &token, json!([{"type": "chunk", "data": "<img src=x onerror=alert(1)>"}])).await;

    viewer.next_event().await.unwrap();
    let chunk = viewer.next_event().await.unwrap();
    assert_eq!(chunk.data.as_deref(), Some("&lt;img src=x onerror=alert(1)&gt;"));
    assert_eq!(
        chunk.metadata.and_then(|m| m.source).as_deref(),
        Some("stream:push")
    );
}

#[tokio::test]
async fn test_notes_are_isolated() {
    let app = TestApp::with_config(|b| b.resource("note-2", None, uuid::Uuid::nil()));
    let token = app.owner_token();
    let viewer = app.listen(NOTE_ID, &token).await;
    let mut reader = SseReader::new(assert_status!(viewer, StatusCode::OK));
    assert_eq!(reader.next_event().await.expect("start").kind, StreamEventType::Start);

    let reached = app.state.broadcaster.broadcast(
        &"note-2".into(),
        &notestream::shared::StreamEvent::chunk("elsewhere"),
    );
    assert_eq!(reached, 0);
    assert_eq!(app.state.broadcaster.stats().total_resources, 1);

    assert_eq!(push(&app, &token, json!([{"type": "chunk", "data": "here"}])).await.delivered, 1);
    let next = reader.next_event().await.expect("note-1 chunk");
    assert_eq!(next.kind, StreamEventType::Chunk);
    assert_eq!(next.data.as_deref(), Some("here"));
}
