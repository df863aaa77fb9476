//! HTTP boundary: status codes, headers and JSON bodies

use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use crate::common::*;
use crate::{assert_contains, assert_status};
use notestream::shared::StreamEventType;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let response = app.send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_listen_requires_token() {
    let app = TestApp::new();

    let response = app.send(get("/api/v2/note/note-1/stream", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["status"], 401);

    let response = app.listen(NOTE_ID, "not.a.token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listen_unknown_note_is_404() {
    let app = TestApp::new();
    let response = app.listen("no-such-note", &app.owner_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.state.broadcaster.stats().total_listeners, 0);
}

#[tokio::test]
async fn test_listen_other_users_note_is_403() {
    let app = TestApp::new();
    let stranger = app.token(Uuid::new_v4());
    let response = app.listen(NOTE_SLUG, &stranger).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.state.broadcaster.stats().total_listeners, 0);
}

#[tokio::test]
async fn test_listen_headers_and_start_frame() {
    let app = TestApp::new();
    let response = assert_status!(app.listen(NOTE_SLUG, &app.owner_token()).await, StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-transform");
    assert_eq!(headers["x-accel-buffering"], "no");

    // slug resolves to the canonical id
    assert_eq!(app.state.broadcaster.listener_count(&NOTE_ID.into()), 1);

    let mut reader = SseReader::new(response);
    let start = reader.next_event().await.expect("start event");
    assert_eq!(start.kind, StreamEventType::Start);
}

#[tokio::test]
async fn test_listen_with_query_token() {
    let app = TestApp::new();
    let uri = format!("/api/v2/note/{NOTE_ID}/stream?token={}", app.owner_token());
    let response = app.send(get(&uri, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_push_accepted() {
    let app = TestApp::new();
    let response = app
        .push(NOTE_ID, &app.owner_token(), json!({"events": [{"type": "chunk", "data": "Hi"}]}))
        .await;
    let response = assert_status!(response, StatusCode::ACCEPTED);
    assert_eq!(
        body_json(response).await,
        json!({"accepted": true, "events": 1, "delivered": 0})
    );
}

#[tokio::test]
async fn test_push_rejects_malformed_batches() {
    let app = TestApp::with_config(|b| b.max_events_per_request(2));
    let token = app.owner_token();

    let cases = [
        json!({"nope": []}),
        json!({"events": []}),
        json!({"events": [{"type": "chunk"}]}),
        json!({"events": [{"type": "shout", "data": "x"}]}),
        json!({"events": [{"type": "end"}, {"type": "chunk", "data": "x"}]}),
        json!({"events": [
            {"type": "chunk", "data": "1"},
            {"type": "chunk", "data": "2"},
            {"type": "chunk", "data": "3"}
        ]}),
    ];
    for body in cases {
        let response = app.push(NOTE_ID, &token, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn test_push_rate_limited() {
    let app = TestApp::with_config(|b| b.rate_limit(1, 1));
    let token = app.owner_token();
    let body = json!({"events": [{"type": "chunk", "data": "x"}]});

    assert_status!(app.push(NOTE_ID, &token, body.clone()).await, StatusCode::ACCEPTED);

    let response = app.push(NOTE_ID, &token, body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let headers = response.headers();
    assert_eq!(headers["x-ratelimit-limit"], "1");
    assert_eq!(headers["x-ratelimit-remaining"], "0");
    let retry_after: u64 = headers[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);

    let body = body_json(response).await;
    assert_contains!(body["error"].as_str().unwrap(), "rate limit");
}

#[tokio::test]
async fn test_push_to_foreign_note_is_403() {
    let app = TestApp::new();
    let response = app
        .push(NOTE_ID, &app.token(Uuid::new_v4()), json!({"events": [{"type": "end"}]}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_listener_count_and_stats() {
    let app = TestApp::new();
    let token = app.owner_token();
    let _a = app.listen(NOTE_ID, &token).await;
    let _b = app.listen(NOTE_SLUG, &token).await;

    let response = app.send(get("/api/v2/note/meeting-notes/listeners", Some(&token))).await;
    let response = assert_status!(response, StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"resource_id": NOTE_ID, "listeners": 2}));

    let response = app.send(get("/api/v2/stream/stats", Some(&token))).await;
    let stats = body_json(assert_status!(response, StatusCode::OK)).await;
    assert_eq!(stats["total_resources"], 1);
    assert_eq!(stats["total_listeners"], 2);
    assert_eq!(stats["resources"][0]["resource_id"], NOTE_ID);
}

#[tokio::test]
async fn test_stats_only_cover_readable_notes() {
    let other = Uuid::new_v4();
    let app = TestApp::with_config(move |b| b.resource("note-2", Some("private-plans"), other));
    let _mine = assert_status!(app.listen(NOTE_ID, &app.owner_token()).await, StatusCode::OK);
    let _theirs = assert_status!(app.listen("note-2", &app.token(other)).await, StatusCode::OK);
    assert_eq!(app.state.broadcaster.stats().total_listeners, 2);

    let response = app.send(get("/api/v2/stream/stats", Some(&app.owner_token()))).await;
    let stats = body_json(assert_status!(response, StatusCode::OK)).await;
    assert_eq!(stats["total_resources"], 1);
    assert_eq!(stats["total_listeners"], 1);
    assert_eq!(stats["resources"], json!([{"resource_id": NOTE_ID, "listeners": 1}]));

    let stranger = app.token(Uuid::new_v4());
    let response = app.send(get("/api/v2/stream/stats", Some(&stranger))).await;
    let stats = body_json(assert_status!(response, StatusCode::OK)).await;
    assert_eq!(stats["total_listeners"], 0);
    assert_eq!(stats["resources"], json!([]));

    let response = app.send(get("/api/v2/note/private-plans/listeners", Some(&app.owner_token()))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
