//! Test app fixture and authentication helpers
//!
//! `TestApp` builds the real router over a seeded in-memory resolver. One
//! note (`note-1`, slug `meeting-notes`) is owned by `owner`.

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;

use notestream::backend::auth::JwtAuthGate;
use notestream::backend::routes::create_router;
use notestream::backend::server::AppState;
use notestream::shared::{AppConfig, AppConfigBuilder};

pub const SECRET: &str = "integration-secret";
pub const NOTE_ID: &str = "note-1";
pub const NOTE_SLUG: &str = "meeting-notes";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub owner: Uuid,
    gate: JwtAuthGate,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|builder| builder)
    }

    /// Build an app after customizing the default test configuration
    pub fn with_config(customize: impl FnOnce(AppConfigBuilder) -> AppConfigBuilder) -> Self {
        let owner = Uuid::new_v4();
        let builder = AppConfig::builder()
            .jwt_secret(SECRET)
            .resource(NOTE_ID, Some(NOTE_SLUG), owner);
        let config = customize(builder).build().expect("valid test config");

        let state = AppState::new(config);
        let router = create_router(state.clone());
        Self {
            state,
            router,
            owner,
            gate: JwtAuthGate::new(SECRET),
        }
    }

    pub fn token(&self, user_id: Uuid) -> String {
        self.gate
            .create_token(user_id, Some(format!("{user_id}@example.com")))
            .expect("token")
    }

    pub fn owner_token(&self) -> String {
        self.token(self.owner)
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.expect("infallible router")
    }

    pub async fn listen(&self, reference: &str, token: &str) -> Response {
        self.send(get(&format!("/api/v2/note/{reference}/stream"), Some(token)))
            .await
    }

    pub async fn push(&self, reference: &str, token: &str, body: serde_json::Value) -> Response {
        self.send(post_json(&format!("/api/v2/note/{reference}/stream"), Some(token), &body))
            .await
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_json(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

/// Collect a (finite) response body as JSON
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}
