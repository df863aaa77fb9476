//! Test suite for notestream
//!
//! - `common` - fixtures: test app, tokens, SSE reader, assertion macros
//! - `integration` - HTTP-level tests driving the router with `oneshot`
//! - `property` - proptest invariants for the registry and framing

pub mod common;
pub mod integration;
pub mod property;
