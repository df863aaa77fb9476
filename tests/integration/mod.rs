//! Integration tests
//!
//! Drive the full router (auth middleware, resolver, producer, transport)
//! with `tower::ServiceExt::oneshot`.

mod http_test;
mod streaming_test;
