//! Common test utilities and helpers
//!
//! - Custom assertion macros
//! - Test app fixture with seeded notes and token helpers
//! - SSE response reader

pub mod assertions;
pub mod auth_helpers;
pub mod sse;

pub use auth_helpers::*;
pub use sse::*;
