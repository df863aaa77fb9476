//! Middleware Module
//!
//! Request processing in front of the stream handlers.
//!
//! - **`auth`** - Bearer / `?token=` authentication and the `AuthUser` extractor
//! - **`rate_limit`** - Per-user token bucket applied to producers

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, bearer_token, AuthUser, AuthenticatedUser};
pub use rate_limit::{RateDecision, RateLimiter, TokenBucketLimiter};
