//! Authentication Module
//!
//! Bearer-token verification for stream viewers and producers. Tokens are
//! issued elsewhere; this service only verifies them.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs      - Module exports and documentation
//! └── sessions.rs - AuthGate trait and the HS256 JwtAuthGate
//! ```

/// JWT token generation and validation
pub mod sessions;

pub use sessions::{AuthError, AuthGate, Claims, JwtAuthGate};
