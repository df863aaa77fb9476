//! Route Configuration Module
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs           - Module exports and documentation
//! ├── router.rs        - Main router creation and layers
//! └── stream_routes.rs - Authenticated stream endpoints
//! ```

/// Main router creation
pub mod router;

/// Stream endpoints
pub mod stream_routes;

pub use router::create_router;
