//! Server Module
//!
//! Initialization and configuration of the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs   - Module exports and documentation
//! ├── state.rs - AppState and its collaborators
//! ├── config.rs - Configuration loading (TOML file + environment)
//! └── init.rs  - App creation and the stale-listener sweep
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `load_config()` layers file and environment
//! 2. **State Creation**: one `StreamBroadcaster` and its registry per process
//! 3. **Background Tasks**: the stale sweep
//! 4. **Router Creation**: stream routes, auth middleware, tracing and CORS

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::load_config;
pub use init::{create_app, spawn_stale_sweep};
pub use state::AppState;
