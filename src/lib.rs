//! notestream - Real-time Note Streaming
//!
//! Fans incremental events (LLM-generated text chunks, collaborative edit
//! acknowledgements and conflicts) scoped to one note out to every viewer
//! currently connected to that note, over Server-Sent Events.
//!
//! # Module Structure
//!
//! - **`shared`** - Event types, configuration and errors shared by the server
//!   and stream consumers
//! - **`backend`** - The registry, broadcaster and SSE transport, plus the
//!   Axum server around them
//!
//! # Usage
//!
//! ```rust,no_run
//! use notestream::backend::server::{create_app, load_config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(load_config()?).await;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Delivery Model
//!
//! Best-effort, single process. A slow or dead viewer is dropped rather than
//! allowed to slow the producer or its siblings.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
