/**
 * notestream Server Entry Point
 *
 * Loads configuration, initializes tracing and serves the streaming API.
 */

use notestream::backend::server::{create_app, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG wins; default to info for our crate and the HTTP trace layer
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("[Server] Startup");
    let config = load_config()?;
    let addr = format!("{}:{}", config.host, config.port);

    let app = create_app(config).await;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "[Server] Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
