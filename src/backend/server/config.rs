/**
 * Server Configuration
 *
 * Loads `AppConfig` for the server binary.
 *
 * # Configuration Sources
 *
 * Later sources override earlier ones:
 * 1. Built-in defaults
 * 2. The TOML file named by `NOTESTREAM_CONFIG`, if set
 * 3. Environment variables: `SERVER_HOST`, `SERVER_PORT`, `JWT_SECRET`,
 *    `HEARTBEAT_SECS`
 *
 * A `.env` file is loaded first when present. Unparseable numeric overrides
 * are logged and ignored; the final configuration must pass `validate()`.
 */

use std::str::FromStr;

use crate::shared::{AppConfig, ConfigError};

pub const CONFIG_PATH_VAR: &str = "NOTESTREAM_CONFIG";

/// Load and validate the server configuration
pub fn load_config() -> Result<AppConfig, ConfigError> {
    dotenv::dotenv().ok();

    let mut config = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => {
            tracing::info!(path = %path, "[Server] Loading configuration file");
            let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                message: e.to_string(),
            })?;
            AppConfig::from_toml_str(&text)?
        }
        Err(_) => {
            tracing::debug!("[Server] {} not set, using defaults", CONFIG_PATH_VAR);
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Apply environment overrides on top of `config`
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(host) = std::env::var("SERVER_HOST") {
        config.host = host;
    }
    if let Some(port) = parse_env("SERVER_PORT") {
        config.port = port;
    }
    match std::env::var("JWT_SECRET") {
        Ok(secret) => config.jwt_secret = secret,
        Err(_) => tracing::warn!("[Server] JWT_SECRET not set, using configured secret"),
    }
    if let Some(secs) = parse_env("HEARTBEAT_SECS") {
        config.heartbeat_interval_secs = secs;
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(name, value = %raw, "[Server] Ignoring unparseable environment override");
            None
        }
    }
}
