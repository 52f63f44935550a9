use anyhow::{anyhow, Result};
use tracing::debug;

/// Process-wide configuration, resolved once at startup and injected into
/// Rocket's managed state so handlers and tests never touch the environment
/// directly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub secret_key: String,
    pub allowed_origin: String,
}

pub fn load_environment() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {:?}", path),
        Err(e) => debug!("Could not load .env file: {}", e),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            secret_key: require("SECRET_KEY")?,
            allowed_origin: require("ALLOWED_ORIGIN")?,
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow!("Required environment variable {} is not set", name))
}
