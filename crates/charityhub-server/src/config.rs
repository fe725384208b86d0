use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use charityhub_stores::countries::DEFAULT_COUNTRIES_URL;
use tracing::info;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub storage_dir: PathBuf,
    /// Base of the durable attachment URLs handed to clients.
    pub public_url: String,
    pub jwt_secret: String,
    pub countries_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = var("CHARITYHUB_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHARITYHUB_JWT_SECRET is unset or still a placeholder; it must match the identity provider's signing secret");
        }

        let host = var("CHARITYHUB_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("CHARITYHUB_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("CHARITYHUB_PORT is not a port number")?;
        let public_url =
            var("CHARITYHUB_PUBLIC_URL").unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Self {
            host,
            port,
            db_path: var("CHARITYHUB_DB_PATH")
                .unwrap_or_else(|| "charityhub.db".into())
                .into(),
            storage_dir: var("CHARITYHUB_STORAGE_DIR")
                .unwrap_or_else(|| "./blob-storage".into())
                .into(),
            public_url,
            jwt_secret,
            countries_url: var("CHARITYHUB_COUNTRIES_URL")
                .unwrap_or_else(|| DEFAULT_COUNTRIES_URL.into()),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty()).or_else(|| {
        info!("{} not set, using default", key);
        None
    })
}
