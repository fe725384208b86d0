mod config;
mod error;
mod middleware;
mod routes;
mod session;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use charityhub_db::Database;
use tracing::info;

use crate::config::Config;
use crate::routes::{AppStateInner, router};
use crate::session::Sessions;
use crate::storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "charityhub=debug,charityhub_stores=debug,charityhub_db=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let storage = Arc::new(Storage::new(config.storage_dir.clone(), config.public_url.clone()).await?);

    let state = Arc::new(AppStateInner {
        db,
        storage,
        sessions: Sessions::default(),
        http: reqwest::Client::new(),
        jwt_secret: config.jwt_secret,
        countries_url: config.countries_url,
    });

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Charity admin server listening on {}", addr);
    info!("Attachments served from {}/files", config.public_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
