//! Service entry point: wire dependencies, spawn the expiry sweeper, serve.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing::info;

use search_reindexer::Dependencies;
use search_reindexer_session::spawn_expiry_sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let deps = Dependencies::new()
        .await
        .context("failed to initialize dependencies")?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let sweeper = spawn_expiry_sweeper(deps.sessions.clone(), shutdown_rx);

    let app = search_reindexer_api::router(deps.state.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], deps.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(());
    let _ = sweeper.await;

    info!("Shutdown complete");
    Ok(())
}
