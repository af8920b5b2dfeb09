pub mod api;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod page;
pub mod request;
pub mod storage;
pub mod units;

pub use api::{router, AppState};
pub use builder::{build, CallParam, TransactionPayload};
pub use catalog::{Action, Token};
pub use config::Config;
pub use error::{LinkError, LinkResult};
pub use request::{validate_request, Amount, TransactionRequest};
pub use storage::{create_storage, MemoryStore, SledStore, StoredRecord, TxStore};

use anyhow::Context;
use std::net::{SocketAddr, TcpListener};
use tracing::info;

/// Open the configured store and serve the API until ctrl-c.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = create_storage(&config.storage_mode, &config.sled_path, config.ttl())
        .context("failed to initialise link storage")?;

    let addr: SocketAddr = config
        .api_addr
        .parse()
        .with_context(|| format!("API_ADDR invalid: {}", config.api_addr))?;
    let listener = TcpListener::bind(addr).with_context(|| format!("failed to bind {}", addr))?;

    info!("🚀 Link API listening on {}", addr);
    info!("🌐 Pages served under {}/transaction/<id>", config.public_base_url);

    serve(listener, AppState::new(store, config)).await
}

/// Serve the router on an already bound listener (tests bind port 0).
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    listener.set_nonblocking(true)?;
    axum::Server::from_tcp(listener)?
        .serve(router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("👋 Link API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        // never resolve; the server keeps running
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
