//! Process bootstrap: config, store, listener, serve.

use crate::config::{ApiConfig, ConfigError};
use crate::server::{self, AppState};
use mem_types::{MemoryStore, MemoryStoreError};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("failed to open memory store")]
    Store(#[from] MemoryStoreError),
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server terminated with an error")]
    Serve(#[source] std::io::Error),
    #[error("MEMORY_DB_PATH is set but this build has no SQLite support (enable feature `sqlite`)")]
    SqliteUnavailable,
}

/// Read the environment and run the server until shutdown.
pub async fn launch() -> Result<(), StartupError> {
    let config = ApiConfig::from_env()?;
    run(config).await
}

pub async fn run(config: ApiConfig) -> Result<(), StartupError> {
    let store = open_store(&config)?;
    if config.api_key.is_none() {
        tracing::warn!("MEMORY_API_KEY is not set; record routes are unauthenticated");
    }
    let state = Arc::new(AppState {
        store,
        api_key: config.api_key.clone(),
    });
    let app = server::router(state);

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;
    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(feature = "sqlite")]
fn open_store(config: &ApiConfig) -> Result<Arc<dyn MemoryStore + Send + Sync>, StartupError> {
    match config.db_path {
        Some(ref path) => {
            tracing::info!(path = %path.display(), "using SQLite memory store");
            Ok(Arc::new(mem_store::SqliteMemoryStore::new(path)?))
        }
        None => Ok(Arc::new(mem_store::InMemoryMemoryStore::new())),
    }
}

#[cfg(not(feature = "sqlite"))]
fn open_store(config: &ApiConfig) -> Result<Arc<dyn MemoryStore + Send + Sync>, StartupError> {
    if config.db_path.is_some() {
        return Err(StartupError::SqliteUnavailable);
    }
    Ok(Arc::new(mem_store::InMemoryMemoryStore::new()))
}

/// Render an error and its source chain, one cause per line.
pub fn diagnostic(err: &dyn std::error::Error) -> String {
    let mut out = format!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    out
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
