//! Memory Management API launcher: serves on 0.0.0.0:$PORT (default 8003).

use mem_api::launcher;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Memory Management API");
    match launcher::launch().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            eprintln!("{}", launcher::diagnostic(&e));
            ExitCode::from(1)
        }
    }
}
