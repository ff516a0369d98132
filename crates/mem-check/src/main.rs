//! mem-check: verify a deployed Memory Management API.

use clap::Parser;
use mem_check::{prompt, DeploymentChecker};
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mem-check")]
#[command(about = "Probe a deployed Memory Management API: health, docs, create, retrieve", long_about = None)]
struct Cli {
    /// Root URL of the deployment (prompted for when omitted on a terminal)
    base_url: Option<String>,

    /// Bearer key for the create/retrieve probes; without it they are skipped
    #[arg(short = 'k', long, env = "MEMORY_API_KEY")]
    api_key: Option<String>,

    /// Never prompt; use defaults for anything not given
    #[arg(long)]
    no_prompt: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let interactive = !cli.no_prompt && std::io::stdin().is_terminal();
    let (base_url, api_key) = prompt::resolve_target(
        cli.base_url,
        cli.api_key,
        interactive,
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
    )?;

    let checker = DeploymentChecker::new(&base_url, api_key)?;
    let report = checker.run(&mut std::io::stdout()).await?;
    tracing::debug!(success = report.success(), "deployment check finished");
    Ok(())
}
