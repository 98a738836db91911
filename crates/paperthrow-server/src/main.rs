//! Standalone PaperThrow session server.
//!
//! Serves the four game endpoints over HTTP with an in-memory store.
//! Every flag can also be set from the environment, so the binary runs
//! unchanged in a container.

use anyhow::{Context, Result};
use clap::Parser;
use paperthrow::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "paperthrow-server")]
#[command(about = "Session, scoring and wind backend for PaperThrow", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "PAPERTHROW_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Secret used to sign session tokens
    #[arg(long, env = "PAPERTHROW_SECRET", hide_env_values = true)]
    secret: String,

    /// Retired secrets whose signatures are still accepted
    #[arg(
        long = "previous-secret",
        env = "PAPERTHROW_PREVIOUS_SECRETS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    previous_secrets: Vec<String>,

    /// Drop sessions older than this many seconds (kept forever if unset)
    #[arg(long, env = "PAPERTHROW_SESSION_TTL_SECS")]
    session_ttl_secs: Option<u64>,

    /// How often expired sessions are swept
    #[arg(long, env = "PAPERTHROW_SWEEP_INTERVAL_SECS", default_value = "60")]
    sweep_interval_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let signer = Signer::new(&cli.secret)
        .and_then(|s| s.with_previous(cli.previous_secrets.iter().filter(|p| !p.is_empty())))
        .context("invalid signing secret")?;

    let config = SessionConfig {
        session_ttl_secs: cli.session_ttl_secs,
        sweep_interval_secs: cli.sweep_interval_secs,
    };

    let server = PaperthrowServerBuilder::new()
        .bind(&cli.bind)
        .session_config(config)
        .build(signer, MemoryStore::new())
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    tracing::info!(
        addr = %server.local_addr()?,
        previous_secrets = server.sessions().signer().previous_count(),
        "starting"
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;

    Ok(())
}
