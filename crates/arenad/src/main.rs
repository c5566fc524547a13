//! `arenad` - Arena HTTP daemon.

use std::path::PathBuf;

use anyhow::{Context, Result};
use arena_core::{build_engine, init_tracing, load_config, open_storage, StorageChoice};
use arenad::{router, AppState};
use clap::Parser;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "arenad")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Arena evaluation daemon", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "ARENAD_BIND", default_value = "127.0.0.1:7878")]
    bind: String,

    /// Path to an arena.toml config file
    #[arg(short, long, env = "ARENA_CONFIG")]
    config: Option<PathBuf>,

    /// Keep all state in memory instead of SurrealDB
    #[arg(long)]
    memory: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(args.json, level);

    let config = load_config(args.config.as_deref()).context("Failed to load Arena config")?;
    let storage = open_storage(if args.memory {
        StorageChoice::Memory
    } else {
        StorageChoice::FromEnv
    })
    .await
    .context("Failed to open Arena storage")?;
    let engine = build_engine(config, storage).context("Failed to build Arena engine")?;

    let app = router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "arenad listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    arena_core::METRICS.flush();
    info!("arenad stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn memory_flag_parses() {
        let args = Args::parse_from(["arenad", "--memory", "--bind", "0.0.0.0:9000"]);
        assert!(args.memory);
        assert_eq!(args.bind, "0.0.0.0:9000");
    }
}
