//! Vault engine binary - builds a vault from configuration and reports it
//!
//! Usage:
//!   vault-engine --config config/vault.toml
//!   vault-engine --config config/vault.toml --snapshot /tmp/vault.snap

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use vault_config::{logging, VaultConfig};
use vault_engine::build_from_config;

#[derive(Parser, Debug)]
#[command(name = "vault-engine")]
#[command(about = "Multi-market vault engine")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = vault_config::defaults::paths::CONFIG_FILE)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Write a state snapshot here after startup
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = VaultConfig::load(Some(args.config.as_path()))
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.logging.json |= args.json_logs;
    logging::init_tracing(&config.logging)?;

    info!(config = %args.config.display(), markets = config.markets.len(), "starting vault engine");

    let vault = build_from_config(&config).map_err(|e| {
        error!("Failed to build vault: {:#}", e);
        e
    })?;

    let summary = vault.summary()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = args.snapshot.as_ref().or(config.engine.snapshot_path.as_ref()) {
        let bytes = vault.snapshot()?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    }

    Ok(())
}
