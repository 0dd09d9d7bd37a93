//! Tracing subscriber setup shared by vault binaries

use crate::vault_config::LoggingConfig;
use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` wins over the configured level
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log filter '{}'", config.level)),
    }
}

/// Install the global subscriber; fails if one is already installed
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;

    let result = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "vault_engine=notalevel".to_string(),
            json: false,
        };
        assert!(env_filter(&config).is_err());
    }

    #[test]
    fn test_directive_level_accepted() {
        let config = LoggingConfig {
            level: "vault_engine=debug,warn".to_string(),
            json: true,
        };
        assert!(env_filter(&config).is_ok());
    }
}
