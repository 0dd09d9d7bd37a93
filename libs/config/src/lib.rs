//! # Vault Configuration
//!
//! Configuration management for the vault engine and its binaries.
//!
//! ## Features
//!
//! - **File + Environment Loading**: TOML via the `config` crate, overridden by
//!   `VAULT__SECTION__KEY` environment variables
//! - **Defaults**: every engine setting has a default in [`defaults`]
//! - **Validation**: duplicate markets, dangling dependencies and malformed
//!   decimal strings are rejected at load time
//! - **Logging Setup**: [`logging::init_tracing`] installs the subscriber
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use vault_config::{logging, VaultConfig};
//!
//! let config = VaultConfig::load(Some(Path::new("config/vault.toml")))?;
//! logging::init_tracing(&config.logging)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod logging;
pub mod vault_config;

pub use vault_config::{
    load_config, EngineConfig, LoggingConfig, MarketConfig, ValidatorConfig, VaultConfig,
};
