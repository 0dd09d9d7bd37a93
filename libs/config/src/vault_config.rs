//! Vault Configuration Module
//!
//! Loads the engine, logging, market and validator settings from a TOML file
//! with environment overrides (`VAULT__ENGINE__ASSET_DECIMALS=18`).

use crate::defaults;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use types::{Address, MarketId, Wad};

/// Main vault configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct VaultConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Markets wired with reference fuses at startup
    #[serde(default)]
    pub markets: Vec<MarketConfig>,

    /// Exchange-rate validator installed on the hooks market
    #[serde(default)]
    pub validator: Option<ValidatorConfig>,
}

/// Engine behavior settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "defaults::asset_decimals")]
    pub asset_decimals: u8,

    #[serde(default = "defaults::hooks_market_id")]
    pub hooks_market_id: u32,

    /// Decimal string, 18-decimal scale
    #[serde(default = "defaults::balance_fuse_dust")]
    pub balance_fuse_dust: String,

    #[serde(default)]
    pub reject_dependency_cycles: bool,

    #[serde(default = "defaults::max_batch_size")]
    pub max_batch_size: usize,

    /// Idle assets credited at startup, in native units (decimal string)
    #[serde(default)]
    pub initial_idle: Option<String>,

    pub snapshot_path: Option<PathBuf>,

    /// Caller granted the owner role at startup
    pub owner: Option<Address>,
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"vault_engine=debug,warn"`
    #[serde(default = "defaults::log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

/// One market and its reference fuses
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MarketConfig {
    pub id: u32,

    pub name: Option<String>,

    /// Native decimals the market's balance fuse reports in
    #[serde(default = "defaults::market_decimals")]
    pub decimals: u8,

    /// Supply fuse entering/exiting this market
    pub fuse: Option<Address>,

    /// Balance fuse valuing this market's positions
    pub balance_fuse: Option<Address>,

    #[serde(default)]
    pub substrates: Vec<Address>,

    /// Markets whose balances must be refreshed whenever this one is
    #[serde(default)]
    pub dependencies: Vec<u32>,

    /// Oracle price per substrate, decimal strings, 18-decimal scale
    #[serde(default)]
    pub prices: HashMap<Address, String>,

    /// Assets supplied into this market at startup, native units
    pub allocation: Option<String>,

    /// Position in the instant-withdrawal candidate list (lower first)
    pub withdraw_priority: Option<u32>,
}

/// Exchange-rate validator settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ValidatorConfig {
    /// Expected exchange rate, decimal string
    pub exchange_rate: String,

    /// Tolerance as a fraction of the rate (`"0.1"` = ±10%)
    pub threshold: String,

    /// Rate reported by the static exchange-rate source; defaults to `exchange_rate`
    pub current_rate: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_decimals: defaults::engine::ASSET_DECIMALS,
            hooks_market_id: defaults::engine::HOOKS_MARKET_ID,
            balance_fuse_dust: defaults::balance_fuse_dust(),
            reject_dependency_cycles: defaults::engine::REJECT_DEPENDENCY_CYCLES,
            max_batch_size: defaults::engine::MAX_BATCH_SIZE,
            initial_idle: None,
            snapshot_path: None,
            owner: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            json: defaults::logging::JSON,
        }
    }
}

impl EngineConfig {
    pub fn hooks_market(&self) -> MarketId {
        MarketId::new(self.hooks_market_id)
    }

    pub fn dust(&self) -> Result<Wad> {
        parse_wad("engine.balance_fuse_dust", &self.balance_fuse_dust)
    }

    /// Startup idle assets in native units
    pub fn initial_idle_units(&self) -> Result<u128> {
        match &self.initial_idle {
            Some(value) => parse_units("engine.initial_idle", value, self.asset_decimals),
            None => Ok(0),
        }
    }
}

impl MarketConfig {
    pub fn market_id(&self) -> MarketId {
        MarketId::new(self.id)
    }

    pub fn dependency_ids(&self) -> Vec<MarketId> {
        self.dependencies.iter().copied().map(MarketId::new).collect()
    }

    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.market_id().to_string())
    }

    /// Parsed oracle prices
    pub fn price_table(&self) -> Result<Vec<(Address, Wad)>> {
        self.prices
            .iter()
            .map(|(substrate, price)| {
                parse_wad(&format!("markets[{}].prices.{}", self.id, substrate), price)
                    .map(|wad| (*substrate, wad))
            })
            .collect()
    }

    /// Startup allocation in the vault asset's native units
    pub fn allocation_units(&self, asset_decimals: u8) -> Result<u128> {
        match &self.allocation {
            Some(value) => parse_units(
                &format!("markets[{}].allocation", self.id),
                value,
                asset_decimals,
            ),
            None => Ok(0),
        }
    }
}

impl ValidatorConfig {
    pub fn exchange_rate(&self) -> Result<Wad> {
        parse_wad("validator.exchange_rate", &self.exchange_rate)
    }

    pub fn threshold(&self) -> Result<Wad> {
        parse_wad("validator.threshold", &self.threshold)
    }

    pub fn current_rate(&self) -> Result<Wad> {
        match &self.current_rate {
            Some(rate) => parse_wad("validator.current_rate", rate),
            None => self.exchange_rate(),
        }
    }
}

impl VaultConfig {
    /// Load configuration from a file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, defaults::paths::ENV_PREFIX)
    }

    /// Load with a custom environment variable prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let path = path.unwrap_or(Path::new(defaults::paths::CONFIG_FILE));
        info!("Loading vault config: {:?}", path);

        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut vault_config: VaultConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        vault_config.expand_paths()?;
        vault_config.validate()?;

        debug!(
            markets = vault_config.markets.len(),
            validator = vault_config.validator.is_some(),
            "vault config loaded"
        );
        Ok(vault_config)
    }

    /// Parse a TOML string without file or environment sources
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut vault_config: VaultConfig =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        vault_config.expand_paths()?;
        vault_config.validate()?;
        Ok(vault_config)
    }

    /// Expand `~` and `$VAR` in path values
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(path) = &self.engine.snapshot_path {
            let raw = path.to_string_lossy();
            let expanded =
                shellexpand::full(raw.as_ref()).context("Failed to expand snapshot path")?;
            self.engine.snapshot_path = Some(PathBuf::from(expanded.as_ref()));
        }
        Ok(())
    }

    pub fn market(&self, id: MarketId) -> Option<&MarketConfig> {
        self.markets.iter().find(|m| m.market_id() == id)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        self.engine.dust()?;
        self.engine.initial_idle_units()?;

        if self.engine.max_batch_size == 0 {
            bail!("engine.max_batch_size must be at least 1");
        }

        let mut ids = HashSet::new();
        for market in &self.markets {
            if !ids.insert(market.id) {
                bail!("Duplicate market id {}", market.id);
            }
        }

        let mut fuses = HashSet::new();
        for market in &self.markets {
            for dependency in &market.dependencies {
                if !ids.contains(dependency) {
                    bail!(
                        "Market {} depends on unknown market {}",
                        market.id,
                        dependency
                    );
                }
            }

            for fuse in market.fuse.iter().chain(market.balance_fuse.iter()) {
                if !fuses.insert(*fuse) {
                    bail!("Fuse {} is assigned to more than one market", fuse);
                }
            }

            market.price_table()?;
            market.allocation_units(self.engine.asset_decimals)?;

            if market.allocation.is_some() && market.fuse.is_none() {
                bail!("Market {} has an allocation but no fuse", market.id);
            }
            if market.allocation.is_some() && market.substrates.is_empty() {
                bail!("Market {} has an allocation but no substrates", market.id);
            }
        }

        if let Some(validator) = &self.validator {
            validator.exchange_rate()?;
            validator.threshold()?;
            validator.current_rate()?;
        }

        Ok(())
    }
}

fn parse_wad(field: &str, value: &str) -> Result<Wad> {
    Wad::from_decimal_str(value).with_context(|| format!("Invalid decimal for {}", field))
}

fn parse_units(field: &str, value: &str, decimals: u8) -> Result<u128> {
    let wad = parse_wad(field, value)?;
    wad.to_units(decimals)
        .with_context(|| format!("Invalid amount for {}", field))
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>) -> Result<VaultConfig> {
    VaultConfig::load(path)
}
