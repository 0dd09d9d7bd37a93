//! Default configuration values
//!
//! Used by `#[serde(default = ...)]` in [`crate::vault_config`] so a config file
//! only needs to name what it changes.

/// Engine defaults
pub mod engine {
    /// Native decimals of the vault's underlying asset (USDC-like)
    pub const ASSET_DECIMALS: u8 = 6;

    /// Market whose configuration array drives the deposit/withdraw hook pipeline
    pub const HOOKS_MARKET_ID: u32 = 0;

    /// Cached balance (18 decimals) below which a balance fuse may be removed
    pub const BALANCE_FUSE_DUST: &str = "0.000001";

    /// Cycles in the dependency graph are tolerated and logged by default
    pub const REJECT_DEPENDENCY_CYCLES: bool = false;

    /// Upper bound on operations in one batch
    pub const MAX_BATCH_SIZE: usize = 64;
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";
    pub const JSON: bool = false;
}

/// Default file locations
pub mod paths {
    pub const CONFIG_FILE: &str = "config/vault.toml";

    /// Environment variable prefix; nested keys are separated by `__`
    pub const ENV_PREFIX: &str = "VAULT";
}

// serde `default = "..."` targets

pub(crate) fn asset_decimals() -> u8 {
    engine::ASSET_DECIMALS
}

pub(crate) fn hooks_market_id() -> u32 {
    engine::HOOKS_MARKET_ID
}

pub(crate) fn balance_fuse_dust() -> String {
    engine::BALANCE_FUSE_DUST.to_string()
}

pub(crate) fn max_batch_size() -> usize {
    engine::MAX_BATCH_SIZE
}

pub(crate) fn log_level() -> String {
    logging::LEVEL.to_string()
}

pub(crate) fn market_decimals() -> u8 {
    18
}
