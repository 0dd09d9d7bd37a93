//! Building a vault from a [`VaultConfig`]
//!
//! Every configured market gets a [`SupplyFuse`] and a [`PositionBalanceFuse`]
//! priced by one shared [`StaticPriceOracle`]. The registry is then populated
//! through the vault's own entry points, acting as the configured owner, so a
//! bootstrapped vault carries the same event history as one configured live.

use crate::access::RoleAccessControl;
use crate::execution::FuseAction;
use crate::fuses::{PositionBalanceFuse, StaticExchangeRate, StaticPriceOracle, SupplyFuse};
use crate::vault::{EngineSettings, Vault};
use crate::withdraw::WithdrawCandidate;
use anyhow::{Context, Result};
use codec::ValidatorEntry;
use std::rc::Rc;
use tracing::info;
use types::{Address, MarketId};
use vault_config::VaultConfig;

/// Caller that configures the vault; holds every role
pub fn owner_of(config: &VaultConfig) -> Address {
    config.engine.owner.unwrap_or(Address::ZERO)
}

/// Build the implementation catalog and an empty vault
pub fn build_catalog(config: &VaultConfig) -> Result<Vault> {
    let settings = EngineSettings::from_config(&config.engine)?;
    let asset_decimals = settings.asset_decimals;

    let oracle = Rc::new(StaticPriceOracle::new());
    let mut builder = Vault::builder(RoleAccessControl::new(owner_of(config))).settings(settings);

    for market in &config.markets {
        for (substrate, price) in market.price_table()? {
            oracle.set_price(substrate, price);
        }
        if let Some(fuse) = market.fuse {
            builder = builder.fuse(SupplyFuse::new(fuse, market.market_id()));
        }
        if let Some(balance_fuse) = market.balance_fuse {
            builder = builder.balance_fuse(PositionBalanceFuse::new(
                balance_fuse,
                market.market_id(),
                asset_decimals,
                market.decimals,
                oracle.clone(),
            ));
        }
    }

    if let Some(validator) = &config.validator {
        builder = builder.exchange_rate_source(StaticExchangeRate::new(validator.current_rate()?));
    }

    Ok(builder.build())
}

/// Populate registry, balances and hooks from configuration
pub fn apply_config(vault: &Vault, config: &VaultConfig) -> Result<()> {
    let owner = owner_of(config);

    let fuses: Vec<Address> = config.markets.iter().filter_map(|m| m.fuse).collect();
    vault.add_fuses(owner, &fuses)?;

    for market in &config.markets {
        let id = market.market_id();
        if !market.substrates.is_empty() {
            vault
                .grant_market_substrates(owner, id, market.substrates.clone())
                .with_context(|| format!("granting substrates of {}", market.label()))?;
        }
        if let Some(balance_fuse) = market.balance_fuse {
            vault
                .set_market_balance_fuse(owner, id, balance_fuse)
                .with_context(|| format!("setting balance fuse of {}", market.label()))?;
        }
        if !market.dependencies.is_empty() {
            vault.update_dependency_graph(owner, id, market.dependency_ids())?;
        }
    }

    let initial_idle = config.engine.initial_idle_units()?;
    if initial_idle > 0 {
        vault
            .deposit(owner, initial_idle)
            .context("depositing initial idle assets")?;
    }

    let mut allocations = Vec::new();
    for market in &config.markets {
        let units = market.allocation_units(config.engine.asset_decimals)?;
        if units == 0 {
            continue;
        }
        // validate() guarantees a fuse and at least one substrate
        if let (Some(fuse), Some(substrate)) = (market.fuse, market.substrates.first()) {
            allocations.push(FuseAction::enter(fuse, SupplyFuse::payload(*substrate, units)?));
        }
    }
    if !allocations.is_empty() {
        let report = vault
            .execute(owner, &allocations)
            .context("allocating startup positions")?;
        info!(markets = report.markets.len(), "startup allocation executed");
    }

    let mut route: Vec<(u32, Address, MarketId)> = config
        .markets
        .iter()
        .filter_map(|m| Some((m.withdraw_priority?, m.fuse?, m.market_id())))
        .collect();
    route.sort_by_key(|(priority, ..)| *priority);
    if !route.is_empty() {
        let candidates = route
            .into_iter()
            .map(|(_, fuse, market)| WithdrawCandidate::without_params(fuse).for_market(market))
            .collect();
        vault.configure_instant_withdrawal(owner, candidates)?;
    }

    if let Some(validator) = &config.validator {
        let entry = ValidatorEntry::new(validator.exchange_rate()?, validator.threshold()?)?;
        vault.set_validator(owner, config.engine.hooks_market(), entry)?;
    }

    let markets: Vec<MarketId> = config.markets.iter().map(|m| m.market_id()).collect();
    vault.refresh_balances(owner, &markets)?;
    Ok(())
}

/// Build a vault, restoring the configured snapshot when one exists
pub fn build_from_config(config: &VaultConfig) -> Result<Vault> {
    let vault = build_catalog(config)?;

    match &config.engine.snapshot_path {
        Some(path) if path.exists() => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading snapshot {}", path.display()))?;
            vault
                .restore(owner_of(config), &bytes)
                .with_context(|| format!("restoring snapshot {}", path.display()))?;
            info!(path = %path.display(), "vault restored from snapshot");
        }
        _ => {
            apply_config(&vault, config)?;
            info!(markets = config.markets.len(), "vault configured");
        }
    }

    Ok(vault)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Wad;

    const CONFIG: &str = r#"
        [engine]
        asset_decimals = 6
        initial_idle = "1000"
        owner = "0x00000000000000000000000000000000000000aa"

        [[markets]]
        id = 1
        fuse = "0x0000000000000000000000000000000000000f01"
        balance_fuse = "0x0000000000000000000000000000000000000b01"
        substrates = ["0x0000000000000000000000000000000000000501"]
        allocation = "400"
        withdraw_priority = 0
        prices = { "0x0000000000000000000000000000000000000501" = "1.0" }
    "#;

    #[test]
    fn test_bootstrap_allocates_and_values() {
        let config = VaultConfig::from_toml_str(CONFIG).unwrap();
        let vault = build_from_config(&config).unwrap();

        assert_eq!(vault.idle_assets().unwrap(), 600_000_000);
        assert_eq!(
            vault.cached_balance(MarketId::new(1)).unwrap(),
            Wad::from_int(400).unwrap()
        );
        assert_eq!(vault.total_assets().unwrap(), Wad::from_int(1000).unwrap());
        let candidates = vault.instant_withdrawal_candidates().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].market, Some(MarketId::new(1)));
    }
}
