//! Read-only report of a vault, serialized by the binary as JSON

use crate::error::VaultResult;
use crate::vault::Vault;
use codec::HookKind;
use serde::Serialize;
use types::{Address, MarketId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorSummary {
    pub exchange_rate: String,
    pub threshold: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSummary {
    pub market: MarketId,
    pub balance_fuse: Option<Address>,
    pub substrates: Vec<Address>,
    pub dependencies: Vec<MarketId>,
    /// Last refreshed balance, 18 decimals
    pub cached_balance: String,
    pub pre_hooks: usize,
    pub post_hooks: usize,
    pub validator: Option<ValidatorSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultSummary {
    pub idle_units: u128,
    pub total_balance: String,
    pub total_assets: String,
    pub supported_fuses: Vec<Address>,
    pub withdraw_route: Vec<Address>,
    pub markets: Vec<MarketSummary>,
}

impl Vault {
    /// Snapshot of balances and configuration for reporting
    pub fn summary(&self) -> VaultResult<VaultSummary> {
        let state = self.state()?;
        let mut markets = Vec::new();

        for market in state.known_markets() {
            let parsed = self.get_hook_config(market)?;
            markets.push(MarketSummary {
                market,
                balance_fuse: state.registry.balance_fuse_of(market),
                substrates: state.registry.substrates_of(market).to_vec(),
                dependencies: state.dependencies_of(market).to_vec(),
                cached_balance: state.cached_balance(market).to_string(),
                pre_hooks: parsed.configured_hooks(HookKind::Pre).count(),
                post_hooks: parsed.configured_hooks(HookKind::Post).count(),
                validator: parsed.validator.map(|v| ValidatorSummary {
                    exchange_rate: v.exchange_rate().to_string(),
                    threshold: v.threshold().to_string(),
                }),
            });
        }

        Ok(VaultSummary {
            idle_units: state.ledger.idle(),
            total_balance: self.total_balance()?.to_string(),
            total_assets: self.total_assets()?.to_string(),
            supported_fuses: state.registry.fuses().to_vec(),
            withdraw_route: state.withdraw_candidates.iter().map(|c| c.fuse).collect(),
            markets,
        })
    }
}
