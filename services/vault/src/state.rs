//! Persistent vault state
//!
//! Everything an operation can change lives in one [`VaultState`] value, so
//! an operation checkpoints by cloning it and rolls back by restoring the
//! clone. Staged events ride along and are discarded with the rollback.

use crate::events::VaultEvent;
use crate::ledger::PositionLedger;
use crate::registry::AdapterRegistry;
use crate::withdraw::WithdrawCandidate;
use codec::PackedSlot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::{MarketId, Wad};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    pub registry: AdapterRegistry,
    pub ledger: PositionLedger,
    /// Last measured balance per market, 18 decimals
    pub balances: BTreeMap<MarketId, Wad>,
    /// market → markets refreshed whenever it is
    pub dependencies: BTreeMap<MarketId, Vec<MarketId>>,
    /// Packed hook/validator records per market
    pub configs: BTreeMap<MarketId, Vec<PackedSlot>>,
    /// Default instant-withdrawal route
    pub withdraw_candidates: Vec<WithdrawCandidate>,
    #[serde(skip)]
    pub(crate) pending: Vec<VaultEvent>,
}

impl VaultState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_balance(&self, market: MarketId) -> Wad {
        self.balances.get(&market).copied().unwrap_or(Wad::ZERO)
    }

    pub fn dependencies_of(&self, market: MarketId) -> &[MarketId] {
        self.dependencies
            .get(&market)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn config_slots(&self, market: MarketId) -> &[PackedSlot] {
        self.configs.get(&market).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn emit(&mut self, event: VaultEvent) {
        self.pending.push(event);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Every market the state knows anything about, ascending
    pub fn known_markets(&self) -> Vec<MarketId> {
        let mut markets: Vec<MarketId> = self
            .registry
            .markets_with_substrates()
            .chain(self.registry.balance_fuse_markets().iter().copied())
            .chain(self.balances.keys().copied())
            .chain(self.dependencies.keys().copied())
            .chain(self.configs.keys().copied())
            .collect();
        markets.sort();
        markets.dedup();
        markets
    }
}
