//! Vault events
//!
//! Operations stage events while they run; the vault moves them to its
//! journal only when the operation commits, so a rolled-back operation leaves
//! no events behind. Hosts collect them with `Vault::drain_events`.

use crate::access::VaultOperation;
use codec::HookKind;
use serde::Serialize;
use std::fmt;
use types::{Address, MarketId, SignedDelta, Wad};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VaultEvent {
    FuseAdded {
        fuse: Address,
    },
    FuseRemoved {
        fuse: Address,
    },
    BalanceFuseSet {
        market: MarketId,
        fuse: Address,
        previous: Option<Address>,
    },
    BalanceFuseRemoved {
        market: MarketId,
        fuse: Address,
    },
    SubstrateGranted {
        market: MarketId,
        substrate: Address,
    },
    SubstrateRevoked {
        market: MarketId,
        substrate: Address,
    },
    MarketSubstratesReplaced {
        market: MarketId,
        substrates: Vec<Address>,
    },
    DependencyGraphUpdated {
        market: MarketId,
        dependencies: Vec<MarketId>,
    },
    HookConfigured {
        market: MarketId,
        kind: HookKind,
        index: u8,
        hook: Address,
    },
    HookRemoved {
        market: MarketId,
        kind: HookKind,
        index: u8,
        hook: Address,
    },
    ValidatorConfigured {
        market: MarketId,
        exchange_rate: Wad,
        threshold: Wad,
    },
    ValidatorRemoved {
        market: MarketId,
    },
    MarketConfigsLoaded {
        market: MarketId,
        slots: usize,
    },
    MarketBalanceUpdated {
        market: MarketId,
        balance: Wad,
        delta: SignedDelta,
    },
    ExchangeRateRecalibrated {
        market: MarketId,
        previous: Wad,
        current: Wad,
    },
    BatchExecuted {
        caller: Address,
        operations: usize,
        markets: Vec<MarketId>,
    },
    InstantWithdrawalConfigured {
        fuses: Vec<Address>,
    },
    InstantWithdrawal {
        requested: u128,
        withdrawn: u128,
    },
    ProtectedCallCompleted {
        caller: Address,
        operation: VaultOperation,
        amount: u128,
    },
    StateRestored {
        markets: usize,
    },
}

impl VaultEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FuseAdded { .. } => "fuse_added",
            Self::FuseRemoved { .. } => "fuse_removed",
            Self::BalanceFuseSet { .. } => "balance_fuse_set",
            Self::BalanceFuseRemoved { .. } => "balance_fuse_removed",
            Self::SubstrateGranted { .. } => "substrate_granted",
            Self::SubstrateRevoked { .. } => "substrate_revoked",
            Self::MarketSubstratesReplaced { .. } => "market_substrates_replaced",
            Self::DependencyGraphUpdated { .. } => "dependency_graph_updated",
            Self::HookConfigured { .. } => "hook_configured",
            Self::HookRemoved { .. } => "hook_removed",
            Self::ValidatorConfigured { .. } => "validator_configured",
            Self::ValidatorRemoved { .. } => "validator_removed",
            Self::MarketConfigsLoaded { .. } => "market_configs_loaded",
            Self::MarketBalanceUpdated { .. } => "market_balance_updated",
            Self::ExchangeRateRecalibrated { .. } => "exchange_rate_recalibrated",
            Self::BatchExecuted { .. } => "batch_executed",
            Self::InstantWithdrawalConfigured { .. } => "instant_withdrawal_configured",
            Self::InstantWithdrawal { .. } => "instant_withdrawal",
            Self::ProtectedCallCompleted { .. } => "protected_call_completed",
            Self::StateRestored { .. } => "state_restored",
        }
    }
}

impl fmt::Display for VaultEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarketBalanceUpdated {
                market,
                balance,
                delta,
            } => write!(f, "{} {} balance={} delta={}", self.name(), market, balance, delta),
            Self::ExchangeRateRecalibrated {
                market,
                previous,
                current,
            } => write!(f, "{} {} {} -> {}", self.name(), market, previous, current),
            Self::InstantWithdrawal {
                requested,
                withdrawn,
            } => write!(f, "{} {}/{}", self.name(), withdrawn, requested),
            other => f.write_str(other.name()),
        }
    }
}
