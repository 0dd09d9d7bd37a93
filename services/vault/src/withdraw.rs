//! Instant withdrawal router
//!
//! Frees idle assets by asking fuses, in priority order, to unwind part of
//! their positions. Each candidate runs against its own ledger checkpoint: a
//! candidate that fails is rolled back and skipped, and routing moves on.
//! Falling short of the requested amount is a normal outcome, not an error.

use crate::fuse::FuseContext;
use crate::state::VaultState;
use crate::vault::Vault;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use types::{Address, MarketId};

/// One entry of a withdrawal route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawCandidate {
    pub fuse: Address,
    /// Market the caller expects the fuse to serve; `None` takes the fuse's own
    pub market: Option<MarketId>,
    /// Fuse-specific parameters, passed through verbatim
    pub params: Bytes,
}

impl WithdrawCandidate {
    pub fn new(fuse: Address, params: impl Into<Bytes>) -> Self {
        Self {
            fuse,
            market: None,
            params: params.into(),
        }
    }

    pub fn without_params(fuse: Address) -> Self {
        Self::new(fuse, Bytes::new())
    }

    /// Pin the candidate to `market`; a fuse declared elsewhere is refused
    pub fn for_market(mut self, market: MarketId) -> Self {
        self.market = Some(market);
        self
    }

    /// Declared market of `fuse` when it disagrees with the pinned one
    pub(crate) fn mismatch(&self, declared: MarketId) -> Option<MarketId> {
        self.market.filter(|market| *market != declared)
    }
}

/// What happened to one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FillStatus {
    /// Idle assets grew by `amount`
    Filled { amount: u128 },
    /// The fuse failed; its effects were rolled back
    Reverted { reason: String },
    /// The fuse is not active or has no implementation
    Unsupported,
    /// The fuse serves another market than the candidate names
    MarketMismatch { declared: MarketId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateFill {
    pub fuse: Address,
    pub market: Option<MarketId>,
    pub status: FillStatus,
}

/// Result of routing one withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalOutcome {
    pub requested: u128,
    pub withdrawn: u128,
    pub fills: Vec<CandidateFill>,
}

impl WithdrawalOutcome {
    pub fn is_complete(&self) -> bool {
        self.withdrawn >= self.requested
    }

    pub fn shortfall(&self) -> u128 {
        self.requested.saturating_sub(self.withdrawn)
    }

    /// Markets whose positions changed
    pub fn filled_markets(&self) -> Vec<MarketId> {
        let mut markets: Vec<MarketId> = self
            .fills
            .iter()
            .filter(|fill| matches!(fill.status, FillStatus::Filled { amount } if amount > 0))
            .filter_map(|fill| fill.market)
            .collect();
        markets.sort();
        markets.dedup();
        markets
    }
}

/// Try candidates in order until `amount` is freed or the list is exhausted
pub(crate) fn route(
    vault: &Vault,
    state: &mut VaultState,
    amount: u128,
    candidates: &[WithdrawCandidate],
) -> WithdrawalOutcome {
    let mut outcome = WithdrawalOutcome {
        requested: amount,
        withdrawn: 0,
        fills: Vec::new(),
    };

    for candidate in candidates {
        let remaining = outcome.shortfall();
        if remaining == 0 {
            break;
        }

        let fuse = match vault.catalog().fuse(&candidate.fuse) {
            Some(fuse) if state.registry.is_supported(&candidate.fuse) => fuse,
            _ => {
                warn!(fuse = %candidate.fuse, "withdrawal candidate is not a supported fuse, skipping");
                outcome.fills.push(CandidateFill {
                    fuse: candidate.fuse,
                    market: None,
                    status: FillStatus::Unsupported,
                });
                continue;
            }
        };

        let market = fuse.market_id();
        if let Some(expected) = candidate.mismatch(market) {
            warn!(fuse = %candidate.fuse, declared = %market, expected = %expected, "withdrawal candidate serves another market, skipping");
            outcome.fills.push(CandidateFill {
                fuse: candidate.fuse,
                market: Some(expected),
                status: FillStatus::MarketMismatch { declared: market },
            });
            continue;
        }

        let checkpoint = state.ledger.clone();
        let idle_before = state.ledger.idle();

        let result = {
            let mut ctx = FuseContext::new(vault, state, market, candidate.fuse);
            fuse.instant_withdraw(&mut ctx, remaining, &candidate.params)
        };

        let status = match result {
            Ok(reported) => {
                let freed = state.ledger.idle().saturating_sub(idle_before);
                if freed != reported {
                    debug!(fuse = %candidate.fuse, reported, freed, "fuse report differs from idle change");
                }
                outcome.withdrawn = outcome.withdrawn.saturating_add(freed);
                debug!(fuse = %candidate.fuse, market = %market, freed, "withdrawal candidate filled");
                FillStatus::Filled { amount: freed }
            }
            Err(err) => {
                state.ledger = checkpoint;
                warn!(fuse = %candidate.fuse, market = %market, error = %err, "withdrawal candidate reverted");
                FillStatus::Reverted {
                    reason: err.to_string(),
                }
            }
        };

        outcome.fills.push(CandidateFill {
            fuse: candidate.fuse,
            market: Some(market),
            status,
        });
    }

    outcome
}
