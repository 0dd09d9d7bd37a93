//! Batch execution
//!
//! A batch is an ordered list of fuse calls. Each call is resolved against the
//! registry and dispatched through the [`Fuse`](crate::fuse::Fuse) trait;
//! afterwards every touched market (and its dependents) is re-measured. The
//! vault runs the whole batch inside one transaction, so the first failure
//! discards the effects of every earlier call.

use crate::balance::{refresh_markets, BalanceUpdate};
use crate::error::{VaultError, VaultResult};
use crate::events::VaultEvent;
use crate::fuse::FuseContext;
use crate::state::VaultState;
use crate::vault::Vault;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use types::{Address, MarketId};

/// Direction of a fuse call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuseCall {
    Enter(Bytes),
    Exit(Bytes),
}

impl FuseCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enter(_) => "enter",
            Self::Exit(_) => "exit",
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Enter(payload) | Self::Exit(payload) => payload,
        }
    }
}

/// One operation of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuseAction {
    pub fuse: Address,
    pub call: FuseCall,
}

impl FuseAction {
    pub fn enter(fuse: Address, payload: impl Into<Bytes>) -> Self {
        Self {
            fuse,
            call: FuseCall::Enter(payload.into()),
        }
    }

    pub fn exit(fuse: Address, payload: impl Into<Bytes>) -> Self {
        Self {
            fuse,
            call: FuseCall::Exit(payload.into()),
        }
    }
}

impl fmt::Display for FuseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}(0x{})",
            self.fuse,
            self.call.name(),
            hex::encode(self.call.payload())
        )
    }
}

/// Summary of a committed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub operations: usize,
    /// Markets touched by the batch, in first-touch order
    pub markets: Vec<MarketId>,
    /// Balance refreshes of touched markets and their dependents
    pub balance_updates: Vec<BalanceUpdate>,
}

pub(crate) fn run_batch(
    vault: &Vault,
    state: &mut VaultState,
    caller: Address,
    actions: &[FuseAction],
) -> VaultResult<BatchReport> {
    let mut touched: Vec<MarketId> = Vec::new();

    for (position, action) in actions.iter().enumerate() {
        let fuse = match vault.catalog().fuse(&action.fuse) {
            Some(fuse) if state.registry.is_supported(&action.fuse) => fuse,
            _ => return Err(VaultError::UnsupportedFuse { fuse: action.fuse }),
        };
        let market = fuse.market_id();
        debug!(position, market = %market, action = %action, "dispatching fuse call");

        let mut ctx = FuseContext::new(vault, state, market, action.fuse);
        let result = match &action.call {
            FuseCall::Enter(payload) => fuse.enter(&mut ctx, payload),
            FuseCall::Exit(payload) => fuse.exit(&mut ctx, payload),
        };
        result.map_err(|source| VaultError::Fuse {
            fuse: action.fuse,
            source,
        })?;

        if !touched.contains(&market) {
            touched.push(market);
        }
    }

    let balance_updates = refresh_markets(vault.catalog(), state, &touched)?;

    state.emit(VaultEvent::BatchExecuted {
        caller,
        operations: actions.len(),
        markets: touched.clone(),
    });

    Ok(BatchReport {
        operations: actions.len(),
        markets: touched,
        balance_updates,
    })
}
