//! Balance aggregation
//!
//! Each market's value comes from its balance fuse, normalized to 18 decimals.
//! Markets can depend on each other (a yield tokenizer's value moves with the
//! lending market underneath it), so refreshing one market also refreshes
//! every market reachable through the dependency graph:
//!
//! ```text
//! refresh([A])      A ──→ B ──→ C
//!                   │
//!                   └───→ D ──→ B (already visited)
//! order: A, B, D, C
//! ```
//!
//! The walk is breadth-first with a visited set, so cycles terminate and each
//! market is measured at most once per refresh.

use crate::catalog::Catalog;
use crate::error::{VaultError, VaultResult};
use crate::events::VaultEvent;
use crate::fuse::MarketView;
use crate::state::VaultState;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::{debug, warn};
use types::{MarketId, SignedDelta, Wad};

/// Result of refreshing one market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceUpdate {
    pub market: MarketId,
    pub previous: Wad,
    pub current: Wad,
    pub delta: SignedDelta,
}

/// Roots followed by every market reachable from them, breadth-first
pub fn dependency_closure(
    dependencies: &BTreeMap<MarketId, Vec<MarketId>>,
    roots: &[MarketId],
) -> Vec<MarketId> {
    let mut visited = HashSet::new();
    let mut queue: VecDeque<MarketId> = VecDeque::new();
    let mut order = Vec::new();

    for root in roots {
        if visited.insert(*root) {
            queue.push_back(*root);
        }
    }

    while let Some(market) = queue.pop_front() {
        order.push(market);
        for dependent in dependencies.get(&market).into_iter().flatten() {
            if visited.insert(*dependent) {
                queue.push_back(*dependent);
            }
        }
    }

    order
}

/// Would giving `market` these dependencies make it reachable from itself?
pub fn creates_cycle(
    dependencies: &BTreeMap<MarketId, Vec<MarketId>>,
    market: MarketId,
    proposed: &[MarketId],
) -> bool {
    let mut graph = dependencies.clone();
    graph.insert(market, proposed.to_vec());
    dependency_closure(&graph, proposed).contains(&market)
}

/// Measure one market through its balance fuse
///
/// `Ok(None)` when the market has no balance fuse.
pub fn measure_market(
    catalog: &Catalog,
    state: &VaultState,
    market: MarketId,
) -> VaultResult<Option<Wad>> {
    let Some(fuse_address) = state.registry.balance_fuse_of(market) else {
        return Ok(None);
    };
    let fuse = catalog
        .balance_fuse(&fuse_address)
        .ok_or(VaultError::UnsupportedFuse { fuse: fuse_address })?;

    let view = MarketView::new(market, state.registry.substrates_of(market), &state.ledger);
    let balance = fuse
        .balance_of(&view)
        .and_then(|reported| reported.normalized())
        .map_err(|source| VaultError::BalanceFuse {
            market,
            fuse: fuse_address,
            source,
        })?;
    Ok(Some(balance))
}

/// Live total over markets with substrates and a balance fuse
///
/// A failing balance fuse contributes its cached value instead.
pub fn live_total(catalog: &Catalog, state: &VaultState) -> VaultResult<Wad> {
    let mut total = Wad::ZERO;

    for market in state.registry.balance_fuse_markets() {
        if state.registry.substrates_of(*market).is_empty() {
            continue;
        }

        let balance = match measure_market(catalog, state, *market) {
            Ok(balance) => balance.unwrap_or(Wad::ZERO),
            Err(err) => {
                let cached = state.cached_balance(*market);
                warn!(market = %market, error = %err, cached = %cached, "balance fuse failed, using cached balance");
                cached
            }
        };

        total = total
            .checked_add(balance)
            .ok_or_else(|| types::FixedPointError::overflow("total_balance"))?;
    }

    Ok(total)
}

/// Re-measure `roots` and their dependents, updating the cache
///
/// Fuse failures propagate so the enclosing operation rolls back.
pub fn refresh_markets(
    catalog: &Catalog,
    state: &mut VaultState,
    roots: &[MarketId],
) -> VaultResult<Vec<BalanceUpdate>> {
    let order = dependency_closure(&state.dependencies, roots);
    let mut updates = Vec::with_capacity(order.len());

    for market in order {
        let current = measure_market(catalog, state, market)?.unwrap_or(Wad::ZERO);
        let previous = state.cached_balance(market);
        let delta = SignedDelta::between(current, previous);

        if current.is_zero() && state.registry.balance_fuse_of(market).is_none() {
            state.balances.remove(&market);
        } else {
            state.balances.insert(market, current);
        }

        debug!(market = %market, balance = %current, delta = %delta, "market balance refreshed");
        state.emit(VaultEvent::MarketBalanceUpdated {
            market,
            balance: current,
            delta,
        });
        updates.push(BalanceUpdate {
            market,
            previous,
            current,
            delta,
        });
    }

    Ok(updates)
}
