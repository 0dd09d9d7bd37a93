//! Position ledger
//!
//! The vault's own record of where its assets sit: an idle balance held by
//! the vault plus one position per (market, substrate). Amounts are in the
//! vault asset's native units. Fuses move assets between idle and positions
//! through [`FuseContext`](crate::fuse::FuseContext); balance fuses read
//! positions to value a market.

use crate::error::FuseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::{Address, MarketId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLedger {
    idle: u128,
    positions: BTreeMap<(MarketId, Address), u128>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idle(&self) -> u128 {
        self.idle
    }

    pub fn credit_idle(&mut self, amount: u128) -> Result<(), FuseError> {
        self.idle = self
            .idle
            .checked_add(amount)
            .ok_or_else(|| FuseError::Arithmetic(types::FixedPointError::overflow("credit_idle")))?;
        Ok(())
    }

    pub fn debit_idle(&mut self, amount: u128) -> Result<(), FuseError> {
        self.idle = self
            .idle
            .checked_sub(amount)
            .ok_or(FuseError::InsufficientIdle {
                requested: amount,
                available: self.idle,
            })?;
        Ok(())
    }

    pub fn position(&self, market: MarketId, substrate: &Address) -> u128 {
        self.positions
            .get(&(market, *substrate))
            .copied()
            .unwrap_or(0)
    }

    pub fn increase_position(
        &mut self,
        market: MarketId,
        substrate: Address,
        amount: u128,
    ) -> Result<(), FuseError> {
        let entry = self.positions.entry((market, substrate)).or_insert(0);
        *entry = entry.checked_add(amount).ok_or_else(|| {
            FuseError::Arithmetic(types::FixedPointError::overflow("increase_position"))
        })?;
        Ok(())
    }

    pub fn decrease_position(
        &mut self,
        market: MarketId,
        substrate: Address,
        amount: u128,
    ) -> Result<(), FuseError> {
        let available = self.position(market, &substrate);
        let remaining = available
            .checked_sub(amount)
            .ok_or(FuseError::InsufficientPosition {
                market,
                substrate,
                requested: amount,
                available,
            })?;

        if remaining == 0 {
            self.positions.remove(&(market, substrate));
        } else {
            self.positions.insert((market, substrate), remaining);
        }
        Ok(())
    }

    /// Non-zero positions held in one market
    pub fn positions_in(&self, market: MarketId) -> impl Iterator<Item = (Address, u128)> + '_ {
        self.positions
            .range((market, Address::ZERO)..)
            .take_while(move |((m, _), _)| *m == market)
            .map(|((_, substrate), amount)| (*substrate, *amount))
    }

    /// Sum of every position across markets, saturating
    pub fn total_positions(&self) -> u128 {
        self.positions
            .values()
            .fold(0u128, |acc, amount| acc.saturating_add(*amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_accounting() {
        let mut ledger = PositionLedger::new();
        ledger.credit_idle(100).unwrap();
        ledger.debit_idle(40).unwrap();
        assert_eq!(ledger.idle(), 60);

        let err = ledger.debit_idle(61).unwrap_err();
        assert!(matches!(
            err,
            FuseError::InsufficientIdle {
                requested: 61,
                available: 60
            }
        ));
        assert_eq!(ledger.idle(), 60);
    }

    #[test]
    fn test_positions_per_market() {
        let mut ledger = PositionLedger::new();
        let (m1, m2) = (MarketId::new(1), MarketId::new(2));
        let token = Address::from_low_u64(0xA);

        ledger.increase_position(m1, token, 30).unwrap();
        ledger.increase_position(m2, token, 50).unwrap();
        ledger.decrease_position(m1, token, 10).unwrap();

        assert_eq!(ledger.position(m1, &token), 20);
        assert_eq!(ledger.positions_in(m2).collect::<Vec<_>>(), vec![(token, 50)]);
        assert_eq!(ledger.total_positions(), 70);

        ledger.decrease_position(m1, token, 20).unwrap();
        assert_eq!(ledger.positions_in(m1).count(), 0);
        assert!(ledger.decrease_position(m1, token, 1).is_err());
    }
}
