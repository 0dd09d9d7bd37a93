//! Adapter registry
//!
//! Tracks which fuses the vault may dispatch to, which balance fuse values
//! each market, and which substrates each market may touch. Every set is a
//! [`RegistrySlot`], so add and remove are O(1) and idempotent.

use super::slot::RegistrySlot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::{Address, MarketId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterRegistry {
    /// Fuses accepted in batches and withdrawal routing
    fuses: RegistrySlot<Address>,
    /// Markets that currently have a balance fuse
    balance_fuse_markets: RegistrySlot<MarketId>,
    market_balance_fuse: BTreeMap<MarketId, Address>,
    substrates: BTreeMap<MarketId, RegistrySlot<Address>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // SUPPORTED FUSES

    pub fn add_fuse(&mut self, fuse: Address) -> bool {
        self.fuses.insert(fuse)
    }

    pub fn remove_fuse(&mut self, fuse: &Address) -> bool {
        self.fuses.remove(fuse)
    }

    pub fn is_supported(&self, fuse: &Address) -> bool {
        self.fuses.contains(fuse)
    }

    pub fn fuses(&self) -> &[Address] {
        self.fuses.as_slice()
    }

    // BALANCE FUSES

    /// Install `fuse` as the market's balance fuse, returning the one it replaces
    pub fn set_market_balance_fuse(&mut self, market: MarketId, fuse: Address) -> Option<Address> {
        self.balance_fuse_markets.insert(market);
        self.market_balance_fuse
            .insert(market, fuse)
            .filter(|previous| *previous != fuse)
    }

    /// Remove the market's balance fuse only if it is `fuse`
    pub fn remove_market_balance_fuse(&mut self, market: MarketId, fuse: &Address) -> bool {
        if self.market_balance_fuse.get(&market) != Some(fuse) {
            return false;
        }
        self.market_balance_fuse.remove(&market);
        self.balance_fuse_markets.remove(&market);
        true
    }

    pub fn balance_fuse_of(&self, market: MarketId) -> Option<Address> {
        self.market_balance_fuse.get(&market).copied()
    }

    pub fn balance_fuse_markets(&self) -> &[MarketId] {
        self.balance_fuse_markets.as_slice()
    }

    // SUBSTRATES

    pub fn grant_substrate(&mut self, market: MarketId, substrate: Address) -> bool {
        self.substrates.entry(market).or_default().insert(substrate)
    }

    pub fn revoke_substrate(&mut self, market: MarketId, substrate: &Address) -> bool {
        let Some(slot) = self.substrates.get_mut(&market) else {
            return false;
        };
        let revoked = slot.remove(substrate);
        if slot.is_empty() {
            self.substrates.remove(&market);
        }
        revoked
    }

    /// Replace the market's whole substrate set
    pub fn grant_market_substrates(
        &mut self,
        market: MarketId,
        substrates: impl IntoIterator<Item = Address>,
    ) {
        let slot = RegistrySlot::from_items(substrates);
        if slot.is_empty() {
            self.substrates.remove(&market);
        } else {
            self.substrates.insert(market, slot);
        }
    }

    pub fn is_substrate_granted(&self, market: MarketId, substrate: &Address) -> bool {
        self.substrates
            .get(&market)
            .is_some_and(|slot| slot.contains(substrate))
    }

    pub fn substrates_of(&self, market: MarketId) -> &[Address] {
        self.substrates
            .get(&market)
            .map(RegistrySlot::as_slice)
            .unwrap_or(&[])
    }

    /// Markets with at least one granted substrate
    pub fn markets_with_substrates(&self) -> impl Iterator<Item = MarketId> + '_ {
        self.substrates.keys().copied()
    }

    /// Every slot is internally consistent and balance-fuse tracking agrees with itself
    pub fn is_consistent(&self) -> bool {
        self.fuses.is_consistent()
            && self.balance_fuse_markets.is_consistent()
            && self.balance_fuse_markets.len() == self.market_balance_fuse.len()
            && self
                .balance_fuse_markets
                .iter()
                .all(|market| self.market_balance_fuse.contains_key(market))
            && self.substrates.values().all(RegistrySlot::is_consistent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn test_fuse_set_idempotence() {
        let mut registry = AdapterRegistry::new();
        assert!(registry.add_fuse(addr(1)));
        assert!(!registry.add_fuse(addr(1)));
        assert_eq!(registry.fuses(), &[addr(1)]);

        assert!(registry.remove_fuse(&addr(1)));
        assert!(!registry.remove_fuse(&addr(1)));
        assert!(!registry.is_supported(&addr(1)));
    }

    #[test]
    fn test_balance_fuse_supersede_and_remove() {
        let mut registry = AdapterRegistry::new();
        let market = MarketId::new(3);

        assert_eq!(registry.set_market_balance_fuse(market, addr(10)), None);
        assert_eq!(registry.set_market_balance_fuse(market, addr(11)), Some(addr(10)));
        assert_eq!(registry.balance_fuse_of(market), Some(addr(11)));
        assert_eq!(registry.balance_fuse_markets(), &[market]);

        // Not the current fuse: no-op
        assert!(!registry.remove_market_balance_fuse(market, &addr(10)));
        assert_eq!(registry.balance_fuse_of(market), Some(addr(11)));

        assert!(registry.remove_market_balance_fuse(market, &addr(11)));
        assert!(registry.balance_fuse_markets().is_empty());
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_substrate_grants() {
        let mut registry = AdapterRegistry::new();
        let market = MarketId::new(1);

        assert!(registry.grant_substrate(market, addr(5)));
        assert!(!registry.grant_substrate(market, addr(5)));
        assert!(registry.is_substrate_granted(market, &addr(5)));
        assert!(!registry.is_substrate_granted(MarketId::new(2), &addr(5)));

        registry.grant_market_substrates(market, [addr(6), addr(7), addr(6)]);
        assert_eq!(registry.substrates_of(market), &[addr(6), addr(7)]);

        assert!(registry.revoke_substrate(market, &addr(6)));
        assert!(registry.revoke_substrate(market, &addr(7)));
        assert!(registry.substrates_of(market).is_empty());
        assert_eq!(registry.markets_with_substrates().count(), 0);
    }
}
