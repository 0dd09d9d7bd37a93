//! Registry consistency under arbitrary mutation sequences

mod common;

use common::*;
use proptest::prelude::*;
use std::collections::HashSet;
use types::{Address, MarketId};
use vault_engine::{AdapterRegistry, RegistrySlot, VaultEvent};

#[derive(Debug, Clone)]
enum Op {
    Insert(u8),
    Remove(u8),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (0u8..24).prop_map(Op::Insert),
            (0u8..24).prop_map(Op::Remove),
        ],
        0..200,
    )
}

proptest! {
    #[test]
    fn slot_matches_model(ops in ops()) {
        let mut slot = RegistrySlot::new();
        let mut model = HashSet::new();

        for op in ops {
            match op {
                Op::Insert(k) => prop_assert_eq!(slot.insert(k), model.insert(k)),
                Op::Remove(k) => prop_assert_eq!(slot.remove(&k), model.remove(&k)),
            }
            prop_assert!(slot.is_consistent());
            prop_assert_eq!(slot.len(), model.len());
            for (position, key) in slot.iter().enumerate() {
                prop_assert_eq!(slot.position(key), Some(position));
            }
        }
    }

    #[test]
    fn adapter_registry_stays_consistent(ops in ops(), market in 0u32..4) {
        let mut registry = AdapterRegistry::new();
        let market = MarketId::new(market);

        for op in ops {
            match op {
                Op::Insert(k) => {
                    registry.add_fuse(Address::from_low_u64(k as u64));
                    registry.grant_substrate(market, Address::from_low_u64(k as u64));
                }
                Op::Remove(k) => {
                    registry.remove_fuse(&Address::from_low_u64(k as u64));
                    registry.revoke_substrate(market, &Address::from_low_u64(k as u64));
                }
            }
            prop_assert!(registry.is_consistent());
            prop_assert_eq!(registry.fuses(), registry.substrates_of(market));
        }
    }
}

#[test]
fn test_add_and_remove_are_idempotent() {
    let f = fixture();
    let extra = addr(0x1234);

    assert!(f.vault.add_fuse(OWNER, extra).unwrap());
    assert!(!f.vault.add_fuse(OWNER, extra).unwrap());
    assert_eq!(
        f.vault
            .supported_fuses()
            .unwrap()
            .iter()
            .filter(|fuse| **fuse == extra)
            .count(),
        1
    );

    assert!(f.vault.remove_fuse(OWNER, extra).unwrap());
    assert!(!f.vault.remove_fuse(OWNER, extra).unwrap());
    assert!(!f.vault.is_supported(&extra).unwrap());

    assert!(!f.vault.grant_substrate(OWNER, LENDING, POOL_A).unwrap());
    assert!(!f.vault.revoke_substrate(OWNER, YIELD, POOL_A).unwrap());

    let events = f.vault.drain_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], VaultEvent::FuseAdded { fuse } if fuse == extra));
    assert!(matches!(events[1], VaultEvent::FuseRemoved { fuse } if fuse == extra));
}

#[test]
fn test_swap_and_pop_through_vault() {
    let f = fixture();
    let extra: Vec<Address> = (0x100..0x105).map(addr).collect();
    f.vault.add_fuses(OWNER, &extra).unwrap();

    f.vault.remove_fuse(OWNER, LENDING_FUSE).unwrap();
    let fuses = f.vault.supported_fuses().unwrap();
    assert_eq!(fuses[0], addr(0x104));
    assert_eq!(fuses.len(), 6);
    assert!(f.vault.state().unwrap().registry.is_consistent());
}

#[test]
fn test_bulk_substrate_grant_replaces_set() {
    let f = fixture();
    f.vault
        .grant_market_substrates(OWNER, LENDING, vec![POOL_B, VAULT_Y, POOL_B])
        .unwrap();

    assert_eq!(f.vault.substrates_of(LENDING).unwrap(), vec![POOL_B, VAULT_Y]);
    assert!(!f.vault.is_substrate_granted(LENDING, &POOL_A).unwrap());
}

#[test]
fn test_configuration_requires_roles() {
    let f = fixture();
    assert!(f.vault.add_fuse(STRANGER, addr(0x1)).is_err());
    assert!(f.vault.grant_substrate(STRANGER, LENDING, addr(0x1)).is_err());
    assert!(f
        .vault
        .update_dependency_graph(STRANGER, LENDING, vec![YIELD])
        .is_err());
    assert!(f.vault.drain_events().is_empty());
}
