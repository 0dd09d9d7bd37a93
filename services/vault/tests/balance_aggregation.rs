//! Balance aggregation, dependency propagation and balance fuse management

mod common;

use common::*;
use std::rc::Rc;
use types::{MarketId, Wad};
use vault_engine::fuses::{PositionBalanceFuse, StaticExchangeRate};
use vault_engine::{ConfigurationError, EngineSettings, VaultError, VaultEvent};

#[test]
fn test_refresh_propagates_to_dependents() {
    let f = funded(1_000_000_000);
    f.vault
        .execute(OWNER, &[supply(LENDING_FUSE, POOL_A, 100_000_000)])
        .unwrap();
    f.vault
        .update_dependency_graph(OWNER, LENDING, vec![YIELD])
        .unwrap();
    f.vault
        .update_dependency_graph(OWNER, YIELD, vec![FLOAT])
        .unwrap();
    f.vault.drain_events();

    // price moves are only cached on refresh
    f.oracle.set_price(POOL_A, wad("2"));
    let updates = f.vault.refresh_balances(OWNER, &[LENDING]).unwrap();

    let refreshed: Vec<MarketId> = updates.iter().map(|u| u.market).collect();
    assert_eq!(refreshed, vec![LENDING, YIELD, FLOAT]);
    assert_eq!(updates[0].previous, Wad::from_int(100).unwrap());
    assert_eq!(updates[0].current, Wad::from_int(200).unwrap());
    assert_eq!(updates[0].delta.0, 100 * Wad::SCALE as i128);

    let events = f.vault.drain_events();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, VaultEvent::MarketBalanceUpdated { .. }))
            .count(),
        3
    );
}

#[test]
fn test_cyclic_dependencies_are_tolerated() {
    let f = funded(1_000);
    f.vault
        .update_dependency_graph(OWNER, LENDING, vec![YIELD])
        .unwrap();
    f.vault
        .update_dependency_graph(OWNER, YIELD, vec![LENDING])
        .unwrap();

    let updates = f.vault.refresh_balances(OWNER, &[YIELD]).unwrap();
    assert_eq!(updates.len(), 2);
}

#[test]
fn test_cycles_rejected_when_configured() {
    let oracle = oracle();
    let rate = Rc::new(StaticExchangeRate::new(Wad::ONE));
    let settings = EngineSettings {
        reject_dependency_cycles: true,
        ..EngineSettings::default()
    };
    let vault = builder(&oracle, &rate).settings(settings).build();

    vault.update_dependency_graph(OWNER, LENDING, vec![YIELD]).unwrap();
    let err = vault
        .update_dependency_graph(OWNER, YIELD, vec![LENDING])
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::Configuration(ConfigurationError::DependencyCycle { market }) if market == YIELD
    ));
    assert!(vault.dependencies_of(YIELD).unwrap().is_empty());

    let err = vault
        .update_dependency_graph(OWNER, FLOAT, vec![FLOAT])
        .unwrap_err();
    assert!(matches!(err, VaultError::Configuration(ConfigurationError::DependencyCycle { .. })));
}

#[test]
fn test_total_balance_normalizes_decimals() {
    let f = funded(1_000_000_000);
    f.vault
        .execute(
            OWNER,
            &[
                supply(LENDING_FUSE, POOL_A, 250_500_000),
                supply(YIELD_FUSE, VAULT_Y, 100_000_000),
            ],
        )
        .unwrap();
    f.oracle.set_price(VAULT_Y, wad("1.5"));

    // lending reports 6 decimals, yield 18
    assert_eq!(f.vault.total_balance().unwrap(), wad("400.5"));
    assert_eq!(f.vault.total_assets().unwrap(), wad("1050"));
}

#[test]
fn test_market_without_balance_fuse_counts_zero() {
    let f = funded(1_000_000_000);
    f.vault
        .execute(OWNER, &[supply(LENDING_FUSE, POOL_A, 100_000_000)])
        .unwrap();

    let orphan = MarketId::new(9);
    f.vault.grant_substrate(OWNER, orphan, addr(0x777)).unwrap();
    assert_eq!(f.vault.total_balance().unwrap(), Wad::from_int(100).unwrap());

    let updates = f.vault.refresh_balances(OWNER, &[orphan]).unwrap();
    assert_eq!(updates[0].current, Wad::ZERO);
    assert_eq!(f.vault.cached_balance(orphan).unwrap(), Wad::ZERO);
}

#[test]
fn test_failing_balance_fuse_reverts_batch() {
    let f = funded(100_000_000);
    let unpriced = addr(0x777);
    f.vault.grant_substrate(OWNER, LENDING, unpriced).unwrap();
    f.vault
        .execute(OWNER, &[supply(LENDING_FUSE, POOL_A, 40_000_000)])
        .unwrap();

    let err = f
        .vault
        .execute(OWNER, &[supply(LENDING_FUSE, unpriced, 10_000_000)])
        .unwrap_err();
    assert!(matches!(err, VaultError::BalanceFuse { market, .. } if market == LENDING));
    assert_eq!(f.vault.idle_assets().unwrap(), 60_000_000);
    assert_eq!(f.vault.cached_balance(LENDING).unwrap(), Wad::from_int(40).unwrap());
}

#[test]
fn test_failing_balance_fuse_serves_cached_total() {
    let f = funded(100_000_000);
    f.vault
        .execute(OWNER, &[supply(LENDING_FUSE, POOL_A, 40_000_000)])
        .unwrap();
    f.oracle.remove_price(&POOL_A);

    assert_eq!(f.vault.total_balance().unwrap(), Wad::from_int(40).unwrap());

    let before = f.vault.state().unwrap();
    let err = f.vault.refresh_balances(OWNER, &[LENDING]).unwrap_err();
    assert!(matches!(err, VaultError::BalanceFuse { .. }));
    assert_eq!(f.vault.state().unwrap(), before);
}

#[test]
fn test_balance_fuse_market_mismatch() {
    let f = fixture();
    let err = f
        .vault
        .set_market_balance_fuse(OWNER, YIELD, LENDING_BALANCE)
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::Configuration(ConfigurationError::FuseMarketMismatch { declared, market, .. })
            if declared == LENDING && market == YIELD
    ));

    let err = f
        .vault
        .set_market_balance_fuse(OWNER, YIELD, addr(0x999))
        .unwrap_err();
    assert!(matches!(err, VaultError::UnsupportedFuse { .. }));
}

#[test]
fn test_balance_fuse_supersede_and_remove() {
    let oracle = oracle();
    let rate = Rc::new(StaticExchangeRate::new(Wad::ONE));
    let replacement = addr(0xb11);
    let vault = builder(&oracle, &rate)
        .balance_fuse(PositionBalanceFuse::new(replacement, LENDING, 6, 6, oracle.clone()))
        .build();
    configure(&vault);

    assert_eq!(
        vault
            .set_market_balance_fuse(OWNER, LENDING, replacement)
            .unwrap(),
        Some(LENDING_BALANCE)
    );
    assert_eq!(vault.balance_fuse_of(LENDING).unwrap(), Some(replacement));

    // removing a fuse that is not current is a no-op
    assert!(!vault
        .remove_market_balance_fuse(OWNER, LENDING, LENDING_BALANCE)
        .unwrap());
    assert_eq!(vault.balance_fuse_of(LENDING).unwrap(), Some(replacement));

    assert!(vault
        .remove_market_balance_fuse(OWNER, LENDING, replacement)
        .unwrap());
    assert_eq!(vault.balance_fuse_of(LENDING).unwrap(), None);
}

#[test]
fn test_balance_fuse_removal_guarded_by_dust() {
    let f = funded(1_000);
    f.vault
        .execute(OWNER, &[supply(LENDING_FUSE, POOL_A, 100)])
        .unwrap();

    let err = f
        .vault
        .remove_market_balance_fuse(OWNER, LENDING, LENDING_BALANCE)
        .unwrap_err();
    assert!(matches!(
        err,
        VaultError::Configuration(ConfigurationError::BalanceFuseNotEmpty { .. })
    ));

    f.vault
        .execute(OWNER, &[redeem(LENDING_FUSE, POOL_A, 100)])
        .unwrap();
    assert!(f
        .vault
        .remove_market_balance_fuse(OWNER, LENDING, LENDING_BALANCE)
        .unwrap());
    assert_eq!(f.vault.cached_balance(LENDING).unwrap(), Wad::ZERO);
}
