//! # Vault Engine
//!
//! Multi-market capital allocation engine. A [`Vault`] holds idle assets and
//! routes them into external markets through pluggable [`Fuse`] adapters.
//!
//! ## Architecture
//!
//! ```text
//! execute(batch) ──→ AdapterRegistry ──→ Fuse::enter / exit ──→ PositionLedger
//!                                                                    │
//!                        refresh touched markets + dependents ←──────┘
//!                                      │
//!                          BalanceFuse::balance_of ──→ cached balances (18 dec)
//!
//! deposit / withdraw ──→ pre-hooks ──→ exchange-rate validator ──→ call ──→ post-hooks
//! ```
//!
//! - **Registry**: supported fuses, per-market balance fuses and substrate
//!   allowances, all O(1) swap-and-pop sets
//! - **Balances**: per-market values normalized to [`Wad`](types::Wad), refreshed
//!   breadth-first along the dependency graph
//! - **Batches**: all-or-nothing; the first failing call rolls back the batch
//! - **Hooks**: packed configuration records decoded by the `codec` crate
//! - **Instant withdrawal**: priority-ordered candidates, partial fills accepted
//!
//! Every mutating entry point is a transaction: it is authorized, guarded
//! against re-entry, and either commits all its effects and events or none.
//!
//! ## Usage
//!
//! ```rust
//! use vault_engine::fuses::SupplyFuse;
//! use vault_engine::{FuseAction, RoleAccessControl, Vault};
//! use types::{Address, MarketId};
//!
//! let owner = Address::from_low_u64(1);
//! let fuse = Address::from_low_u64(0xf1);
//! let pool = Address::from_low_u64(0x501);
//! let market = MarketId::new(1);
//!
//! let vault = Vault::builder(RoleAccessControl::new(owner))
//!     .fuse(SupplyFuse::new(fuse, market))
//!     .build();
//! vault.add_fuse(owner, fuse)?;
//! vault.grant_substrate(owner, market, pool)?;
//! vault.deposit(owner, 1_000)?;
//!
//! let payload = SupplyFuse::payload(pool, 400)?;
//! vault.execute(owner, &[FuseAction::enter(fuse, payload)])?;
//! assert_eq!(vault.idle_assets()?, 600);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod access;
pub mod balance;
pub mod bootstrap;
pub mod catalog;
pub mod error;
pub mod events;
pub mod execution;
pub mod fuse;
pub mod fuses;
pub mod guard;
pub mod hooks;
pub mod ledger;
pub mod registry;
pub mod state;
pub mod summary;
pub mod vault;
pub mod withdraw;

pub use access::{AccessControl, Role, RoleAccessControl, VaultOperation};
pub use balance::BalanceUpdate;
pub use bootstrap::build_from_config;
pub use error::{ConfigurationError, FuseError, VaultError, VaultResult};
pub use events::VaultEvent;
pub use execution::{BatchReport, FuseAction, FuseCall};
pub use fuse::{
    BalanceFuse, ExchangeRateSource, Fuse, FuseBalance, FuseContext, Hook, HookInvocation,
    MarketView, PriceOracle, ProtectedOperation,
};
pub use guard::Phase;
pub use hooks::{check_exchange_rate, RateBands, RateCheck, Recalibration};
pub use ledger::PositionLedger;
pub use registry::{AdapterRegistry, RegistrySlot};
pub use state::VaultState;
pub use summary::{MarketSummary, VaultSummary};
pub use vault::{EngineSettings, Vault, VaultBuilder};
pub use withdraw::{CandidateFill, FillStatus, WithdrawCandidate, WithdrawalOutcome};
