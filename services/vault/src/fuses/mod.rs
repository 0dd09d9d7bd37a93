//! Reference adapters
//!
//! Fuses and oracles that operate on the vault's own position ledger. They back
//! the `vault-engine` binary and the tests, and show the shape a protocol
//! adapter takes.

pub mod balance;
pub mod oracle;
pub mod supply;

pub use balance::PositionBalanceFuse;
pub use oracle::{StaticExchangeRate, StaticPriceOracle};
pub use supply::{SupplyData, SupplyFuse};
