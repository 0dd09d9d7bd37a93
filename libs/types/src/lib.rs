//! # Vault Core Types
//!
//! Value types shared by every crate of the vault engine.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: All balances and rates are stored as scaled integers
//! - **One Canonical Scale**: Cross-market values are normalized to 18 decimals ([`Wad`])
//! - **Type Safety**: Market ids, addresses and fixed-point values are distinct types
//! - **Fixed Width**: [`Address`] is a 160-bit value with an explicit byte layout,
//!   usable inside packed configuration records
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Address, MarketId, Wad};
//!
//! let market = MarketId::new(1);
//! let usdc: Address = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".parse().unwrap();
//!
//! // 250.5 USDC (6 decimals) normalized to 18 decimals
//! let balance = Wad::from_units(250_500_000, 6).unwrap();
//! assert_eq!(balance, Wad::from_decimal_str("250.5").unwrap());
//! # let _ = (market, usdc);
//! ```
//!
//! ## Integration Points
//!
//! - **codec**: packs [`Address`] and [`Wad`] fields into 32-byte configuration slots
//! - **vault-engine**: registry keys, balance aggregation, exchange-rate validation
//! - **vault-config**: decimal strings from configuration files are parsed into [`Wad`]

pub mod common;

pub use common::errors::{AddressError, FixedPointError};
pub use common::fixed_point::{mul_div, SignedDelta, Wad, WAD_DECIMALS};
pub use common::identifiers::{Address, MarketId};
