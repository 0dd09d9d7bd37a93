//! Vault error taxonomy
//!
//! [`VaultError`] is what every public entry point returns. Adapter-side
//! failures are reported by fuses and hooks as [`FuseError`] and wrapped with
//! the adapter's address on the way out. Configuration problems, including
//! every codec failure, are grouped under [`ConfigurationError`].
//!
//! A failing entry point never leaves partial effects behind: the vault
//! restores its pre-operation state before returning the error.

use crate::access::VaultOperation;
use crate::guard::Phase;
use codec::CodecError;
use thiserror::Error;
use types::{Address, FixedPointError, MarketId, Wad};

/// Invalid or inconsistent configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Packed record could not be decoded or the array layout is invalid
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Validator threshold {threshold} on {market} exceeds 1.0")]
    ThresholdTooHigh { market: MarketId, threshold: Wad },

    #[error("Fuse {fuse} is declared for {declared}, not {market}")]
    FuseMarketMismatch {
        fuse: Address,
        declared: MarketId,
        market: MarketId,
    },

    #[error("Dependency update for {market} would create a cycle")]
    DependencyCycle { market: MarketId },

    #[error("Balance fuse {fuse} on {market} still reports {balance} (dust limit {dust})")]
    BalanceFuseNotEmpty {
        market: MarketId,
        fuse: Address,
        balance: Wad,
        dust: Wad,
    },

    #[error("Batch of {len} operations exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("{market} has a validator but no exchange rate source is configured")]
    MissingExchangeRateSource { market: MarketId },
}

/// Failure reported by a fuse, balance fuse, hook, oracle or rate source
#[derive(Debug, Error)]
pub enum FuseError {
    #[error("Substrate {substrate} is not granted on {market}")]
    SubstrateNotGranted { market: MarketId, substrate: Address },

    #[error("Insufficient idle assets: requested {requested}, available {available}")]
    InsufficientIdle { requested: u128, available: u128 },

    #[error("Insufficient position in {substrate} on {market}: requested {requested}, available {available}")]
    InsufficientPosition {
        market: MarketId,
        substrate: Address,
        requested: u128,
        available: u128,
    },

    #[error("Invalid fuse payload: {0}")]
    InvalidPayload(#[from] bincode::Error),

    #[error("No price available for {instrument}")]
    PriceUnavailable { instrument: Address },

    #[error("Fuse {fuse} does not support instant withdrawal")]
    InstantWithdrawUnsupported { fuse: Address },

    #[error(transparent)]
    Arithmetic(#[from] FixedPointError),

    /// Call made back into the vault from inside an adapter
    #[error("Nested vault call failed: {0}")]
    NestedCall(Box<VaultError>),

    #[error("Rejected: {0}")]
    Rejected(String),
}

impl From<VaultError> for FuseError {
    fn from(err: VaultError) -> Self {
        Self::NestedCall(Box::new(err))
    }
}

/// Errors returned by vault entry points
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Caller {caller} is not authorized for {operation}")]
    Unauthorized {
        caller: Address,
        operation: VaultOperation,
    },

    #[error("Fuse {fuse} is not supported")]
    UnsupportedFuse { fuse: Address },

    #[error("Hook {hook} has no registered implementation")]
    UnknownHook { hook: Address },

    #[error("Exchange rate {current} on {market} outside {expected} ± {threshold}")]
    ExchangeRateOutOfRange {
        market: MarketId,
        expected: Wad,
        current: Wad,
        threshold: Wad,
    },

    #[error("Re-entrant vault call rejected while {phase}")]
    Reentrancy { phase: Phase },

    #[error("Fuse {fuse} failed: {source}")]
    Fuse {
        fuse: Address,
        #[source]
        source: FuseError,
    },

    #[error("Hook {hook} failed: {source}")]
    Hook {
        hook: Address,
        #[source]
        source: FuseError,
    },

    #[error("Balance fuse {fuse} on {market} failed: {source}")]
    BalanceFuse {
        market: MarketId,
        fuse: Address,
        #[source]
        source: FuseError,
    },

    #[error("Exchange rate source failed: {source}")]
    ExchangeRateSource {
        #[source]
        source: FuseError,
    },

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] FixedPointError),

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u128, available: u128 },

    #[error("Persistence error: {reason}")]
    Persistence { reason: String },
}

impl From<CodecError> for VaultError {
    fn from(err: CodecError) -> Self {
        Self::Configuration(ConfigurationError::Codec(err))
    }
}

impl VaultError {
    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::Persistence {
            reason: reason.into(),
        }
    }

    /// Codec failure, if this error wraps one
    pub fn as_codec_error(&self) -> Option<&CodecError> {
        match self {
            Self::Configuration(ConfigurationError::Codec(err)) => Some(err),
            _ => None,
        }
    }
}

/// Result type for vault operations
pub type VaultResult<T> = std::result::Result<T, VaultError>;
