//! Adapter traits and the context they run in
//!
//! A [`Fuse`] moves the vault's assets into or out of one external market. A
//! [`BalanceFuse`] values the vault's position in one market. A [`Hook`] runs
//! before or after a protected entry point. All three are trait objects held
//! by the vault's catalog and dispatched by address.
//!
//! Fuses and hooks receive a [`FuseContext`], which scopes them to their
//! market: substrate allowances are enforced there, not in each adapter.

use crate::access::VaultOperation;
use crate::error::FuseError;
use crate::ledger::PositionLedger;
use crate::state::VaultState;
use crate::vault::Vault;
use codec::HookKind;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use types::{Address, MarketId, Wad};

/// Strategy adapter for one market
pub trait Fuse {
    fn address(&self) -> Address;

    fn market_id(&self) -> MarketId;

    fn enter(&self, ctx: &mut FuseContext<'_>, payload: &[u8]) -> Result<(), FuseError>;

    fn exit(&self, ctx: &mut FuseContext<'_>, payload: &[u8]) -> Result<(), FuseError>;

    /// Return up to `amount` native units to idle; reports the amount freed
    fn instant_withdraw(
        &self,
        _ctx: &mut FuseContext<'_>,
        _amount: u128,
        _params: &[u8],
    ) -> Result<u128, FuseError> {
        Err(FuseError::InstantWithdrawUnsupported {
            fuse: self.address(),
        })
    }
}

/// Market valuation as reported by a balance fuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuseBalance {
    pub amount: u128,
    pub decimals: u8,
}

impl FuseBalance {
    pub fn new(amount: u128, decimals: u8) -> Self {
        Self { amount, decimals }
    }

    pub fn normalized(self) -> Result<Wad, FuseError> {
        Ok(Wad::from_units(self.amount, self.decimals)?)
    }
}

/// Values the vault's position in one market
pub trait BalanceFuse {
    fn address(&self) -> Address;

    fn market_id(&self) -> MarketId;

    fn balance_of(&self, view: &MarketView<'_>) -> Result<FuseBalance, FuseError>;
}

/// Which protected entry point a hook is wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectedOperation {
    Deposit,
    Withdraw,
    Mint,
    Redeem,
}

impl ProtectedOperation {
    pub fn vault_operation(self) -> VaultOperation {
        match self {
            Self::Deposit => VaultOperation::Deposit,
            Self::Withdraw => VaultOperation::Withdraw,
            Self::Mint => VaultOperation::Mint,
            Self::Redeem => VaultOperation::Redeem,
        }
    }
}

/// Call a hook is asked to inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookInvocation {
    pub kind: HookKind,
    pub operation: ProtectedOperation,
    pub caller: Address,
    pub amount: u128,
    pub market: MarketId,
}

/// Runs before or after a protected entry point; an error aborts the call
pub trait Hook {
    fn address(&self) -> Address;

    fn run(&self, invocation: &HookInvocation, ctx: &mut FuseContext<'_>) -> Result<(), FuseError>;
}

/// External price feed used by balance fuses
pub trait PriceOracle {
    /// Price of one native unit of `instrument` as (amount, decimals)
    fn price_of(&self, instrument: &Address) -> Result<(u128, u8), FuseError>;
}

/// Current exchange rate checked by the validator
pub trait ExchangeRateSource {
    fn current_exchange_rate(&self) -> Result<Wad, FuseError>;
}

impl<T: Hook + ?Sized> Hook for Rc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn run(&self, invocation: &HookInvocation, ctx: &mut FuseContext<'_>) -> Result<(), FuseError> {
        (**self).run(invocation, ctx)
    }
}

impl<T: PriceOracle + ?Sized> PriceOracle for Rc<T> {
    fn price_of(&self, instrument: &Address) -> Result<(u128, u8), FuseError> {
        (**self).price_of(instrument)
    }
}

impl<T: ExchangeRateSource + ?Sized> ExchangeRateSource for Rc<T> {
    fn current_exchange_rate(&self) -> Result<Wad, FuseError> {
        (**self).current_exchange_rate()
    }
}

/// Mutable view of the vault handed to a fuse or hook
pub struct FuseContext<'a> {
    vault: &'a Vault,
    state: &'a mut VaultState,
    market: MarketId,
    adapter: Address,
}

impl<'a> FuseContext<'a> {
    pub(crate) fn new(
        vault: &'a Vault,
        state: &'a mut VaultState,
        market: MarketId,
        adapter: Address,
    ) -> Self {
        Self {
            vault,
            state,
            market,
            adapter,
        }
    }

    pub fn market_id(&self) -> MarketId {
        self.market
    }

    /// Address of the fuse or hook being run
    pub fn adapter(&self) -> Address {
        self.adapter
    }

    /// The vault itself; every entry point rejects calls made through it
    pub fn vault(&self) -> &Vault {
        self.vault
    }

    pub fn is_substrate_granted(&self, substrate: &Address) -> bool {
        self.state
            .registry
            .is_substrate_granted(self.market, substrate)
    }

    pub fn require_substrate(&self, substrate: &Address) -> Result<(), FuseError> {
        if self.is_substrate_granted(substrate) {
            Ok(())
        } else {
            Err(FuseError::SubstrateNotGranted {
                market: self.market,
                substrate: *substrate,
            })
        }
    }

    pub fn substrates(&self) -> &[Address] {
        self.state.registry.substrates_of(self.market)
    }

    pub fn idle(&self) -> u128 {
        self.state.ledger.idle()
    }

    pub fn position(&self, substrate: &Address) -> u128 {
        self.state.ledger.position(self.market, substrate)
    }

    /// Move `amount` from idle into a position on a granted substrate
    pub fn supply(&mut self, substrate: Address, amount: u128) -> Result<(), FuseError> {
        self.require_substrate(&substrate)?;
        self.state.ledger.debit_idle(amount)?;
        self.state
            .ledger
            .increase_position(self.market, substrate, amount)
    }

    /// Move `amount` from a position on a granted substrate back to idle
    pub fn redeem(&mut self, substrate: Address, amount: u128) -> Result<(), FuseError> {
        self.require_substrate(&substrate)?;
        self.state
            .ledger
            .decrease_position(self.market, substrate, amount)?;
        self.state.ledger.credit_idle(amount)
    }
}

/// Read-only view of one market handed to a balance fuse
pub struct MarketView<'a> {
    market: MarketId,
    substrates: &'a [Address],
    ledger: &'a PositionLedger,
}

impl<'a> MarketView<'a> {
    pub fn new(market: MarketId, substrates: &'a [Address], ledger: &'a PositionLedger) -> Self {
        Self {
            market,
            substrates,
            ledger,
        }
    }

    pub fn market_id(&self) -> MarketId {
        self.market
    }

    pub fn substrates(&self) -> &'a [Address] {
        self.substrates
    }

    pub fn position(&self, substrate: &Address) -> u128 {
        self.ledger.position(self.market, substrate)
    }
}
