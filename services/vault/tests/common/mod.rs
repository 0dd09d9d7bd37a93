//! Shared fixture for vault integration tests
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use types::{Address, MarketId, Wad};
use vault_engine::fuses::{PositionBalanceFuse, StaticExchangeRate, StaticPriceOracle, SupplyFuse};
use vault_engine::{
    EngineSettings, Fuse, FuseAction, FuseContext, FuseError, Hook, HookInvocation,
    RoleAccessControl, Vault, VaultBuilder,
};

pub const OWNER: Address = addr(0xaa);
pub const STRANGER: Address = addr(0xee);

pub const LENDING: MarketId = MarketId::new(1);
pub const YIELD: MarketId = MarketId::new(2);
pub const FLOAT: MarketId = MarketId::new(3);

pub const LENDING_FUSE: Address = addr(0xf01);
pub const YIELD_FUSE: Address = addr(0xf02);
pub const LENDING_BALANCE: Address = addr(0xb01);
pub const YIELD_BALANCE: Address = addr(0xb02);
pub const FLOAT_BALANCE: Address = addr(0xb03);

pub const POOL_A: Address = addr(0x501);
pub const POOL_B: Address = addr(0x502);
pub const VAULT_Y: Address = addr(0x601);

pub const fn addr(low: u64) -> Address {
    let b = low.to_be_bytes();
    Address::new([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ])
}

pub fn wad(value: &str) -> Wad {
    Wad::from_decimal_str(value).unwrap()
}

/// Two supply markets at par plus an empty float market
pub struct Fixture {
    pub vault: Vault,
    pub oracle: Rc<StaticPriceOracle>,
    pub rate: Rc<StaticExchangeRate>,
}

pub fn builder(oracle: &Rc<StaticPriceOracle>, rate: &Rc<StaticExchangeRate>) -> VaultBuilder {
    Vault::builder(RoleAccessControl::new(OWNER))
        .settings(EngineSettings::default())
        .fuse(SupplyFuse::new(LENDING_FUSE, LENDING))
        .fuse(SupplyFuse::new(YIELD_FUSE, YIELD))
        .balance_fuse(PositionBalanceFuse::new(LENDING_BALANCE, LENDING, 6, 6, oracle.clone()))
        .balance_fuse(PositionBalanceFuse::new(YIELD_BALANCE, YIELD, 6, 18, oracle.clone()))
        .balance_fuse(PositionBalanceFuse::new(FLOAT_BALANCE, FLOAT, 6, 6, oracle.clone()))
        .exchange_rate_source(rate.clone())
}

pub fn oracle() -> Rc<StaticPriceOracle> {
    Rc::new(
        StaticPriceOracle::new()
            .with_price(POOL_A, Wad::ONE)
            .with_price(POOL_B, Wad::ONE)
            .with_price(VAULT_Y, Wad::ONE),
    )
}

/// Registers and wires both markets
pub fn configure(vault: &Vault) {
    vault.add_fuses(OWNER, &[LENDING_FUSE, YIELD_FUSE]).unwrap();
    vault
        .grant_market_substrates(OWNER, LENDING, vec![POOL_A, POOL_B])
        .unwrap();
    vault.grant_substrate(OWNER, YIELD, VAULT_Y).unwrap();
    vault
        .set_market_balance_fuse(OWNER, LENDING, LENDING_BALANCE)
        .unwrap();
    vault.set_market_balance_fuse(OWNER, YIELD, YIELD_BALANCE).unwrap();
    vault.set_market_balance_fuse(OWNER, FLOAT, FLOAT_BALANCE).unwrap();
}

pub fn fixture() -> Fixture {
    let oracle = oracle();
    let rate = Rc::new(StaticExchangeRate::new(Wad::ONE));
    let vault = builder(&oracle, &rate).build();
    configure(&vault);
    vault.drain_events();
    Fixture {
        vault,
        oracle,
        rate,
    }
}

/// Fixture with `idle` native units deposited
pub fn funded(idle: u128) -> Fixture {
    let fixture = fixture();
    fixture.vault.deposit(OWNER, idle).unwrap();
    fixture.vault.drain_events();
    fixture
}

pub fn supply(fuse: Address, substrate: Address, amount: u128) -> FuseAction {
    FuseAction::enter(fuse, SupplyFuse::payload(substrate, amount).unwrap())
}

pub fn redeem(fuse: Address, substrate: Address, amount: u128) -> FuseAction {
    FuseAction::exit(fuse, SupplyFuse::payload(substrate, amount).unwrap())
}

/// Fuse that spends idle assets and then fails
pub struct FailingFuse {
    pub address: Address,
    pub market: MarketId,
}

impl Fuse for FailingFuse {
    fn address(&self) -> Address {
        self.address
    }

    fn market_id(&self) -> MarketId {
        self.market
    }

    fn enter(&self, ctx: &mut FuseContext<'_>, _payload: &[u8]) -> Result<(), FuseError> {
        if let Some(substrate) = ctx.substrates().first().copied() {
            ctx.supply(substrate, 1)?;
        }
        Err(FuseError::Rejected("market paused".into()))
    }

    fn exit(&self, _ctx: &mut FuseContext<'_>, _payload: &[u8]) -> Result<(), FuseError> {
        Err(FuseError::Rejected("market paused".into()))
    }

    fn instant_withdraw(
        &self,
        ctx: &mut FuseContext<'_>,
        amount: u128,
        _params: &[u8],
    ) -> Result<u128, FuseError> {
        if let Some(substrate) = ctx.substrates().first().copied() {
            let take = ctx.position(&substrate).min(amount);
            ctx.redeem(substrate, take)?;
        }
        Err(FuseError::Rejected("withdrawal queue full".into()))
    }
}

/// Hook recording its runs into a shared log
pub struct RecordingHook {
    pub address: Address,
    pub log: Rc<std::cell::RefCell<Vec<Address>>>,
    pub fail: Cell<bool>,
}

impl RecordingHook {
    pub fn new(address: Address, log: &Rc<std::cell::RefCell<Vec<Address>>>) -> Self {
        Self {
            address,
            log: log.clone(),
            fail: Cell::new(false),
        }
    }
}

impl Hook for RecordingHook {
    fn address(&self) -> Address {
        self.address
    }

    fn run(&self, _invocation: &HookInvocation, _ctx: &mut FuseContext<'_>) -> Result<(), FuseError> {
        self.log.borrow_mut().push(self.address);
        if self.fail.get() {
            return Err(FuseError::Rejected("hook veto".into()));
        }
        Ok(())
    }
}
