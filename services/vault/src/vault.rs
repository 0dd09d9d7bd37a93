//! # Vault
//!
//! Entry points of the engine. A [`Vault`] owns its [`VaultState`] and runs
//! every mutating call as a transaction:
//!
//! ```text
//! enter phase ──→ authorize ──→ checkpoint ──→ run ──┬─ Ok  ──→ commit staged events
//!  (re-entry                      (clone)            └─ Err ──→ restore checkpoint
//!   rejected)
//! ```
//!
//! The vault is single-threaded (`RefCell`/`Cell`, not `Sync`). A host that
//! shares it across threads wraps it in its own lock.

use crate::access::{AccessControl, VaultOperation};
use crate::balance::{self, BalanceUpdate};
use crate::catalog::Catalog;
use crate::error::{ConfigurationError, VaultError, VaultResult};
use crate::events::VaultEvent;
use crate::execution::{self, BatchReport, FuseAction};
use crate::fuse::{
    BalanceFuse, ExchangeRateSource, Fuse, FuseContext, Hook, HookInvocation, ProtectedOperation,
};
use crate::guard::{ensure_idle, Phase, PhaseGuard};
use crate::hooks;
use crate::state::VaultState;
use crate::withdraw::{self, WithdrawCandidate, WithdrawalOutcome};
use codec::{parse_configs, HookEntry, HookKind, PackedSlot, ParsedConfigs, ValidatorEntry};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, warn};
use types::{Address, FixedPointError, MarketId, Wad};
use vault_config::EngineConfig;

/// Engine knobs fixed at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Native decimals of the vault asset
    pub asset_decimals: u8,
    /// Market whose configuration drives protected entry points
    pub hooks_market: MarketId,
    /// Largest cached balance allowing balance fuse removal
    pub balance_fuse_dust: Wad,
    pub reject_dependency_cycles: bool,
    pub max_batch_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            asset_decimals: vault_config::defaults::engine::ASSET_DECIMALS,
            hooks_market: MarketId::new(vault_config::defaults::engine::HOOKS_MARKET_ID),
            balance_fuse_dust: Wad::from_raw(Wad::SCALE / 1_000_000),
            reject_dependency_cycles: vault_config::defaults::engine::REJECT_DEPENDENCY_CYCLES,
            max_batch_size: vault_config::defaults::engine::MAX_BATCH_SIZE,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        Ok(Self {
            asset_decimals: config.asset_decimals,
            hooks_market: config.hooks_market(),
            balance_fuse_dust: config.dust()?,
            reject_dependency_cycles: config.reject_dependency_cycles,
            max_batch_size: config.max_batch_size,
        })
    }
}

/// Assembles a [`Vault`] and its implementation catalog
pub struct VaultBuilder {
    access: Box<dyn AccessControl>,
    catalog: Catalog,
    exchange_rate: Option<Box<dyn ExchangeRateSource>>,
    settings: EngineSettings,
    state: VaultState,
}

impl VaultBuilder {
    pub fn new(access: impl AccessControl + 'static) -> Self {
        Self {
            access: Box::new(access),
            catalog: Catalog::new(),
            exchange_rate: None,
            settings: EngineSettings::default(),
            state: VaultState::new(),
        }
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn fuse(mut self, fuse: impl Fuse + 'static) -> Self {
        self.catalog.register_fuse(Rc::new(fuse));
        self
    }

    pub fn balance_fuse(mut self, fuse: impl BalanceFuse + 'static) -> Self {
        self.catalog.register_balance_fuse(Rc::new(fuse));
        self
    }

    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.catalog.register_hook(Rc::new(hook));
        self
    }

    pub fn exchange_rate_source(mut self, source: impl ExchangeRateSource + 'static) -> Self {
        self.exchange_rate = Some(Box::new(source));
        self
    }

    /// Start from existing state instead of an empty vault
    pub fn state(mut self, state: VaultState) -> Self {
        self.state = state;
        self
    }

    pub fn build(self) -> Vault {
        info!(
            implementations = self.catalog.len(),
            hooks_market = %self.settings.hooks_market,
            "vault built"
        );
        Vault {
            state: RefCell::new(self.state),
            phase: Cell::new(Phase::Idle),
            journal: RefCell::new(Vec::new()),
            catalog: self.catalog,
            access: self.access,
            exchange_rate: self.exchange_rate,
            settings: self.settings,
        }
    }
}

pub struct Vault {
    state: RefCell<VaultState>,
    phase: Cell<Phase>,
    journal: RefCell<Vec<VaultEvent>>,
    catalog: Catalog,
    access: Box<dyn AccessControl>,
    exchange_rate: Option<Box<dyn ExchangeRateSource>>,
    settings: EngineSettings,
}

impl Vault {
    pub fn builder(access: impl AccessControl + 'static) -> VaultBuilder {
        VaultBuilder::new(access)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub(crate) fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(crate) fn exchange_rate_source(&self) -> Option<&dyn ExchangeRateSource> {
        self.exchange_rate.as_deref()
    }

    // TRANSACTION PLUMBING

    fn authorize(&self, caller: &Address, operation: VaultOperation) -> VaultResult<()> {
        if self.access.authorize(caller, operation) {
            Ok(())
        } else {
            warn!(caller = %caller, %operation, "unauthorized vault call");
            Err(VaultError::Unauthorized {
                caller: *caller,
                operation,
            })
        }
    }

    fn transact<T>(
        &self,
        phase: Phase,
        caller: &Address,
        operation: VaultOperation,
        body: impl FnOnce(&PhaseGuard<'_>, &mut VaultState) -> VaultResult<T>,
    ) -> VaultResult<T> {
        let guard = PhaseGuard::enter(&self.phase, phase)?;
        self.authorize(caller, operation)?;

        let mut state = self
            .state
            .try_borrow_mut()
            .map_err(|_| VaultError::Reentrancy { phase })?;
        let checkpoint = state.clone();

        match body(&guard, &mut state) {
            Ok(value) => {
                let events = state.take_pending();
                drop(state);
                self.commit(events);
                Ok(value)
            }
            Err(err) => {
                *state = checkpoint;
                debug!(%operation, error = %err, "operation rolled back");
                Err(err)
            }
        }
    }

    fn read<T>(&self, view: impl FnOnce(&VaultState) -> T) -> VaultResult<T> {
        ensure_idle(&self.phase)?;
        let state = self.state.try_borrow().map_err(|_| VaultError::Reentrancy {
            phase: self.phase.get(),
        })?;
        Ok(view(&state))
    }

    fn commit(&self, events: Vec<VaultEvent>) {
        for event in &events {
            info!(event = %event, "vault event");
        }
        self.journal.borrow_mut().extend(events);
    }

    /// Committed events since the last drain
    pub fn drain_events(&self) -> Vec<VaultEvent> {
        std::mem::take(&mut *self.journal.borrow_mut())
    }

    /// Copy of the current state
    pub fn state(&self) -> VaultResult<VaultState> {
        self.read(VaultState::clone)
    }

    // ADAPTER REGISTRY

    /// Add fuses to the supported set; returns how many were new
    pub fn add_fuses(&self, caller: Address, fuses: &[Address]) -> VaultResult<usize> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureFuses,
            |_, state| {
                let mut added = 0;
                for fuse in fuses {
                    if !state.registry.add_fuse(*fuse) {
                        continue;
                    }
                    if self.catalog.fuse(fuse).is_none() {
                        warn!(fuse = %fuse, "supported fuse has no implementation in catalog");
                    }
                    state.emit(VaultEvent::FuseAdded { fuse: *fuse });
                    added += 1;
                }
                Ok(added)
            },
        )
    }

    pub fn add_fuse(&self, caller: Address, fuse: Address) -> VaultResult<bool> {
        Ok(self.add_fuses(caller, &[fuse])? == 1)
    }

    /// Remove fuses from the supported set; returns how many were present
    pub fn remove_fuses(&self, caller: Address, fuses: &[Address]) -> VaultResult<usize> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureFuses,
            |_, state| {
                let mut removed = 0;
                for fuse in fuses {
                    if state.registry.remove_fuse(fuse) {
                        state.emit(VaultEvent::FuseRemoved { fuse: *fuse });
                        removed += 1;
                    }
                }
                Ok(removed)
            },
        )
    }

    pub fn remove_fuse(&self, caller: Address, fuse: Address) -> VaultResult<bool> {
        Ok(self.remove_fuses(caller, &[fuse])? == 1)
    }

    pub fn is_supported(&self, fuse: &Address) -> VaultResult<bool> {
        self.read(|state| state.registry.is_supported(fuse))
    }

    pub fn supported_fuses(&self) -> VaultResult<Vec<Address>> {
        self.read(|state| state.registry.fuses().to_vec())
    }

    /// Install a market's balance fuse, returning the one it supersedes
    pub fn set_market_balance_fuse(
        &self,
        caller: Address,
        market: MarketId,
        fuse: Address,
    ) -> VaultResult<Option<Address>> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureBalanceFuses,
            |_, state| {
                let implementation = self
                    .catalog
                    .balance_fuse(&fuse)
                    .ok_or(VaultError::UnsupportedFuse { fuse })?;
                let declared = implementation.market_id();
                if declared != market {
                    return Err(ConfigurationError::FuseMarketMismatch {
                        fuse,
                        declared,
                        market,
                    }
                    .into());
                }

                let previous = state.registry.set_market_balance_fuse(market, fuse);
                state.emit(VaultEvent::BalanceFuseSet {
                    market,
                    fuse,
                    previous,
                });
                Ok(previous)
            },
        )
    }

    /// Remove a market's balance fuse; no-op unless `fuse` is the current one
    pub fn remove_market_balance_fuse(
        &self,
        caller: Address,
        market: MarketId,
        fuse: Address,
    ) -> VaultResult<bool> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureBalanceFuses,
            |_, state| {
                if state.registry.balance_fuse_of(market) != Some(fuse) {
                    debug!(market = %market, fuse = %fuse, "not the current balance fuse, nothing removed");
                    return Ok(false);
                }

                let balance = state.cached_balance(market);
                if balance > self.settings.balance_fuse_dust {
                    return Err(ConfigurationError::BalanceFuseNotEmpty {
                        market,
                        fuse,
                        balance,
                        dust: self.settings.balance_fuse_dust,
                    }
                    .into());
                }

                state.registry.remove_market_balance_fuse(market, &fuse);
                state.balances.remove(&market);
                state.emit(VaultEvent::BalanceFuseRemoved { market, fuse });
                Ok(true)
            },
        )
    }

    pub fn balance_fuse_of(&self, market: MarketId) -> VaultResult<Option<Address>> {
        self.read(|state| state.registry.balance_fuse_of(market))
    }

    pub fn grant_substrate(
        &self,
        caller: Address,
        market: MarketId,
        substrate: Address,
    ) -> VaultResult<bool> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureSubstrates,
            |_, state| {
                let granted = state.registry.grant_substrate(market, substrate);
                if granted {
                    state.emit(VaultEvent::SubstrateGranted { market, substrate });
                }
                Ok(granted)
            },
        )
    }

    pub fn revoke_substrate(
        &self,
        caller: Address,
        market: MarketId,
        substrate: Address,
    ) -> VaultResult<bool> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureSubstrates,
            |_, state| {
                let revoked = state.registry.revoke_substrate(market, &substrate);
                if revoked {
                    state.emit(VaultEvent::SubstrateRevoked { market, substrate });
                }
                Ok(revoked)
            },
        )
    }

    /// Replace a market's whole substrate set
    pub fn grant_market_substrates(
        &self,
        caller: Address,
        market: MarketId,
        substrates: Vec<Address>,
    ) -> VaultResult<()> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureSubstrates,
            |_, state| {
                state
                    .registry
                    .grant_market_substrates(market, substrates.iter().copied());
                state.emit(VaultEvent::MarketSubstratesReplaced {
                    market,
                    substrates: state.registry.substrates_of(market).to_vec(),
                });
                Ok(())
            },
        )
    }

    pub fn substrates_of(&self, market: MarketId) -> VaultResult<Vec<Address>> {
        self.read(|state| state.registry.substrates_of(market).to_vec())
    }

    pub fn is_substrate_granted(&self, market: MarketId, substrate: &Address) -> VaultResult<bool> {
        self.read(|state| state.registry.is_substrate_granted(market, substrate))
    }

    /// Set the markets refreshed whenever `market` is
    pub fn update_dependency_graph(
        &self,
        caller: Address,
        market: MarketId,
        dependencies: Vec<MarketId>,
    ) -> VaultResult<()> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureDependencies,
            |_, state| {
                let mut unique = Vec::with_capacity(dependencies.len());
                for dependency in dependencies {
                    if !unique.contains(&dependency) {
                        unique.push(dependency);
                    }
                }

                if balance::creates_cycle(&state.dependencies, market, &unique) {
                    if self.settings.reject_dependency_cycles {
                        return Err(ConfigurationError::DependencyCycle { market }.into());
                    }
                    warn!(market = %market, "dependency graph now contains a cycle");
                }

                if unique.is_empty() {
                    state.dependencies.remove(&market);
                } else {
                    state.dependencies.insert(market, unique.clone());
                }
                state.emit(VaultEvent::DependencyGraphUpdated {
                    market,
                    dependencies: unique,
                });
                Ok(())
            },
        )
    }

    pub fn dependencies_of(&self, market: MarketId) -> VaultResult<Vec<MarketId>> {
        self.read(|state| state.dependencies_of(market).to_vec())
    }

    // BALANCES

    /// Live sum of market balances, 18 decimals
    pub fn total_balance(&self) -> VaultResult<Wad> {
        self.read(|state| balance::live_total(&self.catalog, state))?
    }

    /// Idle assets plus [`Vault::total_balance`], 18 decimals
    pub fn total_assets(&self) -> VaultResult<Wad> {
        self.read(|state| -> VaultResult<Wad> {
            let idle = Wad::from_units(state.ledger.idle(), self.settings.asset_decimals)?;
            let markets = balance::live_total(&self.catalog, state)?;
            idle.checked_add(markets)
                .ok_or_else(|| FixedPointError::overflow("total_assets").into())
        })?
    }

    /// Idle assets in native units
    pub fn idle_assets(&self) -> VaultResult<u128> {
        self.read(|state| state.ledger.idle())
    }

    pub fn cached_balance(&self, market: MarketId) -> VaultResult<Wad> {
        self.read(|state| state.cached_balance(market))
    }

    /// Re-measure markets and everything that depends on them
    pub fn refresh_balances(
        &self,
        caller: Address,
        markets: &[MarketId],
    ) -> VaultResult<Vec<BalanceUpdate>> {
        self.transact(
            Phase::Refreshing,
            &caller,
            VaultOperation::RefreshBalances,
            |_, state| balance::refresh_markets(&self.catalog, state, markets),
        )
    }

    // BATCH EXECUTION

    /// Run fuse calls in order; all take effect or none do
    pub fn execute(&self, caller: Address, actions: &[FuseAction]) -> VaultResult<BatchReport> {
        self.transact(
            Phase::Executing,
            &caller,
            VaultOperation::Execute,
            |_, state| {
                if actions.len() > self.settings.max_batch_size {
                    return Err(ConfigurationError::BatchTooLarge {
                        len: actions.len(),
                        max: self.settings.max_batch_size,
                    }
                    .into());
                }
                execution::run_batch(self, state, caller, actions)
            },
        )
    }

    // HOOK CONFIGURATION

    pub fn add_hook(
        &self,
        caller: Address,
        market: MarketId,
        kind: HookKind,
        entry: HookEntry,
    ) -> VaultResult<()> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureHooks,
            |_, state| hooks::insert_hook(state, market, kind, entry),
        )
    }

    /// Remove the hook at `index`; returns its target if one was there
    pub fn remove_hook(
        &self,
        caller: Address,
        market: MarketId,
        kind: HookKind,
        index: u8,
    ) -> VaultResult<Option<Address>> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureHooks,
            |_, state| hooks::remove_hook(state, market, kind, index),
        )
    }

    pub fn set_validator(
        &self,
        caller: Address,
        market: MarketId,
        validator: ValidatorEntry,
    ) -> VaultResult<()> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureHooks,
            |_, state| hooks::write_validator(state, market, validator),
        )
    }

    pub fn remove_validator(&self, caller: Address, market: MarketId) -> VaultResult<bool> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureHooks,
            |_, state| hooks::remove_validator(state, market),
        )
    }

    /// Replace a market's packed configuration array wholesale
    pub fn load_market_configs(
        &self,
        caller: Address,
        market: MarketId,
        slots: Vec<PackedSlot>,
    ) -> VaultResult<()> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureHooks,
            |_, state| {
                parse_configs(&slots)?;
                let count = slots.len();
                if slots.is_empty() {
                    state.configs.remove(&market);
                } else {
                    state.configs.insert(market, slots);
                }
                state.emit(VaultEvent::MarketConfigsLoaded {
                    market,
                    slots: count,
                });
                Ok(())
            },
        )
    }

    pub fn get_hook_config(&self, market: MarketId) -> VaultResult<ParsedConfigs> {
        self.read(|state| parse_configs(state.config_slots(market)))?
            .map_err(VaultError::from)
    }

    pub fn get_validator_state(&self, market: MarketId) -> VaultResult<Option<ValidatorEntry>> {
        Ok(self.get_hook_config(market)?.validator)
    }

    pub fn market_config_slots(&self, market: MarketId) -> VaultResult<Vec<PackedSlot>> {
        self.read(|state| state.config_slots(market).to_vec())
    }

    // PROTECTED ENTRY POINTS

    fn protected<T>(
        &self,
        caller: Address,
        operation: ProtectedOperation,
        amount: u128,
        body: impl FnOnce(&Vault, &mut VaultState, MarketId) -> VaultResult<T>,
    ) -> VaultResult<T> {
        self.transact(
            Phase::RunningPreHooks,
            &caller,
            operation.vault_operation(),
            |guard, state| {
                let market = self.settings.hooks_market;
                let parsed = parse_configs(state.config_slots(market))?;
                let invocation = |kind| HookInvocation {
                    kind,
                    operation,
                    caller,
                    amount,
                    market,
                };

                hooks::run_hooks(self, state, &parsed, invocation(HookKind::Pre))?;

                guard.advance(Phase::Validating);
                hooks::validate_exchange_rate(self, state, market, &parsed)?;

                guard.advance(Phase::RunningProtectedCall);
                let value = body(self, state, market)?;

                guard.advance(Phase::RunningPostHooks);
                hooks::run_hooks(self, state, &parsed, invocation(HookKind::Post))?;

                state.emit(VaultEvent::ProtectedCallCompleted {
                    caller,
                    operation: operation.vault_operation(),
                    amount,
                });
                Ok(value)
            },
        )
    }

    /// Run `body` inside the hook pipeline of the hooks market
    pub fn run_protected<T>(
        &self,
        caller: Address,
        operation: ProtectedOperation,
        amount: u128,
        body: impl FnOnce(&mut FuseContext<'_>) -> VaultResult<T>,
    ) -> VaultResult<T> {
        self.protected(caller, operation, amount, |vault, state, market| {
            let mut ctx = FuseContext::new(vault, state, market, caller);
            body(&mut ctx)
        })
    }

    /// Credit `amount` native units to idle under the hook pipeline
    pub fn deposit(&self, caller: Address, amount: u128) -> VaultResult<()> {
        self.protected(caller, ProtectedOperation::Deposit, amount, |_, state, _| {
            state
                .ledger
                .credit_idle(amount)
                .map_err(|_| VaultError::from(FixedPointError::overflow("deposit")))
        })
    }

    /// Pay out `amount` native units under the hook pipeline
    ///
    /// An idle shortfall is covered through the configured instant-withdrawal
    /// route first; the routing outcome is returned when that happened.
    pub fn withdraw(
        &self,
        caller: Address,
        amount: u128,
    ) -> VaultResult<Option<WithdrawalOutcome>> {
        self.protected(caller, ProtectedOperation::Withdraw, amount, |vault, state, _| {
            let idle = state.ledger.idle();
            let routed = if idle < amount {
                let candidates = state.withdraw_candidates.clone();
                Some(route_and_refresh(vault, state, amount - idle, &candidates)?)
            } else {
                None
            };

            let available = state.ledger.idle();
            if available < amount {
                return Err(VaultError::InsufficientLiquidity {
                    requested: amount,
                    available,
                });
            }
            state
                .ledger
                .debit_idle(amount)
                .map_err(|_| VaultError::InsufficientLiquidity {
                    requested: amount,
                    available,
                })?;
            Ok(routed)
        })
    }

    // INSTANT WITHDRAWAL

    /// Free `amount` native units through `candidates`, accepting partial fills
    pub fn instant_withdraw(
        &self,
        caller: Address,
        amount: u128,
        candidates: &[WithdrawCandidate],
    ) -> VaultResult<WithdrawalOutcome> {
        self.transact(
            Phase::Withdrawing,
            &caller,
            VaultOperation::InstantWithdraw,
            |_, state| route_and_refresh(self, state, amount, candidates),
        )
    }

    /// Store the default route used by [`Vault::withdraw`]
    pub fn configure_instant_withdrawal(
        &self,
        caller: Address,
        candidates: Vec<WithdrawCandidate>,
    ) -> VaultResult<()> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::ConfigureInstantWithdrawal,
            |_, state| {
                for candidate in &candidates {
                    let implementation = self
                        .catalog
                        .fuse(&candidate.fuse)
                        .filter(|_| state.registry.is_supported(&candidate.fuse))
                        .ok_or(VaultError::UnsupportedFuse {
                            fuse: candidate.fuse,
                        })?;
                    let declared = implementation.market_id();
                    if let Some(market) = candidate.mismatch(declared) {
                        return Err(ConfigurationError::FuseMarketMismatch {
                            fuse: candidate.fuse,
                            declared,
                            market,
                        }
                        .into());
                    }
                }
                state.emit(VaultEvent::InstantWithdrawalConfigured {
                    fuses: candidates.iter().map(|c| c.fuse).collect(),
                });
                state.withdraw_candidates = candidates;
                Ok(())
            },
        )
    }

    pub fn instant_withdrawal_candidates(&self) -> VaultResult<Vec<WithdrawCandidate>> {
        self.read(|state| state.withdraw_candidates.clone())
    }

    // PERSISTENCE

    /// Serialize persistent state
    pub fn snapshot(&self) -> VaultResult<Vec<u8>> {
        self.read(|state| bincode::serialize(state))?
            .map_err(|e| VaultError::persistence(format!("snapshot encoding failed: {}", e)))
    }

    /// Replace the whole state with a snapshot
    pub fn restore(&self, caller: Address, snapshot: &[u8]) -> VaultResult<()> {
        self.transact(
            Phase::Configuring,
            &caller,
            VaultOperation::Restore,
            |_, state| {
                let restored: VaultState = bincode::deserialize(snapshot).map_err(|e| {
                    VaultError::persistence(format!("snapshot decoding failed: {}", e))
                })?;

                if !restored.registry.is_consistent() {
                    return Err(VaultError::persistence(
                        "snapshot registry tracking is inconsistent",
                    ));
                }
                for slots in restored.configs.values() {
                    parse_configs(slots)?;
                }

                let markets = restored.known_markets().len();
                let pending = state.take_pending();
                *state = restored;
                state.pending = pending;
                state.emit(VaultEvent::StateRestored { markets });
                Ok(())
            },
        )
    }
}

fn route_and_refresh(
    vault: &Vault,
    state: &mut VaultState,
    amount: u128,
    candidates: &[WithdrawCandidate],
) -> VaultResult<WithdrawalOutcome> {
    let outcome = withdraw::route(vault, state, amount, candidates);
    balance::refresh_markets(vault.catalog(), state, &outcome.filled_markets())?;

    if !outcome.is_complete() {
        info!(
            requested = outcome.requested,
            withdrawn = outcome.withdrawn,
            "instant withdrawal partially filled"
        );
    }
    state.emit(VaultEvent::InstantWithdrawal {
        requested: outcome.requested,
        withdrawn: outcome.withdrawn,
    });
    Ok(outcome)
}
