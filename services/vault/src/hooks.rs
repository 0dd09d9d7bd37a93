//! # Hook Pipeline and Exchange-Rate Validator
//!
//! Protected entry points (deposit, withdraw, mint, redeem) run inside a fixed
//! pipeline driven by the hooks market's packed configuration:
//!
//! ```text
//! Idle → RunningPreHooks → Validating → RunningProtectedCall → RunningPostHooks → Idle
//!          index 0,1,..      rate check     the operation         index 0,1,..
//!          stop at gap                                            stop at gap
//! ```
//!
//! ## Validator Hysteresis
//!
//! With expected rate `e` and threshold `t` the validator keeps two inclusive
//! bands around `e`:
//!
//! ```text
//!  e(1-t)     e(1-t/2)        e        e(1+t/2)     e(1+t)
//!    ├───────────┼─────────────┼─────────────┼───────────┤
//!    │ recalib.  │         unchanged         │ recalib.  │   outside: error
//! ```
//!
//! Inside the half band nothing happens. Between the half and full band the
//! stored rate is rewritten in place to the current rate. Outside the full
//! band the whole call fails and nothing it did persists.

use crate::error::{ConfigurationError, VaultError, VaultResult};
use crate::events::VaultEvent;
use crate::fuse::{FuseContext, HookInvocation};
use crate::state::VaultState;
use crate::vault::Vault;
use codec::{
    decode, encode, parse_configs, ConfigRecord, HookEntry, HookKind, ParsedConfigs,
    ValidatorEntry,
};
use serde::Serialize;
use tracing::{debug, info};
use types::{mul_div, Address, FixedPointError, MarketId, Wad};

/// Inclusive lower/upper bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Band {
    pub lower: Wad,
    pub upper: Wad,
}

impl Band {
    fn around(center: Wad, width: u128) -> Self {
        Self {
            lower: Wad::from_raw(center.raw().saturating_sub(width)),
            upper: Wad::from_raw(center.raw().saturating_add(width)),
        }
    }

    pub fn contains(&self, value: Wad) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Full and half tolerance bands for one validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateBands {
    pub full: Band,
    pub half: Band,
}

impl RateBands {
    pub fn new(expected: Wad, threshold: Wad) -> Result<Self, FixedPointError> {
        let full = mul_div(expected.raw(), threshold.raw(), Wad::SCALE)?;
        let half = mul_div(expected.raw(), threshold.raw(), 2 * Wad::SCALE)?;
        Ok(Self {
            full: Band::around(expected, full),
            half: Band::around(expected, half),
        })
    }
}

/// Verdict of the validator for one observed rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateCheck {
    /// Inside the half band
    Unchanged,
    /// Inside the full band but outside the half band
    Recalibrate,
    /// Outside the full band
    OutOfRange,
}

pub fn check_exchange_rate(
    expected: Wad,
    threshold: Wad,
    current: Wad,
) -> Result<RateCheck, FixedPointError> {
    let bands = RateBands::new(expected, threshold)?;
    Ok(if !bands.full.contains(current) {
        RateCheck::OutOfRange
    } else if !bands.half.contains(current) {
        RateCheck::Recalibrate
    } else {
        RateCheck::Unchanged
    })
}

/// Applied recalibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recalibration {
    pub market: MarketId,
    pub previous: Wad,
    pub current: Wad,
}

// PIPELINE STEPS

/// Run every runnable hook of `kind` in index order
pub(crate) fn run_hooks(
    vault: &Vault,
    state: &mut VaultState,
    parsed: &ParsedConfigs,
    invocation: HookInvocation,
) -> VaultResult<usize> {
    let mut executed = 0;

    for entry in parsed.runnable_hooks(invocation.kind) {
        let hook = vault
            .catalog()
            .hook(&entry.target)
            .ok_or(VaultError::UnknownHook { hook: entry.target })?;

        debug!(
            market = %invocation.market,
            kind = %invocation.kind,
            index = entry.index,
            hook = %entry.target,
            "running hook"
        );

        let mut ctx = FuseContext::new(vault, state, invocation.market, entry.target);
        hook.run(&invocation, &mut ctx)
            .map_err(|source| VaultError::Hook {
                hook: entry.target,
                source,
            })?;
        executed += 1;
    }

    Ok(executed)
}

/// Check the market's validator against the current rate, recalibrating if needed
pub(crate) fn validate_exchange_rate(
    vault: &Vault,
    state: &mut VaultState,
    market: MarketId,
    parsed: &ParsedConfigs,
) -> VaultResult<Option<Recalibration>> {
    let (Some(validator), Some(position)) = (parsed.validator, parsed.validator_index) else {
        debug!(market = %market, "no validator configured, skipping rate check");
        return Ok(None);
    };

    let expected = validator.exchange_rate();
    let threshold = validator.threshold();
    if threshold > Wad::ONE {
        return Err(ConfigurationError::ThresholdTooHigh { market, threshold }.into());
    }

    let source = vault
        .exchange_rate_source()
        .ok_or(ConfigurationError::MissingExchangeRateSource { market })?;
    let current = source
        .current_exchange_rate()
        .map_err(|source| VaultError::ExchangeRateSource { source })?;

    match check_exchange_rate(expected, threshold, current)? {
        RateCheck::Unchanged => {
            debug!(market = %market, expected = %expected, current = %current, "exchange rate within half band");
            Ok(None)
        }
        RateCheck::OutOfRange => Err(VaultError::ExchangeRateOutOfRange {
            market,
            expected,
            current,
            threshold,
        }),
        RateCheck::Recalibrate => {
            let slots = state.configs.entry(market).or_default();
            slots[position] = encode(&ConfigRecord::Validator(validator.with_exchange_rate(current)));

            info!(market = %market, previous = %expected, current = %current, "exchange rate recalibrated");
            state.emit(VaultEvent::ExchangeRateRecalibrated {
                market,
                previous: expected,
                current,
            });
            Ok(Some(Recalibration {
                market,
                previous: expected,
                current,
            }))
        }
    }
}

// CONFIGURATION EDITS

/// Append a hook record; collisions and out-of-range indexes leave the array untouched
pub(crate) fn insert_hook(
    state: &mut VaultState,
    market: MarketId,
    kind: HookKind,
    entry: HookEntry,
) -> VaultResult<()> {
    let mut parsed = parse_configs(state.config_slots(market))?;
    parsed.place_hook(kind, entry, None)?;

    state
        .configs
        .entry(market)
        .or_default()
        .push(encode(&ConfigRecord::hook(kind, entry)));
    state.emit(VaultEvent::HookConfigured {
        market,
        kind,
        index: entry.index,
        hook: entry.target,
    });
    Ok(())
}

/// Remove the hook of `kind` at `index`, returning its target
pub(crate) fn remove_hook(
    state: &mut VaultState,
    market: MarketId,
    kind: HookKind,
    index: u8,
) -> VaultResult<Option<Address>> {
    let mut found = None;
    for (position, slot) in state.config_slots(market).iter().enumerate() {
        if let Some((slot_kind, entry)) = decode(slot)?.as_hook() {
            if slot_kind == kind && entry.index == index {
                found = Some((position, entry.target));
                break;
            }
        }
    }

    let Some((position, hook)) = found else {
        return Ok(None);
    };

    let slots = state.configs.entry(market).or_default();
    slots.remove(position);
    if slots.is_empty() {
        state.configs.remove(&market);
    }
    state.emit(VaultEvent::HookRemoved {
        market,
        kind,
        index,
        hook,
    });
    Ok(Some(hook))
}

/// Overwrite the active validator in place, or append one
pub(crate) fn write_validator(
    state: &mut VaultState,
    market: MarketId,
    validator: ValidatorEntry,
) -> VaultResult<()> {
    let parsed = parse_configs(state.config_slots(market))?;
    let slot = encode(&ConfigRecord::Validator(validator));
    let slots = state.configs.entry(market).or_default();

    match parsed.validator_index {
        Some(position) => slots[position] = slot,
        None => slots.push(slot),
    }

    state.emit(VaultEvent::ValidatorConfigured {
        market,
        exchange_rate: validator.exchange_rate(),
        threshold: validator.threshold(),
    });
    Ok(())
}

/// Remove the active validator record
pub(crate) fn remove_validator(state: &mut VaultState, market: MarketId) -> VaultResult<bool> {
    let parsed = parse_configs(state.config_slots(market))?;
    let Some(position) = parsed.validator_index else {
        return Ok(false);
    };

    let slots = state.configs.entry(market).or_default();
    slots.remove(position);
    if slots.is_empty() {
        state.configs.remove(&market);
    }
    state.emit(VaultEvent::ValidatorRemoved { market });
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wad(s: &str) -> Wad {
        Wad::from_decimal_str(s).unwrap()
    }

    #[test]
    fn test_hysteresis_bands() {
        let (e, t) = (wad("100"), wad("0.1"));
        assert_eq!(check_exchange_rate(e, t, wad("100")).unwrap(), RateCheck::Unchanged);
        assert_eq!(check_exchange_rate(e, t, wad("94")).unwrap(), RateCheck::Recalibrate);
        assert_eq!(check_exchange_rate(e, t, wad("85")).unwrap(), RateCheck::OutOfRange);
        assert_eq!(check_exchange_rate(e, t, wad("107")).unwrap(), RateCheck::Recalibrate);
        assert_eq!(check_exchange_rate(e, t, wad("111")).unwrap(), RateCheck::OutOfRange);
    }

    #[test]
    fn test_band_edges_are_inclusive() {
        let (e, t) = (wad("100"), wad("0.1"));
        assert_eq!(check_exchange_rate(e, t, wad("95")).unwrap(), RateCheck::Unchanged);
        assert_eq!(check_exchange_rate(e, t, wad("105")).unwrap(), RateCheck::Unchanged);
        assert_eq!(check_exchange_rate(e, t, wad("90")).unwrap(), RateCheck::Recalibrate);
        assert_eq!(check_exchange_rate(e, t, wad("110")).unwrap(), RateCheck::Recalibrate);
    }

    #[test]
    fn test_zero_threshold_accepts_only_exact_rate() {
        let e = wad("1.5");
        assert_eq!(check_exchange_rate(e, Wad::ZERO, e).unwrap(), RateCheck::Unchanged);
        assert_eq!(
            check_exchange_rate(e, Wad::ZERO, wad("1.500000000000000001")).unwrap(),
            RateCheck::OutOfRange
        );
    }

    #[test]
    fn test_full_threshold_lower_band_reaches_zero() {
        let bands = RateBands::new(wad("2"), Wad::ONE).unwrap();
        assert_eq!(bands.full.lower, Wad::ZERO);
        assert_eq!(bands.full.upper, wad("4"));
        assert_eq!(bands.half.lower, wad("1"));
        assert_eq!(bands.half.upper, wad("3"));
    }

    #[test]
    fn test_hook_edits_preserve_exclusivity() {
        let mut state = VaultState::new();
        let market = MarketId::new(1);
        let first = HookEntry::new(Address::from_low_u64(1), 0);
        let clash = HookEntry::new(Address::from_low_u64(2), 0);

        insert_hook(&mut state, market, HookKind::Pre, first).unwrap();
        let before = state.config_slots(market).to_vec();

        let err = insert_hook(&mut state, market, HookKind::Pre, clash).unwrap_err();
        assert!(matches!(
            err.as_codec_error(),
            Some(codec::CodecError::HookIndexCollision { .. })
        ));
        assert_eq!(state.config_slots(market), before.as_slice());

        assert_eq!(
            remove_hook(&mut state, market, HookKind::Pre, 0).unwrap(),
            Some(first.target)
        );
        assert!(state.config_slots(market).is_empty());
    }

    #[test]
    fn test_validator_written_in_place() {
        let mut state = VaultState::new();
        let market = MarketId::new(1);
        insert_hook(
            &mut state,
            market,
            HookKind::Post,
            HookEntry::new(Address::from_low_u64(1), 0),
        )
        .unwrap();

        write_validator(&mut state, market, ValidatorEntry::new(wad("1"), wad("0.1")).unwrap())
            .unwrap();
        write_validator(&mut state, market, ValidatorEntry::new(wad("2"), wad("0.1")).unwrap())
            .unwrap();

        assert_eq!(state.config_slots(market).len(), 2);
        let parsed = parse_configs(state.config_slots(market)).unwrap();
        assert_eq!(parsed.validator.unwrap().exchange_rate(), wad("2"));

        assert!(remove_validator(&mut state, market).unwrap());
        assert!(!remove_validator(&mut state, market).unwrap());
    }
}
