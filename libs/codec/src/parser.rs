//! # Configuration Array Parser
//!
//! A market's configuration is an unordered array of packed slots. The hook
//! pipeline needs it as fixed-size, index-addressed tables, so [`parse_configs`]
//! walks the array once and routes every record by kind and order index:
//!
//! ```text
//! [slot 0: PreHook idx 1] ──┐
//! [slot 1: Validator    ] ──┼──→ pre_hooks  [_, A, _, _, ...]
//! [slot 2: PreHook idx 0] ──┤    post_hooks [B, _, _, _, ...]
//! [slot 3: PostHook idx 0]──┘    validator = Some(v), validator_index = Some(1)
//! ```
//!
//! Out-of-range and colliding hook indexes are errors, never silently dropped.
//! Only the first validator record counts; later ones are ignored.

use crate::constants::MAX_HOOK_SLOTS;
use crate::error::{CodecError, CodecResult};
use crate::record::{decode, ConfigRecord, HookEntry, PackedSlot, ValidatorEntry};
use crate::record_types::HookKind;
use tracing::debug;

/// Index-addressed view of a market's configuration array
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfigs {
    pub pre_hooks: [Option<HookEntry>; MAX_HOOK_SLOTS],
    pub post_hooks: [Option<HookEntry>; MAX_HOOK_SLOTS],
    pub validator: Option<ValidatorEntry>,
    /// Position of the validator record in the source array
    pub validator_index: Option<usize>,
}

impl ParsedConfigs {
    pub fn hooks(&self, kind: HookKind) -> &[Option<HookEntry>; MAX_HOOK_SLOTS] {
        match kind {
            HookKind::Pre => &self.pre_hooks,
            HookKind::Post => &self.post_hooks,
        }
    }

    /// Hooks in execution order, stopping at the first unset index
    pub fn runnable_hooks(&self, kind: HookKind) -> impl Iterator<Item = &HookEntry> + '_ {
        self.hooks(kind).iter().map_while(Option::as_ref)
    }

    /// Every configured hook in index order, gaps skipped
    pub fn configured_hooks(&self, kind: HookKind) -> impl Iterator<Item = &HookEntry> + '_ {
        self.hooks(kind).iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.validator.is_none()
            && self.pre_hooks.iter().all(Option::is_none)
            && self.post_hooks.iter().all(Option::is_none)
    }

    fn hooks_mut(&mut self, kind: HookKind) -> &mut [Option<HookEntry>; MAX_HOOK_SLOTS] {
        match kind {
            HookKind::Pre => &mut self.pre_hooks,
            HookKind::Post => &mut self.post_hooks,
        }
    }

    /// Place a hook at its order index, rejecting out-of-range and occupied slots
    pub fn place_hook(
        &mut self,
        kind: HookKind,
        entry: HookEntry,
        position: Option<usize>,
    ) -> CodecResult<()> {
        let index = entry.index as usize;
        if index >= MAX_HOOK_SLOTS {
            return Err(CodecError::hook_index_out_of_range(
                kind,
                entry.index,
                MAX_HOOK_SLOTS,
                position,
            ));
        }

        let slot = &mut self.hooks_mut(kind)[index];
        if let Some(existing) = slot {
            return Err(CodecError::HookIndexCollision {
                kind,
                index: entry.index,
                existing: existing.target,
                incoming: entry.target,
            });
        }
        *slot = Some(entry);
        Ok(())
    }
}

/// Walk a configuration array once and build its indexed view
pub fn parse_configs(slots: &[PackedSlot]) -> CodecResult<ParsedConfigs> {
    let mut parsed = ParsedConfigs::default();

    for (position, slot) in slots.iter().enumerate() {
        match decode(slot)? {
            ConfigRecord::PreHook(entry) => parsed.place_hook(HookKind::Pre, entry, Some(position))?,
            ConfigRecord::PostHook(entry) => {
                parsed.place_hook(HookKind::Post, entry, Some(position))?
            }
            ConfigRecord::Validator(entry) => {
                if parsed.validator.is_none() {
                    parsed.validator = Some(entry);
                    parsed.validator_index = Some(position);
                } else {
                    debug!(position, "ignoring validator record after the first");
                }
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::encode;
    use types::{Address, Wad};

    fn pre(index: u8, target: u64) -> PackedSlot {
        encode(&ConfigRecord::PreHook(HookEntry::new(
            Address::from_low_u64(target),
            index,
        )))
    }

    fn post(index: u8, target: u64) -> PackedSlot {
        encode(&ConfigRecord::PostHook(HookEntry::new(
            Address::from_low_u64(target),
            index,
        )))
    }

    fn validator(rate: u128) -> PackedSlot {
        encode(&ConfigRecord::Validator(
            ValidatorEntry::new(Wad::from_int(rate).unwrap(), Wad::from_decimal_str("0.1").unwrap())
                .unwrap(),
        ))
    }

    #[test]
    fn test_routes_by_kind_and_index() {
        let slots = [pre(1, 0xA), validator(100), pre(0, 0xB), post(0, 0xC)];
        let parsed = parse_configs(&slots).unwrap();

        assert_eq!(parsed.pre_hooks[0].unwrap().target, Address::from_low_u64(0xB));
        assert_eq!(parsed.pre_hooks[1].unwrap().target, Address::from_low_u64(0xA));
        assert_eq!(parsed.post_hooks[0].unwrap().target, Address::from_low_u64(0xC));
        assert_eq!(parsed.validator_index, Some(1));
        assert_eq!(
            parsed.validator.unwrap().exchange_rate(),
            Wad::from_int(100).unwrap()
        );
    }

    #[test]
    fn test_empty_array_has_no_validator() {
        let parsed = parse_configs(&[]).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.validator_index, None);
    }

    #[test]
    fn test_first_validator_wins() {
        let slots = [validator(100), validator(200)];
        let parsed = parse_configs(&slots).unwrap();
        assert_eq!(parsed.validator_index, Some(0));
        assert_eq!(
            parsed.validator.unwrap().exchange_rate(),
            Wad::from_int(100).unwrap()
        );
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let err = parse_configs(&[pre(0, 1), post(10, 2)]).unwrap_err();
        assert_eq!(
            err,
            CodecError::HookIndexOutOfRange {
                kind: HookKind::Post,
                index: 10,
                max: MAX_HOOK_SLOTS,
                position: Some(1),
            }
        );
    }

    #[test]
    fn test_collision_rejected_as_distinct_error() {
        let err = parse_configs(&[pre(3, 1), pre(3, 2)]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::HookIndexCollision { kind: HookKind::Pre, index: 3, .. }
        ));

        // Same index on different kinds is fine
        assert!(parse_configs(&[pre(3, 1), post(3, 2)]).is_ok());
    }

    #[test]
    fn test_runnable_hooks_stop_at_first_gap() {
        let parsed = parse_configs(&[pre(0, 1), pre(1, 2), pre(3, 4)]).unwrap();

        let runnable: Vec<_> = parsed.runnable_hooks(HookKind::Pre).map(|h| h.index).collect();
        assert_eq!(runnable, vec![0, 1]);

        let configured: Vec<_> = parsed.configured_hooks(HookKind::Pre).map(|h| h.index).collect();
        assert_eq!(configured, vec![0, 1, 3]);
    }
}
