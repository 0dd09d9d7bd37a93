//! # Packed Config Records - Encode/Decode
//!
//! A [`PackedSlot`] is the storage unit: 32 raw bytes, zero-copy compatible so a
//! whole configuration array can be persisted or diffed as a flat byte buffer.
//! [`ConfigRecord`] is the decoded, typed view of one slot.
//!
//! `encode` is total: every [`ConfigRecord`] that can be constructed fits its
//! layout ([`ValidatorEntry::new`] refuses thresholds wider than 120 bits).
//! `decode` is strict: unknown tags and dirty reserved bytes are errors, so
//! `decode(slot)` succeeding implies `encode(decode(slot)) == slot`.

use crate::constants::*;
use crate::error::{CodecError, CodecResult};
use crate::record_types::{ConfigRecordType, HookKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use types::{Address, Wad};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// One 256-bit configuration storage slot
#[repr(transparent)]
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Default, AsBytes, FromBytes, FromZeroes, Serialize, Deserialize,
)]
pub struct PackedSlot([u8; SLOT_SIZE]);

impl PackedSlot {
    pub const ZERO: Self = Self([0u8; SLOT_SIZE]);

    pub const fn from_bytes(bytes: [u8; SLOT_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; SLOT_SIZE] {
        self.0
    }

    /// Raw type tag (may be unknown)
    pub fn tag(&self) -> u8 {
        self.0[TAG_OFFSET]
    }
}

impl fmt::Debug for PackedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedSlot(0x{})", hex::encode(self.0))
    }
}

/// Hook pipeline entry: target hook reference and execution order index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookEntry {
    pub target: Address,
    pub index: u8,
}

impl HookEntry {
    pub fn new(target: Address, index: u8) -> Self {
        Self { target, index }
    }
}

/// Exchange-rate validator state
///
/// Both fields are 18-decimal fixed point. The threshold is a fraction of the
/// expected rate (`0.10` = ±10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatorEntry {
    exchange_rate: Wad,
    threshold: Wad,
}

impl ValidatorEntry {
    /// Largest threshold representable in the packed layout
    pub const MAX_ENCODABLE_THRESHOLD: u128 = (1u128 << VALIDATOR_THRESHOLD_BITS) - 1;

    /// Build a validator entry; the threshold must fit 120 bits
    ///
    /// Thresholds above 100% are representable and rejected later, when the
    /// validator actually runs.
    pub fn new(exchange_rate: Wad, threshold: Wad) -> CodecResult<Self> {
        if threshold.raw() > Self::MAX_ENCODABLE_THRESHOLD {
            return Err(CodecError::FieldOverflow {
                field: "threshold",
                value: threshold.raw(),
                bits: VALIDATOR_THRESHOLD_BITS,
            });
        }
        Ok(Self {
            exchange_rate,
            threshold,
        })
    }

    pub fn exchange_rate(&self) -> Wad {
        self.exchange_rate
    }

    pub fn threshold(&self) -> Wad {
        self.threshold
    }

    /// Same threshold, re-centered on a new expected rate
    pub fn with_exchange_rate(self, exchange_rate: Wad) -> Self {
        Self {
            exchange_rate,
            ..self
        }
    }
}

/// Decoded configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigRecord {
    PreHook(HookEntry),
    PostHook(HookEntry),
    Validator(ValidatorEntry),
}

impl ConfigRecord {
    pub fn hook(kind: HookKind, entry: HookEntry) -> Self {
        match kind {
            HookKind::Pre => Self::PreHook(entry),
            HookKind::Post => Self::PostHook(entry),
        }
    }

    pub fn record_type(&self) -> ConfigRecordType {
        match self {
            Self::PreHook(_) => ConfigRecordType::PreHook,
            Self::PostHook(_) => ConfigRecordType::PostHook,
            Self::Validator(_) => ConfigRecordType::Validator,
        }
    }

    /// Hook kind and entry, if this is a hook record
    pub fn as_hook(&self) -> Option<(HookKind, &HookEntry)> {
        match self {
            Self::PreHook(entry) => Some((HookKind::Pre, entry)),
            Self::PostHook(entry) => Some((HookKind::Post, entry)),
            Self::Validator(_) => None,
        }
    }

    pub fn encode(&self) -> PackedSlot {
        encode(self)
    }

    pub fn decode(slot: &PackedSlot) -> CodecResult<Self> {
        decode(slot)
    }
}

/// Encode a record into its fixed 32-byte layout
pub fn encode(record: &ConfigRecord) -> PackedSlot {
    let mut out = [0u8; SLOT_SIZE];
    out[TAG_OFFSET] = record.record_type().into();

    match record {
        ConfigRecord::PreHook(entry) | ConfigRecord::PostHook(entry) => {
            out[HOOK_TARGET_OFFSET..HOOK_INDEX_OFFSET].copy_from_slice(entry.target.as_bytes());
            out[HOOK_INDEX_OFFSET] = entry.index;
        }
        ConfigRecord::Validator(entry) => {
            // Threshold is the low 120 bits of a big-endian u128
            let threshold = entry.threshold.raw().to_be_bytes();
            out[VALIDATOR_THRESHOLD_OFFSET..VALIDATOR_RATE_OFFSET]
                .copy_from_slice(&threshold[16 - VALIDATOR_THRESHOLD_LEN..]);
            out[VALIDATOR_RATE_OFFSET..].copy_from_slice(&entry.exchange_rate.raw().to_be_bytes());
        }
    }

    PackedSlot(out)
}

/// Decode a slot; unknown tags and non-zero reserved bytes are rejected
pub fn decode(slot: &PackedSlot) -> CodecResult<ConfigRecord> {
    let bytes = &slot.0;
    let tag = bytes[TAG_OFFSET];
    let record_type =
        ConfigRecordType::try_from(tag).map_err(|_| CodecError::UnknownRecordType { tag })?;

    match record_type {
        ConfigRecordType::PreHook | ConfigRecordType::PostHook => {
            if let Some((offset, &value)) = bytes
                .iter()
                .enumerate()
                .skip(HOOK_RESERVED_OFFSET)
                .find(|&(_, &b)| b != 0)
            {
                return Err(CodecError::NonCanonicalPadding {
                    record_type,
                    offset,
                    value,
                });
            }

            let target = Address::read_from(&bytes[HOOK_TARGET_OFFSET..HOOK_INDEX_OFFSET])
                .unwrap_or(Address::ZERO);
            let entry = HookEntry::new(target, bytes[HOOK_INDEX_OFFSET]);

            Ok(if record_type == ConfigRecordType::PreHook {
                ConfigRecord::PreHook(entry)
            } else {
                ConfigRecord::PostHook(entry)
            })
        }
        ConfigRecordType::Validator => {
            let mut threshold = [0u8; 16];
            threshold[16 - VALIDATOR_THRESHOLD_LEN..]
                .copy_from_slice(&bytes[VALIDATOR_THRESHOLD_OFFSET..VALIDATOR_RATE_OFFSET]);
            let mut rate = [0u8; 16];
            rate.copy_from_slice(&bytes[VALIDATOR_RATE_OFFSET..]);

            Ok(ConfigRecord::Validator(ValidatorEntry {
                exchange_rate: Wad::from_raw(u128::from_be_bytes(rate)),
                threshold: Wad::from_raw(u128::from_be_bytes(threshold)),
            }))
        }
    }
}

/// Split a flat storage buffer into slots
pub fn slots_from_bytes(bytes: &[u8]) -> CodecResult<Vec<PackedSlot>> {
    if bytes.len() % SLOT_SIZE != 0 {
        return Err(CodecError::InvalidSlotBuffer {
            len: bytes.len(),
            slot_size: SLOT_SIZE,
        });
    }
    Ok(bytes
        .chunks_exact(SLOT_SIZE)
        .filter_map(PackedSlot::read_from)
        .collect())
}

/// Concatenate slots into a flat storage buffer
pub fn slots_to_bytes(slots: &[PackedSlot]) -> Vec<u8> {
    slots.as_bytes().to_vec()
}
