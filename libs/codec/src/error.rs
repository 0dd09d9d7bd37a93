//! Codec errors for packed configuration records
//!
//! Two families share one enum:
//! - **decode errors** ([`CodecError::is_decode_error`]): the slot bytes are not a
//!   record this engine understands (unknown tag, dirty reserved bits)
//! - **layout errors**: the records decode fine but the array they form is
//!   invalid (hook index out of range, two hooks on one index)
//!
//! Both are caller-caused configuration problems and are never retried.

use crate::record_types::{ConfigRecordType, HookKind};
use thiserror::Error;
use types::Address;

/// Packed configuration encoding/decoding errors with diagnostic context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// Leading type tag does not match a known record kind
    #[error("Unknown config record type {tag}: known types are 0 (PreHook), 1 (PostHook), 2 (Validator)")]
    UnknownRecordType { tag: u8 },

    /// Reserved payload bytes are not zero
    #[error("Non-canonical {record_type} record: reserved byte at offset {offset} is {value:#04x}, expected 0x00")]
    NonCanonicalPadding {
        record_type: ConfigRecordType,
        offset: usize,
        value: u8,
    },

    /// A field value does not fit its bit width in the packed layout
    #[error("Field {field} value {value} does not fit in {bits} bits")]
    FieldOverflow {
        field: &'static str,
        value: u128,
        bits: u32,
    },

    /// Hook order index is outside [0, max)
    #[error("{kind} index {index} out of range: must be below {max} (slot position {position:?})")]
    HookIndexOutOfRange {
        kind: HookKind,
        index: u8,
        max: usize,
        position: Option<usize>,
    },

    /// Two hooks of the same kind claim one order index
    #[error("{kind} index {index} already occupied by {existing}, rejected {incoming}")]
    HookIndexCollision {
        kind: HookKind,
        index: u8,
        existing: Address,
        incoming: Address,
    },

    /// Raw storage buffer is not a whole number of slots
    #[error("Slot buffer of {len} bytes is not a multiple of the {slot_size}-byte slot size")]
    InvalidSlotBuffer { len: usize, slot_size: usize },
}

impl CodecError {
    /// True for errors raised while decoding a single slot
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownRecordType { .. } | Self::NonCanonicalPadding { .. }
        )
    }

    pub fn hook_index_out_of_range(
        kind: HookKind,
        index: u8,
        max: usize,
        position: Option<usize>,
    ) -> Self {
        Self::HookIndexOutOfRange {
            kind,
            index,
            max,
            position,
        }
    }
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;
