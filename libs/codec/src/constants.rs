//! # Packed Record Layout Constants
//!
//! Every configuration record occupies one 32-byte (256-bit) slot. Offsets are
//! byte offsets into the slot, big-endian, byte 0 first:
//!
//! ```text
//!  byte  0        1 ................. 20   21      22 ........ 31
//!       ┌───────┬───────────────────────┬───────┬───────────────┐
//! HOOK  │ tag   │ target address (160b) │ index │ zero (80b)    │
//!       └───────┴───────────────────────┴───────┴───────────────┘
//!  byte  0        1 ........ 15   16 ......................... 31
//!       ┌───────┬───────────────┬─────────────────────────────┐
//! VALID │ tag   │ threshold     │ expected exchange rate      │
//!       │       │ (120b)        │ (128b)                      │
//!       └───────┴───────────────┴─────────────────────────────┘
//! ```
//!
//! These values are part of the storage format and must never change; new record
//! kinds get new tags instead.

/// Size of one packed configuration slot in bytes
pub const SLOT_SIZE: usize = 32;

/// Offset of the 1-byte type tag
pub const TAG_OFFSET: usize = 0;

/// Hook payload: 160-bit target address
pub const HOOK_TARGET_OFFSET: usize = 1;
pub const HOOK_TARGET_LEN: usize = 20;

/// Hook payload: 8-bit execution order index
pub const HOOK_INDEX_OFFSET: usize = HOOK_TARGET_OFFSET + HOOK_TARGET_LEN;

/// Hook payload: first reserved (zero-filled) byte
pub const HOOK_RESERVED_OFFSET: usize = HOOK_INDEX_OFFSET + 1;

/// Validator payload: 120-bit tolerance threshold
pub const VALIDATOR_THRESHOLD_OFFSET: usize = 1;
pub const VALIDATOR_THRESHOLD_LEN: usize = 15;
pub const VALIDATOR_THRESHOLD_BITS: u32 = (VALIDATOR_THRESHOLD_LEN * 8) as u32;

/// Validator payload: 128-bit expected exchange rate
pub const VALIDATOR_RATE_OFFSET: usize = VALIDATOR_THRESHOLD_OFFSET + VALIDATOR_THRESHOLD_LEN;
pub const VALIDATOR_RATE_LEN: usize = 16;

/// Number of hook positions per (market, hook kind)
pub const MAX_HOOK_SLOTS: usize = 10;

const _: () = assert!(HOOK_RESERVED_OFFSET <= SLOT_SIZE);
const _: () = assert!(VALIDATOR_RATE_OFFSET + VALIDATOR_RATE_LEN == SLOT_SIZE);
