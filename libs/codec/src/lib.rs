//! # Vault Config Codec
//!
//! ## Purpose
//!
//! Every market carries an array of fixed-size configuration records that
//! drive its hook pipeline: pre-hooks, post-hooks and at most one
//! exchange-rate validator. This crate owns the storage format of those
//! records and nothing else:
//! - Packed 256-bit slot layout and its constants
//! - Type tag registry ([`ConfigRecordType`])
//! - Strict encode/decode of single records
//! - Parsing a whole array into index-addressed hook tables
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → services/vault
//!     ↑           ↓            ↓
//! Wad,        PackedSlot   Hook pipeline,
//! Address     ParsedConfigs validator recalibration
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Hook execution or exchange-rate validation (belongs in services/vault)
//! - Authorization of configuration writes
//! - Persistence; slots are plain bytes and callers choose where they live

pub mod constants;
pub mod error;
pub mod parser;
pub mod record;
pub mod record_types;

pub use constants::*;
pub use error::{CodecError, CodecResult};
pub use parser::{parse_configs, ParsedConfigs};
pub use record::{
    decode, encode, slots_from_bytes, slots_to_bytes, ConfigRecord, HookEntry, PackedSlot,
    ValidatorEntry,
};
pub use record_types::{ConfigRecordType, HookKind};
