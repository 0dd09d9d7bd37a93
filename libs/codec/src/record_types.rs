//! # Config Record Type Registry
//!
//! Type tags stored in byte 0 of every packed slot. Tags are append-only: a
//! new hook or validator kind takes the next free value, existing values never
//! change meaning. Decoding a tag that is not listed here fails rather than
//! silently skipping the slot, so an older engine never runs with a partially
//! understood configuration.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a packed configuration record
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize,
)]
pub enum ConfigRecordType {
    /// Hook run before the protected call
    PreHook = 0,
    /// Hook run after the protected call
    PostHook = 1,
    /// Exchange-rate validator (expected rate + threshold)
    Validator = 2,
}

impl ConfigRecordType {
    pub fn name(self) -> &'static str {
        match self {
            Self::PreHook => "PreHook",
            Self::PostHook => "PostHook",
            Self::Validator => "Validator",
        }
    }

    /// All known record types, in tag order
    pub fn all() -> [ConfigRecordType; 3] {
        [Self::PreHook, Self::PostHook, Self::Validator]
    }
}

impl fmt::Display for ConfigRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of the protected call a hook runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookKind {
    Pre,
    Post,
}

impl HookKind {
    pub fn record_type(self) -> ConfigRecordType {
        match self {
            Self::Pre => ConfigRecordType::PreHook,
            Self::Post => ConfigRecordType::PostHook,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pre => f.write_str("pre-hook"),
            Self::Post => f.write_str("post-hook"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values_are_stable() {
        assert_eq!(u8::from(ConfigRecordType::PreHook), 0);
        assert_eq!(u8::from(ConfigRecordType::PostHook), 1);
        assert_eq!(u8::from(ConfigRecordType::Validator), 2);
    }

    #[test]
    fn test_try_from_primitive() {
        assert_eq!(ConfigRecordType::try_from(2u8).unwrap(), ConfigRecordType::Validator);
        assert!(ConfigRecordType::try_from(3u8).is_err());
        assert!(ConfigRecordType::try_from(255u8).is_err());
    }

    #[test]
    fn test_hook_kind_mapping() {
        assert_eq!(HookKind::Pre.record_type(), ConfigRecordType::PreHook);
        assert_eq!(HookKind::Post.record_type(), ConfigRecordType::PostHook);
    }
}
