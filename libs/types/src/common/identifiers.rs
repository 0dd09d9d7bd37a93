//! # Identifiers - Markets and 160-bit Addresses
//!
//! Two identifier kinds flow through the engine:
//!
//! - [`MarketId`]: integer id of a logical capital destination (a lending market,
//!   a yield tokenizer, a float-tracking market)
//! - [`Address`]: opaque 160-bit reference used for fuses, hooks and substrates
//!   (tokens, pools, vaults). Stored as 20 big-endian bytes so it can be copied
//!   verbatim into packed configuration slots.
//!
//! Addresses print as `0x`-prefixed lowercase hex and serialize as hex strings in
//! human-readable formats (TOML, JSON) and as raw bytes in binary formats.

use crate::common::errors::AddressError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Integer identifier of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(pub u32);

impl MarketId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "market#{}", self.0)
    }
}

impl From<u32> for MarketId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// 160-bit opaque reference (fuse, hook or substrate)
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsBytes, FromBytes, FromZeroes)]
pub struct Address([u8; 20]);

impl Address {
    /// Width in bytes
    pub const LEN: usize = 20;

    /// The all-zero address
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address whose low 8 bytes hold `value` (big-endian), rest zero
    ///
    /// Handy for deterministic test and demo fixtures.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Build from a slice, which must be exactly 20 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let array: [u8; 20] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength { got: bytes.len() })?;
        Ok(Self(array))
    }

    pub const fn to_bytes(self) -> [u8; 20] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_slice(&bytes)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(AddressVisitor)
        } else {
            <[u8; 20]>::deserialize(deserializer).map(Self)
        }
    }
}

struct AddressVisitor;

impl<'de> Visitor<'de> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 0x-prefixed 20-byte hex string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let text = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
        let addr: Address = text.parse().unwrap();
        assert_eq!(addr.to_string(), text);

        // Prefix is optional, case-insensitive digits
        let bare: Address = "A0B86991C6218B36C1D19D4A2E9EB0CE3606EB48".parse().unwrap();
        assert_eq!(bare, addr);
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength { got: 2 })
        ));
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(AddressError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_from_low_u64_layout() {
        let addr = Address::from_low_u64(0x0102);
        let bytes = addr.to_bytes();
        assert!(bytes[..18].iter().all(|&b| b == 0));
        assert_eq!(&bytes[18..], &[0x01, 0x02]);
        assert!(!addr.is_zero());
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_address_serde_formats() {
        let addr = Address::from_low_u64(7);

        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), addr);

        let bin = bincode::serialize(&addr).unwrap();
        assert_eq!(bin.len(), 20);
        assert_eq!(bincode::deserialize::<Address>(&bin).unwrap(), addr);
    }

    #[test]
    fn test_zero_copy_bytes() {
        let addr = Address::from_low_u64(42);
        assert_eq!(addr.as_bytes().len(), Address::LEN);
        assert_eq!(Address::read_from(addr.as_bytes()), Some(addr));
    }
}
