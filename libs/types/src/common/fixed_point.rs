//! Fixed-point arithmetic for cross-market balance aggregation
//!
//! Every market reports balances in its own native decimals (6 for USDC, 18 for
//! WETH, 8 for WBTC wrappers). Before two markets can be summed their values are
//! normalized to one canonical scale: 18 decimals, `1.0 == 10^18` ([`Wad`]).
//!
//! ## Design Principles
//!
//! - **No Precision Loss on Up-scaling**: native → 18 decimals is exact for ≤18 decimals
//! - **Explicit Truncation on Down-scaling**: >18 decimals floors toward zero
//! - **Overflow Protection**: checked arithmetic returning [`FixedPointError`]
//! - **Wide Intermediates**: `a * b / d` is computed in 256 bits ([`mul_div`])

use crate::common::errors::FixedPointError;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal places of the canonical scale
pub const WAD_DECIMALS: u8 = 18;

/// Non-negative 18-decimal fixed-point value
///
/// Examples:
/// - 1.0 = Wad(1_000_000_000_000_000_000)
/// - 0.10 (10%) = Wad(100_000_000_000_000_000)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wad(u128);

impl Wad {
    /// Scale factor for 18 decimal places
    pub const SCALE: u128 = 1_000_000_000_000_000_000;

    pub const ZERO: Self = Self(0);

    /// 1.0 (also 100% when used as a ratio)
    pub const ONE: Self = Self(Self::SCALE);

    pub const MAX: Self = Self(u128::MAX);

    /// Create from raw scaled integer
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Get the raw scaled integer value
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Whole units, e.g. `Wad::from_int(100)` == 100.0
    pub fn from_int(units: u128) -> Result<Self, FixedPointError> {
        units
            .checked_mul(Self::SCALE)
            .map(Self)
            .ok_or_else(|| FixedPointError::overflow("from_int"))
    }

    /// Normalize a native-decimal amount to 18 decimals
    ///
    /// Amounts with more than 18 decimals are floored.
    pub fn from_units(amount: u128, decimals: u8) -> Result<Self, FixedPointError> {
        match decimals.cmp(&WAD_DECIMALS) {
            std::cmp::Ordering::Equal => Ok(Self(amount)),
            std::cmp::Ordering::Less => {
                let factor = pow10(WAD_DECIMALS - decimals, decimals)?;
                amount
                    .checked_mul(factor)
                    .map(Self)
                    .ok_or_else(|| FixedPointError::overflow("normalize"))
            }
            std::cmp::Ordering::Greater => {
                let factor = pow10(decimals - WAD_DECIMALS, decimals)?;
                Ok(Self(amount / factor))
            }
        }
    }

    /// Convert back to a native-decimal amount (floors when down-scaling)
    pub fn to_units(self, decimals: u8) -> Result<u128, FixedPointError> {
        match decimals.cmp(&WAD_DECIMALS) {
            std::cmp::Ordering::Equal => Ok(self.0),
            std::cmp::Ordering::Less => Ok(self.0 / pow10(WAD_DECIMALS - decimals, decimals)?),
            std::cmp::Ordering::Greater => {
                let factor = pow10(decimals - WAD_DECIMALS, decimals)?;
                self.0
                    .checked_mul(factor)
                    .ok_or_else(|| FixedPointError::overflow("denormalize"))
            }
        }
    }

    /// Parse a non-negative decimal string such as `"0.05"` or `"1250.5"`
    ///
    /// This is the primary way configuration files express rates and thresholds.
    /// Digits beyond the 18th decimal are truncated.
    pub fn from_decimal_str(s: &str) -> Result<Self, FixedPointError> {
        let invalid = || FixedPointError::InvalidDecimal {
            input: s.to_string(),
        };

        let decimal = Decimal::from_str(s.trim()).map_err(|_| invalid())?;
        if decimal.is_sign_negative() && !decimal.is_zero() {
            return Err(invalid());
        }

        let mantissa = decimal.mantissa().unsigned_abs();
        let scale = decimal.scale() as u8;
        Self::from_units(mantissa, scale)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    // CHECKED ARITHMETIC

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// `self * rhs` where `rhs` is a fixed-point ratio (e.g. a threshold)
    pub fn mul_wad(self, rhs: Self) -> Result<Self, FixedPointError> {
        mul_div(self.0, rhs.0, Self::SCALE).map(Self)
    }

    /// `self / rhs` in fixed point
    pub fn div_wad(self, rhs: Self) -> Result<Self, FixedPointError> {
        mul_div(self.0, Self::SCALE, rhs.0).map(Self)
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            return write!(f, "{}.0", int);
        }
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", int, digits.trim_end_matches('0'))
    }
}

impl FromStr for Wad {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

/// Signed change between two cached balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedDelta(pub i128);

impl SignedDelta {
    /// `current - previous`, saturating at the i128 range
    pub fn between(current: Wad, previous: Wad) -> Self {
        let (cur, prev) = (current.raw(), previous.raw());
        if cur >= prev {
            Self(i128::try_from(cur - prev).unwrap_or(i128::MAX))
        } else {
            Self(i128::try_from(prev - cur).map(|v| -v).unwrap_or(i128::MIN))
        }
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SignedDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = Wad::from_raw(self.0.unsigned_abs());
        if self.0 < 0 {
            write!(f, "-{}", magnitude)
        } else {
            write!(f, "+{}", magnitude)
        }
    }
}

/// `a * b / d` with a 256-bit intermediate, floored
pub fn mul_div(a: u128, b: u128, d: u128) -> Result<u128, FixedPointError> {
    if d == 0 {
        return Err(FixedPointError::DivisionByZero);
    }
    let result = U256::from(a) * U256::from(b) / U256::from(d);
    if result > U256::from(u128::MAX) {
        return Err(FixedPointError::overflow("mul_div"));
    }
    Ok(result.as_u128())
}

fn pow10(exp: u8, decimals: u8) -> Result<u128, FixedPointError> {
    10u128
        .checked_pow(exp as u32)
        .ok_or(FixedPointError::UnsupportedDecimals { decimals })
}
