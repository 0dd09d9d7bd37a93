//! Error types for fixed-point arithmetic and identifier parsing
//!
//! Provides error handling for overflow, decimal-scale conversion and parsing
//! failures in balance calculations, as well as validation failures for addresses.

use thiserror::Error;

/// Errors that can occur while parsing an [`Address`](crate::Address)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AddressError {
    /// Input is not valid hexadecimal
    #[error("Invalid hex in address '{input}': {reason}")]
    InvalidHex { input: String, reason: String },

    /// Input decodes to the wrong number of bytes
    #[error("Invalid address length: expected 20 bytes, got {got}")]
    InvalidLength { got: usize },
}

/// Errors that can occur during fixed-point arithmetic operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FixedPointError {
    /// Result exceeds the representable range of the target type
    #[error("Overflow in fixed-point {operation}")]
    Overflow { operation: &'static str },

    /// Division by zero in fixed-point arithmetic
    #[error("Division by zero in fixed-point arithmetic")]
    DivisionByZero,

    /// Decimal scale cannot be converted to the canonical 18-decimal scale
    #[error("Unsupported decimals {decimals}: conversion to 18 decimals overflows")]
    UnsupportedDecimals { decimals: u8 },

    /// Invalid decimal string format
    #[error("Invalid decimal string: '{input}' - expected non-negative numeric format")]
    InvalidDecimal { input: String },
}

impl FixedPointError {
    pub fn overflow(operation: &'static str) -> Self {
        Self::Overflow { operation }
    }
}
