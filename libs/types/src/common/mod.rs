//! Common value types: identifiers, fixed-point arithmetic and their errors

pub mod errors;
pub mod fixed_point;
pub mod identifiers;
