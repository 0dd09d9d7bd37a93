//! Registry of active adapters, balance fuses and substrate allowances

pub mod adapters;
pub mod slot;

pub use adapters::AdapterRegistry;
pub use slot::RegistrySlot;
