//! Outbound adapters (driven side): implementations of the outbound ports.

pub mod memory;
