//! Common identifier, timestamp and validation types.

pub mod errors;
pub mod identifiers;
pub mod ticks;
