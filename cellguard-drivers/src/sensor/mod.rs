//! Temperature sensor implementations

pub mod ntc;

pub use ntc::{resistance_to_celsius, AdcReader, NtcDivider};
