//! Switch driver implementations

pub mod gpio;

pub use gpio::{GpioSwitchConfig, GpioSwitches};
