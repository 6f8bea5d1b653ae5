//! Hardware abstraction traits
//!
//! These traits define the interface between the protection logic
//! and hardware-specific implementations.

pub mod driver;
pub mod sensor;

pub use driver::{BmsDriver, Switch};
pub use sensor::{SensorError, TemperatureSensor};
