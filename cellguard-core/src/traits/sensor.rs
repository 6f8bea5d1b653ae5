//! Cell temperature sensing
//!
//! One sensor per thermistor on the pack. The context reduces all readings
//! to the min/max range the protection logic works with, see
//! [`PackData::read_cell_temperatures`](crate::context::PackData::read_cell_temperatures).

/// Cell temperature reading failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Thermistor lead broken
    OpenCircuit,
    /// Thermistor input pulled to ground
    ShortCircuit,
    /// Reading could not be turned into a temperature
    ConversionError,
    /// No sensor to read from
    NoSensors,
}

/// A cell temperature measurement point
pub trait TemperatureSensor {
    /// Cell temperature (°C)
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}
