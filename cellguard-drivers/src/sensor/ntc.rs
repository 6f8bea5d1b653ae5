//! NTC 10K thermistor sensor
//!
//! Common cell and MOSFET temperature sensor on battery management boards.
//! Temperature is interpolated from a resistance lookup table.

use cellguard_core::traits::{SensorError, TemperatureSensor};
use cellguard_core::util::interpolate;

const TABLE_LEN: usize = 34;

/// NTC resistance (ohms) at each entry of [`NTC_TEMPERATURE`]
///
/// Generated using beta equation with:
/// - R0 = 10,000 ohms at T0 = 25°C
/// - Beta = 3435K
const NTC_RESISTANCE: [f32; TABLE_LEN] = [
    248_277.0, 182_221.0, 135_452.0, 101_898.0, 77_523.0, 59_606.0, 46_290.0, 36_290.0,
    28_704.0, 22_897.0, 18_410.0, 14_916.0, 12_171.0, 10_000.0, 8_269.0, 6_881.0, 5_759.0,
    4_847.0, 4_101.0, 3_488.0, 2_981.0, 2_559.0, 2_207.0, 1_912.0, 1_662.0, 1_451.0,
    1_272.0, 1_118.0, 987.0, 874.0, 776.0, 692.0, 618.0, 554.0,
];

/// Temperature range: -40°C to 125°C in 5°C steps
const NTC_TEMPERATURE: [f32; TABLE_LEN] = [
    -40.0, -35.0, -30.0, -25.0, -20.0, -15.0, -10.0, -5.0, 0.0, 5.0, 10.0, 15.0, 20.0, 25.0,
    30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0, 100.0,
    105.0, 110.0, 115.0, 120.0, 125.0,
];

/// Full scale of a 12-bit ADC
const ADC_MAX: u16 = 4095;

/// Readings this close to either rail count as open or shorted
const ADC_MARGIN: u16 = 10;

/// Convert thermistor resistance to temperature (°C)
///
/// Resistances outside the table clamp to -40°C or 125°C.
pub fn resistance_to_celsius(ohms: f32) -> Result<f32, SensorError> {
    if ohms.is_nan() || ohms <= 0.0 {
        return Err(SensorError::ShortCircuit);
    }
    interpolate(&NTC_RESISTANCE, &NTC_TEMPERATURE, ohms).map_err(|_| SensorError::ConversionError)
}

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    type Error;

    /// Read ADC value (12-bit, 0-4095)
    fn read(&mut self) -> Result<u16, Self::Error>;
}

/// NTC 10K thermistor in a voltage divider
///
/// Circuit: VREF -- pullup -- ADC_PIN -- NTC -- GND
pub struct NtcDivider<ADC> {
    adc: ADC,
    /// Pull-up resistor value in ohms
    pullup_ohms: f32,
}

impl<ADC> NtcDivider<ADC> {
    /// Create a new NTC sensor
    ///
    /// # Arguments
    /// - `adc`: ADC channel for reading thermistor
    /// - `pullup_ohms`: Pull-up resistor value (typically 10000)
    pub fn new(adc: ADC, pullup_ohms: f32) -> Self {
        Self { adc, pullup_ohms }
    }

    /// Convert ADC reading to resistance
    ///
    /// R_ntc = R_pullup * adc_value / (adc_max - adc_value)
    pub fn adc_to_resistance(&self, adc_value: u16) -> Result<f32, SensorError> {
        if adc_value >= ADC_MAX - ADC_MARGIN {
            return Err(SensorError::OpenCircuit);
        }

        if adc_value < ADC_MARGIN {
            return Err(SensorError::ShortCircuit);
        }

        Ok(self.pullup_ohms * adc_value as f32 / (ADC_MAX - adc_value) as f32)
    }
}

impl<ADC: AdcReader> TemperatureSensor for NtcDivider<ADC> {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        let adc_value = self.adc.read().map_err(|_| SensorError::ConversionError)?;
        let resistance = self.adc_to_resistance(adc_value)?;
        resistance_to_celsius(resistance)
    }
}
