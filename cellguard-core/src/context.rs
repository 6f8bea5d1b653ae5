//! Controller context
//!
//! The long-lived state of one battery pack: configuration, the latest
//! measurements, manual enables, terminal conditions and the supervisory
//! state. Exactly one context exists per physical pack, owned by the
//! control loop.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::protection::ErrorFlags;
use crate::state::BmsState;
use crate::traits::{SensorError, TemperatureSensor};

/// Maximum number of series cells
pub const MAX_CELLS: usize = 16;

/// More cell voltages than [`MAX_CELLS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TooManyCells;

/// Latest measurements of the pack
///
/// Refreshed by the driver layer before each control cycle.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackData {
    /// Individual cell voltages (V)
    pub cell_voltages: Vec<f32, MAX_CELLS>,
    /// Highest cell voltage (V)
    pub cell_voltage_max: f32,
    /// Lowest cell voltage (V)
    pub cell_voltage_min: f32,
    /// Average cell voltage (V)
    pub cell_voltage_avg: f32,
    /// Pack current (A), positive while charging
    pub current: f32,
    /// Highest cell temperature (°C)
    pub cell_temp_max: f32,
    /// Lowest cell temperature (°C)
    pub cell_temp_min: f32,
    /// Protection IC or MOSFET temperature (°C), if measured
    pub ic_temp: Option<f32>,
    /// Active faults
    pub error_flags: ErrorFlags,
}

impl PackData {
    /// Store cell voltages and update max, min and average
    pub fn set_cell_voltages(&mut self, voltages: &[f32]) -> Result<(), TooManyCells> {
        self.cell_voltages = Vec::from_slice(voltages).map_err(|_| TooManyCells)?;

        if voltages.is_empty() {
            self.cell_voltage_max = 0.0;
            self.cell_voltage_min = 0.0;
            self.cell_voltage_avg = 0.0;
            return Ok(());
        }

        let mut max = f32::MIN;
        let mut min = f32::MAX;
        let mut sum = 0.0;
        for &v in voltages {
            max = max.max(v);
            min = min.min(v);
            sum += v;
        }

        self.cell_voltage_max = max;
        self.cell_voltage_min = min;
        self.cell_voltage_avg = sum / voltages.len() as f32;
        Ok(())
    }

    /// Store the temperature range over all cell sensors
    pub fn set_cell_temperatures(&mut self, min: f32, max: f32) {
        self.cell_temp_min = min;
        self.cell_temp_max = max;
    }

    /// Read every cell sensor and store the temperature range
    ///
    /// A failed read is returned as is and leaves the stored range
    /// untouched, so a broken thermistor cannot hide a hot cell.
    pub fn read_cell_temperatures<S: TemperatureSensor>(
        &mut self,
        sensors: &mut [S],
    ) -> Result<(), SensorError> {
        if sensors.is_empty() {
            return Err(SensorError::NoSensors);
        }

        let mut max = f32::MIN;
        let mut min = f32::MAX;
        for sensor in sensors.iter_mut() {
            let celsius = sensor.read_celsius()?;
            max = max.max(celsius);
            min = min.min(celsius);
        }

        self.set_cell_temperatures(min, max);
        Ok(())
    }

    /// Sum of all cell voltages (V)
    pub fn pack_voltage(&self) -> f32 {
        self.cell_voltages.iter().sum()
    }
}

/// Controller context for one battery pack
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BmsContext {
    /// Limits configuration, read-only during operation
    pub conf: Configuration,
    /// Latest measurements
    pub data: PackData,
    /// Manual charge enable
    pub chg_enable: bool,
    /// Manual discharge enable
    pub dis_enable: bool,
    /// Battery is full, charging must stop
    pub full: bool,
    /// Battery is empty, discharging must stop
    pub empty: bool,
    state: BmsState,
}

impl BmsContext {
    /// Create a context in the OFF state with both directions enabled
    pub fn new(conf: Configuration) -> Self {
        Self {
            conf,
            data: PackData::default(),
            chg_enable: true,
            dis_enable: true,
            full: false,
            empty: false,
            state: BmsState::Off,
        }
    }

    /// Current supervisory state
    pub fn state(&self) -> BmsState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: BmsState) {
        self.state = state;
    }

    /// Update `full` and `empty` from the cell voltage extremes
    ///
    /// Full is set at the charge voltage limit and cleared below the
    /// overvoltage reset. Empty is set at the discharge voltage limit and
    /// cleared above the undervoltage reset.
    pub fn update_terminal_conditions(&mut self) {
        if self.data.cell_voltages.is_empty() {
            return;
        }

        let v = &self.conf.voltage;

        if self.data.cell_voltage_max >= v.cell_chg_voltage_limit {
            self.full = true;
        } else if self.data.cell_voltage_max < v.cell_ov_reset {
            self.full = false;
        }

        if self.data.cell_voltage_min <= v.cell_dis_voltage_limit {
            self.empty = true;
        } else if self.data.cell_voltage_min > v.cell_uv_reset {
            self.empty = false;
        }
    }

    /// State of charge (%) from the average cell voltage
    ///
    /// Only meaningful after the pack has rested. `None` if the chemistry
    /// has no OCV curve.
    pub fn soc_from_ocv(&self) -> Option<f32> {
        if self.data.cell_voltages.is_empty() {
            return None;
        }
        self.conf.ocv.soc(self.data.cell_voltage_avg)
    }
}
