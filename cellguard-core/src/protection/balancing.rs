//! Balancing gate
//!
//! Balancing only runs on a resting pack with a large enough cell voltage
//! spread. Selecting which cells to bleed is left to the driver.

use crate::config::Configuration;
use crate::context::PackData;

/// Tracks idle time and decides whether balancing may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BalancingGate {
    idle_ms: u32,
}

impl BalancingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `elapsed_ms` at the given pack current
    pub fn update(&mut self, conf: &Configuration, current: f32, elapsed_ms: u32) {
        let idle = conf.balancing.idle_current;
        if current < idle && current > -idle {
            self.idle_ms = self.idle_ms.saturating_add(elapsed_ms);
        } else {
            self.idle_ms = 0;
        }
    }

    /// Continuous idle time in whole seconds
    pub fn idle_seconds(&self) -> u32 {
        self.idle_ms / 1000
    }

    pub fn allowed(&self, conf: &Configuration, data: &PackData) -> bool {
        let b = &conf.balancing;
        self.idle_seconds() >= b.idle_delay_s
            && data.cell_voltage_max > b.cell_voltage_min
            && data.cell_voltage_max - data.cell_voltage_min > b.cell_voltage_diff
    }
}
