//! Software fault monitor
//!
//! Derives the measurable error flags from pack data for drivers without
//! hardware protection. Voltage and temperature faults clear with
//! hysteresis; current faults latch until acknowledged.

use super::flags::ErrorFlags;
use crate::config::Configuration;
use crate::context::PackData;

/// Faults the monitor can produce
pub const MONITORED: ErrorFlags = ErrorFlags::CELL_UNDERVOLTAGE
    .union(ErrorFlags::CELL_OVERVOLTAGE)
    .union(ErrorFlags::SHORT_CIRCUIT)
    .union(ErrorFlags::DIS_OVERCURRENT)
    .union(ErrorFlags::CHG_OVERCURRENT)
    .union(ErrorFlags::DIS_UNDERTEMP)
    .union(ErrorFlags::DIS_OVERTEMP)
    .union(ErrorFlags::CHG_UNDERTEMP)
    .union(ErrorFlags::CHG_OVERTEMP);

/// Time a trip condition has been continuously present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct TripTimer {
    elapsed_ms: u32,
}

impl TripTimer {
    /// Advance the timer, returns true once the condition held for `delay_ms`
    fn expired(&mut self, condition: bool, elapsed_ms: u32, delay_ms: u32) -> bool {
        if condition {
            self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
            self.elapsed_ms >= delay_ms
        } else {
            self.elapsed_ms = 0;
            false
        }
    }
}

/// Software fault detection
#[derive(Debug, Clone, Default)]
pub struct FaultMonitor {
    flags: ErrorFlags,
    ov_timer: TripTimer,
    uv_timer: TripTimer,
    chg_oc_timer: TripTimer,
    dis_oc_timer: TripTimer,
}

impl FaultMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one set of measurements
    ///
    /// # Arguments
    /// - `elapsed_ms`: Time since the previous update
    pub fn update(
        &mut self,
        conf: &Configuration,
        data: &PackData,
        elapsed_ms: u32,
    ) -> ErrorFlags {
        if !data.cell_voltages.is_empty() {
            let v = &conf.voltage;

            let ov = self.ov_timer.expired(
                data.cell_voltage_max > v.cell_ov_limit,
                elapsed_ms,
                v.cell_ov_delay_ms,
            );
            let ov_clear = data.cell_voltage_max < v.cell_ov_reset;
            track(&mut self.flags, ErrorFlags::CELL_OVERVOLTAGE, ov, ov_clear);

            let uv = self.uv_timer.expired(
                data.cell_voltage_min < v.cell_uv_limit,
                elapsed_ms,
                v.cell_uv_delay_ms,
            );
            let uv_clear = data.cell_voltage_min > v.cell_uv_reset;
            track(&mut self.flags, ErrorFlags::CELL_UNDERVOLTAGE, uv, uv_clear);
        }

        if let Some(c) = &conf.current {
            let discharge = -data.current;

            let chg_oc = self.chg_oc_timer.expired(
                data.current > c.chg_oc_limit,
                elapsed_ms,
                c.chg_oc_delay_ms,
            );
            let dis_oc = self.dis_oc_timer.expired(
                discharge > c.dis_oc_limit,
                elapsed_ms,
                c.dis_oc_delay_ms,
            );

            // Latching, only clear_latched() removes these
            track(&mut self.flags, ErrorFlags::CHG_OVERCURRENT, chg_oc, false);
            track(&mut self.flags, ErrorFlags::DIS_OVERCURRENT, dis_oc, false);
            let sc = discharge > c.dis_sc_limit;
            track(&mut self.flags, ErrorFlags::SHORT_CIRCUIT, sc, false);
        }

        let t = &conf.temperature;
        let hyst = t.hysteresis;
        track(
            &mut self.flags,
            ErrorFlags::CHG_UNDERTEMP,
            data.cell_temp_min < t.chg_ut_limit,
            data.cell_temp_min > t.chg_ut_limit + hyst,
        );
        track(
            &mut self.flags,
            ErrorFlags::CHG_OVERTEMP,
            data.cell_temp_max > t.chg_ot_limit,
            data.cell_temp_max < t.chg_ot_limit - hyst,
        );
        track(
            &mut self.flags,
            ErrorFlags::DIS_UNDERTEMP,
            data.cell_temp_min < t.dis_ut_limit,
            data.cell_temp_min > t.dis_ut_limit + hyst,
        );
        track(
            &mut self.flags,
            ErrorFlags::DIS_OVERTEMP,
            data.cell_temp_max > t.dis_ot_limit,
            data.cell_temp_max < t.dis_ot_limit - hyst,
        );

        self.flags
    }

    /// Faults currently detected
    pub fn flags(&self) -> ErrorFlags {
        self.flags
    }

    /// Acknowledge latched current faults
    pub fn clear_latched(&mut self) {
        self.flags.remove(ErrorFlags::LATCHING);
        self.chg_oc_timer = TripTimer::default();
        self.dis_oc_timer = TripTimer::default();
    }
}

fn track(flags: &mut ErrorFlags, flag: ErrorFlags, trip: bool, clear: bool) {
    if flags.contains(flag) {
        if clear {
            flags.remove(flag);
            #[cfg(feature = "defmt")]
            defmt::info!("fault cleared: {}", flag);
        }
    } else if trip {
        flags.insert(flag);
        #[cfg(feature = "defmt")]
        defmt::warn!("fault set: {}", flag);
    }
}
