//! Configuration type definitions
//!
//! The limits configuration is built once from a chemistry selection and
//! is read-only while the controller runs. Re-selecting a chemistry
//! overwrites the chemistry block and the OCV curve wholesale.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::chemistry::CellChemistry;
use super::ocv::OcvCurve;
use crate::protection::ErrorFlags;

/// Default time without current flow before balancing may start (s)
pub const DEFAULT_BAL_IDLE_DELAY_S: u32 = 1800;

/// Default overcurrent trip delay (ms)
pub const DEFAULT_OC_DELAY_MS: u32 = 320;

/// Default short circuit trip delay (µs)
pub const DEFAULT_SC_DELAY_US: u32 = 200;

/// Default cell voltage trip delay (ms)
pub const DEFAULT_CELL_VOLTAGE_DELAY_MS: u32 = 2000;

/// Capabilities reported by the switch driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverCapabilities {
    /// Driver can measure current and enforce current limits
    pub current_monitoring: bool,
    /// Driver emulates an ideal diode across the open switch in hardware
    pub ideal_diode: bool,
}

/// Per-cell voltage limits (V) and trip delays
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoltageLimits {
    pub cell_ov_limit: f32,
    pub cell_ov_reset: f32,
    pub cell_chg_voltage_limit: f32,
    pub cell_uv_limit: f32,
    pub cell_uv_reset: f32,
    pub cell_dis_voltage_limit: f32,
    pub cell_ov_delay_ms: u32,
    pub cell_uv_delay_ms: u32,
}

/// Balancing gate parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BalancingConfig {
    /// Minimum cell voltage to allow balancing (V)
    pub cell_voltage_min: f32,
    /// Current below which the pack counts as idle (A)
    pub idle_current: f32,
    /// Idle time before balancing may start (s)
    pub idle_delay_s: u32,
    /// Cell voltage spread that triggers balancing (V)
    pub cell_voltage_diff: f32,
}

/// Current limits, only present if the driver monitors current
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurrentLimits {
    pub dis_oc_limit: f32,
    pub dis_oc_delay_ms: u32,
    pub chg_oc_limit: f32,
    pub chg_oc_delay_ms: u32,
    pub dis_sc_limit: f32,
    pub dis_sc_delay_us: u32,
}

impl CurrentLimits {
    /// Limits derived from nominal capacity
    ///
    /// 1C is safe for all supported chemistries; short circuit trips at 2C.
    pub fn for_capacity(nominal_capacity_ah: f32) -> Self {
        Self {
            dis_oc_limit: nominal_capacity_ah,
            dis_oc_delay_ms: DEFAULT_OC_DELAY_MS,
            chg_oc_limit: nominal_capacity_ah,
            chg_oc_delay_ms: DEFAULT_OC_DELAY_MS,
            dis_sc_limit: nominal_capacity_ah * 2.0,
            dis_sc_delay_us: DEFAULT_SC_DELAY_US,
        }
    }
}

/// Temperature limits (°C)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemperatureLimits {
    pub dis_ut_limit: f32,
    pub dis_ot_limit: f32,
    pub chg_ut_limit: f32,
    pub chg_ot_limit: f32,
    /// Margin a temperature must recover by before its fault clears
    pub hysteresis: f32,
}

impl Default for TemperatureLimits {
    fn default() -> Self {
        Self {
            dis_ut_limit: -20.0,
            dis_ot_limit: 45.0,
            // Lithium cells must not be charged below freezing
            chg_ut_limit: 0.0,
            chg_ot_limit: 45.0,
            hysteresis: 5.0,
        }
    }
}

/// Current deadband for ideal diode emulation (A)
///
/// Used when the driver lacks built-in ideal diode control. The disabled
/// switch is closed once current flows in its direction above `on_current`
/// and opened again below `off_current`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdealDiodeConfig {
    pub on_current: f32,
    pub off_current: f32,
}

impl Default for IdealDiodeConfig {
    fn default() -> Self {
        Self {
            on_current: 0.5,
            off_current: 0.1,
        }
    }
}

/// Complete limits configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Configuration {
    /// Selected chemistry
    pub chemistry: CellChemistry,
    /// Nominal pack capacity (Ah)
    pub nominal_capacity_ah: f32,
    pub voltage: VoltageLimits,
    pub balancing: BalancingConfig,
    /// `None` if the driver cannot monitor current
    pub current: Option<CurrentLimits>,
    pub temperature: TemperatureLimits,
    pub ideal_diode: IdealDiodeConfig,
    /// Errors that should raise an alert
    pub alert_mask: ErrorFlags,
    /// OCV curve, zeroed if the chemistry has none
    pub ocv: OcvCurve,
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A cell voltage limit is zero or negative
    VoltageLimitUnset,
    /// Overvoltage reset is not below the overvoltage limit
    OvervoltageHysteresis,
    /// Undervoltage reset is not above the undervoltage limit
    UndervoltageHysteresis,
    /// Charge voltage limit exceeds the overvoltage limit
    ChargeVoltageLimit,
    /// Discharge voltage limit is below the undervoltage limit
    DischargeVoltageLimit,
    /// Temperature limit not finite, under-temperature not below
    /// over-temperature, or negative hysteresis
    TemperatureLimits,
    /// Current limits are zero or negative
    CurrentLimits,
    /// Ideal diode off threshold not below on threshold
    IdealDiodeDeadband,
    /// OCV points not finite or rising with the index
    OcvCurve,
}

/// Build a configuration for a chemistry and capacity
///
/// Universal defaults are set first, then the chemistry's voltage
/// thresholds and OCV curve, then current limits if the driver monitors
/// current. The alert mask defaults to all error kinds.
///
/// [`CellChemistry::Custom`] leaves every voltage threshold at zero. Such a
/// configuration trips on every reading until the caller fills it in, e.g.
/// with [`apply_overrides`](super::apply_overrides); check it with
/// [`Configuration::validate`].
pub fn build_configuration(
    chemistry: CellChemistry,
    nominal_capacity_ah: f32,
    capabilities: DriverCapabilities,
) -> Configuration {
    let mut conf = Configuration::with_defaults(nominal_capacity_ah);

    conf.select_chemistry(chemistry);

    if capabilities.current_monitoring {
        conf.current = Some(CurrentLimits::for_capacity(nominal_capacity_ah));
    }

    conf.alert_mask = ErrorFlags::all();
    conf
}

impl Configuration {
    /// Universal defaults without any chemistry-specific values
    pub fn with_defaults(nominal_capacity_ah: f32) -> Self {
        Self {
            chemistry: CellChemistry::Custom,
            nominal_capacity_ah,
            voltage: VoltageLimits {
                cell_ov_delay_ms: DEFAULT_CELL_VOLTAGE_DELAY_MS,
                cell_uv_delay_ms: DEFAULT_CELL_VOLTAGE_DELAY_MS,
                ..VoltageLimits::default()
            },
            balancing: BalancingConfig {
                cell_voltage_min: 0.0,
                idle_current: 0.1,
                idle_delay_s: DEFAULT_BAL_IDLE_DELAY_S,
                cell_voltage_diff: 0.01,
            },
            current: None,
            temperature: TemperatureLimits::default(),
            ideal_diode: IdealDiodeConfig::default(),
            alert_mask: ErrorFlags::all(),
            ocv: OcvCurve::zeroed(),
        }
    }

    /// Select a chemistry, overwriting its thresholds and the OCV curve
    ///
    /// The OCV curve is zeroed first. For [`CellChemistry::Custom`] the
    /// voltage thresholds keep their current values.
    pub fn select_chemistry(&mut self, chemistry: CellChemistry) {
        self.chemistry = chemistry;
        self.ocv.clear();

        let Some(profile) = chemistry.profile() else {
            return;
        };

        self.voltage.cell_ov_limit = profile.cell_ov_limit;
        self.voltage.cell_chg_voltage_limit = profile.cell_chg_voltage_limit;
        self.voltage.cell_ov_reset = profile.cell_ov_reset;
        self.balancing.cell_voltage_min = profile.bal_cell_voltage_min;
        self.voltage.cell_uv_reset = profile.cell_uv_reset;
        self.voltage.cell_dis_voltage_limit = profile.cell_dis_voltage_limit;
        self.voltage.cell_uv_limit = profile.cell_uv_limit;

        if let Some(points) = profile.ocv {
            self.ocv = OcvCurve::from_ocv(points);
        }
    }

    /// Check the limits for consistency
    ///
    /// Built-in chemistries always pass. Use this after filling in a
    /// custom configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.voltage;

        let limits = [
            v.cell_ov_limit,
            v.cell_ov_reset,
            v.cell_chg_voltage_limit,
            v.cell_uv_limit,
            v.cell_uv_reset,
            v.cell_dis_voltage_limit,
        ];
        // Written as !(x > 0) so NaN is rejected too
        if limits.iter().any(|&x| !(x > 0.0)) {
            return Err(ConfigError::VoltageLimitUnset);
        }
        if v.cell_ov_reset >= v.cell_ov_limit {
            return Err(ConfigError::OvervoltageHysteresis);
        }
        if v.cell_uv_reset <= v.cell_uv_limit {
            return Err(ConfigError::UndervoltageHysteresis);
        }
        if v.cell_chg_voltage_limit > v.cell_ov_limit {
            return Err(ConfigError::ChargeVoltageLimit);
        }
        if v.cell_dis_voltage_limit < v.cell_uv_limit {
            return Err(ConfigError::DischargeVoltageLimit);
        }

        let t = &self.temperature;
        let temperatures = [
            t.dis_ut_limit,
            t.dis_ot_limit,
            t.chg_ut_limit,
            t.chg_ot_limit,
            t.hysteresis,
        ];
        let finite = temperatures.iter().all(|x| x.is_finite());
        let ordered = t.dis_ut_limit < t.dis_ot_limit && t.chg_ut_limit < t.chg_ot_limit;
        if !finite || !ordered || t.hysteresis < 0.0 {
            return Err(ConfigError::TemperatureLimits);
        }

        if let Some(c) = &self.current {
            if !(c.dis_oc_limit > 0.0 && c.chg_oc_limit > 0.0 && c.dis_sc_limit > 0.0) {
                return Err(ConfigError::CurrentLimits);
            }
        }

        if !(self.ideal_diode.off_current < self.ideal_diode.on_current) {
            return Err(ConfigError::IdealDiodeDeadband);
        }

        // An all-zero curve means none is known
        if self.ocv.is_populated() {
            let points = &self.ocv.ocv_points;
            let finite = points.iter().all(|v| v.is_finite());
            if !finite || points.windows(2).any(|w| w[0] < w[1]) {
                return Err(ConfigError::OcvCurve);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ocv::{OCV_LFP, OCV_POINTS};

    const MONITORED: DriverCapabilities = DriverCapabilities {
        current_monitoring: true,
        ideal_diode: false,
    };

    #[test]
    fn test_lfp_configuration() {
        let conf = build_configuration(CellChemistry::Lfp, 10.0, MONITORED);

        assert_eq!(conf.voltage.cell_ov_limit, 3.80);
        assert_eq!(conf.voltage.cell_uv_limit, 2.50);
        assert_eq!(conf.balancing.cell_voltage_min, 3.30);

        let current = conf.current.unwrap();
        assert_eq!(current.chg_oc_limit, 10.0);
        assert_eq!(current.dis_oc_limit, 10.0);
        assert_eq!(current.dis_sc_limit, 20.0);
        assert_eq!(current.chg_oc_delay_ms, 320);
        assert_eq!(current.dis_sc_delay_us, 200);

        assert_eq!(conf.ocv.ocv_points[0], 3.392);
        assert_eq!(conf.ocv.ocv_points[OCV_POINTS - 1], 2.833);
        assert_eq!(conf.alert_mask, ErrorFlags::all());
        assert_eq!(conf.validate(), Ok(()));
    }

    #[test]
    fn test_universal_defaults() {
        let conf = build_configuration(CellChemistry::Nmc, 50.0, MONITORED);

        assert_eq!(conf.balancing.idle_delay_s, 1800);
        assert_eq!(conf.balancing.idle_current, 0.1);
        assert_eq!(conf.balancing.cell_voltage_diff, 0.01);
        assert_eq!(conf.temperature.dis_ut_limit, -20.0);
        assert_eq!(conf.temperature.dis_ot_limit, 45.0);
        assert_eq!(conf.temperature.chg_ut_limit, 0.0);
        assert_eq!(conf.temperature.chg_ot_limit, 45.0);
        assert_eq!(conf.temperature.hysteresis, 5.0);
        assert_eq!(conf.voltage.cell_ov_delay_ms, 2000);
        assert_eq!(conf.voltage.cell_uv_delay_ms, 2000);
    }

    #[test]
    fn test_no_current_block_without_monitoring() {
        let conf = build_configuration(CellChemistry::Lfp, 10.0, DriverCapabilities::default());
        assert!(conf.current.is_none());
    }

    #[test]
    fn test_lto_and_custom_have_no_curve() {
        let lto = build_configuration(CellChemistry::Lto, 10.0, MONITORED);
        assert_eq!(lto.voltage.cell_ov_limit, 2.85);
        assert!(!lto.ocv.is_populated());

        let custom = build_configuration(CellChemistry::Custom, 10.0, MONITORED);
        assert_eq!(custom.voltage.cell_ov_limit, 0.0);
        assert_eq!(custom.voltage.cell_uv_limit, 0.0);
        assert!(!custom.ocv.is_populated());
        assert_eq!(custom.validate(), Err(ConfigError::VoltageLimitUnset));
    }

    #[test]
    fn test_reselect_overwrites_curve() {
        let mut conf = build_configuration(CellChemistry::Lfp, 10.0, MONITORED);
        assert_eq!(conf.ocv.ocv_points, OCV_LFP);

        conf.select_chemistry(CellChemistry::Lto);
        assert!(!conf.ocv.is_populated());
        assert_eq!(conf.voltage.cell_ov_limit, 2.85);

        // Custom keeps whatever thresholds are already there
        conf.select_chemistry(CellChemistry::Custom);
        assert_eq!(conf.chemistry, CellChemistry::Custom);
        assert_eq!(conf.voltage.cell_ov_limit, 2.85);
        assert!(!conf.ocv.is_populated());
    }

    #[test]
    fn test_validate_rejects_inverted_hysteresis() {
        let mut conf = build_configuration(CellChemistry::Nmc, 10.0, MONITORED);
        conf.voltage.cell_ov_reset = conf.voltage.cell_ov_limit;
        assert_eq!(conf.validate(), Err(ConfigError::OvervoltageHysteresis));

        let mut conf = build_configuration(CellChemistry::Nmc, 10.0, MONITORED);
        conf.voltage.cell_uv_reset = 2.9;
        assert_eq!(conf.validate(), Err(ConfigError::UndervoltageHysteresis));

        let mut conf = build_configuration(CellChemistry::Nmc, 10.0, MONITORED);
        conf.ideal_diode.off_current = 0.5;
        assert_eq!(conf.validate(), Err(ConfigError::IdealDiodeDeadband));

        let mut conf = build_configuration(CellChemistry::Nmc, 10.0, MONITORED);
        conf.temperature.chg_ut_limit = 50.0;
        assert_eq!(conf.validate(), Err(ConfigError::TemperatureLimits));
    }

    #[test]
    fn test_validate_rejects_nan_temperature() {
        let mut conf = build_configuration(CellChemistry::Lfp, 10.0, MONITORED);
        conf.temperature.dis_ot_limit = f32::NAN;
        conf.temperature.chg_ot_limit = f32::NAN;
        assert_eq!(conf.validate(), Err(ConfigError::TemperatureLimits));

        let mut conf = build_configuration(CellChemistry::Lfp, 10.0, MONITORED);
        conf.temperature.hysteresis = f32::NAN;
        assert_eq!(conf.validate(), Err(ConfigError::TemperatureLimits));

        let mut conf = build_configuration(CellChemistry::Lfp, 10.0, MONITORED);
        conf.temperature.chg_ot_limit = f32::INFINITY;
        assert_eq!(conf.validate(), Err(ConfigError::TemperatureLimits));
    }

    #[test]
    fn test_validate_checks_ocv_curve() {
        for chemistry in [CellChemistry::Lfp, CellChemistry::Nmc, CellChemistry::Lto] {
            let conf = build_configuration(chemistry, 10.0, MONITORED);
            assert_eq!(conf.validate(), Ok(()));
        }

        // Curve entered empty-to-full
        let mut reversed = OCV_LFP;
        reversed.reverse();
        let mut conf = build_configuration(CellChemistry::Lfp, 10.0, MONITORED);
        conf.ocv = OcvCurve::from_ocv(reversed);
        assert_eq!(conf.validate(), Err(ConfigError::OcvCurve));

        let mut conf = build_configuration(CellChemistry::Lfp, 10.0, MONITORED);
        conf.ocv.ocv_points[10] = f32::NAN;
        assert_eq!(conf.validate(), Err(ConfigError::OcvCurve));

        // Flat stretches are fine
        let mut conf = build_configuration(CellChemistry::Lfp, 10.0, MONITORED);
        conf.ocv.ocv_points[11] = conf.ocv.ocv_points[10];
        assert_eq!(conf.validate(), Ok(()));
    }
}
