//! GPIO switch driver
//!
//! Charge and discharge MOSFETs driven directly from two GPIO pins, for
//! boards without a protection IC controlling the switches.

use cellguard_core::config::DriverCapabilities;
use cellguard_core::traits::{BmsDriver, Switch};
use embedded_hal::digital::{OutputPin, PinState};

/// Pin polarity and capabilities of a GPIO switch board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioSwitchConfig {
    /// Charge switch is on when its pin is LOW
    pub charge_active_low: bool,
    /// Discharge switch is on when its pin is LOW
    pub discharge_active_low: bool,
    /// What the rest of the board can do
    pub capabilities: DriverCapabilities,
}

/// Charge and discharge switches on two GPIO pins
pub struct GpioSwitches<C, D> {
    charge: C,
    discharge: D,
    config: GpioSwitchConfig,
    charge_on: bool,
    discharge_on: bool,
    pin_errors: u32,
}

impl<C: OutputPin, D: OutputPin> GpioSwitches<C, D> {
    /// Create the driver with both switches off
    pub fn new(charge: C, discharge: D, config: GpioSwitchConfig) -> Self {
        let mut switches = Self {
            charge,
            discharge,
            config,
            charge_on: false,
            discharge_on: false,
            pin_errors: 0,
        };
        switches.set_switch(Switch::Charge, false);
        switches.set_switch(Switch::Discharge, false);
        switches
    }

    /// Last commanded state of a switch
    pub fn is_on(&self, switch: Switch) -> bool {
        match switch {
            Switch::Charge => self.charge_on,
            Switch::Discharge => self.discharge_on,
        }
    }

    /// Number of failed pin writes since creation
    pub fn pin_errors(&self) -> u32 {
        self.pin_errors
    }

    /// Release the pins
    pub fn release(self) -> (C, D) {
        (self.charge, self.discharge)
    }
}

impl<C: OutputPin, D: OutputPin> BmsDriver for GpioSwitches<C, D> {
    fn set_switch(&mut self, switch: Switch, enabled: bool) {
        let result = match switch {
            Switch::Charge => {
                self.charge_on = enabled;
                let level = PinState::from(enabled != self.config.charge_active_low);
                self.charge.set_state(level).is_ok()
            }
            Switch::Discharge => {
                self.discharge_on = enabled;
                let level = PinState::from(enabled != self.config.discharge_active_low);
                self.discharge.set_state(level).is_ok()
            }
        };

        if !result {
            self.pin_errors = self.pin_errors.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("switch pin write failed: {}", switch);
        }
    }

    fn has_builtin_diode_emulation(&self) -> bool {
        self.config.capabilities.ideal_diode
    }

    fn has_current_monitoring(&self) -> bool {
        self.config.capabilities.current_monitoring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellguard_core::config::CellChemistry;
    use cellguard_core::protection::FaultMonitor;
    use cellguard_core::state::BmsState;
    use cellguard_core::Controller;
    use embedded_hal::digital::{Error, ErrorKind, ErrorType};

    #[derive(Debug)]
    struct MockError;

    impl Error for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Mock GPIO pin for testing
    struct MockPin {
        high: bool,
        broken: bool,
    }

    impl MockPin {
        fn new() -> Self {
            Self {
                high: false,
                broken: false,
            }
        }

        fn broken() -> Self {
            Self {
                high: false,
                broken: true,
            }
        }
    }

    impl ErrorType for MockPin {
        type Error = MockError;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), MockError> {
            if self.broken {
                return Err(MockError);
            }
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), MockError> {
            if self.broken {
                return Err(MockError);
            }
            self.high = true;
            Ok(())
        }
    }

    fn monitored() -> GpioSwitchConfig {
        GpioSwitchConfig {
            capabilities: DriverCapabilities {
                current_monitoring: true,
                ideal_diode: false,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_active_high_switches() {
        let mut switches = GpioSwitches::new(MockPin::new(), MockPin::new(), monitored());

        // Initially off
        assert!(!switches.is_on(Switch::Charge));
        assert!(!switches.charge.high && !switches.discharge.high);

        switches.set_switch(Switch::Discharge, true);
        assert!(switches.is_on(Switch::Discharge));
        assert!(switches.discharge.high);
        assert!(!switches.charge.high);
    }

    #[test]
    fn test_active_low_charge_pin() {
        let config = GpioSwitchConfig {
            charge_active_low: true,
            ..monitored()
        };
        let mut switches = GpioSwitches::new(MockPin::new(), MockPin::new(), config);

        // Off means high for active-low
        assert!(switches.charge.high);
        assert!(!switches.discharge.high);

        switches.set_switch(Switch::Charge, true);
        assert!(!switches.charge.high);
        assert!(switches.is_on(Switch::Charge));
    }

    #[test]
    fn test_pin_errors_are_counted() {
        let mut switches = GpioSwitches::new(MockPin::broken(), MockPin::new(), monitored());
        assert_eq!(switches.pin_errors(), 1);

        switches.set_switch(Switch::Charge, true);
        switches.set_switch(Switch::Discharge, true);
        assert_eq!(switches.pin_errors(), 2);
        // Commanded state is remembered even if the pin did not follow
        assert!(switches.is_on(Switch::Charge));
    }

    #[test]
    fn test_capabilities() {
        let switches = GpioSwitches::new(MockPin::new(), MockPin::new(), monitored());
        let caps = switches.capabilities();
        assert!(caps.current_monitoring);
        assert!(!caps.ideal_diode);
    }

    type Bms = Controller<GpioSwitches<MockPin, MockPin>>;

    /// One control period: measure, detect faults, decide
    fn refresh(bms: &mut Bms, monitor: &mut FaultMonitor, cells: &[f32], current: f32) {
        let ctx = bms.context_mut();
        ctx.data.set_cell_voltages(cells).unwrap();
        ctx.data.current = current;
        ctx.data.set_cell_temperatures(25.0, 25.0);
        ctx.data.error_flags = monitor.update(&ctx.conf, &ctx.data, 100);
        ctx.update_terminal_conditions();
        bms.run_cycle();
    }

    #[test]
    fn test_controller_with_fault_monitor() {
        let switches = GpioSwitches::new(MockPin::new(), MockPin::new(), monitored());
        let mut bms = Controller::new(switches, CellChemistry::Lfp, 10.0);
        let mut monitor = FaultMonitor::new();

        refresh(&mut bms, &mut monitor, &[3.30, 3.30, 3.30, 3.30], 0.0);
        refresh(&mut bms, &mut monitor, &[3.30, 3.30, 3.30, 3.30], 0.0);
        assert_eq!(bms.state(), BmsState::Normal);
        assert!(bms.driver().is_on(Switch::Charge));
        assert!(bms.driver().is_on(Switch::Discharge));

        // Short circuit: discharge path opens, charging stays possible
        refresh(&mut bms, &mut monitor, &[3.20, 3.20, 3.20, 3.20], -30.0);
        assert_eq!(bms.state(), BmsState::Charging);
        assert!(!bms.driver().is_on(Switch::Discharge));

        // Latched until acknowledged
        refresh(&mut bms, &mut monitor, &[3.30, 3.30, 3.30, 3.30], 0.0);
        assert_eq!(bms.state(), BmsState::Charging);

        monitor.clear_latched();
        refresh(&mut bms, &mut monitor, &[3.30, 3.30, 3.30, 3.30], 0.0);
        assert_eq!(bms.state(), BmsState::Normal);

        bms.shutdown();
        let switches = bms.release();
        let (charge, discharge) = switches.release();
        assert!(!charge.high && !discharge.high);
    }
}
