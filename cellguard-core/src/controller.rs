//! Control loop owner
//!
//! Binds one pack's context to its switch driver and supervisory policy.
//! The surrounding firmware refreshes measurements through
//! [`Controller::context_mut`] and calls [`Controller::run_cycle`] once per
//! control period.

use heapless::HistoryBuffer;

use crate::config::{build_configuration, CellChemistry, Configuration};
use crate::context::BmsContext;
use crate::state::{run_cycle, BmsState, DefaultPolicy, SupervisoryPolicy, Transition};
use crate::traits::{BmsDriver, Switch};

/// Number of transitions kept for diagnostics
pub const HISTORY_LEN: usize = 8;

/// Battery management controller
pub struct Controller<D, P = DefaultPolicy> {
    context: BmsContext,
    driver: D,
    policy: P,
    history: HistoryBuffer<Transition, HISTORY_LEN>,
}

impl<D: BmsDriver> Controller<D> {
    /// Create a controller for a built-in chemistry
    ///
    /// The configuration follows the driver's capabilities.
    pub fn new(driver: D, chemistry: CellChemistry, nominal_capacity_ah: f32) -> Self {
        let conf = build_configuration(chemistry, nominal_capacity_ah, driver.capabilities());
        Self::with_configuration(driver, conf)
    }

    /// Create a controller from a prepared configuration
    pub fn with_configuration(driver: D, conf: Configuration) -> Self {
        Self {
            context: BmsContext::new(conf),
            driver,
            policy: DefaultPolicy,
            history: HistoryBuffer::new(),
        }
    }
}

impl<D: BmsDriver, P: SupervisoryPolicy> Controller<D, P> {
    /// Replace the supervisory policy
    pub fn with_policy<Q: SupervisoryPolicy>(self, policy: Q) -> Controller<D, Q> {
        Controller {
            context: self.context,
            driver: self.driver,
            policy,
            history: self.history,
        }
    }

    /// Run one control cycle
    pub fn run_cycle(&mut self) -> Option<Transition> {
        let transition = run_cycle(&mut self.context, &mut self.driver, &mut self.policy)?;
        self.history.write(transition);
        Some(transition)
    }

    /// Open both switches and stay off until power cycle
    pub fn shutdown(&mut self) {
        self.driver.set_switch(Switch::Charge, false);
        self.driver.set_switch(Switch::Discharge, false);

        let from = self.context.state();
        if from.is_shutdown() {
            return;
        }

        self.context.set_state(BmsState::Shutdown);
        let transition = Transition {
            from,
            to: BmsState::Shutdown,
            error_flags: self.context.data.error_flags,
        };
        transition.log();
        self.history.write(transition);

        #[cfg(feature = "defmt")]
        defmt::warn!("BMS shutdown");
    }

    /// Current supervisory state
    pub fn state(&self) -> BmsState {
        self.context.state()
    }

    pub fn context(&self) -> &BmsContext {
        &self.context
    }

    /// Mutable context for refreshing measurements and manual enables
    pub fn context_mut(&mut self) -> &mut BmsContext {
        &mut self.context
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Recent transitions, oldest first
    pub fn history(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.history.oldest_ordered()
    }

    /// Most recent transition
    pub fn last_transition(&self) -> Option<&Transition> {
        self.history.recent()
    }

    /// State of charge (%) estimated from the resting cell voltage
    pub fn state_of_charge(&self) -> Option<f32> {
        self.context.soc_from_ocv()
    }

    /// Give back the driver
    pub fn release(self) -> D {
        self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverCapabilities;
    use crate::protection::ErrorFlags;

    #[derive(Default)]
    struct FakeDriver {
        charge: bool,
        discharge: bool,
        commands: usize,
    }

    impl BmsDriver for FakeDriver {
        fn set_switch(&mut self, switch: Switch, enabled: bool) {
            match switch {
                Switch::Charge => self.charge = enabled,
                Switch::Discharge => self.discharge = enabled,
            }
            self.commands += 1;
        }

        fn has_builtin_diode_emulation(&self) -> bool {
            false
        }

        fn has_current_monitoring(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_configuration_follows_driver() {
        let bms = Controller::new(FakeDriver::default(), CellChemistry::Lfp, 10.0);
        let conf = &bms.context().conf;

        assert_eq!(conf.voltage.cell_ov_limit, 3.80);
        assert_eq!(conf.current.map(|c| c.chg_oc_limit), Some(10.0));
        assert_eq!(bms.state(), BmsState::Off);
    }

    #[test]
    fn test_startup_sequence() {
        let mut bms = Controller::new(FakeDriver::default(), CellChemistry::Nmc, 5.0);

        // Discharge first, charge on the following cycle
        assert_eq!(bms.run_cycle().map(|t| t.to), Some(BmsState::Discharging));
        assert_eq!(bms.run_cycle().map(|t| t.to), Some(BmsState::Normal));
        assert_eq!(bms.run_cycle(), None);

        assert!(bms.driver().charge && bms.driver().discharge);
        assert_eq!(bms.history().count(), 2);
    }

    #[test]
    fn test_fault_and_recovery() {
        let mut bms = Controller::new(FakeDriver::default(), CellChemistry::Lfp, 10.0);
        bms.run_cycle();
        bms.run_cycle();

        bms.context_mut().data.error_flags = ErrorFlags::CELL_UNDERVOLTAGE;
        assert_eq!(bms.run_cycle().map(|t| t.to), Some(BmsState::Charging));
        assert!(!bms.driver().discharge);

        bms.context_mut().data.error_flags = ErrorFlags::empty();
        assert_eq!(bms.run_cycle().map(|t| t.to), Some(BmsState::Normal));

        let last = bms.last_transition().unwrap();
        assert_eq!((last.from, last.to), (BmsState::Charging, BmsState::Normal));
    }

    #[test]
    fn test_shutdown() {
        let mut bms = Controller::new(FakeDriver::default(), CellChemistry::Lfp, 10.0);
        bms.run_cycle();
        bms.run_cycle();

        bms.shutdown();
        assert_eq!(bms.state(), BmsState::Shutdown);
        assert!(!bms.driver().charge && !bms.driver().discharge);

        let commands = bms.driver().commands;
        assert_eq!(bms.run_cycle(), None);
        assert_eq!(bms.driver().commands, commands);
        assert_eq!(bms.state(), BmsState::Shutdown);

        // Second shutdown is not a transition
        bms.shutdown();
        assert_eq!(bms.history().filter(|t| t.to == BmsState::Shutdown).count(), 1);
    }

    #[test]
    fn test_history_keeps_latest() {
        let mut bms = Controller::new(FakeDriver::default(), CellChemistry::Lfp, 10.0);

        for i in 0..10 {
            let flags = if i % 2 == 0 {
                ErrorFlags::empty()
            } else {
                ErrorFlags::OPEN_WIRE
            };
            bms.context_mut().data.error_flags = flags;
            bms.run_cycle();
        }

        let history: Vec<_> = bms.history().copied().collect();
        assert_eq!(history.len(), HISTORY_LEN);
        assert_eq!(history.last(), bms.last_transition());
        assert_eq!(history.last().map(|t| t.to), Some(BmsState::Off));
    }

    #[test]
    fn test_state_of_charge() {
        let mut bms = Controller::new(FakeDriver::default(), CellChemistry::Lfp, 10.0);
        bms.context_mut().data.set_cell_voltages(&[2.833, 2.833]).unwrap();
        assert_eq!(bms.state_of_charge(), Some(0.0));
    }

    #[test]
    fn test_custom_configuration() {
        let caps = DriverCapabilities::default();
        let mut conf = build_configuration(CellChemistry::Custom, 20.0, caps);
        crate::config::apply_overrides(
            &mut conf,
            "[voltage]\n\
             cell_ov_limit = 3.65\n\
             cell_ov_reset = 3.45\n\
             cell_chg_voltage_limit = 3.60\n\
             cell_uv_limit = 2.50\n\
             cell_uv_reset = 3.00\n\
             cell_dis_voltage_limit = 2.80\n",
        )
        .unwrap();
        assert_eq!(conf.validate(), Ok(()));

        let mut bms = Controller::with_configuration(FakeDriver::default(), conf);
        bms.context_mut().data.set_cell_voltages(&[3.62]).unwrap();
        bms.context_mut().update_terminal_conditions();
        assert!(bms.context().full);

        bms.run_cycle();
        assert_eq!(bms.state(), BmsState::Discharging);
    }
}
