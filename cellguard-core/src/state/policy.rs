//! Supervisory policy
//!
//! A policy looks at the context once per cycle, issues switch commands and
//! names the state for the next cycle. Products that need different rules
//! replace [`DefaultPolicy`] with their own [`SupervisoryPolicy`].

use super::machine::{BmsState, Transition};
use crate::config::IdealDiodeConfig;
use crate::context::BmsContext;
use crate::protection::{charge_allowed, discharge_allowed};
use crate::traits::{BmsDriver, Switch};

/// Strategy deciding the next supervisory state
pub trait SupervisoryPolicy {
    /// Issue switch commands for this cycle and return the next state
    ///
    /// Never called while the context is in [`BmsState::Shutdown`].
    fn next_state<D: BmsDriver>(&mut self, ctx: &BmsContext, driver: &mut D) -> BmsState;
}

/// Run one control cycle
///
/// Applies the policy's decision to the context and returns the transition,
/// if the state changed. Every state change is logged at info level with the
/// error flags that caused it. A context in SHUTDOWN is left untouched.
pub fn run_cycle<D, P>(ctx: &mut BmsContext, driver: &mut D, policy: &mut P) -> Option<Transition>
where
    D: BmsDriver,
    P: SupervisoryPolicy,
{
    let from = ctx.state();
    if from.is_shutdown() {
        return None;
    }

    let to = policy.next_state(ctx, driver);
    if to == from {
        return None;
    }

    ctx.set_state(to);
    let transition = Transition {
        from,
        to,
        error_flags: ctx.data.error_flags,
    };
    transition.log();
    Some(transition)
}

/// Standard charge/discharge switching rules
///
/// Each state first checks whether its closed switches are still permitted,
/// then whether the other direction may be added. When a single direction is
/// enabled and the driver cannot emulate an ideal diode itself, the other
/// switch follows the current direction with the configured deadband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefaultPolicy;

impl SupervisoryPolicy for DefaultPolicy {
    fn next_state<D: BmsDriver>(&mut self, ctx: &BmsContext, driver: &mut D) -> BmsState {
        match ctx.state() {
            BmsState::Off => {
                if discharge_allowed(ctx) {
                    driver.set_switch(Switch::Discharge, true);
                    BmsState::Discharging
                } else if charge_allowed(ctx) {
                    driver.set_switch(Switch::Charge, true);
                    BmsState::Charging
                } else {
                    BmsState::Off
                }
            }
            BmsState::Charging => {
                if !charge_allowed(ctx) {
                    driver.set_switch(Switch::Charge, false);
                    driver.set_switch(Switch::Discharge, false);
                    BmsState::Off
                } else if discharge_allowed(ctx) {
                    driver.set_switch(Switch::Discharge, true);
                    BmsState::Normal
                } else {
                    if !driver.has_builtin_diode_emulation() {
                        // Discharge current flows while charging: positive
                        let current = ctx.data.current;
                        ideal_diode(driver, Switch::Discharge, current, &ctx.conf.ideal_diode);
                    }
                    BmsState::Charging
                }
            }
            BmsState::Discharging => {
                if !discharge_allowed(ctx) {
                    driver.set_switch(Switch::Discharge, false);
                    driver.set_switch(Switch::Charge, false);
                    BmsState::Off
                } else if charge_allowed(ctx) {
                    driver.set_switch(Switch::Charge, true);
                    BmsState::Normal
                } else {
                    if !driver.has_builtin_diode_emulation() {
                        let current = -ctx.data.current;
                        ideal_diode(driver, Switch::Charge, current, &ctx.conf.ideal_diode);
                    }
                    BmsState::Discharging
                }
            }
            BmsState::Normal => {
                if !discharge_allowed(ctx) {
                    driver.set_switch(Switch::Discharge, false);
                    BmsState::Charging
                } else if !charge_allowed(ctx) {
                    driver.set_switch(Switch::Charge, false);
                    BmsState::Discharging
                } else {
                    BmsState::Normal
                }
            }
            BmsState::Shutdown => BmsState::Shutdown,
        }
    }
}

/// Close or open `switch` depending on current through the body diode
///
/// `forward_current` is positive when current flows in the direction the
/// open switch's body diode conducts.
fn ideal_diode<D: BmsDriver>(
    driver: &mut D,
    switch: Switch,
    forward_current: f32,
    conf: &IdealDiodeConfig,
) {
    if forward_current > conf.on_current {
        driver.set_switch(switch, true);
        #[cfg(feature = "defmt")]
        defmt::debug!("ideal diode: {} on", switch);
    } else if forward_current < conf.off_current {
        driver.set_switch(switch, false);
        #[cfg(feature = "defmt")]
        defmt::debug!("ideal diode: {} off", switch);
    }
}
