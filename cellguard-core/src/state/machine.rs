//! Supervisory state definition
//!
//! The state names which power path switches the controller has closed.
//! SHUTDOWN is absorbing: once entered, nothing leaves it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::protection::ErrorFlags;

/// Supervisory states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BmsState {
    /// Both switches open
    #[default]
    Off,
    /// Charge switch closed, discharge only through ideal diode emulation
    Charging,
    /// Discharge switch closed, charge only through ideal diode emulation
    Discharging,
    /// Both switches closed
    Normal,
    /// Both switches open until power cycle
    Shutdown,
}

impl BmsState {
    /// Short name used in transition logs
    pub fn as_str(&self) -> &'static str {
        match self {
            BmsState::Off => "OFF",
            BmsState::Charging => "CHG",
            BmsState::Discharging => "DIS",
            BmsState::Normal => "NORMAL",
            BmsState::Shutdown => "SHUTDOWN",
        }
    }

    /// Check if the state keeps the charge switch closed
    pub fn charge_enabled(&self) -> bool {
        matches!(self, BmsState::Charging | BmsState::Normal)
    }

    /// Check if the state keeps the discharge switch closed
    ///
    /// Ideal diode emulation may still close the other switch briefly.
    pub fn discharge_enabled(&self) -> bool {
        matches!(self, BmsState::Discharging | BmsState::Normal)
    }

    /// Check if this is the absorbing shutdown state
    pub fn is_shutdown(&self) -> bool {
        matches!(self, BmsState::Shutdown)
    }
}

/// Record of one state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transition {
    pub from: BmsState,
    pub to: BmsState,
    /// Error flags at the time of the change
    pub error_flags: ErrorFlags,
}

impl Transition {
    /// Emit the transition at info level
    pub(crate) fn log(&self) {
        #[cfg(feature = "defmt")]
        defmt::info!(
            "{=str} -> {=str} (error flags: {})",
            self.from.as_str(),
            self.to.as_str(),
            self.error_flags
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_sets() {
        assert!(!BmsState::Off.charge_enabled());
        assert!(!BmsState::Off.discharge_enabled());
        assert!(BmsState::Charging.charge_enabled());
        assert!(!BmsState::Charging.discharge_enabled());
        assert!(!BmsState::Discharging.charge_enabled());
        assert!(BmsState::Discharging.discharge_enabled());
        assert!(BmsState::Normal.charge_enabled());
        assert!(BmsState::Normal.discharge_enabled());
        assert!(!BmsState::Shutdown.charge_enabled());
        assert!(!BmsState::Shutdown.discharge_enabled());
    }

    #[test]
    fn test_log_names() {
        assert_eq!(BmsState::Off.as_str(), "OFF");
        assert_eq!(BmsState::Discharging.as_str(), "DIS");
        assert_eq!(BmsState::default(), BmsState::Off);
        assert!(BmsState::Shutdown.is_shutdown());
    }
}
