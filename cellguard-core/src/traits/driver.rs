//! Switch driver trait
//!
//! The only hardware seam of the protection logic. Measurements reach the
//! core through [`PackData`](crate::context::PackData); commands leave it
//! through this trait.

use crate::config::DriverCapabilities;

/// Power path switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Switch {
    /// Charge MOSFET
    Charge,
    /// Discharge MOSFET
    Discharge,
}

/// Trait for battery protection switch drivers
///
/// Implementations wrap a protection IC or plain GPIO-driven MOSFETs.
pub trait BmsDriver {
    /// Command a switch on or off
    ///
    /// Fire-and-forget: a switch that fails to follow shows up later as an
    /// error flag, not as an error here.
    fn set_switch(&mut self, switch: Switch, enabled: bool);

    /// Whether the hardware already emulates an ideal diode across an open
    /// switch
    fn has_builtin_diode_emulation(&self) -> bool;

    /// Whether the driver measures pack current
    fn has_current_monitoring(&self) -> bool;

    /// Both capabilities at once
    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            current_monitoring: self.has_current_monitoring(),
            ideal_diode: self.has_builtin_diode_emulation(),
        }
    }
}

impl<D: BmsDriver + ?Sized> BmsDriver for &mut D {
    fn set_switch(&mut self, switch: Switch, enabled: bool) {
        (**self).set_switch(switch, enabled)
    }

    fn has_builtin_diode_emulation(&self) -> bool {
        (**self).has_builtin_diode_emulation()
    }

    fn has_current_monitoring(&self) -> bool {
        (**self).has_current_monitoring()
    }
}
