//! Error flags
//!
//! Faults are reported as a sticky bitmask. The driver layer (or the
//! software [`FaultMonitor`](super::FaultMonitor)) sets and clears bits;
//! the protection logic only reads them.

use bitflags::bitflags;

bitflags! {
    /// Set of active fault conditions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ErrorFlags: u32 {
        /// Cell voltage below undervoltage limit
        const CELL_UNDERVOLTAGE = 1 << 0;
        /// Cell voltage above overvoltage limit
        const CELL_OVERVOLTAGE = 1 << 1;
        /// Discharge short circuit
        const SHORT_CIRCUIT = 1 << 2;
        /// Discharge current above limit
        const DIS_OVERCURRENT = 1 << 3;
        /// Charge current above limit
        const CHG_OVERCURRENT = 1 << 4;
        /// Cell sense wire disconnected
        const OPEN_WIRE = 1 << 5;
        /// Too cold to discharge
        const DIS_UNDERTEMP = 1 << 6;
        /// Too hot to discharge
        const DIS_OVERTEMP = 1 << 7;
        /// Too cold to charge
        const CHG_UNDERTEMP = 1 << 8;
        /// Too hot to charge
        const CHG_OVERTEMP = 1 << 9;
        /// Internal (IC or MOSFET) overtemperature
        const INT_OVERTEMP = 1 << 10;
        /// Cell failure, e.g. excessive voltage difference
        const CELL_FAILURE = 1 << 11;
        /// Discharge switched off by an earlier decision
        const DIS_OFF = 1 << 12;
        /// Charge switched off by an earlier decision
        const CHG_OFF = 1 << 13;
    }
}

impl ErrorFlags {
    /// Faults that prevent charging
    pub const CHARGE_FAULTS: Self = Self::CELL_OVERVOLTAGE
        .union(Self::CHG_OVERCURRENT)
        .union(Self::OPEN_WIRE)
        .union(Self::CHG_UNDERTEMP)
        .union(Self::CHG_OVERTEMP)
        .union(Self::INT_OVERTEMP)
        .union(Self::CELL_FAILURE)
        .union(Self::CHG_OFF);

    /// Faults that prevent discharging
    pub const DISCHARGE_FAULTS: Self = Self::CELL_UNDERVOLTAGE
        .union(Self::SHORT_CIRCUIT)
        .union(Self::DIS_OVERCURRENT)
        .union(Self::OPEN_WIRE)
        .union(Self::DIS_UNDERTEMP)
        .union(Self::DIS_OVERTEMP)
        .union(Self::INT_OVERTEMP)
        .union(Self::CELL_FAILURE)
        .union(Self::DIS_OFF);

    /// Faults that only clear when explicitly acknowledged
    pub const LATCHING: Self = Self::SHORT_CIRCUIT
        .union(Self::DIS_OVERCURRENT)
        .union(Self::CHG_OVERCURRENT);
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u32:#010x}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        assert_eq!(ErrorFlags::CELL_UNDERVOLTAGE.bits(), 0x0001);
        assert_eq!(ErrorFlags::OPEN_WIRE.bits(), 0x0020);
        assert_eq!(ErrorFlags::CHG_OFF.bits(), 0x2000);
        assert_eq!(ErrorFlags::all().bits(), 0x3fff);
    }

    #[test]
    fn test_path_independent_faults_in_both_groups() {
        let shared = ErrorFlags::OPEN_WIRE | ErrorFlags::INT_OVERTEMP | ErrorFlags::CELL_FAILURE;
        assert!(ErrorFlags::CHARGE_FAULTS.contains(shared));
        assert!(ErrorFlags::DISCHARGE_FAULTS.contains(shared));
        assert_eq!(
            ErrorFlags::CHARGE_FAULTS & ErrorFlags::DISCHARGE_FAULTS,
            shared
        );
    }

    #[test]
    fn test_groups_cover_all_flags() {
        assert_eq!(
            ErrorFlags::CHARGE_FAULTS | ErrorFlags::DISCHARGE_FAULTS,
            ErrorFlags::all()
        );
    }
}
