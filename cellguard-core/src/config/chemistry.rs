//! Cell chemistry profiles
//!
//! Each supported chemistry maps to one immutable record of per-cell
//! voltage thresholds and, where known, an OCV curve.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ocv::{OCV_LFP, OCV_NMC, OCV_POINTS};

/// Battery cell chemistry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellChemistry {
    /// Lithium iron phosphate (LiFePO4)
    Lfp,
    /// Lithium nickel manganese cobalt oxide
    Nmc,
    /// Lithium titanate
    Lto,
    /// Thresholds supplied by the caller
    Custom,
}

/// Per-cell voltage thresholds and OCV curve of one chemistry (V)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChemistryProfile {
    /// Cell overvoltage trip level
    pub cell_ov_limit: f32,
    /// Voltage at which charging is considered complete
    pub cell_chg_voltage_limit: f32,
    /// Overvoltage fault clears below this level
    pub cell_ov_reset: f32,
    /// Minimum cell voltage to allow balancing
    pub bal_cell_voltage_min: f32,
    /// Undervoltage fault clears above this level
    pub cell_uv_reset: f32,
    /// Voltage at which discharging is considered complete
    pub cell_dis_voltage_limit: f32,
    /// Cell undervoltage trip level
    pub cell_uv_limit: f32,
    /// OCV curve, if one is known
    pub ocv: Option<[f32; OCV_POINTS]>,
}

const LFP: ChemistryProfile = ChemistryProfile {
    cell_ov_limit: 3.80,
    cell_chg_voltage_limit: 3.55,
    cell_ov_reset: 3.40,
    bal_cell_voltage_min: 3.30,
    cell_uv_reset: 3.10,
    cell_dis_voltage_limit: 2.80,
    // Most cells survive 2.0 V, margin left for further self-discharge
    cell_uv_limit: 2.50,
    ocv: Some(OCV_LFP),
};

const NMC: ChemistryProfile = ChemistryProfile {
    cell_ov_limit: 4.25,
    cell_chg_voltage_limit: 4.20,
    cell_ov_reset: 4.05,
    bal_cell_voltage_min: 3.80,
    cell_uv_reset: 3.50,
    cell_dis_voltage_limit: 3.20,
    cell_uv_limit: 3.00,
    ocv: Some(OCV_NMC),
};

// TODO: add a typical LTO OCV curve once one has been characterised
const LTO: ChemistryProfile = ChemistryProfile {
    cell_ov_limit: 2.85,
    cell_chg_voltage_limit: 2.80,
    cell_ov_reset: 2.70,
    bal_cell_voltage_min: 2.50,
    cell_uv_reset: 2.10,
    cell_dis_voltage_limit: 2.00,
    cell_uv_limit: 1.90,
    ocv: None,
};

impl CellChemistry {
    /// Built-in profile, or `None` for [`CellChemistry::Custom`]
    pub const fn profile(self) -> Option<&'static ChemistryProfile> {
        match self {
            CellChemistry::Lfp => Some(&LFP),
            CellChemistry::Nmc => Some(&NMC),
            CellChemistry::Lto => Some(&LTO),
            CellChemistry::Custom => None,
        }
    }
}
