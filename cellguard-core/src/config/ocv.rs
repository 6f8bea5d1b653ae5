//! Open-circuit voltage curves
//!
//! A relaxed cell's terminal voltage maps to its state of charge. The curve
//! is stored as cell voltage per 5% SoC step, from full (100%) down to
//! empty (0%).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::util::{interpolate, is_zeroed};

/// Number of points in every OCV curve
pub const OCV_POINTS: usize = 21;

const _: () = assert!(OCV_POINTS >= 2, "OCV curve needs at least one segment");

/// State of charge (%) for each OCV point
pub const SOC_POINTS: [f32; OCV_POINTS] = [
    100.0, 95.0, 90.0, 85.0, 80.0, 75.0, 70.0, 65.0, 60.0, 55.0, 50.0, 45.0, 40.0, 35.0, 30.0,
    25.0, 20.0, 15.0, 10.0, 5.0, 0.0,
];

/// Typical LiFePO4 cell OCV (V)
pub const OCV_LFP: [f32; OCV_POINTS] = [
    3.392, 3.314, 3.309, 3.308, 3.304, 3.296, 3.283, 3.275, 3.271, 3.268, 3.265, 3.264, 3.262,
    3.252, 3.240, 3.226, 3.213, 3.190, 3.177, 3.132, 2.833,
];

/// Typical NMC cell OCV (V)
pub const OCV_NMC: [f32; OCV_POINTS] = [
    4.198, 4.135, 4.089, 4.056, 4.026, 3.993, 3.962, 3.924, 3.883, 3.858, 3.838, 3.819, 3.803,
    3.787, 3.764, 3.745, 3.726, 3.702, 3.684, 3.588, 2.800,
];

/// OCV to state-of-charge lookup curve
///
/// `ocv_points` is non-increasing with index. An all-zero curve means no
/// curve is known for the selected chemistry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OcvCurve {
    /// Cell voltage (V) at each SoC point
    pub ocv_points: [f32; OCV_POINTS],
    /// State of charge (%) at each point
    pub soc_points: [f32; OCV_POINTS],
}

impl Default for OcvCurve {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl OcvCurve {
    /// Curve without voltage data
    pub const fn zeroed() -> Self {
        Self {
            ocv_points: [0.0; OCV_POINTS],
            soc_points: SOC_POINTS,
        }
    }

    /// Curve from voltage points on the standard SoC axis
    pub const fn from_ocv(ocv_points: [f32; OCV_POINTS]) -> Self {
        Self {
            ocv_points,
            soc_points: SOC_POINTS,
        }
    }

    /// Zero the voltage points
    pub fn clear(&mut self) {
        self.ocv_points = [0.0; OCV_POINTS];
    }

    /// Check if the curve carries voltage data
    pub fn is_populated(&self) -> bool {
        let mut bytes = [0u8; OCV_POINTS * 4];
        for (chunk, v) in bytes.chunks_exact_mut(4).zip(self.ocv_points.iter()) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        // OCV_POINTS * 4 is larger than a machine word
        !is_zeroed(&bytes).unwrap_or(true)
    }

    /// Estimate state of charge (%) from a relaxed cell voltage
    ///
    /// Returns `None` if the curve is not populated. Voltages outside the
    /// curve clamp to 0% or 100%.
    pub fn soc(&self, cell_voltage: f32) -> Option<f32> {
        if !self.is_populated() {
            return None;
        }
        interpolate(&self.ocv_points, &self.soc_points, cell_voltage).ok()
    }
}
