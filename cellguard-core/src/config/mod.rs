//! Configuration types
//!
//! Chemistry profiles, OCV curves and the limits configuration built from
//! them.

pub mod chemistry;
pub mod ocv;
pub mod overlay;
pub mod types;

pub use chemistry::{CellChemistry, ChemistryProfile};
pub use ocv::{OcvCurve, OCV_POINTS, SOC_POINTS};
pub use overlay::{apply_overrides, ParseError};
pub use types::*;
