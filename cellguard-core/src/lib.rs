//! Board-agnostic protection logic for the battery management unit
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Switch driver trait (the only hardware seam)
//! - Chemistry profiles, OCV curves and limits configuration
//! - Error flags, charge/discharge permission and software fault detection
//! - Supervisory state machine and the controller that runs it
//! - Lookup-table interpolation

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod context;
pub mod controller;
pub mod protection;
pub mod state;
pub mod traits;
pub mod util;

pub use config::{build_configuration, CellChemistry, Configuration, DriverCapabilities};
pub use context::{BmsContext, PackData, MAX_CELLS};
pub use controller::Controller;
pub use protection::{charge_allowed, discharge_allowed, BalancingGate, ErrorFlags, FaultMonitor};
pub use state::{BmsState, DefaultPolicy, SupervisoryPolicy, Transition};
pub use traits::{BmsDriver, SensorError, Switch, TemperatureSensor};
pub use util::interpolate;
