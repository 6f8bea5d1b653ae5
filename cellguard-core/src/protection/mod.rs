//! Pack protection
//!
//! Error flags, the charge/discharge permission predicates, software fault
//! detection and balancing gating.

pub mod balancing;
pub mod flags;
pub mod monitor;
pub mod permission;

pub use balancing::BalancingGate;
pub use flags::ErrorFlags;
pub use monitor::FaultMonitor;
pub use permission::{charge_allowed, charge_fault, discharge_allowed, discharge_fault};
