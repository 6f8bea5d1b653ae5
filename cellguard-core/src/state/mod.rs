//! Supervisory state machine
//!
//! Decides once per control cycle which power path switches are closed.
//! The decision rules are a pluggable policy; the state itself is explicit,
//! finite, and deterministic.

pub mod machine;
pub mod policy;

pub use machine::{BmsState, Transition};
pub use policy::{run_cycle, DefaultPolicy, SupervisoryPolicy};
