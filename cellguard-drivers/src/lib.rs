//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in cellguard-core:
//!
//! - Charge/discharge switches on plain GPIO pins
//! - Temperature sensors (NTC thermistor)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod sensor;
pub mod switch;
