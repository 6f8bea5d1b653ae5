//! Small numeric and data-integrity helpers

pub mod buffer;
pub mod interpolate;

pub use buffer::{is_zeroed, BufferTooSmall};
pub use interpolate::{interpolate, InterpolateError};
