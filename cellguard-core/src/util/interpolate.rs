//! Lookup-table interpolation
//!
//! Maps a value on a monotonic independent axis to a linearly interpolated
//! value on a dependent axis. Used for OCV to state-of-charge conversion and
//! for thermistor tables.

/// Errors for degenerate lookup tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterpolateError {
    /// Fewer than two points, no segment to interpolate on
    TooFewPoints,
    /// Independent and dependent axis differ in length
    LengthMismatch,
}

/// Interpolate in a lookup table
///
/// Values of `a` must be monotonically increasing or decreasing. The
/// direction is taken from the first two points, or from the endpoints if
/// the table starts with a flat segment.
///
/// Queries outside the range of `a` are clamped to the first or last value
/// of `b`. There is no extrapolation.
///
/// # Example
/// ```
/// use cellguard_core::util::interpolate;
/// let a = [1.0, 2.0, 3.0];
/// let b = [10.0, 20.0, 30.0];
/// assert_eq!(interpolate(&a, &b, 2.5), Ok(25.0));
/// assert_eq!(interpolate(&a, &b, 9.0), Ok(30.0));
/// ```
pub fn interpolate(a: &[f32], b: &[f32], value_a: f32) -> Result<f32, InterpolateError> {
    if a.len() != b.len() {
        return Err(InterpolateError::LengthMismatch);
    }
    if a.len() < 2 {
        return Err(InterpolateError::TooFewPoints);
    }

    let last = a.len() - 1;
    let increasing = if a[0] != a[1] {
        a[0] < a[1]
    } else {
        a[0] < a[last]
    };

    for i in 0..a.len() {
        let reached = if increasing {
            value_a <= a[i]
        } else {
            value_a >= a[i]
        };

        if reached {
            // Exact hits return the table value without rounding error
            if i == 0 || value_a == a[i] {
                return Ok(b[i]);
            }
            // Not reached at i - 1, so a[i - 1] != a[i]
            return Ok(b[i - 1] + (b[i] - b[i - 1]) * (value_a - a[i - 1]) / (a[i] - a[i - 1]));
        }
    }

    Ok(b[last])
}
