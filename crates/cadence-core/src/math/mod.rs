// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scalar helpers backing the dimension projection rules.
//!
//! All functions operate on `f64`, the scalar type of every [`State`](crate::spaces::State).
//! Angular helpers work in **radians** unless stated otherwise.

// Re-export standard mathematical constants for convenience.
pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

// --- Utility Functions ---

/// Clamps a value to a specified minimum and maximum range.
///
/// # Examples
///
/// ```
/// use cadence_core::math::clamp;
/// assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
/// assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
/// assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
/// ```
#[inline]
pub fn clamp<T: PartialOrd>(value: T, min_val: T, max_val: T) -> T {
    if value < min_val {
        min_val
    } else if value > max_val {
        max_val
    } else {
        value
    }
}

/// Wraps `value` into the half-open interval `[low, high)`.
///
/// The modular arithmetic is anchored at `low`, so an angle just above `high`
/// re-enters just above `low`, never at `high` itself.
///
/// # Examples
///
/// ```
/// use cadence_core::math::{wrap, PI};
/// let wrapped = wrap(PI + 0.01, -PI, PI);
/// assert!((wrapped - (-PI + 0.01)).abs() < 1e-12);
/// assert_eq!(wrap(370.0, 0.0, 360.0), 10.0);
/// ```
#[inline]
pub fn wrap(value: f64, low: f64, high: f64) -> f64 {
    let span = high - low;
    let offset = (value - low) % span;
    let offset = if offset < 0.0 { offset + span } else { offset };
    let wrapped = low + offset;
    // `low + offset` can round up onto `high` when `offset` is within an ulp of `span`.
    if wrapped >= high {
        low
    } else {
        wrapped
    }
}

/// Rounds `value` to the nearest multiple of `step`.
///
/// A `step` of zero (or below) disables snapping.
///
/// # Examples
///
/// ```
/// use cadence_core::math::snap;
/// assert_eq!(snap(1.24, 0.5), 1.0);
/// assert_eq!(snap(1.26, 0.5), 1.5);
/// assert_eq!(snap(1.26, 0.0), 1.26);
/// ```
#[inline]
pub fn snap(value: f64, step: f64) -> f64 {
    if step > 0.0 {
        step * (value / step).round()
    } else {
        value
    }
}

/// Returns `true` if `value` lies in the closed interval `[low, high]`.
#[inline]
pub fn in_interval(value: f64, low: f64, high: f64) -> bool {
    value >= low && value <= high
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wrap_is_anchored_at_low() {
        assert_abs_diff_eq!(wrap(PI + 0.01, -PI, PI), -PI + 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap(-PI - 0.01, -PI, PI), PI - 0.01, epsilon = 1e-12);
        assert_eq!(wrap(PI, -PI, PI), -PI);
        assert_eq!(wrap(-PI, -PI, PI), -PI);
    }

    #[test]
    fn wrap_handles_many_periods() {
        assert_abs_diff_eq!(wrap(7.5 * TAU + 0.25, 0.0, TAU), PI + 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(wrap(-725.0, 0.0, 360.0), 355.0, epsilon = 1e-9);
    }

    #[test]
    fn wrap_result_never_reaches_high() {
        for i in -1000..1000 {
            let value = i as f64 * 0.0137;
            let wrapped = wrap(value, -1.0, 1.0);
            assert!((-1.0..1.0).contains(&wrapped), "{value} wrapped to {wrapped}");
        }
    }

    #[test]
    fn snap_rounds_to_grid() {
        assert_eq!(snap(1.24, 0.5), 1.0);
        assert_eq!(snap(1.26, 0.5), 1.5);
        assert_eq!(snap(-1.26, 0.5), -1.5);
        assert_eq!(snap(3.0, -1.0), 3.0);
    }

    #[test]
    fn clamp_and_interval() {
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert!(in_interval(10.0, 0.0, 10.0));
        assert!(!in_interval(10.5, 0.0, 10.0));
    }
}
