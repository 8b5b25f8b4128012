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

use super::SpaceError;
use crate::math;

/// A single constrained scalar axis.
///
/// A Dimension is immutable once it is placed into a [`Space`](super::Space).
/// Its [`project_value`](Dimension::project_value) function is the only way a
/// value enters a [`State`](super::State).
///
/// # Examples
///
/// ```
/// use cadence_core::Dimension;
/// use cadence_core::math::PI;
///
/// let heading = Dimension::new("heading")
///     .with_unit("rad")
///     .with_limits(-PI, PI)
///     .wrapping(true);
/// let wrapped = heading.project_value(PI + 0.5).unwrap();
/// assert!((wrapped - (-PI + 0.5)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    name: String,
    unit: Option<String>,
    limits: Option<(f64, f64)>,
    wrapping: bool,
    discretization: f64,
    error_on_limit: bool,
}

impl Dimension {
    /// Creates an unconstrained Dimension.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            limits: None,
            wrapping: false,
            discretization: 0.0,
            error_on_limit: false,
        }
    }

    /// Sets the physical unit, informational only.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Restricts the Dimension to `[low, high]`.
    pub fn with_limits(mut self, low: f64, high: f64) -> Self {
        self.limits = Some((low, high));
        self
    }

    /// Wraps out-of-range values modulo the limit interval instead of clamping.
    pub fn wrapping(mut self, wrapping: bool) -> Self {
        self.wrapping = wrapping;
        self
    }

    /// Snaps projected values to multiples of `step`. Zero disables snapping.
    pub fn with_discretization(mut self, step: f64) -> Self {
        self.discretization = step;
        self
    }

    /// Rejects out-of-range values instead of clamping them.
    /// Has no effect on a wrapping Dimension.
    pub fn error_on_limit(mut self, error_on_limit: bool) -> Self {
        self.error_on_limit = error_on_limit;
        self
    }

    /// The Dimension's name, unique within its Space.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The physical unit, if any.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// The `(low, high)` limits, if any.
    pub fn limits(&self) -> Option<(f64, f64)> {
        self.limits
    }

    /// Whether out-of-range values wrap.
    pub fn is_wrapping(&self) -> bool {
        self.wrapping
    }

    /// The snapping step, `0.0` when disabled.
    pub fn discretization(&self) -> f64 {
        self.discretization
    }

    /// Whether out-of-range values are rejected.
    pub fn errors_on_limit(&self) -> bool {
        self.error_on_limit
    }

    /// Width of the limit interval, if any.
    pub fn span(&self) -> Option<f64> {
        self.limits.map(|(low, high)| high - low)
    }

    /// Returns `true` if `value` would be stored unchanged by the range policy.
    ///
    /// Wrapping Dimensions exclude their upper limit.
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.limits {
            None => true,
            Some((low, high)) if self.wrapping => (low..high).contains(&value),
            Some((low, high)) => math::in_interval(value, low, high),
        }
    }

    /// Projects an optional value; absence is preserved.
    pub fn project(&self, value: Option<f64>) -> Result<Option<f64>, SpaceError> {
        value.map(|v| self.project_value(v)).transpose()
    }

    /// Applies the range policy, then the discretization.
    pub fn project_value(&self, value: f64) -> Result<f64, SpaceError> {
        if !value.is_finite() {
            return Err(SpaceError::NonFinite {
                dimension: self.name.clone(),
            });
        }
        let ranged = self.apply_range(value)?;
        if self.discretization > 0.0 {
            Ok(self.settle(math::snap(ranged, self.discretization)))
        } else {
            Ok(ranged)
        }
    }

    fn apply_range(&self, value: f64) -> Result<f64, SpaceError> {
        match self.limits {
            None => Ok(value),
            Some((low, high)) if self.wrapping => Ok(math::wrap(value, low, high)),
            Some((low, high)) if value < low || value > high => {
                if self.error_on_limit {
                    Err(SpaceError::LimitExceeded {
                        dimension: self.name.clone(),
                        value,
                        limits: (low, high),
                    })
                } else {
                    Ok(math::clamp(value, low, high))
                }
            }
            Some(_) => Ok(value),
        }
    }

    // Snapping may push a value across a limit. Bring it back without
    // leaving the grid where the interval allows it.
    fn settle(&self, snapped: f64) -> f64 {
        let Some((low, high)) = self.limits else {
            return snapped;
        };
        if self.contains(snapped) {
            return snapped;
        }
        if self.wrapping {
            return math::wrap(snapped, low, high);
        }
        let step = self.discretization;
        let inward = if snapped > high {
            snapped - step
        } else {
            snapped + step
        };
        math::clamp(inward, low, high)
    }

    pub(crate) fn validate(&self) -> Result<(), SpaceError> {
        if let Some((low, high)) = self.limits {
            if !low.is_finite() || !high.is_finite() || low >= high {
                return Err(SpaceError::InvalidLimits {
                    dimension: self.name.clone(),
                    limits: (low, high),
                });
            }
        }
        if !self.discretization.is_finite() || self.discretization < 0.0 {
            return Err(SpaceError::InvalidDiscretization {
                dimension: self.name.clone(),
                step: self.discretization,
            });
        }
        Ok(())
    }
}

impl From<&str> for Dimension {
    fn from(name: &str) -> Self {
        Dimension::new(name)
    }
}

impl From<String> for Dimension {
    fn from(name: String) -> Self {
        Dimension::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::PI;
    use approx::assert_abs_diff_eq;

    fn angle() -> Dimension {
        Dimension::new("psi").with_limits(-PI, PI).wrapping(true)
    }

    #[test]
    fn unconstrained_passes_values_through() {
        let dim = Dimension::new("x");
        assert_eq!(dim.project_value(1234.5), Ok(1234.5));
        assert_eq!(dim.project(None), Ok(None));
        assert_eq!(dim.project(Some(-3.0)), Ok(Some(-3.0)));
    }

    #[test]
    fn wrapping_crosses_upper_limit() {
        let projected = angle().project_value(PI + 0.01).unwrap();
        assert_abs_diff_eq!(projected, -PI + 0.01, epsilon = 1e-12);
    }

    #[test]
    fn wrapping_maps_upper_limit_to_lower() {
        assert_abs_diff_eq!(angle().project_value(PI).unwrap(), -PI, epsilon = 1e-12);
    }

    #[test]
    fn wrapping_is_idempotent() {
        let dim = angle();
        for raw in [-10.0, -PI, -1.0, 0.0, 2.5, PI, 7.0, 100.0] {
            let once = dim.project_value(raw).unwrap();
            let twice = dim.project_value(once).unwrap();
            assert_abs_diff_eq!(once, twice, epsilon = 1e-12);
            assert!(dim.contains(once), "{once} escaped the interval");
        }
    }

    #[test]
    fn clamping_saturates_at_limits() {
        let dim = Dimension::new("u").with_limits(0.0, 10.0);
        assert_eq!(dim.project_value(15.0), Ok(10.0));
        assert_eq!(dim.project_value(-5.0), Ok(0.0));
        assert_eq!(dim.project_value(4.0), Ok(4.0));
    }

    #[test]
    fn error_on_limit_rejects() {
        let dim = Dimension::new("u").with_limits(0.0, 10.0).error_on_limit(true);
        assert_eq!(
            dim.project_value(15.0),
            Err(SpaceError::LimitExceeded {
                dimension: "u".to_string(),
                value: 15.0,
                limits: (0.0, 10.0),
            })
        );
        assert_eq!(dim.project_value(10.0), Ok(10.0));
    }

    #[test]
    fn error_on_limit_ignored_when_wrapping() {
        let dim = angle().error_on_limit(true);
        assert!(dim.project_value(4.0).is_ok());
    }

    #[test]
    fn discretization_rounds_to_nearest_step() {
        let dim = Dimension::new("grid").with_discretization(0.5);
        assert_eq!(dim.project_value(1.24), Ok(1.0));
        assert_eq!(dim.project_value(1.26), Ok(1.5));
    }

    #[test]
    fn discretization_stays_inside_clamping_limits() {
        let dim = Dimension::new("d")
            .with_limits(0.0, 1.3)
            .with_discretization(0.5);
        // 1.3 snaps to 1.5, one step back is 1.0.
        assert_eq!(dim.project_value(5.0), Ok(1.0));
        assert_eq!(dim.project_value(-5.0), Ok(0.0));
    }

    #[test]
    fn discretization_near_wrap_boundary() {
        let dim = Dimension::new("phase")
            .with_limits(0.0, 1.0)
            .wrapping(true)
            .with_discretization(0.25);
        assert_eq!(dim.project_value(0.9), Ok(0.0));
        assert_eq!(dim.project_value(1.3), Ok(0.25));
    }

    #[test]
    fn discretized_wrapping_is_idempotent() {
        let phase = Dimension::new("phase")
            .with_limits(0.0, 1.0)
            .wrapping(true)
            .with_discretization(0.25);
        let quarter_turns = angle().with_discretization(PI / 2.0);
        for dim in [phase, quarter_turns] {
            for raw in [-7.3, -PI, -0.1, 0.0, 0.9, 0.99, 3.0, PI, 12.6] {
                let once = dim.project_value(raw).unwrap();
                let twice = dim.project_value(once).unwrap();
                assert_eq!(once, twice, "{} not stable at {raw}", dim.name());
                assert!(dim.contains(once), "{once} escaped {}", dim.name());
            }
        }
        assert_abs_diff_eq!(
            angle()
                .with_discretization(PI / 2.0)
                .project_value(3.0)
                .unwrap(),
            -PI
        );
    }

    #[test]
    fn non_finite_rejected() {
        let dim = Dimension::new("x");
        assert_eq!(
            dim.project_value(f64::NAN),
            Err(SpaceError::NonFinite {
                dimension: "x".to_string()
            })
        );
        assert!(dim.project_value(f64::INFINITY).is_err());
    }

    #[test]
    fn validation() {
        assert!(Dimension::new("ok").with_limits(0.0, 1.0).validate().is_ok());
        assert!(matches!(
            Dimension::new("bad").with_limits(1.0, 1.0).validate(),
            Err(SpaceError::InvalidLimits { .. })
        ));
        assert!(matches!(
            Dimension::new("bad").with_discretization(-0.1).validate(),
            Err(SpaceError::InvalidDiscretization { .. })
        ));
    }
}
