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

use super::{space::WeakSpace, Space, SpaceError, SpaceId, State};
use std::{fmt, sync::Arc};

/// A conversion function between two spaces. Its output is projected through
/// the destination's dimensions.
pub type MapFn = Arc<dyn Fn(&State) -> Vec<f64> + Send + Sync>;

struct MappingCore {
    from: WeakSpace,
    to: WeakSpace,
    from_id: SpaceId,
    to_id: SpaceId,
    from_name: String,
    to_name: String,
    forward: MapFn,
    inverse: Option<MapFn>,
}

/// A registered transform between two spaces, optionally invertible.
///
/// Construction registers the mapping on both endpoints. The endpoints are
/// held weakly: a mapping never keeps a Space alive.
#[derive(Clone)]
pub struct SpaceMapping {
    core: Arc<MappingCore>,
}

impl SpaceMapping {
    /// Creates and registers a mapping from `from` to `to`.
    pub fn new(from: &Space, to: &Space, forward: MapFn, inverse: Option<MapFn>) -> Self {
        let mapping = Self {
            core: Arc::new(MappingCore {
                from: from.downgrade(),
                to: to.downgrade(),
                from_id: from.id(),
                to_id: to.id(),
                from_name: from.name().to_string(),
                to_name: to.name().to_string(),
                forward,
                inverse,
            }),
        };
        from.register_mapping(mapping.clone());
        if from != to {
            to.register_mapping(mapping.clone());
        }
        log::debug!(
            "Registered {} mapping '{}' -> '{}'.",
            if mapping.is_invertible() {
                "invertible"
            } else {
                "one-way"
            },
            from.name(),
            to.name()
        );
        mapping
    }

    /// Creates and registers a mapping usable only from `from` to `to`.
    pub fn one_way<F>(from: &Space, to: &Space, forward: F) -> Self
    where
        F: Fn(&State) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::new(from, to, Arc::new(forward), None)
    }

    /// Creates and registers a mapping usable in both directions.
    pub fn invertible<F, G>(from: &Space, to: &Space, forward: F, inverse: G) -> Self
    where
        F: Fn(&State) -> Vec<f64> + Send + Sync + 'static,
        G: Fn(&State) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::new(from, to, Arc::new(forward), Some(Arc::new(inverse)))
    }

    /// Identity of the source Space.
    pub fn from_id(&self) -> SpaceId {
        self.core.from_id
    }

    /// Identity of the destination Space.
    pub fn to_id(&self) -> SpaceId {
        self.core.to_id
    }

    /// The source Space, if it is still alive.
    pub fn source(&self) -> Option<Space> {
        self.core.from.upgrade()
    }

    /// The destination Space, if it is still alive.
    pub fn destination(&self) -> Option<Space> {
        self.core.to.upgrade()
    }

    /// Returns `true` if the mapping can be used backwards.
    pub fn is_invertible(&self) -> bool {
        self.core.inverse.is_some()
    }

    pub(crate) fn connects(&self, a: SpaceId, b: SpaceId) -> bool {
        (self.core.from_id == a && self.core.to_id == b)
            || (self.core.from_id == b && self.core.to_id == a)
    }

    /// Converts a State of the source Space into the destination Space.
    pub fn apply_forward(&self, state: &State) -> Result<State, SpaceError> {
        let core = &self.core;
        if state.space().id() != core.from_id {
            return Err(SpaceError::Unrepresentable {
                from: state.space().name().to_string(),
                to: core.to_name.clone(),
            });
        }
        let to = core.to.upgrade().ok_or_else(|| SpaceError::Unrepresentable {
            from: core.from_name.clone(),
            to: core.to_name.clone(),
        })?;
        to.state_from(&(core.forward)(state))
    }

    /// Converts a State of the destination Space back into the source Space.
    pub fn apply_inverse(&self, state: &State) -> Result<State, SpaceError> {
        let core = &self.core;
        let Some(inverse) = &core.inverse else {
            return Err(SpaceError::NotInvertible {
                from: core.to_name.clone(),
                to: core.from_name.clone(),
            });
        };
        if state.space().id() != core.to_id {
            return Err(SpaceError::Unrepresentable {
                from: state.space().name().to_string(),
                to: core.from_name.clone(),
            });
        }
        let from = core.from.upgrade().ok_or_else(|| SpaceError::Unrepresentable {
            from: core.to_name.clone(),
            to: core.from_name.clone(),
        })?;
        from.state_from(&inverse(state))
    }
}

impl fmt::Debug for SpaceMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceMapping")
            .field("from", &self.core.from_name)
            .field("to", &self.core.to_name)
            .field("invertible", &self.is_invertible())
            .finish()
    }
}

/// The result of a mapping lookup between two spaces.
#[derive(Debug, Clone)]
pub enum MappingRoute {
    /// Both sides are the same Space.
    Identity,
    /// Apply the mapping's forward function.
    Forward(SpaceMapping),
    /// Apply the mapping's inverse function.
    Inverse(SpaceMapping),
}

impl MappingRoute {
    /// Converts `state` along this route.
    pub fn apply(&self, state: &State) -> Result<State, SpaceError> {
        match self {
            MappingRoute::Identity => Ok(state.clone()),
            MappingRoute::Forward(mapping) => mapping.apply_forward(state),
            MappingRoute::Inverse(mapping) => mapping.apply_inverse(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{spaces::MapMode, Dimension};
    use approx::assert_relative_eq;

    fn polar_and_cartesian() -> (Space, Space) {
        let polar = Space::with_name(
            "polar",
            [
                Dimension::new("r").with_limits(0.0, 100.0),
                Dimension::new("theta")
                    .with_limits(-crate::math::PI, crate::math::PI)
                    .wrapping(true),
            ],
        )
        .unwrap();
        let cartesian = Space::with_name("cartesian", ["x", "y"].map(Dimension::new)).unwrap();
        (polar, cartesian)
    }

    fn register_polar(polar: &Space, cartesian: &Space) -> SpaceMapping {
        SpaceMapping::invertible(
            polar,
            cartesian,
            |s: &State| vec![s[0] * s[1].cos(), s[0] * s[1].sin()],
            |s: &State| vec![s[0].hypot(s[1]), s[1].atan2(s[0])],
        )
    }

    #[test]
    fn registered_on_both_sides() {
        let (polar, cartesian) = polar_and_cartesian();
        register_polar(&polar, &cartesian);
        assert!(polar.has_mapping(&cartesian));
        assert!(cartesian.has_mapping(&polar));
        assert!(matches!(
            polar.mapping_route(&cartesian),
            Ok(MappingRoute::Forward(_))
        ));
        assert!(matches!(
            cartesian.mapping_route(&polar),
            Ok(MappingRoute::Inverse(_))
        ));
    }

    #[test]
    fn round_trip_restores_state() {
        let (polar, cartesian) = polar_and_cartesian();
        register_polar(&polar, &cartesian);

        for (r, theta) in [(1.0, 0.3), (2.5, -2.0), (10.0, 3.0), (0.5, -0.1)] {
            let p = polar.map([r, theta]).unwrap();
            let c = cartesian.map(&p).unwrap();
            let back = polar.map(&c).unwrap();
            assert_relative_eq!(back[0], r, epsilon = 1e-9);
            assert_relative_eq!(back[1], theta, epsilon = 1e-9);
        }
    }

    #[test]
    fn destination_projection_applies() {
        let raw = Space::from_names(["v"]).unwrap();
        let bounded = Space::new([Dimension::new("v").with_limits(-1.0, 1.0)]).unwrap();
        SpaceMapping::one_way(&raw, &bounded, |s: &State| vec![s[0] * 10.0]);
        let mapped = bounded.map(&raw.map(0.5).unwrap()).unwrap();
        assert_eq!(mapped[0], 1.0);
    }

    #[test]
    fn one_way_mapping_refuses_reverse_even_when_forced() {
        let meters = Space::from_names(["d"]).unwrap();
        let centimeters = Space::from_names(["d"]).unwrap();
        SpaceMapping::one_way(&meters, &centimeters, |s: &State| vec![s[0] * 100.0]);

        let d = meters.map(1.5).unwrap();
        assert_eq!(centimeters.map(&d).unwrap()[0], 150.0);

        let cm = centimeters.map(20.0).unwrap();
        assert!(matches!(
            meters.map(&cm),
            Err(SpaceError::NotInvertible { .. })
        ));
        assert!(matches!(
            meters.map_with(&cm, MapMode::Forced),
            Err(SpaceError::NotInvertible { .. })
        ));
    }

    #[test]
    fn wrong_arity_output_is_reported() {
        let a = Space::from_names(["a"]).unwrap();
        let b = Space::from_names(["b", "c"]).unwrap();
        SpaceMapping::one_way(&a, &b, |s: &State| vec![s[0]]);
        assert_eq!(
            b.map(&a.zeros()).unwrap_err(),
            SpaceError::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn mapping_does_not_keep_spaces_alive() {
        let (polar, cartesian) = polar_and_cartesian();
        let mapping = register_polar(&polar, &cartesian);
        drop(cartesian);
        assert!(mapping.destination().is_none());
        assert!(mapping.source().is_some());
        assert!(matches!(
            mapping.apply_forward(&polar.zeros()),
            Err(SpaceError::Unrepresentable { .. })
        ));
    }
}
