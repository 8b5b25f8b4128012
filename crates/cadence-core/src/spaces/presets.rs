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

//! Standard coordinate spaces for planar and spatial bodies, and the
//! mappings between them.
//!
//! Every call builds a new Space: presets share a layout, not an identity.
//! Connect two instances explicitly with the `link_*` functions.
//!
//! ```
//! use cadence_core::spaces::presets;
//!
//! let ground = presets::planar();
//! let world = presets::spatial();
//! presets::link_planar_spatial(&ground, &world, 0.3).unwrap();
//!
//! let pose = ground.map([1.0, 2.0, 0.5]).unwrap();
//! let lifted = world.map(&pose).unwrap();
//! assert_eq!(lifted["z"], 0.3);
//! assert_eq!(lifted["yaw"], 0.5);
//! ```

use super::{Dimension, Space, SpaceError, SpaceMapping, State};
use crate::math::{PI, TAU};

fn preset(name: &str, dimensions: Vec<Dimension>) -> Space {
    Space::with_name(name, dimensions)
        .unwrap_or_else(|e| unreachable!("preset '{name}' is well formed: {e}"))
}

fn length(name: &str) -> Dimension {
    Dimension::new(name).with_unit("m")
}

/// Heading in `[0, 2π)`.
fn heading(name: &str) -> Dimension {
    Dimension::new(name)
        .with_unit("rad")
        .with_limits(0.0, TAU)
        .wrapping(true)
}

fn tilt(name: &str) -> Dimension {
    Dimension::new(name)
        .with_unit("rad")
        .with_limits(-PI, PI)
        .wrapping(true)
}

/// `coord1d`: `x`.
pub fn coord_1d() -> Space {
    preset("coord1d", vec![length("x")])
}

/// `coord2d`: `x`, `y`.
pub fn coord_2d() -> Space {
    preset("coord2d", vec![length("x"), length("y")])
}

/// `space2d`: position `x`, `y` and heading `psi` in `[0, 2π)`.
pub fn planar() -> Space {
    preset("space2d", vec![length("x"), length("y"), heading("psi")])
}

/// `space3d`: position `x`, `y`, `z` and Z-Y-X Euler angles `roll`, `pitch`
/// in `[-π, π)` and `yaw` in `[0, 2π)`.
pub fn spatial() -> Space {
    preset(
        "space3d",
        vec![
            length("x"),
            length("y"),
            length("z"),
            tilt("roll"),
            tilt("pitch"),
            heading("yaw"),
        ],
    )
}

fn indices<const N: usize>(space: &Space, names: [&str; N]) -> Result<[usize; N], SpaceError> {
    let mut found = [0; N];
    for (slot, name) in found.iter_mut().zip(names) {
        *slot = space
            .index_of(name)
            .ok_or_else(|| SpaceError::UnknownDimension(name.to_string()))?;
    }
    Ok(found)
}

/// Embeds a line into a plane at `y = 0`. One-way.
pub fn link_coord_1d_2d(line: &Space, plane: &Space) -> Result<SpaceMapping, SpaceError> {
    let [x] = indices(line, ["x"])?;
    let [px, py] = indices(plane, ["x", "y"])?;
    let arity = plane.len();
    Ok(SpaceMapping::one_way(line, plane, move |s: &State| {
        let mut out = vec![0.0; arity];
        out[px] = s.values()[x];
        out[py] = 0.0;
        out
    }))
}

/// Connects a planar pose to a spatial one flying at height `offset_z`.
///
/// Forward, the heading becomes the yaw with zero roll and pitch. Backwards,
/// height, roll and pitch are dropped.
pub fn link_planar_spatial(
    plane: &Space,
    world: &Space,
    offset_z: f64,
) -> Result<SpaceMapping, SpaceError> {
    if plane.len() != 3 {
        return Err(SpaceError::DimensionMismatch {
            expected: 3,
            found: plane.len(),
        });
    }
    if world.len() != 6 {
        return Err(SpaceError::DimensionMismatch {
            expected: 6,
            found: world.len(),
        });
    }
    let [px, py, psi] = indices(plane, ["x", "y", "psi"])?;
    let [wx, wy, wz, roll, pitch, yaw] =
        indices(world, ["x", "y", "z", "roll", "pitch", "yaw"])?;

    Ok(SpaceMapping::invertible(
        plane,
        world,
        move |s: &State| {
            let v = s.values();
            let mut out = vec![0.0; 6];
            out[wx] = v[px];
            out[wy] = v[py];
            out[wz] = offset_z;
            out[roll] = 0.0;
            out[pitch] = 0.0;
            out[yaw] = v[psi];
            out
        },
        move |s: &State| {
            let v = s.values();
            let mut out = vec![0.0; 3];
            out[px] = v[wx];
            out[py] = v[wy];
            out[psi] = v[yaw];
            out
        },
    ))
}

/// Connects two spaces with the same dimension names in the same order by
/// copying values across. Used to relate two instances of one preset.
pub fn link_same_layout(a: &Space, b: &Space) -> Result<SpaceMapping, SpaceError> {
    if a.len() != b.len() {
        return Err(SpaceError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    if let Some((_, name)) = a.names().zip(b.names()).find(|(x, y)| x != y) {
        return Err(SpaceError::UnknownDimension(name.to_string()));
    }
    Ok(SpaceMapping::invertible(
        a,
        b,
        |s: &State| s.values().to_vec(),
        |s: &State| s.values().to_vec(),
    ))
}

/// Places a pose given relative to `base` into `base`'s frame: the relative
/// position is rotated by the base heading, and headings add up.
///
/// `relative` is mapped into `base`'s Space first.
pub fn compose_planar(base: &State, relative: &State) -> Result<State, SpaceError> {
    let space = base.space();
    let [x, y, psi] = indices(space, ["x", "y", "psi"])?;
    let relative = space.map(relative)?;
    let (b, r) = (base.values(), relative.values());

    let (sin, cos) = b[psi].sin_cos();
    let mut out = b.to_vec();
    out[x] = b[x] + cos * r[x] - sin * r[y];
    out[y] = b[y] + sin * r[x] + cos * r[y];
    out[psi] = b[psi] + r[psi];
    space.map(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRAC_PI_2;
    use approx::assert_abs_diff_eq;

    #[test]
    fn preset_layouts() {
        assert_eq!(coord_1d().names().collect::<Vec<_>>(), ["x"]);
        assert_eq!(coord_2d().names().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(planar().names().collect::<Vec<_>>(), ["x", "y", "psi"]);
        assert_eq!(
            spatial().names().collect::<Vec<_>>(),
            ["x", "y", "z", "roll", "pitch", "yaw"]
        );
        assert_ne!(planar(), planar());
    }

    #[test]
    fn planar_heading_wraps_to_full_turn() {
        let pose = planar().map([0.0, 0.0, -FRAC_PI_2]).unwrap();
        assert_abs_diff_eq!(pose["psi"], 3.0 * FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn line_embeds_into_plane() {
        let (line, plane) = (coord_1d(), coord_2d());
        link_coord_1d_2d(&line, &plane).unwrap();

        let lifted = plane.map(&line.map(4.0).unwrap()).unwrap();
        assert_eq!(lifted.values(), &[4.0, 0.0]);
        assert!(matches!(
            line.map(&lifted),
            Err(SpaceError::NotInvertible { .. })
        ));
    }

    #[test]
    fn planar_spatial_round_trip() {
        let (ground, world) = (planar(), spatial());
        link_planar_spatial(&ground, &world, 0.25).unwrap();

        let pose = ground.map([1.0, -2.0, 1.0]).unwrap();
        let lifted = world.map(&pose).unwrap();
        assert_eq!(lifted.values(), &[1.0, -2.0, 0.25, 0.0, 0.0, 1.0]);

        let tilted = world.map([3.0, 4.0, 5.0, 0.1, -0.2, 2.0]).unwrap();
        let flat = ground.map(&tilted).unwrap();
        assert_eq!(flat.values(), &[3.0, 4.0, 2.0]);
    }

    #[test]
    fn planar_spatial_requires_layouts() {
        let err = link_planar_spatial(&coord_2d(), &spatial(), 0.0).unwrap_err();
        assert_eq!(
            err,
            SpaceError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
        let renamed = Space::from_names(["x", "y", "theta"]).unwrap();
        let err = link_planar_spatial(&renamed, &spatial(), 0.0).unwrap_err();
        assert_eq!(err, SpaceError::UnknownDimension("psi".to_string()));
    }

    #[test]
    fn same_layout_links_instances() {
        let (a, b) = (planar(), planar());
        link_same_layout(&a, &b).unwrap();
        let moved = b.map(&a.map([1.0, 2.0, 3.0]).unwrap()).unwrap();
        assert_eq!(moved.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(moved.space(), &b);

        assert!(link_same_layout(&planar(), &spatial()).is_err());
        assert_eq!(
            link_same_layout(&coord_2d(), &Space::from_names(["x", "z"]).unwrap()).unwrap_err(),
            SpaceError::UnknownDimension("z".to_string())
        );
    }

    #[test]
    fn compose_rotates_relative_position() {
        let ground = planar();
        let base = ground.map([1.0, 1.0, FRAC_PI_2]).unwrap();
        let ahead = ground.map([2.0, 0.0, FRAC_PI_2]).unwrap();

        let placed = compose_planar(&base, &ahead).unwrap();
        assert_abs_diff_eq!(placed["x"], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(placed["y"], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(placed["psi"], PI, epsilon = 1e-12);
    }
}
