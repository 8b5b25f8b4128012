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

use super::{space::Candidate, Space, SpaceError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{
    fmt,
    ops::{Add, Div, Index, Mul, Neg, Sub},
};

/// A value vector bound to exactly one [`Space`].
///
/// Every write goes through the dimensions' projection, so a State never
/// holds a value its Space would clamp, wrap or reject. Arithmetic produces
/// new States.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    space: Space,
    values: Vec<f64>,
}

impl State {
    /// Wraps values that were already projected through `space`.
    pub(crate) fn from_projected(space: Space, values: Vec<f64>) -> Self {
        debug_assert_eq!(space.len(), values.len());
        Self { space, values }
    }

    /// The owning Space.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The components in dimension order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consumes the State, returning its components.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a State of a zero-dimensional Space.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The component at `index`.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// The component of the dimension called `name`.
    pub fn get_named(&self, name: &str) -> Option<f64> {
        self.space.index_of(name).map(|i| self.values[i])
    }

    /// `(dimension name, value)` pairs in dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.space.names().zip(self.values.iter().copied())
    }

    /// Projects `value` through dimension `index` and stores it.
    pub fn set(&mut self, index: usize, value: f64) -> Result<(), SpaceError> {
        let dim = self
            .space
            .dimension(index)
            .ok_or_else(|| SpaceError::UnknownDimension(format!("#{index}")))?;
        self.values[index] = dim.project_value(value)?;
        Ok(())
    }

    /// Projects `value` through the dimension called `name` and stores it.
    pub fn set_named(&mut self, name: &str, value: f64) -> Result<(), SpaceError> {
        let index = self
            .space
            .index_of(name)
            .ok_or_else(|| SpaceError::UnknownDimension(name.to_string()))?;
        self.set(index, value)
    }

    /// Replaces every component with the strict mapping of `candidate`.
    pub fn assign<'a>(&mut self, candidate: impl Into<Candidate<'a>>) -> Result<(), SpaceError> {
        self.values = self.space.map(candidate)?.values;
        Ok(())
    }

    /// Converts into `space` through a registered mapping.
    pub fn map_to(&self, space: &Space) -> Result<State, SpaceError> {
        space.map(self)
    }

    /// Converts into `space`, projecting positionally if no mapping exists.
    pub fn map_to_forced(&self, space: &Space) -> Result<State, SpaceError> {
        space.map_forced(self)
    }

    /// Component-wise sum, `rhs` mapped into this State's Space first.
    pub fn checked_add(&self, rhs: &State) -> Result<State, SpaceError> {
        self.combine(rhs, |a, b| a + b)
    }

    /// Component-wise difference, `rhs` mapped into this State's Space first.
    pub fn checked_sub(&self, rhs: &State) -> Result<State, SpaceError> {
        self.combine(rhs, |a, b| a - b)
    }

    /// Multiplies every component by `factor`.
    pub fn checked_scale(&self, factor: f64) -> Result<State, SpaceError> {
        let scaled: Vec<f64> = self.values.iter().map(|v| v * factor).collect();
        self.space.state_from(&scaled)
    }

    /// Left-multiplies the State by an n×n matrix given as rows.
    pub fn transform<R: AsRef<[f64]>>(&self, matrix: &[R]) -> Result<State, SpaceError> {
        let n = self.len();
        if matrix.len() != n {
            return Err(SpaceError::DimensionMismatch {
                expected: n,
                found: matrix.len(),
            });
        }
        let mut product = Vec::with_capacity(n);
        for row in matrix {
            let row = row.as_ref();
            if row.len() != n {
                return Err(SpaceError::DimensionMismatch {
                    expected: n,
                    found: row.len(),
                });
            }
            product.push(row.iter().zip(&self.values).map(|(a, b)| a * b).sum());
        }
        self.space.state_from(&product)
    }

    fn combine(&self, rhs: &State, op: impl Fn(f64, f64) -> f64) -> Result<State, SpaceError> {
        let rhs = self.space.map(rhs)?;
        let values: Vec<f64> = self
            .values
            .iter()
            .zip(&rhs.values)
            .map(|(&a, &b)| op(a, b))
            .collect();
        self.space.state_from(&values)
    }
}

impl Index<usize> for State {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl Index<&str> for State {
    type Output = f64;

    fn index(&self, name: &str) -> &f64 {
        match self.space.index_of(name) {
            Some(i) => &self.values[i],
            None => panic!(
                "dimension '{name}' not found in space '{}'",
                self.space.name()
            ),
        }
    }
}

fn expect_state(result: Result<State, SpaceError>) -> State {
    result.unwrap_or_else(|e| panic!("state arithmetic failed: {e}"))
}

impl Add<&State> for &State {
    type Output = State;

    fn add(self, rhs: &State) -> State {
        expect_state(self.checked_add(rhs))
    }
}

impl Add for State {
    type Output = State;

    fn add(self, rhs: State) -> State {
        &self + &rhs
    }
}

impl Sub<&State> for &State {
    type Output = State;

    fn sub(self, rhs: &State) -> State {
        expect_state(self.checked_sub(rhs))
    }
}

impl Sub for State {
    type Output = State;

    fn sub(self, rhs: State) -> State {
        &self - &rhs
    }
}

impl Mul<f64> for &State {
    type Output = State;

    fn mul(self, rhs: f64) -> State {
        expect_state(self.checked_scale(rhs))
    }
}

impl Mul<f64> for State {
    type Output = State;

    fn mul(self, rhs: f64) -> State {
        &self * rhs
    }
}

impl Div<f64> for &State {
    type Output = State;

    fn div(self, rhs: f64) -> State {
        expect_state(self.checked_scale(1.0 / rhs))
    }
}

impl Div<f64> for State {
    type Output = State;

    fn div(self, rhs: f64) -> State {
        &self / rhs
    }
}

impl Neg for &State {
    type Output = State;

    fn neg(self) -> State {
        expect_state(self.checked_scale(-1.0))
    }
}

impl Neg for State {
    type Output = State;

    fn neg(self) -> State {
        -&self
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "]")
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
