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

//! Error type of the state-space algebra.

use std::fmt;

/// An error raised while projecting, mapping or building spaces.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceError {
    /// A value fell outside a Dimension configured with `error_on_limit`.
    LimitExceeded {
        /// The Dimension that rejected the value.
        dimension: String,
        /// The offending value.
        value: f64,
        /// The Dimension's `(low, high)` limits.
        limits: (f64, f64),
    },
    /// A NaN or infinite value was offered to a Dimension.
    NonFinite {
        /// The Dimension that rejected the value.
        dimension: String,
    },
    /// No mapping connects the two spaces and forced projection was not requested.
    Unrepresentable {
        /// Name of the source space.
        from: String,
        /// Name of the destination space.
        to: String,
    },
    /// A one-way mapping was used against its direction.
    NotInvertible {
        /// Name of the source space.
        from: String,
        /// Name of the destination space.
        to: String,
    },
    /// A value sequence does not have the arity of the space.
    DimensionMismatch {
        /// Number of dimensions of the space.
        expected: usize,
        /// Number of values offered.
        found: usize,
    },
    /// A named lookup found no such Dimension.
    UnknownDimension(String),
    /// Two Dimensions of the same space share a name.
    DuplicateDimension(String),
    /// Limits are not finite or not ordered.
    InvalidLimits {
        /// The Dimension carrying the limits.
        dimension: String,
        /// The rejected limits.
        limits: (f64, f64),
    },
    /// The discretization step is negative or not finite.
    InvalidDiscretization {
        /// The Dimension carrying the step.
        dimension: String,
        /// The rejected step.
        step: f64,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceError::LimitExceeded {
                dimension,
                value,
                limits: (low, high),
            } => write!(
                f,
                "Value {value} exceeds limits [{low}, {high}] of dimension '{dimension}'"
            ),
            SpaceError::NonFinite { dimension } => {
                write!(f, "Non-finite value offered to dimension '{dimension}'")
            }
            SpaceError::Unrepresentable { from, to } => {
                write!(f, "No mapping from space '{from}' to space '{to}'")
            }
            SpaceError::NotInvertible { from, to } => {
                write!(
                    f,
                    "Mapping between '{to}' and '{from}' has no inverse for direction '{from}' -> '{to}'"
                )
            }
            SpaceError::DimensionMismatch { expected, found } => {
                write!(f, "Expected {expected} values, found {found}")
            }
            SpaceError::UnknownDimension(name) => write!(f, "Unknown dimension '{name}'"),
            SpaceError::DuplicateDimension(name) => {
                write!(f, "Dimension '{name}' appears more than once in the space")
            }
            SpaceError::InvalidLimits {
                dimension,
                limits: (low, high),
            } => write!(
                f,
                "Invalid limits [{low}, {high}] for dimension '{dimension}'"
            ),
            SpaceError::InvalidDiscretization { dimension, step } => {
                write!(
                    f,
                    "Invalid discretization step {step} for dimension '{dimension}'"
                )
            }
        }
    }
}

impl std::error::Error for SpaceError {}
