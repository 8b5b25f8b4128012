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

//! # Cadence Core
//!
//! Foundational crate containing the state-space algebra, numeric helpers and
//! the thread-safe hand-off primitives used by the scheduling kernel.
//!
//! Physical quantities are modelled as [`spaces::State`] values drawn from a
//! [`spaces::Space`], an ordered set of constrained [`spaces::Dimension`]s.
//! Spaces are connected by [`spaces::SpaceMapping`]s that can be discovered
//! from either side.

#![warn(missing_docs)]

pub mod event;
pub mod math;
pub mod spaces;
pub mod utils;

pub use spaces::{
    Candidate, Dimension, MapFn, MapMode, MappingRoute, Space, SpaceError, SpaceId, SpaceMapping,
    State,
};
pub use utils::timer::Stopwatch;
