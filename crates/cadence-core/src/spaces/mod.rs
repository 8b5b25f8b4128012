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

//! State-space algebra.
//!
//! A [`Dimension`] is a constrained scalar axis, a [`Space`] an ordered set of
//! them, and a [`State`] a value vector bound to one Space. Spaces are related
//! by [`SpaceMapping`]s, looked up as typed [`MappingRoute`]s.

mod dimension;
mod error;
mod mapping;
pub mod presets;
mod space;
mod state;

pub use self::dimension::Dimension;
pub use self::error::SpaceError;
pub use self::mapping::{MapFn, MappingRoute, SpaceMapping};
pub use self::space::{Candidate, MapMode, Space, SpaceId};
pub use self::state::State;
