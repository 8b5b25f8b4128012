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

//! The public-facing SDK for cadence.
//!
//! This crate assembles the scheduling kernel into a ready-made simulation
//! [`Environment`] with fixed phases, and provides [`Dynamics`] objects and
//! input hand-off actions to populate it.

pub mod dynamics;
pub mod environment;
pub mod input;

pub use dynamics::{Dynamics, DynamicsInput, DynamicsModel, DynamicsState};
pub use environment::{Environment, EnvironmentConfig, PHASES};
pub use input::InputAction;

pub use cadence_core::spaces::presets;

pub mod prelude {
    pub use crate::{
        Dynamics, DynamicsInput, DynamicsModel, Environment, EnvironmentConfig, InputAction,
    };
    pub use cadence_control::{
        Action, ArgValue, Args, Lifecycle, RunLimit, RunMode, ScheduledObject, SchedulerConfig,
        SchedulerError, SchedulerHandle, SchedulerState, SchedulingData, SimClock,
    };
    pub use cadence_core::event::{EventBus, LatestSlot};
    pub use cadence_core::{Dimension, MapMode, Space, SpaceError, SpaceMapping, State};
}
