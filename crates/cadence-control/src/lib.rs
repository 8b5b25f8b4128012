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

//! # Cadence Control
//!
//! The scheduling kernel: a tree of priority-ordered [`Action`]s, objects
//! that own Action sub-trees ([`ScheduledObject`]), and the [`Scheduler`]
//! that executes a root Action once per tick at a fixed sample period.

#![warn(missing_docs)]

pub mod action;
pub mod args;
pub mod clock;
pub mod error;
pub mod object;
pub mod scheduler;

pub use action::{Action, ActionFn, ActionId, OwnerInfo, Provider, CALLTREE_FLAG};
pub use args::{ArgValue, Args};
pub use clock::SimClock;
pub use error::{ActionError, SchedulerError, TreeError};
pub use object::{register_actions_into, Lifecycle, ScheduledObject, SchedulingData};
pub use scheduler::{
    RunLimit, RunMode, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerState,
    SchedulerWorker, WorkerOutput,
};
