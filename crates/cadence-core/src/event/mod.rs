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

//! Thread-safe hand-off points between producer threads and the tick loop.
//!
//! External inputs (input devices, visualization feeds, ...) run on their own
//! threads. They never touch simulation state directly: they publish into an
//! [`EventBus`] or overwrite a [`LatestSlot`], and an Action drains it while a
//! tick is executing.

mod bus;
mod slot;

pub use self::bus::EventBus;
pub use self::slot::LatestSlot;
