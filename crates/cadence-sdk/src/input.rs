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

//! Actions feeding external input into a dynamics object.
//!
//! Input devices run on their own threads and publish raw vectors into an
//! [`EventBus`] or a [`LatestSlot`]. The actions built here pick them up
//! during a tick, so the device never touches simulation state.

use crate::dynamics::DynamicsInput;
use cadence_control::Action;
use cadence_core::event::{EventBus, LatestSlot};
use flume::Receiver;

/// Builder for an input hand-off action.
pub struct InputAction {
    name: String,
    priority: i32,
    target: DynamicsInput,
}

impl InputAction {
    pub fn new(name: impl Into<String>, target: DynamicsInput) -> Self {
        Self {
            name: name.into(),
            priority: Action::DEFAULT_PRIORITY,
            target,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Drains `bus` on every run and applies the most recent vector.
    pub fn from_bus(self, bus: &EventBus<Vec<f64>>) -> Action {
        let receiver: Receiver<Vec<f64>> = bus.receiver().clone();
        let target = self.target;
        let name = self.name.clone();
        Action::new(self.name)
            .with_priority(self.priority)
            .with_function(move |_| {
                let mut pending = receiver.try_iter();
                let Some(mut latest) = pending.next() else {
                    return Ok(());
                };
                let mut skipped = 0usize;
                for value in pending {
                    latest = value;
                    skipped += 1;
                }
                if skipped > 0 {
                    log::trace!("{name}: {skipped} stale input(s) superseded.");
                }
                apply(&name, &target, &latest);
                Ok(())
            })
    }

    /// Takes the value of `slot`, if any, on every run.
    pub fn from_slot(self, slot: &LatestSlot<Vec<f64>>) -> Action {
        let slot = slot.clone();
        let target = self.target;
        let name = self.name.clone();
        Action::new(self.name)
            .with_priority(self.priority)
            .with_function(move |_| {
                if let Some(latest) = slot.take() {
                    apply(&name, &target, &latest);
                }
                Ok(())
            })
    }
}

// A malformed device sample is dropped; the previous input stays in effect.
fn apply(name: &str, target: &DynamicsInput, values: &[f64]) {
    if let Err(e) = target.set(values) {
        log::warn!("{name}: input {values:?} dropped: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::{Dynamics, DynamicsModel};
    use cadence_core::{Space, State};
    use std::thread;

    struct Hold {
        space: Space,
    }

    impl DynamicsModel for Hold {
        fn state_space(&self) -> &Space {
            &self.space
        }

        fn input_space(&self) -> &Space {
            &self.space
        }

        fn step(&self, _state: &State, input: &State) -> anyhow::Result<State> {
            Ok(input.clone())
        }
    }

    fn hold() -> Dynamics<Hold> {
        Dynamics::new(
            "hold",
            Hold {
                space: Space::from_names(["a", "b"]).unwrap(),
            },
        )
    }

    #[test]
    fn bus_applies_latest_sample() {
        let dynamics = hold();
        let bus = EventBus::<Vec<f64>>::new();
        let action = InputAction::new("joystick", dynamics.input_handle()).from_bus(&bus);

        let producer = bus.sender();
        thread::spawn(move || {
            for i in 0..5 {
                producer.send(vec![i as f64, -(i as f64)]).unwrap();
            }
        })
        .join()
        .unwrap();

        action.call().unwrap();
        assert_eq!(dynamics.input().values(), &[4.0, -4.0]);
        assert!(bus.is_empty());

        // Nothing pending: the input is kept.
        action.call().unwrap();
        assert_eq!(dynamics.input().values(), &[4.0, -4.0]);
    }

    #[test]
    fn malformed_sample_is_dropped() {
        let dynamics = hold();
        let slot = LatestSlot::new();
        let action = InputAction::new("pad", dynamics.input_handle()).from_slot(&slot);

        slot.put(vec![1.0, 2.0]);
        action.call().unwrap();
        slot.put(vec![9.0]);
        action.call().unwrap();
        assert_eq!(dynamics.input().values(), &[1.0, 2.0]);
        assert!(!slot.is_filled());
    }
}
