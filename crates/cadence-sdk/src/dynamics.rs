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

//! Dynamic systems stepped once per tick.

use anyhow::anyhow;
use cadence_control::{Action, ArgValue, Lifecycle, ScheduledObject, SchedulingData};
use cadence_core::{Candidate, Space, SpaceError, State};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The model of a discrete-time dynamic system.
pub trait DynamicsModel: Send + Sync + 'static {
    fn state_space(&self) -> &Space;

    fn input_space(&self) -> &Space;

    fn output_space(&self) -> &Space {
        self.state_space()
    }

    /// The state after one sample period.
    fn step(&self, state: &State, input: &State) -> anyhow::Result<State>;

    /// The observable output. Defaults to the state mapped into the output space.
    fn output(&self, state: &State) -> anyhow::Result<State> {
        Ok(self.output_space().map(state)?)
    }
}

/// Current state and input of a [`Dynamics`] object.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsState {
    pub state: State,
    pub input: State,
}

type Shared = Arc<Mutex<DynamicsState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, DynamicsState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes the input of a [`Dynamics`] object from outside its tree.
#[derive(Clone)]
pub struct DynamicsInput {
    shared: Shared,
    space: Space,
}

impl DynamicsInput {
    /// Maps `candidate` into the input space and stores it.
    pub fn set<'a>(&self, candidate: impl Into<Candidate<'a>>) -> Result<(), SpaceError> {
        let input = self.space.map(candidate)?;
        lock(&self.shared).input = input;
        Ok(())
    }

    pub fn space(&self) -> &Space {
        &self.space
    }
}

/// A scheduled object stepping a [`DynamicsModel`].
///
/// Its `update` action reads the current input through an `input` lambda on
/// every run, steps the model and stores the new state. `_start` restores the
/// initial state.
pub struct Dynamics<M: DynamicsModel> {
    scheduling: SchedulingData,
    model: Arc<M>,
    shared: Shared,
    initial: Arc<Mutex<State>>,
}

impl<M: DynamicsModel> Dynamics<M> {
    pub fn new(name: impl Into<String>, model: M) -> Self {
        let initial = model.state_space().zeros();
        Self::with_state(name, model, initial)
    }

    /// Starts from `initial`, which must be a State of the model's state space.
    pub fn with_state(name: impl Into<String>, model: M, initial: State) -> Self {
        let model = Arc::new(model);
        let shared: Shared = Arc::new(Mutex::new(DynamicsState {
            state: initial.clone(),
            input: model.input_space().zeros(),
        }));
        let initial = Arc::new(Mutex::new(initial));

        let mut scheduling = SchedulingData::new(name, "Dynamics");

        let update = {
            let input_source = Arc::clone(&shared);
            let shared = Arc::clone(&shared);
            let model = Arc::clone(&model);
            Action::new("update")
                .with_lambda("input", move || ArgValue::State(lock(&input_source).input.clone()))
                .with_function(move |args| {
                    let input = args
                        .state("input")
                        .ok_or_else(|| anyhow!("update requires an 'input' state"))?;
                    let input = model.input_space().map(input)?;
                    let current = lock(&shared).state.clone();
                    let next = model.step(&current, &input)?;
                    let next = model.state_space().map(&next)?;
                    let mut guard = lock(&shared);
                    guard.input = input;
                    guard.state = next;
                    Ok(())
                })
        };
        if let Err(e) = scheduling.try_register_action(update) {
            unreachable!("fresh namespace: {e}");
        }

        {
            let shared = Arc::clone(&shared);
            let initial = Arc::clone(&initial);
            scheduling
                .lifecycle(Lifecycle::Start)
                .set_function(move |_| {
                    let initial = initial.lock().unwrap_or_else(PoisonError::into_inner).clone();
                    lock(&shared).state = initial;
                    Ok(())
                });
        }

        Self {
            scheduling,
            model,
            shared,
            initial,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The `update` action, to be attached below a phase.
    pub fn update_action(&self) -> Action {
        self.action("update")
            .unwrap_or_else(|| unreachable!("update is registered at construction"))
    }

    pub fn state(&self) -> State {
        lock(&self.shared).state.clone()
    }

    pub fn input(&self) -> State {
        lock(&self.shared).input.clone()
    }

    pub fn snapshot(&self) -> DynamicsState {
        lock(&self.shared).clone()
    }

    pub fn set_state<'a>(&self, candidate: impl Into<Candidate<'a>>) -> Result<(), SpaceError> {
        let state = self.model.state_space().map(candidate)?;
        lock(&self.shared).state = state;
        Ok(())
    }

    pub fn set_input<'a>(&self, candidate: impl Into<Candidate<'a>>) -> Result<(), SpaceError> {
        self.input_handle().set(candidate)
    }

    /// A clonable writer for the input, usable from other actions.
    pub fn input_handle(&self) -> DynamicsInput {
        DynamicsInput {
            shared: Arc::clone(&self.shared),
            space: self.model.input_space().clone(),
        }
    }

    pub fn output(&self) -> anyhow::Result<State> {
        self.model.output(&self.state())
    }

    /// Replaces the state `reset` and `_start` go back to.
    pub fn set_initial_state<'a>(
        &self,
        candidate: impl Into<Candidate<'a>>,
    ) -> Result<(), SpaceError> {
        let state = self.model.state_space().map(candidate)?;
        *self.initial.lock().unwrap_or_else(PoisonError::into_inner) = state;
        Ok(())
    }

    /// Restores the initial state and zeroes the input.
    pub fn reset(&self) {
        let initial = self
            .initial
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut guard = lock(&self.shared);
        guard.state = initial;
        guard.input = self.model.input_space().zeros();
    }
}

impl<M: DynamicsModel> ScheduledObject for Dynamics<M> {
    fn scheduling(&self) -> &SchedulingData {
        &self.scheduling
    }

    fn scheduling_mut(&mut self) -> &mut SchedulingData {
        &mut self.scheduling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cadence_core::Dimension;

    /// x[k+1] = x[k] + dt * u[k], saturating at |x| <= 5.
    struct Integrator {
        states: Space,
        inputs: Space,
        dt: f64,
    }

    impl Integrator {
        fn new(dt: f64) -> Self {
            Self {
                states: Space::new([Dimension::new("x").with_limits(-5.0, 5.0)]).unwrap(),
                inputs: Space::from_names(["u"]).unwrap(),
                dt,
            }
        }
    }

    impl DynamicsModel for Integrator {
        fn state_space(&self) -> &Space {
            &self.states
        }

        fn input_space(&self) -> &Space {
            &self.inputs
        }

        fn step(&self, state: &State, input: &State) -> anyhow::Result<State> {
            Ok(self.states.map([state[0] + self.dt * input[0]])?)
        }
    }

    #[test]
    fn update_reads_current_input() {
        let dynamics = Dynamics::new("integrator", Integrator::new(0.5));
        let update = dynamics.update_action();

        dynamics.set_input(2.0).unwrap();
        update.call().unwrap();
        assert_relative_eq!(dynamics.state()[0], 1.0);

        dynamics.set_input(-1.0).unwrap();
        update.call().unwrap();
        assert_relative_eq!(dynamics.state()[0], 0.5);
    }

    #[test]
    fn state_stays_within_limits() {
        let dynamics = Dynamics::new("integrator", Integrator::new(1.0));
        dynamics.set_input(4.0).unwrap();
        for _ in 0..3 {
            dynamics.update_action().call().unwrap();
        }
        assert_eq!(dynamics.state()[0], 5.0);
    }

    #[test]
    fn start_restores_initial_state() {
        let dynamics = Dynamics::new("integrator", Integrator::new(1.0));
        dynamics.set_initial_state(1.5).unwrap();
        dynamics.set_state(3.0).unwrap();
        dynamics.lifecycle(Lifecycle::Start).call().unwrap();
        assert_eq!(dynamics.state()[0], 1.5);

        dynamics.set_state(-2.0).unwrap();
        dynamics.set_input(1.0).unwrap();
        dynamics.reset();
        assert_eq!(dynamics.snapshot().state[0], 1.5);
        assert_eq!(dynamics.input()[0], 0.0);
    }

    #[test]
    fn default_output_is_the_state() {
        let dynamics = Dynamics::new("integrator", Integrator::new(1.0));
        dynamics.set_state(2.0).unwrap();
        assert_eq!(dynamics.output().unwrap().values(), &[2.0]);
    }

    #[test]
    fn input_from_another_space_is_rejected() {
        let dynamics = Dynamics::new("integrator", Integrator::new(1.0));
        let foreign = Space::from_names(["v"]).unwrap().map(1.0).unwrap();
        assert!(dynamics.set_input(&foreign).is_err());
    }
}
