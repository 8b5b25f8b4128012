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

//! The root scheduled object of a simulation.

use cadence_control::{
    register_actions_into, Action, Args, Lifecycle, RunLimit, ScheduledObject,
    Scheduler, SchedulerConfig, SchedulerError, SchedulerHandle, SchedulerState, SchedulerWorker,
    SchedulingData, SimClock, TreeError,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;

/// Standard phases below the `step` action, with their priorities.
pub const PHASES: [(&str, i32); 5] = [
    ("input", 10),
    ("controller", 20),
    ("world", 30),
    ("visualization", 40),
    ("output", 50),
];

const ENTRY_PRIORITY: i32 = 0;
const EXIT_PRIORITY: i32 = 1000;

/// Configuration of an [`Environment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub name: String,
    pub scheduler: SchedulerConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: "environment".to_string(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Root of a simulation: owns the scheduler, the clock and the `step` tree.
///
/// ```text
/// step
/// ├── _entry          (0)   local and global tick += 1
/// ├── input           (10)
/// ├── controller      (20)
/// ├── world           (30)
/// ├── visualization   (40)
/// ├── output          (50)
/// └── _exit           (1000)
/// ```
pub struct Environment {
    scheduling: SchedulingData,
    config: EnvironmentConfig,
    step: Action,
    phases: Vec<Action>,
    scheduler: Option<Scheduler>,
    handle: SchedulerHandle,
}

impl Environment {
    pub fn new(config: EnvironmentConfig) -> Self {
        let mut scheduling = SchedulingData::new(config.name.clone(), "Environment");
        let clock = SimClock::new(config.scheduler.sample_period);
        scheduling.set_clock(clock.clone());

        let step = scheduling
            .try_register_action(Action::phase("step"))
            .unwrap_or_else(|e| unreachable!("fresh namespace: {e}"));

        let entry = scheduling.lifecycle(Lifecycle::Entry).clone();
        entry.set_priority(ENTRY_PRIORITY);
        {
            let ticks = scheduling.tick_counter();
            let clock = clock.clone();
            entry.set_function(move |_| {
                let tick = ticks.fetch_add(1, Ordering::AcqRel) + 1;
                clock.set_tick(tick);
                Ok(())
            });
        }
        step.register(&entry);

        let exit = scheduling.lifecycle(Lifecycle::Exit).clone();
        exit.set_priority(EXIT_PRIORITY);
        step.register(&exit);

        {
            let ticks = scheduling.tick_counter();
            let clock = clock.clone();
            scheduling
                .lifecycle(Lifecycle::Start)
                .set_function(move |_| {
                    ticks.store(0, Ordering::Release);
                    clock.reset();
                    Ok(())
                });
        }

        let phases = PHASES
            .iter()
            .map(|&(name, priority)| {
                let phase = Action::phase(name).with_priority(priority);
                step.register(&phase);
                scheduling
                    .try_register_action(phase)
                    .unwrap_or_else(|e| unreachable!("fresh namespace: {e}"))
            })
            .collect();

        let scheduler = Scheduler::with_clock(step.clone(), config.scheduler.clone(), clock)
            .with_init_action(scheduling.lifecycle(Lifecycle::Init).clone());
        let handle = scheduler.handle();

        log::info!(
            "Environment '{}' created ({:?}, period {:?}).",
            config.name,
            config.scheduler.mode,
            config.scheduler.sample_period
        );

        Self {
            scheduling,
            config,
            step,
            phases,
            scheduler: Some(scheduler),
            handle,
        }
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// The root Action driven by the scheduler.
    pub fn step_action(&self) -> &Action {
        &self.step
    }

    /// One of the [`PHASES`], by name.
    pub fn phase(&self, name: &str) -> Option<&Action> {
        self.phases.iter().find(|p| p.name() == name)
    }

    /// `None` while the scheduler runs on a worker thread.
    pub fn scheduler(&self) -> Option<&Scheduler> {
        self.scheduler.as_ref()
    }

    /// Exit and halt requests for the scheduler, valid across [`spawn`](Self::spawn).
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    fn scheduler_mut(&mut self, operation: &'static str) -> Result<&mut Scheduler, SchedulerError> {
        self.scheduler.as_mut().ok_or(SchedulerError::InvalidState {
            operation,
            state: SchedulerState::Running,
        })
    }

    /// Initializes the scheduler (running the `_init` tree), then runs the
    /// `_start` tree, which resets the ticks.
    pub fn init(&mut self) -> Result<(), SchedulerError> {
        self.scheduler_mut("init")?.init()?;
        self.lifecycle(Lifecycle::Start)
            .call()
            .map_err(SchedulerError::Init)
    }

    /// Runs the `step` tree once, outside the scheduler.
    ///
    /// Refused while the scheduler is out on a worker thread.
    pub fn step(&self) -> Result<(), SchedulerError> {
        self.drive("step", &Args::new())
    }

    fn drive(&self, operation: &'static str, args: &Args) -> Result<(), SchedulerError> {
        if self.scheduler.is_none() {
            return Err(SchedulerError::InvalidState {
                operation,
                state: SchedulerState::Running,
            });
        }
        self.step.run(args).map_err(|source| SchedulerError::Tick {
            tick: self.tick(),
            source,
        })
    }

    pub fn run(&mut self, limit: RunLimit) -> Result<(), SchedulerError> {
        self.scheduler_mut("run")?.run(limit)
    }

    /// Starts the scheduler on a worker thread. Hand the worker back with
    /// [`join`](Self::join).
    pub fn spawn(&mut self, limit: RunLimit) -> Result<SchedulerWorker, SchedulerError> {
        let scheduler = self.scheduler.take().ok_or(SchedulerError::InvalidState {
            operation: "spawn",
            state: SchedulerState::Running,
        })?;
        Ok(scheduler.spawn(limit))
    }

    /// Waits for a worker started by [`spawn`](Self::spawn) and takes the
    /// scheduler back, returning the run result.
    pub fn join(&mut self, worker: SchedulerWorker) -> Result<(), SchedulerError> {
        let (scheduler, result) = worker.join()?;
        self.scheduler = Some(scheduler);
        result
    }

    /// Makes `object` a child of the environment and hangs its actions
    /// below `phase`.
    pub fn add_object(
        &mut self,
        object: &mut dyn ScheduledObject,
        phase: &str,
    ) -> Result<(), TreeError> {
        let phase_action = self
            .phase(phase)
            .cloned()
            .ok_or_else(|| TreeError::UnknownAction {
                object: self.name().to_string(),
                name: phase.to_string(),
            })?;
        self.try_register_child(object)?;
        register_actions_into(object, &phase_action)
    }

    /// Reverses [`add_object`](Self::add_object).
    pub fn remove_object(&mut self, object: &mut dyn ScheduledObject) -> Result<(), TreeError> {
        self.try_deregister_child(object)?;
        for (name, action) in object.scheduling().actions() {
            if Lifecycle::from_name(name).is_some() {
                continue;
            }
            if let Some(parent) = action.parent() {
                if self.phases.contains(&parent) {
                    parent.try_remove(action)?;
                }
            }
        }
        Ok(())
    }

    /// Runs the `step` tree once with the call-tree trace enabled.
    pub fn trace_step(&self) -> Result<(), SchedulerError> {
        self.drive(
            "trace_step",
            &Args::new().with(cadence_control::CALLTREE_FLAG, true),
        )
    }
}

impl ScheduledObject for Environment {
    fn scheduling(&self) -> &SchedulingData {
        &self.scheduling
    }

    fn scheduling_mut(&mut self) -> &mut SchedulingData {
        &mut self.scheduling
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(EnvironmentConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_layout() {
        let env = Environment::default();
        assert_eq!(
            env.step_action().child_keys(),
            [
                "_entry",
                "input",
                "controller",
                "world",
                "visualization",
                "output",
                "_exit"
            ]
        );
        assert!(env.phase("world").is_some());
        assert!(env.phase("physics").is_none());
        assert_eq!(env.action("step"), Some(env.step_action().clone()));
    }

    #[test]
    fn manual_steps_advance_ticks() {
        let env = Environment::default();
        env.step().unwrap();
        env.step().unwrap();
        assert_eq!(env.tick(), 2);
        assert_eq!(env.tick_global(), 2);
    }

    #[test]
    fn config_serde_defaults() {
        let config: EnvironmentConfig =
            serde_json::from_str(r#"{"name":"lab","scheduler":{"mode":"fast"}}"#).unwrap();
        assert_eq!(config.name, "lab");
        assert_eq!(config.scheduler.sample_period, std::time::Duration::from_secs(1));
    }
}
