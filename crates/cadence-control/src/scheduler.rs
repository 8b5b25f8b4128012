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

//! Fixed-period driver of a root Action.

use crate::action::Action;
use crate::args::Args;
use crate::clock::SimClock;
use crate::error::SchedulerError;
use cadence_core::Stopwatch;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::{thread, time::Duration};

/// Pacing of the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunMode {
    /// Wait for the next period boundary after every tick.
    #[default]
    #[serde(rename = "rt")]
    RealTime,
    /// Run ticks back to back.
    #[serde(rename = "fast")]
    Fast,
}

/// How long [`Scheduler::run`] keeps ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLimit {
    /// A fixed number of ticks.
    Steps(u64),
    /// Simulated time; runs `ceil(t / period)` ticks.
    Time(Duration),
    /// Until an exit or halt request arrives.
    Unbounded,
}

impl RunLimit {
    /// The tick budget for a given sample period.
    pub fn ticks(&self, period: Duration) -> Option<u64> {
        match *self {
            RunLimit::Steps(n) => Some(n),
            RunLimit::Time(t) if period.is_zero() => {
                log::warn!("Time limit {t:?} with a zero sample period runs no tick.");
                Some(0)
            }
            RunLimit::Time(t) => {
                let ticks = t.as_nanos().div_ceil(period.as_nanos());
                Some(u64::try_from(ticks).unwrap_or(u64::MAX))
            }
            RunLimit::Unbounded => None,
        }
    }
}

/// The scheduler's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Created, `init` not called yet.
    #[default]
    Uninitialized,
    /// Ready to run or step.
    Initialized,
    /// A run loop is executing.
    Running,
    /// The run ended normally, by limit or exit request.
    Exited,
    /// The run was halted by request or by a failing action.
    Halted,
}

impl SchedulerState {
    /// Checks whether a transition to `next` is allowed.
    pub fn can_transition_to(&self, next: SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, next),
            (Uninitialized | Initialized | Exited | Halted, Initialized)
                | (Initialized | Halted, Running)
                | (Running, Exited | Halted)
        )
    }
}

/// Configuration of a [`Scheduler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Real-time pacing or running as fast as possible.
    pub mode: RunMode,
    /// Wall-clock length of one tick in real-time mode, and the simulated
    /// length of one tick in both modes.
    #[serde(with = "duration_secs")]
    pub sample_period: Duration,
    /// Log a warning when a tick takes longer than its period.
    pub overrun_warning: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::RealTime,
            sample_period: Duration::from_secs(1),
            overrun_warning: true,
        }
    }
}

mod duration_secs {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Exit,
    Halt,
}

/// Requests delivered to a running [`Scheduler`] from any thread.
///
/// Requests are observed between ticks only.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    commands: Sender<Command>,
}

impl SchedulerHandle {
    /// Stops the run; the scheduler ends in [`SchedulerState::Exited`].
    pub fn request_exit(&self) {
        log::debug!("Scheduler: exit requested.");
        let _ = self.commands.send(Command::Exit);
    }

    /// Suspends the run; the scheduler ends in [`SchedulerState::Halted`]
    /// and can be resumed with another `run`.
    pub fn request_halt(&self) {
        log::debug!("Scheduler: halt requested.");
        let _ = self.commands.send(Command::Halt);
    }
}

/// Drives a root Action at a fixed sample period.
///
/// The Scheduler is the single driver of its tree: it is moved, not shared,
/// when run on a worker thread with [`Scheduler::spawn`].
pub struct Scheduler {
    root: Action,
    init_action: Option<Action>,
    config: SchedulerConfig,
    clock: SimClock,
    state: SchedulerState,
    ticks: u64,
    args: Args,
    commands_tx: Sender<Command>,
    commands_rx: Receiver<Command>,
}

impl Scheduler {
    /// Creates a scheduler over `root` with the default config for everything else.
    pub fn new(root: Action, mode: RunMode, sample_period: Duration) -> Self {
        Self::with_config(
            root,
            SchedulerConfig {
                mode,
                sample_period,
                ..SchedulerConfig::default()
            },
        )
    }

    /// Creates a scheduler over `root` from a full config.
    pub fn with_config(root: Action, config: SchedulerConfig) -> Self {
        let clock = SimClock::new(config.sample_period);
        Self::with_clock(root, config, clock)
    }

    /// Uses an existing clock; its period is set to the configured one.
    pub fn with_clock(root: Action, config: SchedulerConfig, clock: SimClock) -> Self {
        clock.set_period(config.sample_period);
        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        Self {
            root,
            init_action: None,
            config,
            clock,
            state: SchedulerState::Uninitialized,
            ticks: 0,
            args: Args::default(),
            commands_tx,
            commands_rx,
        }
    }

    /// Action run by [`init`](Scheduler::init), typically an object's `_init`.
    pub fn with_init_action(mut self, action: Action) -> Self {
        self.init_action = Some(action);
        self
    }

    /// Arguments passed to the root Action on every tick.
    pub fn set_args(&mut self, args: Args) {
        self.args = args;
    }

    /// The action invoked once per tick.
    pub fn root(&self) -> &Action {
        &self.root
    }

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The clock whose period follows the configured sample period.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Ticks executed since the last `init`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// A cloneable handle for exit and halt requests from other threads.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            commands: self.commands_tx.clone(),
        }
    }

    fn set_state(&mut self, next: SchedulerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid scheduler transition {:?} -> {:?}",
            self.state,
            next
        );
        log::debug!("Scheduler: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Resets the tick count, discards stale requests and runs the init action.
    pub fn init(&mut self) -> Result<(), SchedulerError> {
        if self.state == SchedulerState::Running {
            return Err(SchedulerError::InvalidState {
                operation: "init",
                state: self.state,
            });
        }
        self.ticks = 0;
        while self.commands_rx.try_recv().is_ok() {}
        if let Some(action) = &self.init_action {
            action.run(&self.args).map_err(SchedulerError::Init)?;
        }
        self.set_state(SchedulerState::Initialized);
        log::info!(
            "Scheduler initialized ({:?}, period {:?}).",
            self.config.mode,
            self.config.sample_period
        );
        Ok(())
    }

    /// Executes one tick without pacing.
    pub fn step(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Initialized | SchedulerState::Halted => self.tick_once(),
            state => Err(SchedulerError::InvalidState {
                operation: "step",
                state,
            }),
        }
    }

    fn tick_once(&mut self) -> Result<(), SchedulerError> {
        self.ticks += 1;
        log::trace!("Scheduler: tick {}", self.ticks);
        self.root
            .run(&self.args)
            .map_err(|source| SchedulerError::Tick {
                tick: self.ticks,
                source,
            })
    }

    /// Ticks until `limit` is exhausted or a request arrives.
    ///
    /// A failing tick halts the scheduler and returns the error.
    pub fn run(&mut self, limit: RunLimit) -> Result<(), SchedulerError> {
        if !matches!(
            self.state,
            SchedulerState::Initialized | SchedulerState::Halted
        ) {
            return Err(SchedulerError::InvalidState {
                operation: "run",
                state: self.state,
            });
        }

        let period = self.config.sample_period;
        let budget = limit.ticks(period);
        self.set_state(SchedulerState::Running);
        log::info!("Scheduler running ({limit:?}).");

        let mut executed = 0u64;
        loop {
            if let Some(next) = self.pending_request() {
                self.finish(next);
                return Ok(());
            }
            if budget.is_some_and(|b| executed >= b) {
                self.finish(SchedulerState::Exited);
                return Ok(());
            }

            let watch = Stopwatch::new();
            if let Err(e) = self.tick_once() {
                log::error!("Scheduler halted: {e}");
                self.set_state(SchedulerState::Halted);
                return Err(e);
            }
            executed += 1;

            if self.config.mode == RunMode::RealTime {
                match watch.remaining(period) {
                    Some(rest) => match self.commands_rx.recv_timeout(rest) {
                        Ok(command) => {
                            self.finish(Self::target_of(command));
                            return Ok(());
                        }
                        Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {}
                    },
                    None if self.config.overrun_warning => log::warn!(
                        "Tick {} overran its period ({:?} > {:?}).",
                        self.ticks,
                        watch.elapsed(),
                        period
                    ),
                    None => {}
                }
            }
        }
    }

    fn pending_request(&self) -> Option<SchedulerState> {
        self.commands_rx.try_recv().ok().map(Self::target_of)
    }

    fn target_of(command: Command) -> SchedulerState {
        match command {
            Command::Exit => SchedulerState::Exited,
            Command::Halt => SchedulerState::Halted,
        }
    }

    fn finish(&mut self, next: SchedulerState) {
        self.set_state(next);
        log::info!("Scheduler {:?} after {} tick(s).", next, self.ticks);
    }

    /// Moves the scheduler onto its own thread and runs it there.
    pub fn spawn(mut self, limit: RunLimit) -> SchedulerWorker {
        let handle = self.handle();
        let join = thread::spawn(move || {
            let result = self.run(limit);
            (self, result)
        });
        SchedulerWorker { handle, join }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("ticks", &self.ticks)
            .finish()
    }
}

/// What a worker thread hands back: the scheduler and its run result.
pub type WorkerOutput = (Scheduler, Result<(), SchedulerError>);

/// A scheduler running on a dedicated thread.
pub struct SchedulerWorker {
    handle: SchedulerHandle,
    join: thread::JoinHandle<WorkerOutput>,
}

impl SchedulerWorker {
    /// Handle of the scheduler running on the worker.
    pub fn handle(&self) -> &SchedulerHandle {
        &self.handle
    }

    /// Returns `true` once the worker thread has ended.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the run to end and takes the scheduler back.
    pub fn join(self) -> Result<WorkerOutput, SchedulerError> {
        self.join.join().map_err(|_| SchedulerError::WorkerPanicked)
    }
}
