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

// Cadence Sandbox
// Drives a unicycle through the environment with commands from a device thread.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use cadence_sdk::prelude::*;
use cadence_sdk::presets;

/// Planar unicycle: (x, y, psi) driven by forward speed and turn rate.
struct Unicycle {
    states: Space,
    inputs: Space,
    position: Space,
    dt: f64,
}

impl Unicycle {
    fn new(dt: f64) -> Result<Self> {
        let states = presets::planar();
        let inputs = Space::with_name(
            "command",
            [
                Dimension::new("v").with_unit("m/s").with_limits(-1.0, 1.0),
                Dimension::new("omega")
                    .with_unit("rad/s")
                    .with_limits(-2.0, 2.0),
            ],
        )?;
        let position = presets::coord_2d();
        SpaceMapping::one_way(&states, &position, |pose| vec![pose["x"], pose["y"]]);

        Ok(Self {
            states,
            inputs,
            position,
            dt,
        })
    }
}

impl DynamicsModel for Unicycle {
    fn state_space(&self) -> &Space {
        &self.states
    }

    fn input_space(&self) -> &Space {
        &self.inputs
    }

    fn output_space(&self) -> &Space {
        &self.position
    }

    fn step(&self, state: &State, input: &State) -> Result<State> {
        let (v, omega) = (input["v"], input["omega"]);
        let psi = state["psi"];
        Ok(self.states.map([
            state["x"] + self.dt * v * psi.cos(),
            state["y"] + self.dt * v * psi.sin(),
            psi + self.dt * omega,
        ])?)
    }
}

fn load_config() -> Result<EnvironmentConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file '{path}'"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config file '{path}'"))
        }
        None => Ok(EnvironmentConfig {
            name: "sandbox".into(),
            scheduler: SchedulerConfig {
                sample_period: Duration::from_millis(50),
                ..SchedulerConfig::default()
            },
        }),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let dt = config.scheduler.sample_period.as_secs_f64();
    let mut env = Environment::new(config);

    let mut vehicle = Dynamics::new("vehicle", Unicycle::new(dt)?);
    env.add_object(&mut vehicle, "world")?;

    let commands = EventBus::<Vec<f64>>::new();
    let device = InputAction::new("device", vehicle.input_handle()).from_bus(&commands);
    env.phase("input")
        .context("environment has no input phase")?
        .register(&device);

    // Half a circle forward, then back the other way.
    let producer = commands.sender();
    let device_thread = thread::spawn(move || {
        for step in 0..40 {
            let turn_deg: f64 = if step < 20 { 60.0 } else { -60.0 };
            if producer.send(vec![0.5, turn_deg.to_radians()]).is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
    });

    // One traced tick to show the call tree; init rewinds it.
    env.trace_step()?;
    env.init()?;
    env.run(RunLimit::Time(Duration::from_secs(2)))?;

    if device_thread.join().is_err() {
        log::warn!("Input device thread panicked.");
    }

    log::info!(
        "Finished after {} ticks ({:.2} s simulated).",
        env.tick(),
        env.time()
    );
    let pose = vehicle.state();
    println!("pose:     {pose}");
    println!("heading:  {:.1} deg", pose["psi"].to_degrees());
    println!("position: {}", vehicle.output()?);
    Ok(())
}
