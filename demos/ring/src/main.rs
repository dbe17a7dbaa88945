//! `ring` — one learning vehicle damping stop-and-go waves on a ring road.
//!
//! Twenty-one human drivers follow a target speed on a single-lane ring;
//! one `rl` vehicle is driven by a hand-written proportional policy that
//! closes the gap to its leader.  Runs against the in-process mock engine,
//! so no simulator binary is needed.
//!
//! Run with:
//!   cargo run -p ring --release -- [OUTPUT_DIR] [PARAMS_JSON]
//!
//! `PARAMS_JSON` may override any `engine` / `env` parameter, e.g.
//! `{"env": {"max_speed": 20.0, "seed": 7}}`.  Log verbosity follows
//! `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tc_control::{ContinuousRouter, Controllers, Roster, TargetSpeed};
use tc_core::{EngineParams, EnvParams, VehicleId};
use tc_engine::mock::{MockEngine, MockLauncher, MockScenario};
use tc_env::{ActionApi, EnvBuilder, EnvError, EnvResult, EnvView, Experiment, Task};
use tc_output::{CsvWriter, EnvOutputObserver};
use tc_scenario::EdgeNetwork;

// ── Constants ─────────────────────────────────────────────────────────────────

const EDGES:          usize = 4;
const EDGE_LENGTH:    f64   = 65.0; // 260 m around
const HUMANS:         usize = 21;
const HUMAN_SPEED:    f64   = 8.0;
const START_SPEED:    f64   = 4.0;
const RUNS:           usize = 3;
const STEPS_PER_RUN:  u64   = 600;
const STATE_INTERVAL: u64   = 10;
/// Gap the policy tries to hold behind its leader, in metres.
const DESIRED_GAP:    f64   = 9.0;
const GAIN:           f64   = 0.4;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    engine: EngineParams,
    env:    EnvParams,
}

fn load_config(path: Option<&Path>) -> Result<DemoConfig> {
    let mut config = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", p.display()))?
        }
        None => DemoConfig::default(),
    };
    // The mock needs no settling or retry delay.
    config.engine.settle_secs = 0.0;
    config.engine.connect_retry_delay_ms = 0;
    Ok(config)
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// Observation: own speed, gap to leader, leader speed.
type Obs = [f64; 3];

struct WaveDamping {
    rl: VehicleId,
}

impl Task for WaveDamping {
    type Action = f64;
    type Observation = Obs;

    fn apply_actions(&mut self, action: &f64, api: &mut ActionApi<'_>) -> EnvResult<()> {
        api.apply_acceleration(&[(self.rl.clone(), *action)])
    }

    fn observe(&self, view: &EnvView<'_>) -> Obs {
        let Ok(me) = view.vehicles.get(&self.rl) else {
            return [0.0; 3];
        };
        match &me.leader {
            Some(l) => [me.speed, l.gap, view.vehicles.speed(&l.id).unwrap_or(me.speed)],
            None => [me.speed, f64::INFINITY, me.speed],
        }
    }

    /// Mean network speed, minus a penalty for harsh actions.
    fn compute_reward(&self, view: &EnvView<'_>, action: &f64, crashed: bool) -> f64 {
        if crashed {
            return -10.0;
        }
        view.mean_speed() - 0.1 * action.abs()
    }
}

fn policy(obs: &Obs) -> f64 {
    let [speed, gap, leader_speed] = *obs;
    if !gap.is_finite() {
        return 1.0;
    }
    (GAIN * (gap - DESIRED_GAP) + (leader_speed - speed)).clamp(-3.0, 1.5)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("output/ring"));
    let config = load_config(args.next().as_deref().map(Path::new))?;

    // 1. Network and roster.
    let net = Arc::new(EdgeNetwork::ring("ring", EDGES, EDGE_LENGTH, 1)?);
    let roster = Roster::new()
        .add(
            "human",
            HUMANS,
            Controllers::none()
                .with_acceleration(TargetSpeed::new(HUMAN_SPEED))
                .with_routing(ContinuousRouter),
        )
        .add("rl", 1, Controllers::none().with_routing(ContinuousRouter));
    info!(vehicles = roster.len(), length = EDGES as f64 * EDGE_LENGTH, "ring network built");

    // 2. Engine.
    let engine = MockEngine::new(
        MockScenario::new(Arc::clone(&net), config.engine.step_length)
            .with_evenly_spaced(&roster.ids_with_types(), START_SPEED)?,
    );

    // 3. Environment.
    let env = EnvBuilder::new(net, engine, WaveDamping { rl: VehicleId::from("rl_0") })
        .roster(roster)
        .engine_params(config.engine)
        .env_params(config.env)
        .launcher(MockLauncher::default())
        .build()?;
    let mut experiment = Experiment::new(env);

    // 4. Output.
    let writer = CsvWriter::new(&out_dir)?;
    let mut obs = EnvOutputObserver::new(writer).with_state_interval(STATE_INTERVAL);

    // 5. Run.
    let t0 = Instant::now();
    let report = match experiment.run(RUNS, STEPS_PER_RUN, policy, &mut obs) {
        Ok(report) => report,
        Err(e @ EnvError::RosterMismatch { .. }) => {
            error!(error = %e, "engine network does not match the roster");
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };
    experiment.env_mut().terminate();

    if let Some(e) = obs.take_error() {
        warn!(error = %e, "output error");
    }

    // 6. Summary.
    println!("Experiment complete in {:.3} s", t0.elapsed().as_secs_f64());
    println!("{:<6} {:>6} {:>12} {:>10} {:>8}", "Run", "Steps", "Return", "Speed", "Crashed");
    println!("{}", "-".repeat(46));
    for r in &report.rollouts {
        println!(
            "{:<6} {:>6} {:>12.2} {:>10.3} {:>8}",
            r.run,
            r.steps,
            r.total_reward,
            r.mean_speed,
            if r.crashed { "yes" } else { "no" },
        );
    }
    println!("Mean return: {:.2}", report.mean_return());
    println!("Output written to {}", out_dir.display());

    Ok(())
}
