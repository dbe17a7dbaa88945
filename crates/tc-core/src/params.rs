//! Engine and episode configuration.
//!
//! Both structs are plain data with `Default` impls.  Applications usually
//! build them in code; with the `serde` feature they can also be loaded from
//! JSON, where every omitted field keeps its default.

use std::path::PathBuf;
use std::time::Duration;

use crate::{CoreError, CoreResult};

// ── EngineParams ──────────────────────────────────────────────────────────────

/// How to launch and connect to the external simulation engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineParams {
    /// Engine executable.
    pub binary: PathBuf,

    /// Engine configuration file passed with `-c`.
    pub config_path: PathBuf,

    /// Fixed port for the protocol connection.  `None` picks a free port at
    /// every launch.
    pub port: Option<u16>,

    /// Simulated seconds per step.
    pub step_length: f64,

    /// Suppress the engine's per-step console log.
    pub no_step_log: bool,

    /// Sub-lane lateral resolution in metres.  `None` disables sub-lanes.
    pub lateral_resolution: Option<f64>,

    /// Directory that receives `<scenario>-emission.xml`.  `None` disables
    /// emission output.
    pub emission_path: Option<PathBuf>,

    /// Allow vehicles to overtake on the right.
    pub overtake_right: bool,

    /// Use the ballistic integration method instead of Euler.
    pub ballistic: bool,

    /// Engine random seed.
    pub seed: Option<u64>,

    /// Launch attempts before giving up with a launch error.
    pub launch_retries: u32,

    /// Connection attempts per launch.
    pub connect_retries: u32,

    /// Pause between two connection attempts, in milliseconds.
    pub connect_retry_delay_ms: u64,

    /// Pause between spawning the engine and the first connection attempt.
    pub settle_secs: f64,

    /// Shortens the settle pause to 0.1 s.
    pub test_mode: bool,
}

impl EngineParams {
    /// Launch attempts used when nothing else is configured.
    pub const DEFAULT_LAUNCH_RETRIES: u32 = 10;

    /// The pause between spawning the engine and connecting to it.
    pub fn settle_duration(&self) -> Duration {
        if self.test_mode {
            Duration::from_millis(100)
        } else {
            Duration::from_secs_f64(self.settle_secs.max(0.0))
        }
    }

    #[inline]
    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }

    /// Reject values the control loop cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.step_length > 0.0) {
            return Err(CoreError::Config(format!(
                "step_length must be positive, got {}",
                self.step_length
            )));
        }
        if self.launch_retries == 0 {
            return Err(CoreError::Config("launch_retries must be at least 1".into()));
        }
        if self.connect_retries == 0 {
            return Err(CoreError::Config("connect_retries must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            binary:                 PathBuf::from("sumo"),
            config_path:            PathBuf::new(),
            port:                   None,
            step_length:            0.1,
            no_step_log:            true,
            lateral_resolution:     None,
            emission_path:          None,
            overtake_right:         false,
            ballistic:              false,
            seed:                   None,
            launch_retries:         Self::DEFAULT_LAUNCH_RETRIES,
            connect_retries:        100,
            connect_retry_delay_ms: 1_000,
            settle_secs:            1.0,
            test_mode:              false,
        }
    }
}

// ── EnvParams ─────────────────────────────────────────────────────────────────

/// Episode-level knobs for the control loop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvParams {
    /// Maximum speed recorded for every vehicle at episode start.
    pub max_speed: f64,

    /// Seconds a vehicle is considered "recently changed lane".  Resets set
    /// every vehicle's last change to `-lane_change_duration`.
    pub lane_change_duration: f64,

    /// Permute which vehicle starts in which slot on every reset.
    pub vehicle_arrangement_shuffle: bool,

    /// Draw a random starting offset on every reset.
    pub starting_position_shuffle: bool,

    /// Sort vehicle ids by absolute position after every step.
    pub sort_vehicles: bool,

    /// Global steps after which the engine process is restarted.
    pub restart_threshold: u64,

    /// Starting offset used by a shuffled reset without a random offset.
    pub initial_offset: f64,

    /// Leader search distance in metres.
    pub leader_lookahead: f64,

    /// Deceleration-override window of a slow-down command, in seconds.
    pub slow_down_window: f64,

    /// How long the engine holds a commanded lane, in milliseconds.
    pub lane_change_hold_ms: u64,

    /// Seed for shuffles and color choice.
    pub seed: u64,
}

impl EnvParams {
    /// Sentinel "last lane change" time meaning "long ago".
    #[inline]
    pub fn lane_change_sentinel(&self) -> f64 {
        -self.lane_change_duration
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.max_speed < 0.0 {
            return Err(CoreError::Config(format!(
                "max_speed must be non-negative, got {}",
                self.max_speed
            )));
        }
        if self.slow_down_window < 0.0 {
            return Err(CoreError::Config(format!(
                "slow_down_window must be non-negative, got {}",
                self.slow_down_window
            )));
        }
        Ok(())
    }
}

impl Default for EnvParams {
    fn default() -> Self {
        Self {
            max_speed:                   55.0,
            lane_change_duration:        5.0,
            vehicle_arrangement_shuffle: false,
            starting_position_shuffle:   false,
            sort_vehicles:               false,
            restart_threshold:           2_000_000,
            initial_offset:              0.0,
            leader_lookahead:            2_000.0,
            slow_down_window:            1.0,
            lane_change_hold_ms:         100_000,
            seed:                        0,
        }
    }
}
