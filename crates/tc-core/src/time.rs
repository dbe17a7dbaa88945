//! Episode time model.
//!
//! # Design
//!
//! Two integer counters drive the control loop:
//!
//! - `time_counter`: steps since the current episode started.  Reset to 0
//!   by every episode reset.
//! - `step_counter`: steps since the engine process was last started.  It
//!   survives resets and is only cleared when the process is restarted, so
//!   it bounds how long a single engine process lives.
//!
//! Simulated seconds are derived as `time_counter * step_length`; integer
//! counters keep comparisons exact.

use std::fmt;

/// Step counters plus the step length used to convert them to seconds.
///
/// `EpisodeClock` holds no heap data and is cheap to copy.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeClock {
    /// Simulated seconds per step.
    pub step_length: f64,
    /// Steps since the start of the current episode.
    pub time_counter: u64,
    /// Steps since the engine process was last (re)started.
    pub step_counter: u64,
}

impl EpisodeClock {
    pub fn new(step_length: f64) -> Self {
        Self { step_length, time_counter: 0, step_counter: 0 }
    }

    /// Advance both counters by one step.
    #[inline]
    pub fn advance(&mut self) {
        self.time_counter += 1;
        self.step_counter += 1;
    }

    /// Start a new episode.  The global step counter is left untouched.
    #[inline]
    pub fn reset_episode(&mut self) {
        self.time_counter = 0;
    }

    /// Clear the global counter after a process restart.
    #[inline]
    pub fn reset_process(&mut self) {
        self.step_counter = 0;
    }

    /// `true` once the global counter is strictly past `threshold`.
    #[inline]
    pub fn needs_restart(&self, threshold: u64) -> bool {
        self.step_counter > threshold
    }

    /// Simulated seconds since the episode started.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.time_counter as f64 * self.step_length
    }
}

impl fmt::Display for EpisodeClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={} ({:.1}s, global step {})",
            self.time_counter,
            self.elapsed_secs(),
            self.step_counter
        )
    }
}
