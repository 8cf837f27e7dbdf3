//! Runtime configuration: worker cadences, lock timeout and button behaviour.
//!
//! Every field has a default matching the reference hardware, so a partial
//! config file (or none at all) is valid.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub input: InputConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Period between sensor acquisitions
    pub sample_interval_ms: u64,
    /// Period between display refreshes
    pub render_interval_ms: u64,
    /// Period between button polls
    pub poll_interval_ms: u64,
    /// Longest a worker waits for the shared state before skipping a cycle
    pub lock_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 2000,
            render_interval_ms: 100,
            poll_interval_ms: 50,
            lock_timeout_ms: 250,
        }
    }
}

impl TimingConfig {
    pub const fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub const fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// When a button that stays actuated may fire again.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RetriggerPolicy {
    /// A held button fires again every debounce window.
    #[default]
    WhileHeld,
    /// A button fires once per press; it must be released before firing again.
    EdgeOnly,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct InputConfig {
    /// Minimum time between two accepted actuations of the same button
    pub debounce_ms: u64,
    pub retrigger: RetriggerPolicy,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            retrigger: RetriggerPolicy::WhileHeld,
        }
    }
}

impl InputConfig {
    pub const fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
