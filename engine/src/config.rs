use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::effects::DEFAULT_EXPLOSION_RADIUS;
use crate::matcher::DEFAULT_MIN_RUN_LENGTH;

pub const DEFAULT_STEP_DELAY: Duration = Duration::ZERO;
pub const DEFAULT_MAX_CASCADE_STEPS: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tuning knobs for match resolution. Every field falls back to its default
/// when missing, so an empty document is a valid config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default = "default_min_run_length")]
    pub min_run_length: usize,
    #[serde(default = "default_explosion_radius")]
    pub explosion_radius: usize,
    /// Pause between cascade transitions. Pacing only; results do not
    /// depend on it.
    #[serde(
        rename = "step_delay_ms",
        with = "crate::duration_ms",
        default = "default_step_delay"
    )]
    pub step_delay: Duration,
    #[serde(default = "default_max_cascade_steps")]
    pub max_cascade_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
            explosion_radius: DEFAULT_EXPLOSION_RADIUS,
            step_delay: DEFAULT_STEP_DELAY,
            max_cascade_steps: DEFAULT_MAX_CASCADE_STEPS,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        Ok(config.sanitized())
    }

    pub fn sanitized(mut self) -> Self {
        self.min_run_length = self.min_run_length.max(2);
        self.max_cascade_steps = self.max_cascade_steps.max(1);
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }
}

fn default_min_run_length() -> usize {
    DEFAULT_MIN_RUN_LENGTH
}

fn default_explosion_radius() -> usize {
    DEFAULT_EXPLOSION_RADIUS
}

fn default_step_delay() -> Duration {
    DEFAULT_STEP_DELAY
}

fn default_max_cascade_steps() -> usize {
    DEFAULT_MAX_CASCADE_STEPS
}
