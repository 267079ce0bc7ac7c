//! Wheel geometry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of slots: one hour of one-second ticks.
pub const DEFAULT_SLOT_COUNT: usize = 3600;

/// Default tick length.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Geometry of a [`crate::wheel::TimeWheel`]: `slot_count` slots advanced once per `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub slot_count: usize,

    #[serde(rename = "tick_ms", with = "crate::config::duration_ms")]
    pub tick: Duration,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            tick: DEFAULT_TICK,
        }
    }
}

impl WheelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_count == 0 {
            return Err(ConfigError::Invalid("wheel.slot_count must be > 0".into()));
        }
        if self.tick.is_zero() {
            return Err(ConfigError::Invalid("wheel.tick_ms must be > 0".into()));
        }
        Ok(())
    }

    /// Time covered by one full sweep.
    pub fn span(&self) -> Duration {
        self.tick
            .checked_mul(u32::try_from(self.slot_count).unwrap_or(u32::MAX))
            .unwrap_or(Duration::MAX)
    }

    /// Number of whole ticks needed to cover `delay`. A partial tick counts as one.
    pub fn ticks_for(&self, delay: Duration) -> u64 {
        let ticks = delay.as_nanos().div_ceil(self.tick.as_nanos());
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}
