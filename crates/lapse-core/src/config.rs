//! Construction-time configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! {
//!   "dispatcher": { "interrupt_on_error": false, "interval_ms": 0 },
//!   "wheel": { "slot_count": 3600, "tick_ms": 1000 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dispatch::QueueTaskOptions;
use crate::error::ConfigError;
use crate::wheel::WheelConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapseConfig {
    pub dispatcher: QueueTaskOptions,
    pub wheel: WheelConfig,
}

impl LapseConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: LapseConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wheel.validate()
    }
}

/// `Duration` <-> integer milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_object_yields_defaults() {
        let config = LapseConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LapseConfig::default());
        assert_eq!(config.wheel.slot_count, 3600);
        assert_eq!(config.wheel.tick, Duration::from_secs(1));
        assert!(!config.dispatcher.interrupt_on_error);
        assert_eq!(config.dispatcher.interval, Duration::ZERO);
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let config = LapseConfig::from_json_str(
            r#"{ "dispatcher": { "interrupt_on_error": true, "interval_ms": 250 },
                 "wheel": { "tick_ms": 100 } }"#,
        )
        .unwrap();
        assert!(config.dispatcher.interrupt_on_error);
        assert_eq!(config.dispatcher.interval, Duration::from_millis(250));
        assert_eq!(config.wheel.tick, Duration::from_millis(100));
        assert_eq!(config.wheel.slot_count, 3600);
    }

    #[test]
    fn zero_slot_count_is_rejected() {
        let err = LapseConfig::from_json_str(r#"{ "wheel": { "slot_count": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = LapseConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = LapseConfig::load("/definitely/not/here/lapse.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn serializes_durations_as_millis() {
        let value = serde_json::to_value(LapseConfig::default()).unwrap();
        assert_eq!(value["wheel"]["tick_ms"], 1000);
        assert_eq!(value["dispatcher"]["interval_ms"], 0);
    }
}
