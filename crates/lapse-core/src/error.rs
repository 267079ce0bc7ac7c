use std::time::Duration;

use thiserror::Error;

/// Opaque error returned by a task handler. The core never interprets it.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LapseError {
    #[error("container is empty")]
    EmptyContainer,

    #[error("payload must not be empty")]
    InvalidPayload,

    #[error("queue is full: depth={depth} exceeds max_depth={max_depth}")]
    QueueFull { depth: usize, max_depth: usize },

    #[error("delay must be positive, got {0:?}")]
    InvalidDelay(Duration),

    #[error("dispatcher has been stopped")]
    DispatcherStopped,
}

/// Errors raised while loading or validating [`crate::config::LapseConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
