//! lapse-core
//!
//! In-process task scheduling primitives.
//!
//! # モジュール構成
//! - **container**: thread-safe FIFO `Queue` / LIFO `Stack`
//! - **dispatch**: `QueueTask`（1 worker で順番に handler を実行する dispatcher）
//! - **wheel**: `TimeWheel`（遅延 timer を slot に振り分ける timing wheel）
//! - **ports**: Clock / IdGenerator の抽象化
//! - **config**: JSON で読める構成（dispatcher + wheel）
//! - **error**: エラー型

pub mod config;
pub mod container;
pub mod dispatch;
pub mod error;
pub mod ids;
pub mod ports;
pub mod wheel;

pub use config::LapseConfig;
pub use container::{FetchVerdict, Queue, Stack};
pub use dispatch::{
    DispatcherState, DispatcherStats, HandlerFn, QueueTask, QueueTaskOptions, TaskHandler,
};
pub use error::{ConfigError, HandlerError, LapseError};
pub use ids::TimerId;
pub use wheel::{PendingTimer, TimeWheel, WheelConfig, WheelStats};
