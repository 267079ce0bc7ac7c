//! Wheel module: delayed one-shot timers on a hashed timing wheel.
//!
//! # 構成
//! - `WheelConfig`: slot 数と tick 長（既定は 3600 slot × 1s）
//! - `TimeWheel`: ticker task が tick ごとに 1 slot を処理する
//! - action は発火時に別 task で実行される（ticker を止めない）

mod config;
mod slots;
mod task;
mod time_wheel;

pub use config::{DEFAULT_SLOT_COUNT, DEFAULT_TICK, WheelConfig};
pub use task::{PendingTimer, WheelStats};
pub use time_wheel::TimeWheel;
