//! Dispatch module: sequential task execution on top of [`crate::container::Queue`].
//!
//! # フロー
//! 1. `QueueTask::post()` で payload を末尾に追加し、worker を起こす
//! 2. worker は queue が空になるまで先頭から 1 件ずつ `TaskHandler::execute()` を呼ぶ
//! 3. 失敗時は `interrupt_on_error` に従って停止 or スキップ
//! 4. 空になったら park して次の post を待つ（ループは抜けない）

mod handler;
mod options;
mod queue_task;
mod state;

pub use handler::{HandlerFn, TaskHandler};
pub use options::QueueTaskOptions;
pub use queue_task::QueueTask;
pub use state::{DispatcherState, DispatcherStats};
