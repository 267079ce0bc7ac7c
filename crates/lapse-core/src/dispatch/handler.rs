//! Handler trait - QueueTask が 1 件ずつ呼び出す処理
//!
//! - `TaskHandler<T>`: object-safe な async trait (`Arc<dyn TaskHandler<T>>` で保持)
//! - `HandlerFn`: async closure をそのまま handler にするアダプタ

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;

/// A handler invoked by [`crate::dispatch::QueueTask`] for each payload, one at a time.
///
/// The dispatcher never calls `execute` concurrently on the same instance.
#[async_trait]
pub trait TaskHandler<T>: Send + Sync
where
    T: Send + 'static,
{
    async fn execute(&self, data: T) -> Result<(), HandlerError>;

    /// Called after `execute` returned an error (or panicked).
    fn on_failure(&self, _error: &HandlerError) {}
}

/// Closure-backed handler.
///
/// ```ignore
/// let handler = HandlerFn::arc(|n: u32| async move {
///     println!("got {n}");
///     Ok::<(), HandlerError>(())
/// });
/// let dispatcher = QueueTask::new(handler, QueueTaskOptions::default());
/// ```
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    pub fn new<T, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), HandlerError>>,
    {
        Self { f }
    }

    pub fn arc<T, Fut>(f: F) -> Arc<Self>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), HandlerError>>,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> TaskHandler<T> for HandlerFn<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn execute(&self, data: T) -> Result<(), HandlerError> {
        (self.f)(data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn handler_fn_forwards_payload() {
        let total = Arc::new(AtomicU32::new(0));
        let handler = HandlerFn::arc({
            let total = Arc::clone(&total);
            move |n: u32| {
                let total = Arc::clone(&total);
                async move {
                    total.fetch_add(n, Ordering::SeqCst);
                    Ok::<(), HandlerError>(())
                }
            }
        });

        handler.execute(2).await.unwrap();
        handler.execute(40).await.unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 42);
    }

    #[tokio::test]
    async fn handler_fn_propagates_errors() {
        let handler = HandlerFn::new(|s: String| async move {
            if s.is_empty() {
                Err::<(), HandlerError>("empty input".into())
            } else {
                Ok(())
            }
        });

        assert!(handler.execute("ok".to_string()).await.is_ok());
        let err = handler.execute(String::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "empty input");
    }
}
