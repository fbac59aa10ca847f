//! Bounded concurrency dispatcher
//!
//! Fans a batch of tasks out to at most `width` concurrently running tokio
//! tasks and yields `(task, result)` pairs as they complete. Completion order
//! is unrelated to submission order; consumers fold results one at a time.

use std::future::Future;

use futures::stream::{self, Stream, StreamExt};
use tracing::error;

use crate::errors::DispatchError;

/// Run `worker` over `tasks` with at most `width` in flight
///
/// A `width` of zero is treated as one. There is no retry here; wrap a
/// [`Fetcher`](crate::app::fetch::Fetcher) call in `worker` for that.
pub fn dispatch<T, R, F, Fut>(
    tasks: impl IntoIterator<Item = T>,
    worker: F,
    width: usize,
) -> impl Stream<Item = (T, Result<R, DispatchError>)>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let width = width.max(1);
    stream::iter(tasks)
        .map(move |task| {
            let handle = tokio::spawn(worker(task.clone()));
            async move {
                let result = handle.await.map_err(|e| {
                    error!("Worker task failed: {}", e);
                    DispatchError::WorkerFailed {
                        message: e.to_string(),
                    }
                });
                (task, result)
            }
        })
        .buffer_unordered(width)
}
