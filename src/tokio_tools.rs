use std::future::Future;

use tokio::task::JoinHandle;
use tracing::Instrument;

/// Spawn a Tokio task wrapped in a named trace span, so per-room actor
/// tasks can be told apart in the logs.
pub fn spawn_named<F>(name: impl Into<String>, future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let span = tracing::info_span!("task", task_name = %name.into());
    tokio::spawn(future.instrument(span))
}
