//! Supervision scope for stage workers.

use super::CancellationToken;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// A supervision scope for the workers of one pipeline run.
///
/// Every stage worker is spawned through the scope so that one cancellation
/// token reaches all of them and [`PipelineScope::join`] can await every
/// worker before the run is considered finished. A worker suspended on a
/// handoff or a timer observes the token through its `select!` loop, so
/// cancelling the scope never leaves a worker blocked.
pub struct PipelineScope {
    /// Identifies this run in logs.
    run_id: Uuid,
    /// The cancellation token shared by all workers.
    token: Arc<CancellationToken>,
    /// Handles of spawned workers, joined in spawn order.
    handles: Mutex<Vec<(String, JoinHandle<()>)>>,
}

impl PipelineScope {
    /// Creates a new scope with a fresh run id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            token: Arc::new(CancellationToken::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Returns the run id of this scope.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the cancellation token shared by this scope's workers.
    #[must_use]
    pub fn token(&self) -> Arc<CancellationToken> {
        self.token.clone()
    }

    /// Spawns a stage worker supervised by this scope.
    pub fn spawn_worker<F>(&self, name: &str, worker: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = tracing::debug_span!("stage_worker", stage = name, run_id = %self.run_id);
        let handle = tokio::spawn(worker.instrument(span));
        self.handles.lock().push((name.to_string(), handle));
    }

    /// Requests cancellation of all workers in the scope.
    pub fn cancel(&self, reason: &str) {
        debug!(run_id = %self.run_id, reason, "cancelling pipeline scope");
        self.token.cancel(reason);
    }

    /// Waits for every spawned worker to finish.
    ///
    /// Panicked workers are logged and do not abort the join.
    pub async fn join(&self) {
        let handles: Vec<_> = {
            let mut guard = self.handles.lock();
            std::mem::take(&mut *guard)
        };

        for (name, handle) in handles {
            if let Err(join_error) = handle.await {
                warn!(stage = %name, run_id = %self.run_id, error = %join_error, "stage worker did not finish cleanly");
            }
        }
    }

    /// Cancels all workers and waits for them to finish.
    pub async fn shutdown(&self, reason: &str) {
        self.cancel(reason);
        self.join().await;
    }

    /// Returns the number of workers not yet joined.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.handles.lock().len()
    }
}

impl Default for PipelineScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PipelineScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineScope")
            .field("run_id", &self.run_id)
            .field("worker_count", &self.worker_count())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_join_waits_for_workers() {
        let scope = PipelineScope::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            scope.spawn_worker("count", async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        scope.join().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(scope.worker_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_parked_worker() {
        let scope = PipelineScope::new();
        let token = scope.token();

        scope.spawn_worker("parked", async move {
            token.cancelled().await;
        });

        let shutdown = scope.shutdown("test over");
        tokio::time::timeout(Duration::from_secs(1), shutdown)
            .await
            .expect("shutdown should not hang");
    }

    #[tokio::test]
    async fn test_panicked_worker_does_not_abort_join() {
        let scope = PipelineScope::new();

        scope.spawn_worker("panics", async {
            panic!("intentional test panic");
        });
        scope.spawn_worker("fine", async {});

        tokio::time::timeout(Duration::from_secs(1), scope.join())
            .await
            .expect("join should complete despite the panic");
    }

    #[tokio::test]
    async fn test_distinct_run_ids() {
        assert_ne!(PipelineScope::new().run_id(), PipelineScope::new().run_id());
    }
}
