//! Driving a task through its fetch.

use anyhow::anyhow;

use crate::error::FetchError;
use crate::fetcher::Fetcher;

use super::{FetchTask, ResourceKey};

/// Runs the scheduler's settle hook exactly once, even if the run future is
/// dropped or the fetcher panics; in that case the task fails instead of
/// leaving its waiters hanging.
struct RunGuard<'a, K, S: FnOnce()> {
    task: &'a FetchTask<K>,
    on_settled: Option<S>,
}

impl<'a, K, S: FnOnce()> RunGuard<'a, K, S> {
    fn new(task: &'a FetchTask<K>, on_settled: S) -> Self {
        Self {
            task,
            on_settled: Some(on_settled),
        }
    }

    fn settled(&mut self) {
        if let Some(f) = self.on_settled.take() {
            f();
        }
    }
}

impl<K, S: FnOnce()> Drop for RunGuard<'_, K, S> {
    fn drop(&mut self) {
        if let Some(f) = self.on_settled.take() {
            self.task
                .settle(Err(FetchError::from(anyhow!("fetch aborted before completion"))));
            f();
        }
    }
}

impl<K: ResourceKey> FetchTask<K> {
    /// Invoke `fetcher` for this task and publish the result.
    ///
    /// Skips the fetch entirely if the task was cancelled first. `on_settled`
    /// runs once the outcome is published, so the key never leaves the
    /// scheduler while its result is still unknown.
    pub(crate) async fn run<F, S>(&self, fetcher: &F, on_settled: S)
    where
        F: Fetcher<K>,
        S: FnOnce(),
    {
        let mut guard = RunGuard::new(self, on_settled);

        if !self.begin() {
            tracing::debug!(key = ?self.key(), "task cancelled before start; fetch skipped");
            guard.settled();
            return;
        }

        tracing::debug!(key = ?self.key(), "fetch started");
        let result = fetcher.fetch(self.key()).await.map_err(FetchError::from);
        if let Err(e) = &result {
            tracing::warn!(key = ?self.key(), "{}", e);
        }

        if !self.settle(result) {
            tracing::debug!(key = ?self.key(), "task cancelled in flight; result discarded");
        }
        guard.settled();
    }
}
