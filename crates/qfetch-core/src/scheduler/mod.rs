//! Bounded-concurrency, single-flight fetch scheduler.
//!
//! Keys are queued in `pending` and promoted into a bounded `active` set;
//! each admitted task runs its fetch on a spawned tokio task. Re-adding a key
//! never starts a second fetch: an active key returns its running task and a
//! pending key is moved to the front of the queue.
//!
//! Lock order is always scheduler state → task state.

mod queues;

use std::sync::Arc;

use crate::config::DEFAULT_CONCURRENCY_LIMIT;
use crate::fetcher::Fetcher;
use crate::sync::GuardedState;
use crate::task::{FetchTask, ResourceKey};

use queues::{Placement, Queues};

/// Scheduler parameters fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    concurrency_limit: usize,
}

impl SchedulerConfig {
    /// A limit of 0 is raised to 1.
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY_LIMIT)
    }
}

struct Shared<K, F> {
    limit: usize,
    fetcher: F,
    queues: GuardedState<Queues<K>>,
}

/// Fetches keys through `F` with at most `concurrency_limit` in flight.
///
/// Cloning yields another handle to the same scheduler. Work that has been
/// admitted keeps the scheduler's state alive until it settles, so dropping
/// every handle does not abandon queued or running fetches.
///
/// Admission spawns onto the ambient tokio runtime; calls made outside one
/// queue work that is admitted on the next call from inside a runtime.
pub struct FetchScheduler<K, F> {
    shared: Arc<Shared<K, F>>,
}

impl<K, F> Clone for FetchScheduler<K, F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, F> FetchScheduler<K, F>
where
    K: ResourceKey,
    F: Fetcher<K>,
{
    pub fn new(fetcher: F, config: SchedulerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                limit: config.concurrency_limit(),
                fetcher,
                queues: GuardedState::new(Queues::new()),
            }),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.shared.limit
    }

    /// Request `key`, returning the task that will fetch it.
    ///
    /// Active keys return their running task, pending keys jump to the front
    /// of the queue, anything else is queued at the back.
    pub fn add(&self, key: K) -> FetchTask<K> {
        let (task, placement) = self.shared.queues.mutate(|q| q.lookup_or_insert(key));
        match placement {
            Placement::Active => {}
            Placement::Reprioritized => {
                tracing::debug!(key = ?task.key(), "pending fetch moved to front");
            }
            Placement::Queued => {
                tracing::debug!(key = ?task.key(), "fetch queued");
                Shared::admit(&self.shared);
            }
        }
        task
    }

    /// Cancel `key` wherever it is. Returns false if the key isn't tracked.
    pub fn cancel(&self, key: &K) -> bool {
        let Some((task, freed_slot)) = self.shared.queues.mutate(|q| q.remove(key)) else {
            return false;
        };
        task.cancel();
        tracing::debug!(key = ?key, active = freed_slot, "fetch cancelled");
        if freed_slot {
            Shared::admit(&self.shared);
        }
        true
    }

    /// Cancel every pending and active fetch.
    pub fn cancel_all(&self) {
        let tasks = self.shared.queues.mutate(|q| q.drain());
        if tasks.is_empty() {
            return;
        }
        tracing::debug!(count = tasks.len(), "cancelling all fetches");
        for task in tasks {
            task.cancel();
        }
    }

    /// Number of tracked keys that have not reached a terminal outcome.
    pub fn remaining_count(&self) -> usize {
        self.shared.queues.mutate(|q| q.remaining())
    }

    pub fn pending_count(&self) -> usize {
        self.shared.queues.mutate(|q| q.pending_len())
    }

    pub fn active_count(&self) -> usize {
        self.shared.queues.mutate(|q| q.active_len())
    }

    /// Pending keys in admission order.
    pub fn pending_keys(&self) -> Vec<K> {
        self.shared.queues.mutate(|q| q.pending_keys())
    }
}

impl<K, F> Shared<K, F>
where
    K: ResourceKey,
    F: Fetcher<K>,
{
    /// Fill free slots from the front of `pending`.
    fn admit(this: &Arc<Self>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime; admission deferred");
            return;
        };
        while let Some(task) = this.queues.mutate(|q| q.next_admission(this.limit)) {
            tracing::debug!(key = ?task.key(), "fetch admitted");
            let shared = Arc::clone(this);
            runtime.spawn(async move {
                let settle = {
                    let shared = Arc::clone(&shared);
                    let task = task.clone();
                    move || {
                        shared.queues.mutate(|q| q.release(&task));
                        Shared::admit(&shared);
                    }
                };
                task.run(&shared.fetcher, settle).await;
            });
        }
    }
}
