//! One fetch of one resource key.
//!
//! A [`FetchTask`] is a cheap handle (clones share state). It moves through
//! `not started → started → succeeded | failed` exactly once, and every
//! waiter, past or future, observes the same terminal outcome.

mod key;
mod run;

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::FetchError;
use crate::sync::GuardedState;

pub use key::ResourceKey;

/// Terminal outcome of a fetch.
pub type FetchResult = Result<Bytes, FetchError>;

/// Coarse lifecycle position of a task, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    NotStarted,
    Started,
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(Default)]
struct TaskState {
    outcome: Option<FetchResult>,
    has_started: bool,
    start_waiters: Vec<oneshot::Sender<Result<(), FetchError>>>,
    finish_waiters: Vec<oneshot::Sender<FetchResult>>,
}

impl TaskState {
    fn status(&self) -> TaskStatus {
        match &self.outcome {
            None if self.has_started => TaskStatus::Started,
            None => TaskStatus::NotStarted,
            Some(Ok(_)) => TaskStatus::Succeeded,
            Some(Err(FetchError::Cancelled)) => TaskStatus::Cancelled,
            Some(Err(FetchError::Failed(_))) => TaskStatus::Failed,
        }
    }
}

struct TaskInner<K> {
    key: K,
    state: GuardedState<TaskState>,
}

/// Handle to the fetch of a single key.
pub struct FetchTask<K> {
    inner: Arc<TaskInner<K>>,
}

impl<K> Clone for FetchTask<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for FetchTask<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTask")
            .field("key", &self.inner.key)
            .field("status", &self.status())
            .finish()
    }
}

/// Either an already-known value or a receiver that will deliver it.
enum Wait<T> {
    Ready(T),
    Pending(oneshot::Receiver<T>),
}

impl<T> Wait<T> {
    async fn resolve(self) -> Option<T> {
        match self {
            Wait::Ready(v) => Some(v),
            Wait::Pending(rx) => rx.await.ok(),
        }
    }
}

impl<K> FetchTask<K> {
    pub(crate) fn new(key: K) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                key,
                state: GuardedState::new(TaskState::default()),
            }),
        }
    }

    pub fn key(&self) -> &K {
        &self.inner.key
    }

    pub fn status(&self) -> TaskStatus {
        self.inner.state.mutate(|s| s.status())
    }

    pub fn has_started(&self) -> bool {
        self.inner.state.mutate(|s| s.has_started)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state.mutate(|s| s.outcome.is_some())
    }

    /// The cached outcome, without waiting.
    pub fn outcome(&self) -> Option<FetchResult> {
        self.inner.state.mutate(|s| s.outcome.clone())
    }

    /// Wait until the fetcher has been invoked for this task.
    ///
    /// Resolves immediately if it already was. A task that ends without ever
    /// starting (cancelled while pending) resolves with its terminal error.
    pub async fn await_start(&self) -> Result<(), FetchError> {
        let wait = self.inner.state.mutate(|s| {
            if s.has_started {
                return Wait::Ready(Ok(()));
            }
            if let Some(Err(e)) = &s.outcome {
                return Wait::Ready(Err(e.clone()));
            }
            let (tx, rx) = oneshot::channel();
            s.start_waiters.retain(|w| !w.is_closed());
            s.start_waiters.push(tx);
            Wait::Pending(rx)
        });
        // `&self` keeps the senders alive; a closed channel reads as cancellation.
        wait.resolve().await.unwrap_or(Err(FetchError::Cancelled))
    }

    /// Wait for the terminal outcome. Late and repeated calls get the cached one.
    pub async fn await_finish(&self) -> FetchResult {
        let wait = self.inner.state.mutate(|s| match &s.outcome {
            Some(outcome) => Wait::Ready(outcome.clone()),
            None => {
                let (tx, rx) = oneshot::channel();
                // Callers that gave up (e.g. a timed-out race) leave closed senders behind.
                s.finish_waiters.retain(|w| !w.is_closed());
                s.finish_waiters.push(tx);
                Wait::Pending(rx)
            }
        });
        wait.resolve().await.unwrap_or(Err(FetchError::Cancelled))
    }

    /// Force the task to `Cancelled` unless it already finished.
    ///
    /// Returns whether this call changed the outcome. A fetch already in
    /// flight keeps running; its result is discarded.
    pub fn cancel(&self) -> bool {
        self.settle(Err(FetchError::Cancelled))
    }

    /// Whether both handles refer to the same fetch.
    pub fn same_task(&self, other: &FetchTask<K>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Mark started and wake start waiters. Returns false if the task is
    /// already terminal, in which case the fetch must not run.
    fn begin(&self) -> bool {
        self.inner.state.mutate(|s| {
            if s.outcome.is_some() {
                return false;
            }
            debug_assert!(!s.has_started, "fetch task run twice");
            s.has_started = true;
            for tx in s.start_waiters.drain(..) {
                let _ = tx.send(Ok(()));
            }
            true
        })
    }

    /// Record the terminal outcome once and resolve every waiter with it.
    fn settle(&self, result: FetchResult) -> bool {
        self.inner.state.mutate(|s| {
            if s.outcome.is_some() {
                return false;
            }
            let started = result.as_ref().map(|_| ()).map_err(FetchError::clone);
            for tx in s.start_waiters.drain(..) {
                let _ = tx.send(started.clone());
            }
            for tx in s.finish_waiters.drain(..) {
                let _ = tx.send(result.clone());
            }
            s.outcome = Some(result);
            true
        })
    }
}
