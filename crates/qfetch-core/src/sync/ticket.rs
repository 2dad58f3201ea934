//! Single-slot lock with FIFO hand-off.
//!
//! Used where something must happen exactly once even when several callers
//! race to do it (e.g. a one-shot handler registration): the first caller
//! claims, the rest queue up and are granted in arrival order.

use std::collections::VecDeque;

use tokio::sync::oneshot;

use super::GuardedState;

#[derive(Debug, Default)]
struct TicketState {
    claimed: bool,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Mutual exclusion with strict FIFO wakeup order.
///
/// There is no guard object; the holder calls [`release`](Self::release)
/// explicitly. A waiter whose `wait_for_claim` future is dropped never ends up
/// holding the lock: if it is dropped before its grant it is skipped, and if
/// it is dropped after the grant was sent but before it was observed it
/// passes the lock straight on.
#[derive(Debug, Default)]
pub struct TicketLock {
    state: GuardedState<TicketState>,
}

impl TicketLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock if it is free. Never suspends.
    pub fn claim(&self) -> bool {
        self.state.mutate(|s| {
            if s.claimed {
                false
            } else {
                s.claimed = true;
                true
            }
        })
    }

    /// Suspend until the caller holds the lock.
    pub async fn wait_for_claim(&self) {
        let rx = self.state.mutate(|s| {
            if s.claimed {
                let (tx, rx) = oneshot::channel();
                s.waiters.push_back(tx);
                Some(rx)
            } else {
                s.claimed = true;
                None
            }
        });
        let Some(rx) = rx else {
            return;
        };

        let mut pending = PendingGrant {
            lock: self,
            rx,
            granted: false,
        };
        // Senders are only dropped after a successful send or together with
        // the lock itself, which `&self` keeps alive.
        let _ = (&mut pending.rx).await;
        pending.granted = true;
    }

    /// Hand the lock to the oldest live waiter, or mark it free.
    pub fn release(&self) {
        self.state.mutate(|s| {
            while let Some(tx) = s.waiters.pop_front() {
                if tx.send(()).is_ok() {
                    return;
                }
            }
            s.claimed = false;
        });
    }

    pub fn is_claimed(&self) -> bool {
        self.state.mutate(|s| s.claimed)
    }

    /// Number of callers still suspended in `wait_for_claim`.
    pub fn waiting(&self) -> usize {
        self.state
            .mutate(|s| s.waiters.iter().filter(|tx| !tx.is_closed()).count())
    }
}

/// Owned by a suspended `wait_for_claim`; resolves cancellation on drop.
struct PendingGrant<'a> {
    lock: &'a TicketLock,
    rx: oneshot::Receiver<()>,
    granted: bool,
}

impl Drop for PendingGrant<'_> {
    fn drop(&mut self) {
        if self.granted {
            return;
        }
        // After close() no further grant can land; anything already sent
        // means we hold the lock and must pass it on.
        self.rx.close();
        if self.rx.try_recv().is_ok() {
            tracing::debug!("ticket lock granted to a cancelled waiter; passing it on");
            self.lock.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn until_waiting(lock: &TicketLock, n: usize) {
        while lock.waiting() < n {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn claim_and_release() {
        let lock = TicketLock::new();
        assert!(lock.claim());
        assert!(!lock.claim());
        assert!(lock.is_claimed());
        lock.release();
        assert!(!lock.is_claimed());
        assert!(lock.claim());
    }

    #[tokio::test]
    async fn wait_for_claim_on_free_lock_returns_immediately() {
        let lock = TicketLock::new();
        lock.wait_for_claim().await;
        assert!(lock.is_claimed());
        assert_eq!(lock.waiting(), 0);
    }

    #[tokio::test]
    async fn waiters_are_granted_in_arrival_order() {
        let lock = Arc::new(TicketLock::new());
        let order = Arc::new(GuardedState::new(Vec::new()));
        assert!(lock.claim());

        let mut handles = Vec::new();
        for id in 0..5 {
            let l = Arc::clone(&lock);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                l.wait_for_claim().await;
                order.mutate(|o| o.push(id));
                l.release();
            }));
            until_waiting(&lock, id + 1).await;
        }

        lock.release();
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(order.read(), vec![0, 1, 2, 3, 4]);
        assert!(!lock.is_claimed());
    }

    #[tokio::test]
    async fn waiter_dropped_before_grant_is_skipped() {
        let lock = Arc::new(TicketLock::new());
        assert!(lock.claim());

        let l = Arc::clone(&lock);
        let abandoned = tokio::spawn(async move { l.wait_for_claim().await });
        until_waiting(&lock, 1).await;
        abandoned.abort();
        let _ = abandoned.await;
        assert_eq!(lock.waiting(), 0);

        lock.release();
        assert!(!lock.is_claimed());
    }

    #[tokio::test]
    async fn waiter_dropped_after_grant_passes_lock_on() {
        let lock = Arc::new(TicketLock::new());
        assert!(lock.claim());

        let l = Arc::clone(&lock);
        let first = tokio::spawn(async move { l.wait_for_claim().await });
        until_waiting(&lock, 1).await;

        let l = Arc::clone(&lock);
        let second = tokio::spawn(async move {
            l.wait_for_claim().await;
            true
        });
        until_waiting(&lock, 2).await;

        // Grant lands on `first`, which is cancelled before it can observe it.
        lock.release();
        first.abort();
        let _ = first.await;

        assert!(second.await.unwrap());
        assert!(lock.is_claimed());
        lock.release();
        assert!(!lock.is_claimed());
    }
}
