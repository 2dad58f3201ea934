//! Pending/active bookkeeping. Always accessed under the scheduler's guard.

use std::collections::{HashMap, VecDeque};

use crate::task::{FetchTask, ResourceKey};

/// Where `add` found (or put) a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Placement {
    /// Already fetching; returned unchanged.
    Active,
    /// Was pending; moved to the front.
    Reprioritized,
    /// New task at the back of pending.
    Queued,
}

pub(super) struct Queues<K> {
    /// Front is admitted next.
    pending: VecDeque<FetchTask<K>>,
    active: HashMap<K, FetchTask<K>>,
}

impl<K: ResourceKey> Queues<K> {
    pub(super) fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            active: HashMap::new(),
        }
    }

    fn pending_position(&self, key: &K) -> Option<usize> {
        self.pending.iter().position(|t| t.key() == key)
    }

    pub(super) fn lookup_or_insert(&mut self, key: K) -> (FetchTask<K>, Placement) {
        if let Some(task) = self.active.get(&key) {
            if !task.is_finished() {
                return (task.clone(), Placement::Active);
            }
            // Outcome already published; its run just hasn't released the
            // slot yet. The key is requested afresh below.
            self.active.remove(&key);
        }
        if let Some(pos) = self.pending_position(&key) {
            if let Some(task) = self.pending.remove(pos) {
                // A pending task cancelled through its own handle is dead
                // weight; the key is requested afresh below.
                if !task.is_finished() {
                    self.pending.push_front(task.clone());
                    return (task, Placement::Reprioritized);
                }
            }
        }
        let task = FetchTask::new(key);
        self.pending.push_back(task.clone());
        (task, Placement::Queued)
    }

    /// Remove `key` from whichever collection holds it; the bool is true when
    /// an active slot was freed.
    pub(super) fn remove(&mut self, key: &K) -> Option<(FetchTask<K>, bool)> {
        if let Some(task) = self.active.remove(key) {
            return Some((task, true));
        }
        let pos = self.pending_position(key)?;
        self.pending.remove(pos).map(|task| (task, false))
    }

    /// Move the next live pending task into `active`, if a slot is free.
    pub(super) fn next_admission(&mut self, limit: usize) -> Option<FetchTask<K>> {
        while self.active.len() < limit {
            let task = self.pending.pop_front()?;
            if task.is_finished() {
                continue;
            }
            self.active.insert(task.key().clone(), task.clone());
            return Some(task);
        }
        None
    }

    /// Free the slot held by `task`. A no-op when the key was cancelled and
    /// possibly re-added as a different task meanwhile.
    pub(super) fn release(&mut self, task: &FetchTask<K>) -> bool {
        let held = self
            .active
            .get(task.key())
            .is_some_and(|t| t.same_task(task));
        if held {
            self.active.remove(task.key());
        }
        held
    }

    pub(super) fn drain(&mut self) -> Vec<FetchTask<K>> {
        let mut tasks: Vec<_> = self.pending.drain(..).collect();
        tasks.extend(self.active.drain().map(|(_, t)| t));
        tasks
    }

    /// Tracked keys whose task has not reached a terminal outcome.
    pub(super) fn remaining(&self) -> usize {
        self.pending
            .iter()
            .chain(self.active.values())
            .filter(|t| !t.is_finished())
            .count()
    }

    pub(super) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(super) fn active_len(&self) -> usize {
        self.active.len()
    }

    pub(super) fn pending_keys(&self) -> Vec<K> {
        self.pending.iter().map(|t| t.key().clone()).collect()
    }
}
