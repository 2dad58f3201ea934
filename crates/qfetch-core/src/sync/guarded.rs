//! Mutex-guarded value container.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Holds one value and only hands it out under exclusive access.
///
/// `read`, `write` and `mutate` are atomic relative to each other. Closures
/// passed to `mutate` must be short and must not await or call back into the
/// same instance (that deadlocks).
#[derive(Debug, Default)]
pub struct GuardedState<T> {
    inner: Mutex<T>,
}

impl<T> GuardedState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Replace the protected value.
    pub fn write(&self, value: T) {
        *self.lock() = value;
    }

    /// Run `f` with exclusive access and return its result.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    // A panic inside a closure must not wedge every later caller, so poisoning
    // is ignored and the value handed out as-is.
    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> GuardedState<T> {
    /// Snapshot of the protected value.
    pub fn read(&self) -> T {
        self.lock().clone()
    }
}
