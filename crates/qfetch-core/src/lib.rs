//! Bounded-concurrency, single-flight resource fetching.
//!
//! [`FetchScheduler`] admits at most N fetches at once, coalesces repeated
//! requests for a key into one [`FetchTask`], lets pending keys be
//! reprioritized, and broadcasts each outcome to every waiter.

pub mod checksum;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod scheduler;
pub mod sync;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use error::FetchError;
pub use fetcher::{Fetcher, HttpFetcher};
pub use scheduler::{FetchScheduler, SchedulerConfig};
pub use task::{FetchResult, FetchTask, ResourceKey, TaskStatus};
