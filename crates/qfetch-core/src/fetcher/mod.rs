//! The fetch capability the scheduler consumes.
//!
//! The scheduler never performs I/O itself; it hands each admitted key to a
//! [`Fetcher`]. [`HttpFetcher`] is the stock implementation for URL keys.

mod http;

use std::future::Future;

use anyhow::Result;
use bytes::Bytes;

pub use http::{HttpFetcher, HttpOptions};

/// Fetches the bytes behind one key.
///
/// Must be safe to call concurrently for distinct keys. The scheduler calls it
/// at most once per task.
pub trait Fetcher<K>: Send + Sync + 'static {
    fn fetch(&self, key: &K) -> impl Future<Output = Result<Bytes>> + Send;
}

impl<K, T: Fetcher<K>> Fetcher<K> for std::sync::Arc<T> {
    fn fetch(&self, key: &K) -> impl Future<Output = Result<Bytes>> + Send {
        (**self).fetch(key)
    }
}
