//! Terminal failure taxonomy for a fetch.

use std::sync::Arc;

/// Why a [`FetchTask`](crate::task::FetchTask) did not produce bytes.
///
/// Recorded once per task and replayed verbatim to every waiter, so it is
/// cheap to clone. Neither variant is retried by the scheduler.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The fetcher returned an error.
    #[error("fetch failed: {0:#}")]
    Failed(Arc<anyhow::Error>),
    /// The key was cancelled before or during its fetch.
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// The fetcher's error, if this is a fetch failure.
    pub fn underlying(&self) -> Option<&anyhow::Error> {
        match self {
            FetchError::Failed(e) => Some(e),
            FetchError::Cancelled => None,
        }
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(e: anyhow::Error) -> Self {
        FetchError::Failed(Arc::new(e))
    }
}
