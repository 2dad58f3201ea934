//! Test fetcher with scripted completions and concurrency accounting.

use anyhow::{anyhow, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::fetcher::Fetcher;
use crate::sync::GuardedState;

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
    gates: HashMap<String, oneshot::Sender<Result<Bytes>>>,
}

/// In `gated` mode every fetch blocks until the test calls `complete`;
/// otherwise it yields a few times and returns `body:<key>`.
pub(crate) struct ScriptedFetcher {
    gated: bool,
    script: GuardedState<Script>,
}

impl ScriptedFetcher {
    pub(crate) fn immediate() -> Arc<Self> {
        Arc::new(Self {
            gated: false,
            script: GuardedState::default(),
        })
    }

    pub(crate) fn gated() -> Arc<Self> {
        Arc::new(Self {
            gated: true,
            script: GuardedState::default(),
        })
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.script.mutate(|s| s.calls.clone())
    }

    pub(crate) fn call_count(&self, key: &str) -> usize {
        self.script
            .mutate(|s| s.calls.iter().filter(|k| k.as_str() == key).count())
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.script.mutate(|s| s.max_in_flight)
    }

    /// Yield until the fetcher has been called for `key`.
    pub(crate) async fn wait_for_call(&self, key: &str) {
        while self.call_count(key) == 0 {
            tokio::task::yield_now().await;
        }
    }

    /// Release a gated fetch with `result`. Returns false if `key` isn't blocked.
    pub(crate) fn complete(&self, key: &str, result: Result<Bytes>) -> bool {
        match self.script.mutate(|s| s.gates.remove(key)) {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }
}

impl Fetcher<String> for ScriptedFetcher {
    async fn fetch(&self, key: &String) -> Result<Bytes> {
        let gate = self.script.mutate(|s| {
            s.calls.push(key.clone());
            s.in_flight += 1;
            s.max_in_flight = s.max_in_flight.max(s.in_flight);
            if self.gated {
                let (tx, rx) = oneshot::channel();
                s.gates.insert(key.clone(), tx);
                Some(rx)
            } else {
                None
            }
        });

        let result = match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(anyhow!("gate dropped"))),
            None => {
                for _ in 0..3 {
                    tokio::task::yield_now().await;
                }
                Ok(Bytes::from(format!("body:{key}")))
            }
        };

        self.script.mutate(|s| s.in_flight -= 1);
        result
    }
}

pub(crate) fn k(key: &str) -> String {
    key.to_string()
}
