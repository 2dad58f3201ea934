//! `qfetch get <url>...` – fetch URLs through the scheduler and save them.

use anyhow::{Context, Result};
use qfetch_core::checksum;
use qfetch_core::config::QfetchConfig;
use qfetch_core::fetcher::{Fetcher, HttpFetcher, HttpOptions};
use qfetch_core::{FetchResult, FetchScheduler, FetchTask, SchedulerConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::cli::output;

#[derive(Debug)]
pub struct GetArgs {
    pub urls: Vec<String>,
    pub output_dir: PathBuf,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub checksum: bool,
}

/// What happened to one URL.
struct Report {
    url: String,
    saved: Result<(PathBuf, usize, Option<String>)>,
}

pub async fn run_get(cfg: &QfetchConfig, args: GetArgs) -> Result<()> {
    let limit = args.jobs.unwrap_or(cfg.concurrency_limit);
    let fetcher = HttpFetcher::new(HttpOptions::from(&cfg.http_or_default()));
    let sched = FetchScheduler::new(fetcher, SchedulerConfig::new(limit));

    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| format!("create {}", args.output_dir.display()))?;

    let tasks = queue_all(&sched, &args.urls);
    let urls: Vec<String> = tasks.iter().map(|t| t.key().clone()).collect();
    let names = output::assign_filenames(&urls);
    let deadline = args.timeout_secs.map(Duration::from_secs);

    let interrupt = {
        let sched = sched.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted; cancelling remaining fetches");
                sched.cancel_all();
            }
        })
    };

    let mut reports = JoinSet::new();
    for (task, name) in tasks.into_iter().zip(names) {
        let sched = sched.clone();
        let path = args.output_dir.join(name);
        let want_digest = args.checksum;
        reports.spawn(async move {
            let result = finish_within(&sched, &task, deadline).await;
            let saved = save(result, path, want_digest).await;
            Report {
                url: task.key().clone(),
                saved,
            }
        });
    }
    tracing::info!(
        count = urls.len(),
        requested = args.urls.len(),
        limit = sched.concurrency_limit(),
        "fetches queued"
    );

    let mut failed = 0usize;
    while let Some(joined) = reports.join_next().await {
        let report = joined.context("fetch report task")?;
        match report.saved {
            Ok((path, len, digest)) => match digest {
                Some(d) => println!("{}  {}  ({} bytes)", d, path.display(), len),
                None => println!("{}  ({} bytes)", path.display(), len),
            },
            Err(e) => {
                failed += 1;
                eprintln!("{}: {:#}", report.url, e);
            }
        }
    }
    interrupt.abort();

    if failed > 0 {
        anyhow::bail!("{} of {} fetch(es) failed", failed, urls.len());
    }
    Ok(())
}

/// Add every URL to `sched`, one task per distinct fetch.
///
/// Repeated URLs coalesce inside the scheduler; the returned list keeps the
/// first occurrence of each task in request order.
fn queue_all<F: Fetcher<String>>(
    sched: &FetchScheduler<String, F>,
    urls: &[String],
) -> Vec<FetchTask<String>> {
    let mut tasks: Vec<FetchTask<String>> = Vec::new();
    for url in urls {
        let task = sched.add(url.clone());
        if !tasks.iter().any(|t| t.same_task(&task)) {
            tasks.push(task);
        }
    }
    tasks
}

/// Wait for `task`, cancelling it if `deadline` passes first.
async fn finish_within<F: Fetcher<String>>(
    sched: &FetchScheduler<String, F>,
    task: &FetchTask<String>,
    deadline: Option<Duration>,
) -> FetchResult {
    let Some(deadline) = deadline else {
        return task.await_finish().await;
    };
    match tokio::time::timeout(deadline, task.await_finish()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(url = %task.key(), "deadline passed; cancelling");
            sched.cancel(task.key());
            task.await_finish().await
        }
    }
}

async fn save(
    result: FetchResult,
    path: PathBuf,
    want_digest: bool,
) -> Result<(PathBuf, usize, Option<String>)> {
    let body = result?;
    tokio::fs::write(&path, &body)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    let digest = want_digest.then(|| checksum::sha256_bytes(&body));
    Ok((path, body.len(), digest))
}
