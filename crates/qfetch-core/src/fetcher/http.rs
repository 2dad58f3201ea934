//! HTTP GET fetcher on libcurl.
//!
//! Each fetch runs a blocking curl transfer on tokio's blocking pool and
//! collects the whole body in memory.

use anyhow::{Context, Result};
use bytes::Bytes;
use std::time::Duration;

use crate::config::HttpConfig;

use super::Fetcher;

/// Transfer settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Whole-transfer limit enforced by curl.
    pub timeout: Duration,
    pub max_redirections: u32,
    pub user_agent: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for HttpOptions {
    fn from(cfg: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            max_redirections: cfg.max_redirections,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// Fetches `http://` / `https://` URLs with a plain GET.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    opts: HttpOptions,
}

impl HttpFetcher {
    pub fn new(opts: HttpOptions) -> Self {
        Self { opts }
    }
}

impl Fetcher<String> for HttpFetcher {
    async fn fetch(&self, key: &String) -> Result<Bytes> {
        let url = key.clone();
        let opts = self.opts.clone();
        tokio::task::spawn_blocking(move || get(&url, &opts))
            .await
            .context("fetch worker panicked")?
    }
}

/// Blocking GET of `url`; returns the body on a 2xx status.
fn get(url: &str, opts: &HttpOptions) -> Result<Bytes> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(opts.max_redirections)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.timeout)?;
    if let Some(ua) = &opts.user_agent {
        easy.useragent(ua)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer
            .perform()
            .with_context(|| format!("GET {} failed", url))?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }

    tracing::debug!(url, bytes = body.len(), "http fetch complete");
    Ok(Bytes::from(body))
}
