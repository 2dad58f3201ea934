use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::scheduler::SchedulerConfig;

/// Default number of fetches allowed in flight at once.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 32;

/// HTTP transfer parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_timeout_secs: u64,
    /// Seconds allowed for a whole transfer.
    pub timeout_secs: u64,
    /// Maximum number of redirects followed per fetch.
    pub max_redirections: u32,
    /// Optional User-Agent header; curl's default when missing.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 300,
            max_redirections: 10,
            user_agent: None,
        }
    }
}

/// Global configuration loaded from `~/.config/qfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QfetchConfig {
    /// Maximum number of fetches running at once.
    pub concurrency_limit: usize,
    /// Optional HTTP settings; if missing, built-in defaults are used.
    #[serde(default)]
    pub http: Option<HttpConfig>,
}

impl Default for QfetchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            http: None,
        }
    }
}

impl QfetchConfig {
    /// HTTP settings with defaults filled in.
    pub fn http_or_default(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::new(self.concurrency_limit)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("qfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<QfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = QfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: QfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
