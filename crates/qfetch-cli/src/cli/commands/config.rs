//! `qfetch config` – show where settings live and what is in effect.

use anyhow::Result;
use qfetch_core::config::{self, QfetchConfig};

pub fn run_config(cfg: &QfetchConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    let mut effective = cfg.clone();
    effective.http = Some(cfg.http_or_default());
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}
