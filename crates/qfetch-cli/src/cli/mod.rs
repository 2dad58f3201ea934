//! CLI for the qfetch resource fetcher.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use qfetch_core::config;
use std::path::{Path, PathBuf};

use commands::{run_checksum, run_config, run_get, GetArgs};

/// Top-level CLI for qfetch.
#[derive(Debug, Parser)]
#[command(name = "qfetch")]
#[command(about = "qfetch: bounded-concurrency fetcher with request coalescing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch one or more URLs; repeated URLs are fetched once.
    Get {
        /// HTTP/HTTPS URLs, fetched in the order given.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Directory to write bodies into (default: current directory).
        #[arg(short = 'o', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Fetch up to N URLs at once (default: concurrency_limit from config).
        #[arg(short = 'j', long, value_name = "N")]
        jobs: Option<usize>,

        /// Cancel any URL not finished within SECS of being queued.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Print the SHA-256 of each fetched body.
        #[arg(long)]
        checksum: bool,
    },

    /// Show the config file location and effective settings.
    Config,

    /// Compute SHA-256 of a file (e.g. a previously fetched body).
    Checksum {
        /// Path to the file.
        path: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                urls,
                output_dir,
                jobs,
                timeout,
                checksum,
            } => {
                let output_dir = match output_dir {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                let args = GetArgs {
                    urls,
                    output_dir,
                    jobs,
                    timeout_secs: timeout,
                    checksum,
                };
                run_get(&cfg, args).await?;
            }
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Checksum { path } => run_checksum(Path::new(&path))?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
