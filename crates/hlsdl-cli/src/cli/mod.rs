//! CLI for the hlsdl HLS downloader.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hlsdl_core::config::{self, HlsdlConfig};
use std::path::PathBuf;

use commands::{run_download, run_validate};

/// Top-level CLI for hlsdl.
#[derive(Debug, Parser)]
#[command(name = "hlsdl")]
#[command(about = "hlsdl: download an HLS stream into a single transport stream file", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every segment of a playlist and merge them into one file.
    Download(DownloadArgs),

    /// Check that files look like MPEG transport streams.
    Validate {
        /// Files to check.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

/// Options for `hlsdl download`. Anything left unset comes from the config file.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Playlist URL (master or media, HTTP/HTTPS).
    pub url: String,

    /// Output file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Staging directory for segment files.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Retry rounds for failed segments.
    #[arg(long, value_name = "N")]
    pub retry: Option<u32>,

    /// Maximum concurrent segment downloads.
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip the transport stream sync check on segments.
    #[arg(long)]
    pub no_validate: bool,
}

impl DownloadArgs {
    /// Layer command-line overrides on top of the loaded config.
    pub fn apply(&self, cfg: &mut HlsdlConfig) {
        if let Some(output) = &self.output {
            cfg.output = output.clone();
        }
        if let Some(dir) = &self.dir {
            cfg.staging_dir = dir.clone();
        }
        if let Some(retry) = self.retry {
            cfg.max_retry = retry;
        }
        if let Some(threads) = self.threads {
            cfg.threads = threads;
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout_secs = timeout;
        }
        if self.no_validate {
            cfg.validate = false;
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Download(args) => {
                let mut cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                args.apply(&mut cfg);
                run_download(&args.url, &cfg).await?;
            }
            CliCommand::Validate { paths } => run_validate(&paths).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
