//! CLI for the Persian AI Lab asset bootstrap.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use palab_core::bootstrap::AssetKind;
use palab_core::config::{self, LabConfig};
use palab_core::fetch::CurlFetcher;
use palab_core::logging;
use std::path::{Path, PathBuf};

use commands::{
    run_bootstrap, run_checksum, run_fetch, run_provenance, run_reset, run_status,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "palab")]
#[command(about = "Persian AI Lab: download and track the lab's datasets and models", long_about = None)]
pub struct Cli {
    /// Data root holding `datasets/`, `models/` and `logs/` (default: config or current dir).
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every asset that is not installed yet.
    Bootstrap,

    /// Show the bootstrap status of each asset.
    Status {
        /// Print the raw status JSON.
        #[arg(long)]
        json: bool,
    },

    /// List provenance records of installed assets.
    Provenance {
        /// Print the raw provenance JSON.
        #[arg(long)]
        json: bool,
    },

    /// Mark one asset (text, asr, tts) for download on the next bootstrap.
    Reset {
        /// Asset kind.
        kind: AssetKind,
    },

    /// Download a single URL with an optional size limit.
    Fetch {
        /// Direct HTTP/HTTPS URL.
        url: String,
        /// Destination file (default: name derived from the URL, in the current dir).
        dest: Option<PathBuf>,
        /// Refuse downloads larger than N MiB.
        #[arg(long, value_name = "N")]
        max_mb: Option<u64>,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let cfg = config::load_or_init()?;
        let root = match &self.root {
            Some(root) => root.clone(),
            None => cfg.data_root_or(&std::env::current_dir().context("current dir")?),
        };
        init_logging(&root);
        tracing::debug!(root = %root.display(), hub = %cfg.hub_url, "loaded config");

        match self.command {
            CliCommand::Bootstrap => run_bootstrap(cfg, root).await?,
            CliCommand::Status { json } => run_status(&root, json).await?,
            CliCommand::Provenance { json } => run_provenance(&root, json).await?,
            CliCommand::Reset { kind } => run_reset(cfg, &root, kind).await?,
            CliCommand::Fetch { url, dest, max_mb } => run_fetch(&cfg, url, dest, max_mb).await?,
            CliCommand::Checksum { path } => run_checksum(&path).await?,
        }

        Ok(())
    }
}

fn init_logging(root: &Path) {
    if let Err(e) = logging::init_logging(&logging::log_path(root)) {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }
}

/// HTTP client configured from `cfg` (bearer token for gated repositories).
pub(crate) fn fetcher(cfg: &LabConfig) -> CurlFetcher {
    CurlFetcher::new().with_bearer_token(cfg.hf_token.clone())
}

#[cfg(test)]
mod tests;
