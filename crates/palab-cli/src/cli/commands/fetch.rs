//! `palab fetch` – download one URL with the same limits as the bootstrap.

use anyhow::{Context, Result};
use palab_core::checksum::sha256_path;
use palab_core::config::LabConfig;
use palab_core::downloader::{download_file, DownloadTask};
use palab_core::retry::run_with_retry;
use palab_core::units::{format_bytes, mb_to_bytes};
use palab_core::url_model::derive_filename;
use std::path::PathBuf;

pub async fn run_fetch(
    cfg: &LabConfig,
    url: String,
    dest: Option<PathBuf>,
    max_mb: Option<u64>,
) -> Result<()> {
    let dest = match dest {
        Some(d) => d,
        None => std::env::current_dir()?.join(derive_filename(&url)),
    };
    let fetcher = crate::cli::fetcher(cfg);
    let policy = cfg.retry_policy();
    let limit = max_mb.map(mb_to_bytes);

    let (written, digest, dest) = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut step = 0u8;
        let mut task = DownloadTask::new(url.as_str(), &dest)
            .with_limit(limit)
            .with_progress(|p| {
                if p >= step {
                    println!("  {:>3}%", p);
                    step = p.saturating_add(10);
                }
            });
        let written = run_with_retry(&policy, None, || download_file(&fetcher, &mut task))
            .with_context(|| format!("download {}", url))?;
        drop(task);
        let digest = sha256_path(&dest).with_context(|| format!("checksum {}", dest.display()))?;
        Ok((written, digest, dest))
    })
    .await??;

    println!("saved {} ({})", dest.display(), format_bytes(written));
    println!("sha256 {}", digest);
    Ok(())
}
