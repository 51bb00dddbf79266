//! `palab reset <kind>` – mark one asset for re-download.

use anyhow::Result;
use palab_core::bootstrap::{AssetKind, BootstrapManager, JsonFileStore};
use palab_core::config::LabConfig;
use std::path::Path;

pub async fn run_reset(cfg: LabConfig, root: &Path, kind: AssetKind) -> Result<()> {
    let fetcher = crate::cli::fetcher(&cfg);
    let mut mgr = BootstrapManager::new(cfg, root, fetcher, JsonFileStore::new(root));
    mgr.reset(kind)?;
    tracing::info!(kind = %kind, "asset reset");
    println!("{} will be downloaded on the next bootstrap.", kind.title());
    Ok(())
}
