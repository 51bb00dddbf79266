//! `palab checksum` – SHA-256 of a file, in `sha256sum` format.

use anyhow::{Context, Result};
use palab_core::checksum;
use std::path::Path;

pub async fn run_checksum(path: &Path) -> Result<()> {
    let digest =
        checksum::sha256_path(path).with_context(|| format!("checksum {}", path.display()))?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
