//! `palab provenance` – list where installed assets came from.

use anyhow::Result;
use palab_core::bootstrap::{JsonFileStore, StatusStore};
use std::path::Path;

pub async fn run_provenance(root: &Path, json: bool) -> Result<()> {
    let records = JsonFileStore::new(root).load_provenance()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No provenance records.");
        return Ok(());
    }
    println!("{:<12} {:<6} {:<32} {}", "TIMESTAMP", "KIND", "SOURCE", "FILES");
    for r in records {
        let files = r.metadata.get("files").map(String::as_str).unwrap_or("-");
        println!("{:<12} {:<6} {:<32} {}", r.timestamp, r.id, r.source, files);
    }
    Ok(())
}
