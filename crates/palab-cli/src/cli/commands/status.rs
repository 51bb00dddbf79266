//! `palab status` – show the bootstrap state of each asset.

use anyhow::Result;
use palab_core::bootstrap::{load_state, BootstrapState, JsonFileStore};
use palab_core::units::format_bytes;
use std::path::Path;

pub async fn run_status(root: &Path, json: bool) -> Result<()> {
    let store = JsonFileStore::new(root);
    let state = load_state(&store);
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        if let Some(err) = &state.load_error {
            println!("warning: {} is unreadable ({}); showing defaults", store.status_path().display(), err);
        }
        print_state(&state);
    }
    Ok(())
}

/// Table of assets followed by the phase line.
pub(crate) fn print_state(state: &BootstrapState) {
    println!("{:<6} {:<14} {:>10} {:>5}  {}", "KIND", "STATUS", "SIZE", "PCT", "SOURCE");
    for (kind, asset) in &state.assets {
        let size = asset
            .bytes_downloaded
            .map(format_bytes)
            .unwrap_or_else(|| "-".to_string());
        let pct = asset
            .progress_percent
            .map(|p| format!("{p}%"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<14} {:>10} {:>5}  {}",
            kind,
            asset.status.as_str(),
            size,
            pct,
            asset.selected_source_id.as_deref().unwrap_or("-")
        );
        if let Some(msg) = &asset.error_message {
            println!("       error: {}", msg);
        }
    }
    let total = state
        .total_bytes
        .unwrap_or_else(|| state.installed_bytes());
    println!("phase: {}  installed: {}", state.phase.as_str(), format_bytes(total));
}
