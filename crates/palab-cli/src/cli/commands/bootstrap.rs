//! `palab bootstrap` – install every missing asset.
//!
//! The manager runs on a blocking task (libcurl is blocking); its events are
//! forwarded over a channel to a printer task. Ctrl-C cancels the run.

use anyhow::{bail, Result};
use palab_core::bootstrap::{AssetState, BootstrapEvent, BootstrapManager, JsonFileStore, Phase};
use palab_core::config::LabConfig;
use palab_core::control::CancelToken;
use palab_core::units::format_bytes;
use std::path::PathBuf;

use super::status::print_state;

/// Print a file's progress only every this many percent.
const PROGRESS_STEP: u8 = 10;

pub async fn run_bootstrap(cfg: LabConfig, root: PathBuf) -> Result<()> {
    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\ncancelling after the current chunk...");
                cancel.cancel();
            }
        })
    };

    let (events_tx, mut events_rx) = tokio::sync::mpsc::channel::<BootstrapEvent>(64);
    let printer = tokio::spawn(async move {
        let mut last_printed: Option<u8> = None;
        while let Some(event) = events_rx.recv().await {
            match event {
                BootstrapEvent::AssetStarted { kind } => {
                    println!("==> {} ({})", kind.title(), kind);
                }
                BootstrapEvent::SourceResolved { source, files, .. } => {
                    println!("    source {} ({} file(s))", source, files);
                }
                BootstrapEvent::FileProgress { file, index, count, percent, .. } => {
                    if percent == 0 {
                        last_printed = None;
                    }
                    let due = last_printed.map_or(true, |last| percent >= last.saturating_add(PROGRESS_STEP));
                    if due || percent == 100 {
                        println!("    [{}/{}] {} {:>3}%", index + 1, count, file, percent);
                        last_printed = Some(percent);
                    }
                }
                BootstrapEvent::AssetFinished { status: AssetState::Installed, bytes, .. } => {
                    println!("    installed, {}", format_bytes(bytes));
                }
                BootstrapEvent::AssetFinished { error, .. } => {
                    println!("    failed: {}", error.unwrap_or_default());
                }
            }
        }
    });

    let run_cancel = cancel.clone();
    let state = tokio::task::spawn_blocking(move || {
        let fetcher = crate::cli::fetcher(&cfg);
        let store = JsonFileStore::new(&root);
        let mut mgr = BootstrapManager::new(cfg, root, fetcher, store);
        let mut forward = |event: BootstrapEvent| {
            let _ = events_tx.blocking_send(event);
        };
        mgr.start_with(&mut forward, &run_cancel);
        mgr.into_state()
    })
    .await?;

    let _ = printer.await;
    ctrl_c.abort();

    println!();
    print_state(&state);
    if state.phase == Phase::Error {
        if cancel.is_cancelled() {
            bail!("bootstrap cancelled");
        }
        bail!("bootstrap finished with errors; run `palab bootstrap` again to retry failed assets");
    }
    Ok(())
}
