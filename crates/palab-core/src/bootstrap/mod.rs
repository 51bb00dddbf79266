//! Bootstrap of the lab's datasets and models.
//!
//! [`BootstrapManager`] installs the text dataset, the speech dataset and the
//! TTS model into fixed directories under the data root, one after another.
//! Each asset's outcome is tracked in a persisted [`BootstrapState`]; a
//! provenance record is appended for every installed asset.

mod manager;
mod sources;
mod store;
mod types;

pub use manager::{BootstrapEvent, BootstrapManager};
pub use sources::{resolve_source, select_files, HubClient, ResolvedSource};
pub use store::{JsonFileStore, MemoryStore, StatusStore, PROVENANCE_FILE, STATUS_FILE};
pub use types::{
    AssetKind, AssetState, AssetStatus, BootstrapState, Phase, ProvenanceRecord, RepoType,
};

use std::time::{SystemTime, UNIX_EPOCH};

/// Read the persisted state, never failing: a missing status gives the
/// default state, an unreadable one the default state with `load_error` set.
/// Assets interrupted mid-install are reset.
pub fn load_state<S: StatusStore + ?Sized>(store: &S) -> BootstrapState {
    match store.load_state() {
        Ok(Some(mut state)) => {
            state.load_error = None;
            let reset = state.recover_stale();
            if reset > 0 {
                tracing::warn!(reset, "reset assets left installing by an interrupted run");
            }
            state
        }
        Ok(None) => BootstrapState::default(),
        Err(e) => {
            tracing::warn!("ignoring unreadable bootstrap status: {:#}", e);
            BootstrapState {
                load_error: Some(format!("{:#}", e)),
                ..BootstrapState::default()
            }
        }
    }
}

/// Seconds since the Unix epoch (0 if the clock is before it).
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
