//! Bootstrap orchestration: install every asset once, record what happened.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::sources::{resolve_source, HubClient};
use super::store::StatusStore;
use super::types::{AssetKind, AssetState, BootstrapState, Phase, ProvenanceRecord};
use super::{load_state, unix_timestamp};
use crate::checksum::sha256_path;
use crate::config::LabConfig;
use crate::control::CancelToken;
use crate::downloader::{download_file, DownloadTask};
use crate::fetch::HttpFetch;
use crate::retry::run_with_retry;
use crate::storage;
use crate::units::format_bytes;
use crate::url_model::LocalNames;

/// Progress notifications emitted during [`BootstrapManager::start_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapEvent {
    AssetStarted {
        kind: AssetKind,
    },
    SourceResolved {
        kind: AssetKind,
        source: String,
        files: usize,
    },
    FileProgress {
        kind: AssetKind,
        file: String,
        index: usize,
        count: usize,
        percent: u8,
    },
    AssetFinished {
        kind: AssetKind,
        status: AssetState,
        bytes: u64,
        error: Option<String>,
    },
}

/// Result of one successful asset install.
struct InstalledAsset {
    source: String,
    discovered: bool,
    files: Vec<String>,
    checksums: BTreeMap<String, String>,
    bytes: u64,
}

/// Owns the bootstrap state and drives installs through a fetcher and a store.
pub struct BootstrapManager<F, S> {
    config: LabConfig,
    data_root: PathBuf,
    fetcher: F,
    store: S,
    state: BootstrapState,
}

impl<F: HttpFetch, S: StatusStore> BootstrapManager<F, S> {
    /// Load the persisted state from `store` (recovering stale records).
    pub fn new(config: LabConfig, data_root: impl Into<PathBuf>, fetcher: F, store: S) -> Self {
        let state = load_state(&store);
        Self {
            config,
            data_root: data_root.into(),
            fetcher,
            store,
            state,
        }
    }

    pub fn status(&self) -> &BootstrapState {
        &self.state
    }

    pub fn into_state(self) -> BootstrapState {
        self.state
    }

    pub fn provenance(&self) -> Result<Vec<ProvenanceRecord>> {
        self.store.load_provenance()
    }

    /// Install every asset that is not installed yet.
    pub fn start(&mut self) -> &BootstrapState {
        self.start_with(&mut |_: BootstrapEvent| {}, &CancelToken::new())
    }

    /// [`start`](Self::start) with a progress observer and a cancel token.
    pub fn start_with(
        &mut self,
        observer: &mut dyn FnMut(BootstrapEvent),
        cancel: &CancelToken,
    ) -> &BootstrapState {
        self.state.load_error = None;

        if AssetKind::ALL.into_iter().all(|k| self.is_present(k)) {
            tracing::info!("all assets already installed");
            self.state.phase = Phase::Done;
            self.state.total_bytes = Some(self.state.installed_bytes());
            self.persist();
            return &self.state;
        }

        tracing::info!(root = %self.data_root.display(), "bootstrap started");
        self.state.phase = Phase::Running;
        self.state.started_at = Some(unix_timestamp());
        self.state.finished_at = None;
        self.state.total_bytes = None;
        self.persist();

        for kind in AssetKind::ALL {
            if self.is_present(kind) {
                tracing::debug!(kind = %kind, "already installed");
                continue;
            }
            if cancel.is_cancelled() {
                self.state.asset_mut(kind).reset();
                continue;
            }
            self.run_asset(kind, observer, cancel);
        }

        self.state.phase = if self.state.any_error() || cancel.is_cancelled() {
            Phase::Error
        } else {
            Phase::Done
        };
        self.state.finished_at = Some(unix_timestamp());
        self.state.total_bytes = Some(self.state.installed_bytes());
        self.persist();
        tracing::info!(
            phase = self.state.phase.as_str(),
            total = %format_bytes(self.state.installed_bytes()),
            "bootstrap finished"
        );
        &self.state
    }

    /// Mark `kind` not installed so the next start downloads it again.
    /// Files already on disk are left in place and overwritten by that run.
    pub fn reset(&mut self, kind: AssetKind) -> Result<()> {
        self.state.asset_mut(kind).reset();
        if self.state.phase == Phase::Done {
            self.state.phase = Phase::Idle;
        }
        self.store
            .save_state(&self.state)
            .with_context(|| format!("save status after resetting {}", kind))
    }

    /// Installed according to the status and every recorded file still on disk.
    fn is_present(&self, kind: AssetKind) -> bool {
        self.state.asset(kind).map_or(false, |a| {
            a.status == AssetState::Installed
                && !a.files.is_empty()
                && a.files.iter().all(|f| self.data_root.join(f).is_file())
        })
    }

    fn persist(&self) {
        if let Err(e) = self.store.save_state(&self.state) {
            tracing::warn!("failed to save bootstrap status: {:#}", e);
        }
    }

    fn run_asset(
        &mut self,
        kind: AssetKind,
        observer: &mut dyn FnMut(BootstrapEvent),
        cancel: &CancelToken,
    ) {
        {
            let asset = self.state.asset_mut(kind);
            asset.reset();
            asset.status = AssetState::Installing;
            asset.progress_percent = Some(0);
        }
        self.persist();
        observer(BootstrapEvent::AssetStarted { kind });
        tracing::info!(kind = %kind, "installing {}", kind.title());

        match self.install(kind, observer, cancel) {
            Ok(done) => {
                let asset = self.state.asset_mut(kind);
                asset.status = AssetState::Installed;
                asset.progress_percent = Some(100);
                asset.bytes_downloaded = Some(done.bytes);
                asset.selected_source_id = Some(done.source.clone());
                asset.files = done.files.clone();
                asset.checksums = done.checksums.clone();
                asset.error_message = None;

                let record = self.provenance_record(kind, &done);
                if let Err(e) = self.store.append_provenance(&record) {
                    tracing::warn!(kind = %kind, "failed to append provenance: {:#}", e);
                }
                self.persist();
                tracing::info!(kind = %kind, source = %done.source, bytes = done.bytes, "asset installed");
                observer(BootstrapEvent::AssetFinished {
                    kind,
                    status: AssetState::Installed,
                    bytes: done.bytes,
                    error: None,
                });
            }
            Err(e) => {
                let message = if cancel.is_cancelled() {
                    "cancelled".to_string()
                } else {
                    format!("{:#}", e)
                };
                tracing::error!(kind = %kind, "asset failed: {}", message);
                let asset = self.state.asset_mut(kind);
                asset.status = AssetState::Error;
                asset.error_message = Some(message.clone());
                let bytes = asset.bytes_downloaded.unwrap_or(0);
                self.persist();
                observer(BootstrapEvent::AssetFinished {
                    kind,
                    status: AssetState::Error,
                    bytes,
                    error: Some(message),
                });
            }
        }
    }

    fn install(
        &mut self,
        kind: AssetKind,
        observer: &mut dyn FnMut(BootstrapEvent),
        cancel: &CancelToken,
    ) -> Result<InstalledAsset> {
        let hub = HubClient::new(&self.fetcher, &self.config.hub_url, &self.config.revision)?;
        let source = resolve_source(&hub, kind, &self.config)
            .with_context(|| format!("resolve source for {}", kind))?;
        self.state.asset_mut(kind).selected_source_id = Some(source.id.clone());
        self.persist();
        observer(BootstrapEvent::SourceResolved {
            kind,
            source: source.id.clone(),
            files: source.files.len(),
        });

        let dir = self.data_root.join(kind.relative_dir());
        storage::ensure_dir(&dir).with_context(|| format!("create {}", dir.display()))?;

        let policy = self.config.retry_policy();
        let per_asset = self.config.max_per_asset_bytes();
        let total = self.config.max_total_bytes();
        let used_elsewhere = self.state.installed_bytes();
        let count = source.files.len();

        let mut files = Vec::with_capacity(count);
        let mut checksums = BTreeMap::new();
        let mut bytes = 0u64;
        let mut names = LocalNames::new();

        for (index, file) in source.files.iter().enumerate() {
            let rel = format!("{}/{}", kind.relative_dir(), names.allocate(file));
            let dest = self.data_root.join(&rel);
            let limit = per_asset
                .saturating_sub(bytes)
                .min(total.saturating_sub(used_elsewhere.saturating_add(bytes)));
            let url = hub.file_url(kind, &source.id, file);
            tracing::debug!(kind = %kind, file = %file, limit, "fetching file");

            let written = {
                let mut task = DownloadTask::new(url, &dest)
                    .with_limit(Some(limit))
                    .with_cancel(cancel)
                    .with_progress(|percent| {
                        observer(BootstrapEvent::FileProgress {
                            kind,
                            file: file.clone(),
                            index,
                            count,
                            percent,
                        })
                    });
                run_with_retry(&policy, Some(cancel), || download_file(&self.fetcher, &mut task))
                    .with_context(|| format!("download {}", file))?
            };

            let digest = sha256_path(&dest).with_context(|| format!("checksum {}", dest.display()))?;
            bytes += written;
            checksums.insert(rel.clone(), digest);
            files.push(rel);

            let asset = self.state.asset_mut(kind);
            asset.bytes_downloaded = Some(bytes);
            asset.progress_percent = Some(((index + 1) * 100 / count) as u8);
            self.persist();
        }

        Ok(InstalledAsset {
            source: source.id,
            discovered: source.discovered,
            files,
            checksums,
            bytes,
        })
    }

    fn provenance_record(&self, kind: AssetKind, done: &InstalledAsset) -> ProvenanceRecord {
        let mut metadata = BTreeMap::new();
        metadata.insert("kind".to_string(), kind.as_str().to_string());
        metadata.insert("title".to_string(), kind.title().to_string());
        metadata.insert("hub".to_string(), self.config.hub_url.clone());
        metadata.insert("revision".to_string(), self.config.revision.clone());
        metadata.insert("discovered".to_string(), done.discovered.to_string());
        metadata.insert("bytes".to_string(), done.bytes.to_string());
        metadata.insert("files".to_string(), done.files.join(","));
        for (file, digest) in &done.checksums {
            metadata.insert(format!("sha256:{}", file), digest.clone());
        }
        ProvenanceRecord {
            id: kind.as_str().to_string(),
            source: done.source.clone(),
            timestamp: unix_timestamp(),
            metadata,
        }
    }
}
