//! Status, phase and provenance types persisted by the bootstrap.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The fixed set of assets the lab needs. Order is processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Persian text dataset.
    Text,
    /// Persian speech (ASR) dataset.
    Asr,
    /// Persian text-to-speech model.
    Tts,
}

/// Hub repository type an asset lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoType {
    Dataset,
    Model,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Text, AssetKind::Asr, AssetKind::Tts];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Text => "text",
            AssetKind::Asr => "asr",
            AssetKind::Tts => "tts",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AssetKind::Text => "Persian text dataset",
            AssetKind::Asr => "Persian speech dataset",
            AssetKind::Tts => "Persian TTS model",
        }
    }

    /// Install directory relative to the data root.
    pub fn relative_dir(self) -> &'static str {
        match self {
            AssetKind::Text => "datasets/text",
            AssetKind::Asr => "datasets/speech",
            AssetKind::Tts => "models/tts",
        }
    }

    pub fn repo_type(self) -> RepoType {
        match self {
            AssetKind::Text | AssetKind::Asr => RepoType::Dataset,
            AssetKind::Tts => RepoType::Model,
        }
    }

    /// Environment variable that overrides the configured source.
    pub fn source_env_var(self) -> &'static str {
        match self {
            AssetKind::Text => "PALAB_TEXT_SOURCE",
            AssetKind::Asr => "PALAB_ASR_SOURCE",
            AssetKind::Tts => "PALAB_TTS_SOURCE",
        }
    }

    /// Hub search query used when no source is configured.
    pub fn default_query(self) -> &'static str {
        match self {
            AssetKind::Text => "persian",
            AssetKind::Asr => "persian speech",
            AssetKind::Tts => "persian tts",
        }
    }

    /// File suffixes worth downloading when a repository is listed.
    pub fn file_suffixes(self) -> &'static [&'static str] {
        match self {
            AssetKind::Text => &[".jsonl", ".json", ".csv", ".tsv", ".txt", ".parquet"],
            AssetKind::Asr => &[".parquet", ".tar", ".tar.gz", ".zip", ".tsv", ".csv"],
            AssetKind::Tts => &[".onnx", ".json", ".bin", ".pth", ".safetensors", ".txt"],
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(AssetKind::Text),
            "asr" | "speech" => Ok(AssetKind::Asr),
            "tts" => Ok(AssetKind::Tts),
            other => Err(format!("unknown asset kind '{}' (expected text, asr or tts)", other)),
        }
    }
}

/// Per-asset lifecycle: not_installed -> installing -> {installed, error}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetState {
    #[default]
    NotInstalled,
    Installing,
    Installed,
    Error,
}

/// Run phase: idle -> running -> {done, error}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Done,
    Error,
}

impl AssetState {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetState::NotInstalled => "not_installed",
            AssetState::Installing => "installing",
            AssetState::Installed => "installed",
            AssetState::Error => "error",
        }
    }
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Done => "done",
            Phase::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatus {
    pub id: AssetKind,
    pub title: String,
    pub status: AssetState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_downloaded: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_source_id: Option<String>,
    /// Installed files, relative to the data root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// Lowercase hex SHA-256 per installed file (same keys as `files`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<String, String>,
}

impl AssetStatus {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            id: kind,
            title: kind.title().to_string(),
            status: AssetState::NotInstalled,
            bytes_downloaded: None,
            progress_percent: None,
            error_message: None,
            selected_source_id: None,
            files: Vec::new(),
            checksums: BTreeMap::new(),
        }
    }

    /// Back to `not_installed`, forgetting files and errors.
    pub fn reset(&mut self) {
        *self = AssetStatus::new(self.id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapState {
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    /// Unix seconds.
    #[serde(default)]
    pub started_at: Option<i64>,
    /// Unix seconds.
    #[serde(default)]
    pub finished_at: Option<i64>,
    pub assets: BTreeMap<AssetKind, AssetStatus>,
    /// Set when the status file existed but could not be read or parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

impl Default for BootstrapState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            total_bytes: None,
            started_at: None,
            finished_at: None,
            assets: AssetKind::ALL
                .into_iter()
                .map(|k| (k, AssetStatus::new(k)))
                .collect(),
            load_error: None,
        }
    }
}

impl BootstrapState {
    pub fn asset(&self, kind: AssetKind) -> Option<&AssetStatus> {
        self.assets.get(&kind)
    }

    pub fn asset_mut(&mut self, kind: AssetKind) -> &mut AssetStatus {
        self.assets
            .entry(kind)
            .or_insert_with(|| AssetStatus::new(kind))
    }

    pub fn any_error(&self) -> bool {
        self.assets.values().any(|a| a.status == AssetState::Error)
    }

    /// Sum of bytes recorded for installed assets.
    pub fn installed_bytes(&self) -> u64 {
        self.assets
            .values()
            .filter(|a| a.status == AssetState::Installed)
            .filter_map(|a| a.bytes_downloaded)
            .sum()
    }

    /// Repair a state read back after a crash: assets stuck in `installing`
    /// go back to `not_installed` (their files are not trusted), a `running`
    /// phase becomes `idle`, and missing asset entries are filled in.
    /// Returns the number of assets reset.
    pub fn recover_stale(&mut self) -> usize {
        for kind in AssetKind::ALL {
            self.asset_mut(kind);
        }
        let mut reset = 0;
        for asset in self.assets.values_mut() {
            if asset.status == AssetState::Installing {
                asset.reset();
                reset += 1;
            }
        }
        if self.phase == Phase::Running {
            self.phase = Phase::Idle;
        }
        reset
    }
}

/// Append-only audit entry written when an asset is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub id: String,
    pub source: String,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
