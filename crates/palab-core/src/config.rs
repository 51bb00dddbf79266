use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bootstrap::AssetKind;
use crate::retry::RetryPolicy;
use crate::units::mb_to_bytes;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per file (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

/// Where one asset comes from. Everything is optional: an empty table means
/// "discover a repository on the hub and pick files by extension".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSourceConfig {
    /// Hub repository id, e.g. `org/persian-corpus`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Repository files to fetch; empty = list the repository and filter by kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// Search query for discovery (defaults per kind).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Per-kind asset sources (`[assets.text]`, `[assets.asr]`, `[assets.tts]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsConfig {
    #[serde(default)]
    pub text: AssetSourceConfig,
    #[serde(default)]
    pub asr: AssetSourceConfig,
    #[serde(default)]
    pub tts: AssetSourceConfig,
}

/// Global configuration loaded from `~/.config/palab/config.toml`, then
/// overridden from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabConfig {
    /// Directory holding `datasets/`, `models/` and `logs/` (None = current dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    /// Hugging Face compatible endpoint.
    pub hub_url: String,
    /// Repository revision used in resolve URLs.
    pub revision: String,
    /// Hard cap on bytes downloaded across all assets, in MiB.
    pub max_total_mb: u64,
    /// Hard cap on bytes downloaded per asset, in MiB.
    pub max_per_asset_mb: u64,
    /// Maximum number of files fetched for the speech dataset.
    pub max_asr_files: usize,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Hub access token; only ever read from `HF_TOKEN`, never written to disk.
    #[serde(skip)]
    pub hf_token: Option<String>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            data_root: None,
            hub_url: "https://huggingface.co".to_string(),
            revision: "main".to_string(),
            max_total_mb: 4096,
            max_per_asset_mb: 2048,
            max_asr_files: 4,
            retry: None,
            assets: AssetsConfig::default(),
            hf_token: None,
        }
    }
}

impl LabConfig {
    pub fn asset(&self, kind: AssetKind) -> &AssetSourceConfig {
        match kind {
            AssetKind::Text => &self.assets.text,
            AssetKind::Asr => &self.assets.asr,
            AssetKind::Tts => &self.assets.tts,
        }
    }

    pub fn asset_mut(&mut self, kind: AssetKind) -> &mut AssetSourceConfig {
        match kind {
            AssetKind::Text => &mut self.assets.text,
            AssetKind::Asr => &mut self.assets.asr,
            AssetKind::Tts => &mut self.assets.tts,
        }
    }

    pub fn max_total_bytes(&self) -> u64 {
        mb_to_bytes(self.max_total_mb)
    }

    pub fn max_per_asset_bytes(&self) -> u64 {
        mb_to_bytes(self.max_per_asset_mb)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    /// Data root: configured value or `fallback` (normally the working directory).
    pub fn data_root_or(&self, fallback: &Path) -> PathBuf {
        self.data_root
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production
    /// and a map in tests. Numeric values that fail to parse are errors.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("MAX_TOTAL_MB") {
            self.max_total_mb = v.parse().with_context(|| format!("MAX_TOTAL_MB={v}"))?;
        }
        if let Some(v) = get("MAX_PER_ASSET_MB") {
            self.max_per_asset_mb = v.parse().with_context(|| format!("MAX_PER_ASSET_MB={v}"))?;
        }
        if let Some(v) = get("MAX_ASR_FILES") {
            self.max_asr_files = v.parse().with_context(|| format!("MAX_ASR_FILES={v}"))?;
        }
        if let Some(v) = get("HF_ENDPOINT") {
            self.hub_url = v;
        }
        if let Some(v) = get("PALAB_DATA_ROOT") {
            self.data_root = Some(PathBuf::from(v));
        }
        for kind in AssetKind::ALL {
            if let Some(v) = get(kind.source_env_var()) {
                self.asset_mut(kind).source = Some(v);
            }
        }
        if let Some(v) = get("HF_TOKEN") {
            self.hf_token = Some(v);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("palab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from `path`, creating a default file if none exists.
pub fn load_or_init_at(path: &Path) -> Result<LabConfig> {
    if !path.exists() {
        let default_cfg = LabConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LabConfig = toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Load the user config (or create the default one) and apply environment overrides.
pub fn load_or_init() -> Result<LabConfig> {
    let mut cfg = load_or_init_at(&config_path()?)?;
    cfg.apply_env(|name| std::env::var(name).ok())?;
    Ok(cfg)
}
