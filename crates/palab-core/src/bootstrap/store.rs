//! Persistence of the bootstrap status and the provenance log.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::types::{BootstrapState, ProvenanceRecord};
use crate::storage;

pub const STATUS_FILE: &str = "datasets/.status.json";
pub const PROVENANCE_FILE: &str = "datasets/.provenance.json";

/// Where bootstrap state and provenance live.
pub trait StatusStore {
    /// `Ok(None)` when nothing was saved yet; `Err` when a saved state is unreadable.
    fn load_state(&self) -> Result<Option<BootstrapState>>;
    fn save_state(&self, state: &BootstrapState) -> Result<()>;
    fn append_provenance(&self, record: &ProvenanceRecord) -> Result<()>;
    fn load_provenance(&self) -> Result<Vec<ProvenanceRecord>>;
}

impl<T: StatusStore + ?Sized> StatusStore for &T {
    fn load_state(&self) -> Result<Option<BootstrapState>> {
        (**self).load_state()
    }
    fn save_state(&self, state: &BootstrapState) -> Result<()> {
        (**self).save_state(state)
    }
    fn append_provenance(&self, record: &ProvenanceRecord) -> Result<()> {
        (**self).append_provenance(record)
    }
    fn load_provenance(&self) -> Result<Vec<ProvenanceRecord>> {
        (**self).load_provenance()
    }
}

/// JSON files under the data root, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    status_path: PathBuf,
    provenance_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_root: &Path) -> Self {
        Self {
            status_path: data_root.join(STATUS_FILE),
            provenance_path: data_root.join(PROVENANCE_FILE),
        }
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    pub fn provenance_path(&self) -> &Path {
        &self.provenance_path
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

fn parse_provenance(raw: Option<&str>, origin: &str) -> Result<Vec<ProvenanceRecord>> {
    match raw {
        None => Ok(Vec::new()),
        Some(s) if s.trim().is_empty() => Ok(Vec::new()),
        Some(s) => serde_json::from_str(s).with_context(|| format!("parse {}", origin)),
    }
}

impl StatusStore for JsonFileStore {
    fn load_state(&self) -> Result<Option<BootstrapState>> {
        let Some(raw) = read_optional(&self.status_path)? else {
            return Ok(None);
        };
        let state = serde_json::from_str(&raw)
            .with_context(|| format!("parse {}", self.status_path.display()))?;
        Ok(Some(state))
    }

    fn save_state(&self, state: &BootstrapState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)?;
        storage::write_atomic(&self.status_path, &json)
            .with_context(|| format!("write {}", self.status_path.display()))
    }

    fn append_provenance(&self, record: &ProvenanceRecord) -> Result<()> {
        let raw = read_optional(&self.provenance_path)?;
        let mut records = parse_provenance(raw.as_deref(), &self.provenance_path.display().to_string())?;
        records.push(record.clone());
        let json = serde_json::to_vec_pretty(&records)?;
        storage::write_atomic(&self.provenance_path, &json)
            .with_context(|| format!("write {}", self.provenance_path.display()))
    }

    fn load_provenance(&self) -> Result<Vec<ProvenanceRecord>> {
        let raw = read_optional(&self.provenance_path)?;
        parse_provenance(raw.as_deref(), &self.provenance_path.display().to_string())
    }
}

/// In-memory store holding the same JSON text the file store would write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    status: Mutex<Option<String>>,
    provenance: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with arbitrary status text (e.g. a truncated file).
    pub fn with_raw_status(raw: impl Into<String>) -> Self {
        Self {
            status: Mutex::new(Some(raw.into())),
            provenance: Mutex::new(None),
        }
    }

    pub fn raw_status(&self) -> Option<String> {
        self.status.lock().ok().and_then(|s| s.clone())
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("memory store lock poisoned")
}

impl StatusStore for MemoryStore {
    fn load_state(&self) -> Result<Option<BootstrapState>> {
        let guard = self.status.lock().map_err(poisoned)?;
        match guard.as_deref() {
            None => Ok(None),
            Some(raw) => Ok(Some(serde_json::from_str(raw).context("parse stored status")?)),
        }
    }

    fn save_state(&self, state: &BootstrapState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        *self.status.lock().map_err(poisoned)? = Some(json);
        Ok(())
    }

    fn append_provenance(&self, record: &ProvenanceRecord) -> Result<()> {
        let mut guard = self.provenance.lock().map_err(poisoned)?;
        let mut records = parse_provenance(guard.as_deref(), "stored provenance")?;
        records.push(record.clone());
        *guard = Some(serde_json::to_string_pretty(&records)?);
        Ok(())
    }

    fn load_provenance(&self) -> Result<Vec<ProvenanceRecord>> {
        let guard = self.provenance.lock().map_err(poisoned)?;
        parse_provenance(guard.as_deref(), "stored provenance")
    }
}
