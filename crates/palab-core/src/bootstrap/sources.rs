//! Source resolution: which hub repository and files an asset comes from.
//!
//! A configured repository id wins. Otherwise the hub's search API is asked
//! for the kind's query and the first hit is taken. The file list is either
//! configured or read from the repository's `siblings` and filtered by the
//! kind's file suffixes.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use url::Url;

use super::types::{AssetKind, RepoType};
use crate::config::LabConfig;
use crate::fetch::{get_bytes, HttpFetch};

/// Hub API responses are small JSON documents.
const MAX_API_BODY: usize = 8 * 1024 * 1024;
const SEARCH_LIMIT: usize = 5;

/// Repository and files chosen for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub id: String,
    pub files: Vec<String>,
    /// True when the repository id came from hub search.
    pub discovered: bool,
}

#[derive(Debug, Deserialize)]
struct RepoSummary {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    siblings: Vec<Sibling>,
}

#[derive(Debug, Deserialize)]
struct Sibling {
    rfilename: String,
}

/// Thin client for the few hub endpoints the bootstrap needs.
pub struct HubClient<'f> {
    fetcher: &'f dyn HttpFetch,
    base: Url,
    revision: String,
}

impl<'f> HubClient<'f> {
    pub fn new(fetcher: &'f dyn HttpFetch, hub_url: &str, revision: &str) -> Result<Self> {
        let base = Url::parse(hub_url).with_context(|| format!("invalid hub url '{}'", hub_url))?;
        if base.cannot_be_a_base() {
            bail!("hub url '{}' cannot be used as a base", hub_url);
        }
        Ok(Self {
            fetcher,
            base,
            revision: revision.to_string(),
        })
    }

    fn url_with<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    fn api_collection(kind: AssetKind) -> &'static str {
        match kind.repo_type() {
            RepoType::Dataset => "datasets",
            RepoType::Model => "models",
        }
    }

    /// `GET {hub}/api/{datasets|models}?search=<query>&limit=N` → repository ids.
    pub fn search(&self, kind: AssetKind, query: &str) -> Result<Vec<String>> {
        let mut url = self.url_with(["api", Self::api_collection(kind)]);
        url.query_pairs_mut()
            .append_pair("search", query)
            .append_pair("limit", &SEARCH_LIMIT.to_string());
        let body = get_bytes(self.fetcher, url.as_str(), MAX_API_BODY)
            .with_context(|| format!("hub search for '{}'", query))?;
        let hits: Vec<RepoSummary> =
            serde_json::from_slice(&body).with_context(|| format!("parse search response from {}", url))?;
        Ok(hits.into_iter().map(|h| h.id).collect())
    }

    /// `GET {hub}/api/{datasets|models}/{id}` → repository file paths.
    pub fn list_files(&self, kind: AssetKind, repo_id: &str) -> Result<Vec<String>> {
        let url = self.url_with(
            ["api", Self::api_collection(kind)]
                .into_iter()
                .chain(repo_id.split('/')),
        );
        let body = get_bytes(self.fetcher, url.as_str(), MAX_API_BODY)
            .with_context(|| format!("list files of {}", repo_id))?;
        let info: RepoInfo =
            serde_json::from_slice(&body).with_context(|| format!("parse repository info from {}", url))?;
        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    /// Download URL of one repository file:
    /// `{hub}/datasets/{id}/resolve/{rev}/{file}` or `{hub}/{id}/resolve/{rev}/{file}`.
    pub fn file_url(&self, kind: AssetKind, repo_id: &str, file: &str) -> String {
        let prefix: &[&str] = match kind.repo_type() {
            RepoType::Dataset => &["datasets"],
            RepoType::Model => &[],
        };
        self.url_with(
            prefix
                .iter()
                .copied()
                .chain(repo_id.split('/'))
                .chain(["resolve", self.revision.as_str()])
                .chain(file.split('/')),
        )
        .to_string()
    }
}

/// Keep the files worth downloading for `kind`, in listing order.
/// Hidden files and READMEs are skipped; speech datasets are capped at `max_asr_files`.
pub fn select_files(kind: AssetKind, files: &[String], max_asr_files: usize) -> Vec<String> {
    let suffixes = kind.file_suffixes();
    let selected = files.iter().filter(|f| {
        let name = f.rsplit('/').next().unwrap_or(f.as_str()).to_ascii_lowercase();
        !name.starts_with('.')
            && !name.starts_with("readme")
            && suffixes.iter().any(|s| name.ends_with(s))
    });
    cap_for_kind(kind, selected.cloned().collect(), max_asr_files)
}

fn cap_for_kind(kind: AssetKind, mut files: Vec<String>, max_asr_files: usize) -> Vec<String> {
    if kind == AssetKind::Asr {
        files.truncate(max_asr_files);
    }
    files
}

/// Resolve repository and file list for `kind` from config, falling back to hub discovery.
pub fn resolve_source(hub: &HubClient<'_>, kind: AssetKind, cfg: &LabConfig) -> Result<ResolvedSource> {
    let asset_cfg = cfg.asset(kind);

    let (id, discovered) = match asset_cfg.source.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => (id.to_string(), false),
        _ => {
            let query = asset_cfg.query.as_deref().unwrap_or(kind.default_query());
            let hits = hub.search(kind, query)?;
            let id = hits
                .into_iter()
                .next()
                .with_context(|| format!("hub search for '{}' returned no repositories", query))?;
            tracing::info!(kind = %kind, source = %id, "discovered source");
            (id, true)
        }
    };

    let files = if asset_cfg.files.is_empty() {
        let listed = hub.list_files(kind, &id)?;
        select_files(kind, &listed, cfg.max_asr_files)
    } else {
        cap_for_kind(kind, asset_cfg.files.clone(), cfg.max_asr_files)
    };
    if files.is_empty() {
        bail!("no downloadable {} files found in {}", kind, id);
    }

    Ok(ResolvedSource {
        id,
        files,
        discovered,
    })
}
