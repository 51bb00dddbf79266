//! Single-file HTTP downloader with byte-limit enforcement.
//!
//! Issues one GET through an [`HttpFetch`], rejects non-2xx responses and
//! declared sizes over the limit before touching disk, then streams the body
//! into `<destination>.part`, enforcing the same limit on the bytes actually
//! received. The temp file is renamed onto the destination only after the
//! whole body arrived.

mod error;
mod sink;

pub use error::{DownloadError, TransportKind};

use std::path::PathBuf;

use crate::control::CancelToken;
use crate::fetch::HttpFetch;
use crate::storage;

/// Progress callback: whole percent in `0..=100`.
pub type ProgressFn<'a> = Box<dyn FnMut(u8) + 'a>;

/// One download: source URL, destination, optional limit, progress and cancel hooks.
///
/// A task can be passed to [`download_file`] again after a failure (retry);
/// progress reports stay non-decreasing across attempts.
pub struct DownloadTask<'a> {
    pub url: String,
    pub destination: PathBuf,
    pub byte_limit: Option<u64>,
    progress: Option<ProgressFn<'a>>,
    cancel: Option<&'a CancelToken>,
    last_reported: Option<u8>,
}

impl<'a> DownloadTask<'a> {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            byte_limit: None,
            progress: None,
            cancel: None,
            last_reported: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.byte_limit = limit;
        self
    }

    pub fn with_progress(mut self, progress: impl FnMut(u8) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.map(CancelToken::is_cancelled).unwrap_or(false)
    }

    /// Forward `percent` (clamped to 100) if it is above the last reported value.
    pub(crate) fn report(&mut self, percent: u64) {
        let pct = percent.min(100) as u8;
        if self.last_reported.map_or(false, |last| pct <= last) {
            return;
        }
        self.last_reported = Some(pct);
        if let Some(progress) = self.progress.as_mut() {
            progress(pct);
        }
    }
}

/// Download `task.url` to `task.destination` and return the number of bytes written.
///
/// Errors:
/// - `Http` for a non-2xx final status;
/// - `SizeLimitExceeded` when the declared or streamed size passes `byte_limit`
///   (the destination is never created or modified in that case);
/// - `PartialTransfer` when fewer bytes than declared arrived;
/// - `Cancelled`, `Transport`, `Io` as reported.
///
/// On any error the `.part` file is removed.
pub fn download_file(
    fetcher: &dyn HttpFetch,
    task: &mut DownloadTask<'_>,
) -> Result<u64, DownloadError> {
    if task.is_cancelled() {
        return Err(DownloadError::Cancelled);
    }
    let url = task.url.clone();
    let temp_path = storage::temp_path(&task.destination);
    tracing::debug!(url = %url, dest = %task.destination.display(), limit = ?task.byte_limit, "download start");

    let mut sink = sink::FileSink::new(task, temp_path);
    let result = fetcher.get(&url, &mut sink).and_then(|()| sink.finish());
    match result {
        Ok(written) => {
            tracing::info!(url = %url, bytes = written, "download complete");
            Ok(written)
        }
        Err(e) => {
            sink.discard();
            tracing::warn!(url = %url, "download failed: {}", e);
            Err(e)
        }
    }
}
