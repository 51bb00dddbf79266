//! Response handler that streams a body into the task's `.part` file.

use std::path::PathBuf;

use super::{DownloadError, DownloadTask};
use crate::fetch::{ResponseHandler, ResponseHead};
use crate::storage::{self, StorageWriter};

pub(super) struct FileSink<'t, 'a> {
    task: &'t mut DownloadTask<'a>,
    temp_path: PathBuf,
    writer: Option<StorageWriter>,
    declared: Option<u64>,
    written: u64,
}

impl<'t, 'a> FileSink<'t, 'a> {
    pub(super) fn new(task: &'t mut DownloadTask<'a>, temp_path: PathBuf) -> Self {
        Self {
            task,
            temp_path,
            writer: None,
            declared: None,
            written: 0,
        }
    }

    /// Verify the byte count, sync, and rename the temp file onto the destination.
    pub(super) fn finish(&mut self) -> Result<u64, DownloadError> {
        let mut writer = match self.writer.take() {
            Some(w) => w,
            // Handler never saw a response head; nothing was written.
            None => {
                return Err(DownloadError::PartialTransfer {
                    expected: self.declared.unwrap_or(0),
                    received: 0,
                })
            }
        };
        if let Some(expected) = self.declared {
            if self.written < expected {
                writer.discard();
                return Err(DownloadError::PartialTransfer {
                    expected,
                    received: self.written,
                });
            }
        }
        if let Err(e) = writer.sync() {
            writer.discard();
            return Err(DownloadError::io(
                format!("sync {}", self.temp_path.display()),
                e,
            ));
        }
        let destination = self.task.destination.clone();
        writer.finalize(&destination).map_err(|e| {
            DownloadError::io(
                format!(
                    "rename {} to {}",
                    self.temp_path.display(),
                    destination.display()
                ),
                e,
            )
        })?;
        self.task.report(100);
        Ok(self.written)
    }

    /// Drop any partial data. Safe to call after `finish` or when nothing was written.
    pub(super) fn discard(&mut self) {
        match self.writer.take() {
            Some(writer) => writer.discard(),
            None => {
                if let Err(e) = storage::remove_if_exists(&self.temp_path) {
                    tracing::warn!(path = %self.temp_path.display(), "failed to remove temp file: {}", e);
                }
            }
        }
    }
}

impl ResponseHandler for FileSink<'_, '_> {
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), DownloadError> {
        if !head.is_success() {
            return Err(DownloadError::Http {
                status: head.status,
                url: self.task.url.clone(),
            });
        }
        if let (Some(limit), Some(declared)) = (self.task.byte_limit, head.content_length) {
            if declared > limit {
                return Err(DownloadError::SizeLimitExceeded {
                    limit,
                    actual: declared,
                });
            }
        }
        self.declared = head.content_length;

        if let Some(parent) = self.task.destination.parent() {
            storage::ensure_dir(parent)
                .map_err(|e| DownloadError::io(format!("create dir {}", parent.display()), e))?;
        }
        let writer = StorageWriter::create(&self.temp_path).map_err(|e| {
            DownloadError::io(format!("create {}", self.temp_path.display()), e)
        })?;
        self.writer = Some(writer);
        self.task.report(0);
        Ok(())
    }

    fn on_chunk(&mut self, data: &[u8]) -> Result<(), DownloadError> {
        if self.task.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        let total = self.written + data.len() as u64;
        if let Some(limit) = self.task.byte_limit {
            if total > limit {
                return Err(DownloadError::SizeLimitExceeded {
                    limit,
                    actual: total,
                });
            }
        }
        let writer = match self.writer.as_mut() {
            Some(w) => w,
            None => {
                return Err(DownloadError::io(
                    "body chunk before response head",
                    std::io::Error::new(std::io::ErrorKind::Other, "no open writer"),
                ))
            }
        };
        writer
            .write_all(data)
            .map_err(|e| DownloadError::io(format!("write {}", self.temp_path.display()), e))?;
        self.written = total;

        if let Some(declared) = self.declared.filter(|d| *d > 0) {
            self.task.report(self.written.saturating_mul(100) / declared);
        }
        Ok(())
    }
}
