//! Sequential writer for a `.part` download file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const WRITE_BUF: usize = 256 * 1024;

/// Buffered writer for a temp file. Bytes go to `temp_path` until `finalize`
/// renames it onto the destination; `discard` deletes it instead.
pub struct StorageWriter {
    file: BufWriter<File>,
    temp_path: PathBuf,
}

impl StorageWriter {
    /// Create (or truncate) the temp file at `temp_path`.
    pub fn create(temp_path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(StorageWriter {
            file: BufWriter::with_capacity(WRITE_BUF, file),
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Append `data` at the current end of the file.
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)
    }

    /// Flush buffers and sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_all()
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Atomically rename the temp file to the final path, replacing any existing file.
    /// Fails if `final_path` is on a different filesystem.
    pub fn finalize(self, final_path: &Path) -> io::Result<()> {
        let StorageWriter { file, temp_path } = self;
        let file = file.into_inner().map_err(|e| e.into_error())?;
        drop(file);
        std::fs::rename(&temp_path, final_path)
    }

    /// Close and delete the temp file. Errors are logged, not returned.
    pub fn discard(self) {
        let StorageWriter { file, temp_path } = self;
        drop(file);
        if let Err(e) = super::remove_if_exists(&temp_path) {
            tracing::warn!(path = %temp_path.display(), "failed to remove temp file: {}", e);
        }
    }
}
