//! Disk I/O and file lifecycle.
//!
//! Downloads stream into a `.part` file next to the destination and are
//! renamed into place only once complete. State files are replaced the same
//! way so readers never observe a half-written JSON document.

mod writer;

pub use writer::StorageWriter;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `train.jsonl` → `train.jsonl.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Create `dir` and any missing parents. No-op if it already exists.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Replace `path` with `contents`: write the temp file, sync, rename over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut writer = StorageWriter::create(&temp_path(path))?;
    if let Err(e) = writer.write_all(contents).and_then(|()| writer.sync()) {
        writer.discard();
        return Err(e);
    }
    writer.finalize(path)
}
