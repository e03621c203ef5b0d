//! File system helpers shared by the cache and the CLI.
//!
//! Writes go through a uniquely named temporary file in the destination
//! directory followed by a rename, so readers never observe a torn file and
//! two concurrent writers of the same path resolve to last-write-wins.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Creates `path` and all of its parents if they do not exist yet.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or if `path` exists
/// but is not a directory.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", path.display()),
        ));
    }
    Ok(())
}

/// Atomically replaces the contents of `path`.
///
/// The parent directory is created if needed. The temporary file lives next
/// to the destination so the final rename never crosses file systems.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written, synced
/// or renamed into place.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = tempfile::Builder::new().prefix(".tmp-").tempfile_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;

    Ok(())
}
