//! Pending and done directories
//!
//! Files waiting for upload sit in the pending directory. A file leaves it only by being
//! renamed into the done directory, so the pending set never holds a half-moved file.

use std::io;
use std::path::{Path, PathBuf};

/// List regular files in `dir`, sorted by file name.
///
/// Sub-directories and other non-regular entries are ignored.
pub async fn scan_pending(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        if file_type.is_file() {
            files.push(entry.path());
        } else if file_type.is_symlink() {
            // Follow links to regular files; dangling links are skipped
            match tokio::fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_file() => files.push(entry.path()),
                _ => {}
            }
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Create the done directory (owner-only on Unix) if it does not exist.
pub async fn prepare_done_dir(dir: &Path) -> io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(dir).await
}

/// Move a completed file into the done directory under the same file name.
pub async fn mark_complete(path: &Path, done_dir: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    let dest = done_dir.join(file_name);
    tokio::fs::rename(path, &dest).await?;
    Ok(dest)
}
