//! File-system helpers shared by resources.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Ensure the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Sibling path `<name>.backup_<stamp>` for `path` that does not exist yet.
///
/// When a backup with the same stamp already exists (two restores within
/// one second) a `_1`, `_2`, ... suffix is added.
#[must_use]
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "file".into(), |n| n.to_string_lossy().into_owned());
    let base = path.with_file_name(format!("{name}.backup_{stamp}"));
    if base.symlink_metadata().is_err() {
        return base;
    }
    (1..)
        .map(|n| path.with_file_name(format!("{name}.backup_{stamp}_{n}")))
        .find(|candidate| candidate.symlink_metadata().is_err())
        .unwrap_or(base)
}

/// Write `contents` to a uniquely named temp file beside `path`.
///
/// The file is created with mode 0600 and never follows an existing link.
/// The caller persists it over `path`; dropping it removes it.
///
/// # Errors
///
/// Returns an error if the temp file cannot be created or written; nothing
/// is left behind in that case.
pub fn stage(path: &Path, contents: &str) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".tuxsync_tmp")
        .tempfile_in(dir)?;
    staged.write_all(contents.as_bytes())?;
    staged.as_file().sync_all()?;
    Ok(staged)
}
