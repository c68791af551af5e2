//! Shell config file resource.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::helpers::fs::{backup_path, ensure_parent_dir, stage};
use super::{Resource, ResourceChange, ResourceState};
use crate::error::FilesystemError;

/// Marker line placed before content appended in merge mode.
pub const MERGE_MARKER: &str = "# === TuxSync Restored Content ===";

/// How saved content is combined with an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellConfigMode {
    /// Move the existing file to a backup and write the saved content.
    Replace,
    /// Copy the existing file to a backup and append the saved content.
    Merge,
}

/// The shell config file at `target` with `content` restored into it.
#[derive(Debug, Clone)]
pub struct ShellConfigResource {
    /// File to restore.
    pub target: PathBuf,
    /// Saved shell config text.
    pub content: String,
    /// Replace or merge.
    pub mode: ShellConfigMode,
    /// Timestamp used in backup names (`%Y%m%d_%H%M%S`).
    pub stamp: String,
}

impl ShellConfigResource {
    /// Create a resource for `target`.
    #[must_use]
    pub const fn new(
        target: PathBuf,
        content: String,
        mode: ShellConfigMode,
        stamp: String,
    ) -> Self {
        Self {
            target,
            content,
            mode,
            stamp,
        }
    }

    /// Stamp for backup names taken from the local clock.
    #[must_use]
    pub fn stamp_now() -> String {
        chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
    }

    fn read_err(&self, source: io::Error) -> FilesystemError {
        FilesystemError::Read {
            path: self.target.clone(),
            source,
        }
    }

    fn write_err(&self, source: io::Error) -> FilesystemError {
        FilesystemError::Write {
            path: self.target.clone(),
            source,
        }
    }

    fn existing(&self) -> Result<Option<String>, FilesystemError> {
        match fs::read_to_string(&self.target) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.read_err(e)),
        }
    }

    fn merged(&self, existing: &str) -> String {
        format!("{existing}\n\n{MERGE_MARKER}\n{}", self.content)
    }

    /// Put `staged` at the target, moving any existing file to `backup`
    /// first. In merge mode the existing file is copied instead so it stays
    /// in place if the final rename fails. The staged file is removed on
    /// every error path.
    fn install(
        &self,
        staged: NamedTempFile,
        backup: Option<&Path>,
    ) -> Result<(), FilesystemError> {
        if let Some(backup) = backup {
            let preserved = match self.mode {
                ShellConfigMode::Replace => fs::rename(&self.target, backup),
                ShellConfigMode::Merge => fs::copy(&self.target, backup).map(|_| ()),
            };
            if let Err(source) = preserved {
                return Err(FilesystemError::Backup {
                    path: self.target.clone(),
                    backup: backup.to_path_buf(),
                    source,
                });
            }
        }
        staged
            .persist(&self.target)
            .map(|_| ())
            .map_err(|e| self.write_err(e.error))
    }
}

impl Resource for ShellConfigResource {
    fn description(&self) -> String {
        let verb = match self.mode {
            ShellConfigMode::Replace => "replace",
            ShellConfigMode::Merge => "merge into",
        };
        format!("{verb} {}", self.target.display())
    }

    fn current_state(&self) -> Result<ResourceState, FilesystemError> {
        if self.target.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("{} is a directory", self.target.display()),
            });
        }
        let Some(existing) = self.existing()? else {
            return Ok(ResourceState::Missing);
        };
        let correct = match self.mode {
            ShellConfigMode::Replace => existing == self.content,
            ShellConfigMode::Merge => existing.contains(&self.content),
        };
        Ok(if correct {
            ResourceState::Correct
        } else {
            ResourceState::Incorrect {
                current: format!("{} bytes of other content", existing.len()),
            }
        })
    }

    fn apply(&self) -> Result<ResourceChange, FilesystemError> {
        match self.current_state()? {
            ResourceState::Correct => return Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => {
                return Err(self.write_err(io::Error::other(reason)));
            }
            ResourceState::Missing | ResourceState::Incorrect { .. } => {}
        }

        ensure_parent_dir(&self.target).map_err(|e| self.write_err(e))?;
        let existing = self.existing()?;
        let contents = match (&existing, self.mode) {
            (Some(existing), ShellConfigMode::Merge) => self.merged(existing),
            _ => self.content.clone(),
        };
        let staged = stage(&self.target, &contents).map_err(|e| self.write_err(e))?;
        if let Ok(meta) = fs::metadata(&self.target) {
            fs::set_permissions(staged.path(), meta.permissions())
                .map_err(|e| self.write_err(e))?;
        }

        let backup = existing
            .is_some()
            .then(|| backup_path(&self.target, &self.stamp));
        self.install(staged, backup.as_deref())?;
        Ok(ResourceChange::Applied { backup })
    }
}
