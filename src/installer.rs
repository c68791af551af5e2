//! The external package executor that installs a profile's packages.
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::InstallerSettings;
use crate::error::ExecutorError;
use crate::exec::Executor;

/// Result of one install invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The executor exited successfully.
    Installed,
    /// The executor ran but exited non-zero. Which packages failed is not
    /// known.
    Failed {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
}

/// Installs packages on the current machine.
#[cfg_attr(test, mockall::automock)]
pub trait PackageInstaller {
    /// Executor name for messages.
    fn name(&self) -> String;

    /// Install all `packages` in a single invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the executor cannot be obtained or
    /// started. A non-zero exit is an [`InstallOutcome::Failed`], not an
    /// error.
    fn install(&self, packages: &[String]) -> Result<InstallOutcome, ExecutorError>;
}

/// `tuxmate`, located on `PATH` or downloaded on first use.
pub struct Tuxmate<'a> {
    executor: &'a dyn Executor,
    settings: InstallerSettings,
    download_dir: PathBuf,
}

impl fmt::Debug for Tuxmate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tuxmate")
            .field("settings", &self.settings)
            .field("download_dir", &self.download_dir)
            .finish_non_exhaustive()
    }
}

impl<'a> Tuxmate<'a> {
    /// Create an installer that downloads into the per-user cache
    /// directory.
    #[must_use]
    pub fn new(executor: &'a dyn Executor, settings: InstallerSettings) -> Self {
        Self::with_download_dir(executor, settings, crate::logging::cache_root())
    }

    /// Create an installer that downloads into `download_dir`.
    #[must_use]
    pub const fn with_download_dir(
        executor: &'a dyn Executor,
        settings: InstallerSettings,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            executor,
            settings,
            download_dir,
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> ExecutorError {
        ExecutorError::Unavailable {
            program: self.settings.program.clone(),
            reason: reason.into(),
        }
    }

    /// Path or name to invoke: `PATH` first, then a previous download, then
    /// a fresh download.
    fn locate(&self) -> Result<String, ExecutorError> {
        if self.executor.which(&self.settings.program) {
            return Ok(self.settings.program.clone());
        }
        let cached = self.download_dir.join(&self.settings.program);
        if is_trusted(&cached) {
            return Ok(cached.display().to_string());
        }
        if cached.symlink_metadata().is_ok() {
            tracing::warn!("ignoring {}: not a private executable", cached.display());
        }
        if !self.settings.auto_download {
            return Err(self.unavailable("not found on PATH and auto_download is disabled"));
        }

        fs::create_dir_all(&self.download_dir).map_err(|e| {
            self.unavailable(format!("creating {}: {e}", self.download_dir.display()))
        })?;
        if !is_private_dir(&self.download_dir) {
            return Err(self.unavailable(format!(
                "{} is writable by other users",
                self.download_dir.display()
            )));
        }
        let mut failures = Vec::new();
        for url in self.settings.download_urls() {
            tracing::debug!("downloading {url}");
            match download(&url, &self.download_dir, &cached) {
                Ok(()) => return Ok(cached.display().to_string()),
                Err(e) => failures.push(format!("{url}: {e}")),
            }
        }
        Err(self.unavailable(format!("download failed ({})", failures.join("; "))))
    }
}

impl PackageInstaller for Tuxmate<'_> {
    fn name(&self) -> String {
        self.settings.program.clone()
    }

    fn install(&self, packages: &[String]) -> Result<InstallOutcome, ExecutorError> {
        if packages.is_empty() {
            return Ok(InstallOutcome::Installed);
        }
        let program = self.locate()?;
        let mut args = vec!["install"];
        args.extend(packages.iter().map(String::as_str));

        let result = self
            .executor
            .run_interactive(&program, &args)
            .map_err(|e| ExecutorError::Launch {
                program: program.clone(),
                reason: format!("{e:#}"),
            })?;
        Ok(if result.success {
            InstallOutcome::Installed
        } else {
            InstallOutcome::Failed { code: result.code }
        })
    }
}

/// Fetch `url` into a temp file in `dir`, mark it executable and move it to
/// `dest`. A failed download never leaves a partial file at `dest`.
fn download(url: &str, dir: &Path, dest: &Path) -> io::Result<()> {
    let mut response = ureq::get(url).call().map_err(io::Error::other)?;
    let mut file = NamedTempFile::new_in(dir)?;
    io::copy(&mut response.body_mut().as_reader(), &mut file)?;
    file.as_file().sync_all()?;
    set_executable(file.path())?;
    file.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Owned by the effective user and not writable by group or others.
#[cfg(unix)]
fn owned_privately(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    meta.uid() == nix::unistd::geteuid().as_raw() && meta.mode() & 0o022 == 0
}

#[cfg(unix)]
fn is_private_dir(dir: &Path) -> bool {
    fs::symlink_metadata(dir).is_ok_and(|m| m.is_dir() && owned_privately(&m))
}

#[cfg(not(unix))]
fn is_private_dir(dir: &Path) -> bool {
    dir.is_dir()
}

/// A previous download is reused only when it is a regular executable file
/// that no other user can have replaced or modified.
#[cfg(unix)]
fn is_trusted(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    let Ok(meta) = fs::symlink_metadata(path) else {
        return false;
    };
    meta.is_file()
        && meta.permissions().mode() & 0o111 != 0
        && owned_privately(&meta)
        && path.parent().is_some_and(is_private_dir)
}

#[cfg(not(unix))]
fn is_trusted(path: &Path) -> bool {
    path.is_file()
}
