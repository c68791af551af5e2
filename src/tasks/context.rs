//! Shared state handed to every task.
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Settings;
use crate::exec::Executor;
use crate::logging::Log;
use crate::prompt::Prompt;

/// Ambient state shared by orchestrators and tasks for one run.
///
/// Built once in the command layer; nothing below it reads the process
/// environment.
pub struct Context<'a> {
    /// Logger for output and step recording.
    pub log: &'a dyn Log,
    /// Runs external programs.
    pub executor: &'a dyn Executor,
    /// Asks the user questions.
    pub prompt: &'a dyn Prompt,
    /// Resolved settings.
    pub settings: &'a Settings,
    /// The user's home directory.
    pub home: PathBuf,
    /// Log decisions without changing anything.
    pub dry_run: bool,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("prompt", &"<dyn Prompt>")
            .field("settings", &self.settings)
            .field("home", &self.home)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl<'a> Context<'a> {
    /// Create a context with an explicit home directory.
    #[must_use]
    pub const fn with_home(
        log: &'a dyn Log,
        executor: &'a dyn Executor,
        prompt: &'a dyn Prompt,
        settings: &'a Settings,
        home: PathBuf,
        dry_run: bool,
    ) -> Self {
        Self {
            log,
            executor,
            prompt,
            settings,
            home,
            dry_run,
        }
    }

    /// Absolute path of the shell config file.
    #[must_use]
    pub fn shell_config_path(&self) -> PathBuf {
        self.settings.shell_config_path(&self.home)
    }

    /// Home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }
}

/// The user's home directory from `HOME`.
///
/// # Errors
///
/// Returns an error if `HOME` is unset or empty.
pub fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("HOME environment variable is not set"))
}
