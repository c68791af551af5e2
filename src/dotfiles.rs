//! Optional dotfile manager integration (chezmoi).
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};

use crate::exec::Executor;

/// Commit message used when pushing the dotfile source directory.
pub const COMMIT_MESSAGE: &str = "Update dotfiles via tuxsync";

/// What [`DotfileTool::push`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Changes were committed and pushed.
    Pushed,
    /// The source directory had nothing to commit.
    Clean,
}

/// A dotfile manager with a git-backed source directory.
#[cfg_attr(test, mockall::automock)]
pub trait DotfileTool {
    /// Tool name for messages.
    fn name(&self) -> String;

    /// Whether the tool is installed.
    fn is_available(&self) -> bool;

    /// Initialise the source directory from `repo` (`owner/repo` or URL).
    ///
    /// # Errors
    ///
    /// Returns an error if the tool exits non-zero.
    fn init(&self, repo: &str) -> Result<()>;

    /// Write managed dotfiles into the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool exits non-zero.
    fn apply(&self) -> Result<()>;

    /// The source directory, if the tool has been initialised.
    fn source_dir(&self) -> Option<PathBuf>;

    /// Commit and push pending changes in the source directory.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no source directory or a git command
    /// fails.
    fn push(&self) -> Result<PushOutcome>;
}

/// [`DotfileTool`] driving the `chezmoi` CLI.
pub struct Chezmoi<'a> {
    executor: &'a dyn Executor,
    program: String,
}

impl fmt::Debug for Chezmoi<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chezmoi")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl<'a> Chezmoi<'a> {
    /// Create a driver invoking `program`.
    #[must_use]
    pub fn new(executor: &'a dyn Executor, program: &str) -> Self {
        Self {
            executor,
            program: program.to_string(),
        }
    }
}

impl DotfileTool for Chezmoi<'_> {
    fn name(&self) -> String {
        self.program.clone()
    }

    fn is_available(&self) -> bool {
        self.executor.which(&self.program)
    }

    fn init(&self, repo: &str) -> Result<()> {
        self.executor
            .run(&self.program, &["init", repo])
            .with_context(|| format!("{} init {repo}", self.program))?;
        Ok(())
    }

    fn apply(&self) -> Result<()> {
        self.executor
            .run(&self.program, &["apply"])
            .with_context(|| format!("{} apply", self.program))?;
        Ok(())
    }

    fn source_dir(&self) -> Option<PathBuf> {
        let result = self
            .executor
            .run(&self.program, &["source-path"])
            .ok()?;
        let path = result.stdout.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    fn push(&self) -> Result<PushOutcome> {
        let Some(dir) = self.source_dir() else {
            bail!(
                "{} has no source directory; run '{} init <repo>' first",
                self.program,
                self.program
            );
        };
        self.executor
            .run_in(&dir, "git", &["add", "."])
            .context("staging dotfile changes")?;
        let status = self
            .executor
            .run_in(&dir, "git", &["status", "--porcelain"])
            .context("checking dotfile changes")?;
        if status.stdout.trim().is_empty() {
            return Ok(PushOutcome::Clean);
        }
        self.executor
            .run_in(&dir, "git", &["commit", "-m", COMMIT_MESSAGE])
            .context("committing dotfile changes")?;
        self.executor
            .run_in(&dir, "git", &["push"])
            .context("pushing dotfile changes")?;
        Ok(PushOutcome::Pushed)
    }
}
