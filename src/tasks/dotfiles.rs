//! Dotfile tool step.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::dotfiles::DotfileTool;

/// Initialise the dotfile tool from a repository and apply it.
pub struct ApplyDotfiles<'a> {
    tool: &'a dyn DotfileTool,
    repo: Option<&'a str>,
}

impl std::fmt::Debug for ApplyDotfiles<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyDotfiles")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl<'a> ApplyDotfiles<'a> {
    /// Create the step. `repo` is `None` unless both `--use-chezmoi` and
    /// `--chezmoi-repo` were given.
    #[must_use]
    pub const fn new(tool: &'a dyn DotfileTool, repo: Option<&'a str>) -> Self {
        Self { tool, repo }
    }
}

impl Task for ApplyDotfiles<'_> {
    fn name(&self) -> &'static str {
        "Apply dotfiles"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        self.repo.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(repo) = self.repo else {
            return Ok(TaskResult::Skipped("no dotfiles repository given".to_string()));
        };
        let name = self.tool.name();
        if !self.tool.is_available() {
            return Ok(TaskResult::Skipped(format!("{name} not installed")));
        }
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would run '{name} init {repo}' then '{name} apply'"));
            return Ok(TaskResult::DryRun);
        }
        self.tool.init(repo)?;
        self.tool.apply()?;
        ctx.log.info(&format!("dotfiles applied from {repo}"));
        Ok(TaskResult::Ok)
    }
}
