//! Shell config restore step.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::resources::shell_config::{ShellConfigMode, ShellConfigResource};
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Restore the saved shell config, keeping a copy of whatever was there.
#[derive(Debug)]
pub struct RestoreShellConfig<'a> {
    content: Option<&'a str>,
    mode: ShellConfigMode,
    skip: bool,
}

impl<'a> RestoreShellConfig<'a> {
    /// Create the step. `content` is `None` when the backup has no shell
    /// config; `skip` comes from `--skip-bashrc`.
    #[must_use]
    pub const fn new(content: Option<&'a str>, mode: ShellConfigMode, skip: bool) -> Self {
        Self {
            content,
            mode,
            skip,
        }
    }
}

impl Task for RestoreShellConfig<'_> {
    fn name(&self) -> &'static str {
        "Restore shell config"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        self.content.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if self.skip {
            return Ok(TaskResult::Skipped("--skip-bashrc".to_string()));
        }
        let Some(content) = self.content else {
            return Ok(TaskResult::Skipped("backup has no shell config".to_string()));
        };
        let resource = ShellConfigResource::new(
            ctx.shell_config_path(),
            content.to_string(),
            self.mode,
            ShellConfigResource::stamp_now(),
        );

        match resource.current_state()? {
            ResourceState::Correct => {
                ctx.log.info(&format!(
                    "{} already has the saved content",
                    resource.target.display()
                ));
                return Ok(TaskResult::Ok);
            }
            ResourceState::Invalid { reason } => anyhow::bail!("cannot restore: {reason}"),
            ResourceState::Missing | ResourceState::Incorrect { .. } => {}
        }

        if ctx.dry_run {
            ctx.log.dry_run(&format!("would {}", resource.description()));
            if resource.target.exists() {
                ctx.log.dry_run("existing file would be backed up first");
            }
            return Ok(TaskResult::DryRun);
        }

        match resource.apply()? {
            ResourceChange::Applied { backup } => {
                if let Some(backup) = backup {
                    ctx.log
                        .info(&format!("previous file saved as {}", backup.display()));
                }
                ctx.log.info(&format!("restored {}", resource.target.display()));
            }
            ResourceChange::AlreadyCorrect => {}
        }
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::{TaskStatus, isolated_logger};
    use crate::tasks::execute;
    use crate::tasks::test_helpers::context;
    use std::fs;

    fn run(home: &std::path::Path, task: &RestoreShellConfig, dry_run: bool) -> TaskStatus {
        let (log, _tmp, _guard) = isolated_logger();
        let exec = MockExecutor::default();
        let settings = Settings::default();
        let ctx = context(&log, &exec, &settings, home.to_path_buf(), dry_run);
        execute(task, &ctx)
    }

    #[test]
    fn replaces_and_keeps_backup() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(".bashrc"), "old").unwrap();
        let task = RestoreShellConfig::new(Some("new"), ShellConfigMode::Replace, false);
        assert_eq!(run(home.path(), &task, false), TaskStatus::Ok);
        assert_eq!(fs::read_to_string(home.path().join(".bashrc")).unwrap(), "new");
        let backups: Vec<_> = fs::read_dir(home.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".bashrc.backup_"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), "old");
    }

    #[test]
    fn dry_run_writes_nothing() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(".bashrc"), "old").unwrap();
        let task = RestoreShellConfig::new(Some("new"), ShellConfigMode::Merge, false);
        assert_eq!(run(home.path(), &task, true), TaskStatus::DryRun);
        assert_eq!(fs::read_to_string(home.path().join(".bashrc")).unwrap(), "old");
        assert_eq!(fs::read_dir(home.path()).unwrap().count(), 1);
    }

    #[test]
    fn no_saved_config_is_not_applicable() {
        let home = tempfile::tempdir().unwrap();
        let task = RestoreShellConfig::new(None, ShellConfigMode::Replace, false);
        assert_eq!(run(home.path(), &task, false), TaskStatus::NotApplicable);
    }

    #[test]
    fn skip_flag_leaves_file() {
        let home = tempfile::tempdir().unwrap();
        let task = RestoreShellConfig::new(Some("new"), ShellConfigMode::Replace, true);
        assert_eq!(run(home.path(), &task, false), TaskStatus::Skipped);
        assert!(!home.path().join(".bashrc").exists());
    }

    #[test]
    fn directory_in_the_way_fails() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir(home.path().join(".bashrc")).unwrap();
        let task = RestoreShellConfig::new(Some("new"), ShellConfigMode::Replace, false);
        assert_eq!(run(home.path(), &task, false), TaskStatus::Failed);
    }
}
