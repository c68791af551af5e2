//! Named restore steps whose outcomes are recorded for the summary.
pub mod context;
pub mod dotfiles;
pub mod packages;
pub mod shell_config;

pub use context::Context;

use anyhow::Result;

use crate::logging::TaskStatus;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use tuxsync::tasks::TaskResult;
///
/// let skipped = TaskResult::Skipped("--skip-packages".into());
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped by a flag or a missing tool.
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// A named, executable restore step.
pub trait Task {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether the step applies to this backup at all.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails. Later steps still run.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Execute a task, record its status in the logger and return it.
pub fn execute(task: &dyn Task, ctx: &Context) -> TaskStatus {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return TaskStatus::NotApplicable;
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            TaskStatus::Ok
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            TaskStatus::Skipped
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
            TaskStatus::DryRun
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            TaskStatus::Failed
        }
    }
}
