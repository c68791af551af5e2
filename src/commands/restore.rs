//! Command: restore a backup onto this machine.

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, RestoreOpts};
use crate::dotfiles::{Chezmoi, DotfileTool};
use crate::error::Error;
use crate::exec::SystemExecutor;
use crate::installer::{PackageInstaller, Tuxmate};
use crate::logging::{Logger, TaskStatus};
use crate::profile::{self, Profile};
use crate::prompt;
use crate::resources::shell_config::ShellConfigMode;
use crate::scanner::{self, PackageManager};
use crate::storage::{Backend, BackupId, Storage};
use crate::tasks::dotfiles::ApplyDotfiles;
use crate::tasks::packages::InstallPackages;
use crate::tasks::shell_config::RestoreShellConfig;
use crate::tasks::{self, Context, Task};

/// Choices that shape one restore run. Dry-run lives in [`Context`].
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Assume yes to every question.
    pub yes: bool,
    /// Do not install packages.
    pub skip_packages: bool,
    /// Do not touch the shell config.
    pub skip_shell_config: bool,
    /// Append to the existing shell config instead of replacing it.
    pub merge_shell_config: bool,
    /// Dotfiles repository to init and apply after the shell config.
    pub dotfiles_repo: Option<String>,
}

/// Recorded vs detected package manager when they differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Manager the backup was taken with.
    pub recorded: PackageManager,
    /// Manager found on this machine.
    pub detected: PackageManager,
}

/// What a restore run did.
#[derive(Debug)]
pub struct RestoreReport {
    /// The restored profile.
    pub profile: Profile,
    /// Set when the package manager differs from the backup's.
    pub mismatch: Option<Mismatch>,
    /// Every step in order with its final status.
    pub steps: Vec<(String, TaskStatus)>,
}

impl RestoreReport {
    /// Number of failed steps.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|(_, status)| *status == TaskStatus::Failed)
            .count()
    }

    /// Status of the step called `name`.
    #[must_use]
    pub fn status_of(&self, name: &str) -> Option<TaskStatus> {
        self.steps
            .iter()
            .find(|(step, _)| step == name)
            .map(|(_, status)| *status)
    }
}

/// Restore the backup `id` onto this machine.
///
/// Fetching and parsing failures abort before anything is changed. After
/// that every step runs and records its own status; a failed step does not
/// stop the ones after it.
///
/// # Errors
///
/// - [`Error::Cancelled`] when the user declines a confirmation.
/// - [`Error::Storage`] when the backup cannot be fetched (`NotFound` is
///   distinct).
/// - [`Error::Profile`] when the backup cannot be parsed.
pub fn restore(
    ctx: &Context,
    storage: &dyn Storage,
    installer: &dyn PackageInstaller,
    dotfiles: &dyn DotfileTool,
    id: &BackupId,
    opts: &RestoreOptions,
) -> Result<RestoreReport, Error> {
    if !opts.yes && !ctx.dry_run {
        ctx.log
            .info(&format!("This will restore packages from backup: {id}"));
        if !ctx.prompt.confirm("Continue with restore?", true) {
            return Err(Error::Cancelled("restore declined".to_string()));
        }
    }

    ctx.log.stage(&format!("Fetching backup {id}"));
    let payload = storage.retrieve(id)?;

    ctx.log.stage("Reading profile");
    let profile = profile::deserialize(&payload)?;
    for line in profile.describe() {
        ctx.log.info(&line);
    }

    let mismatch = reconcile(ctx, &profile, opts)?;

    let mode = if opts.merge_shell_config {
        ShellConfigMode::Merge
    } else {
        ShellConfigMode::Replace
    };
    let install = InstallPackages::new(profile.packages(), installer, opts.skip_packages);
    let shell_config =
        RestoreShellConfig::new(profile.shell_config(), mode, opts.skip_shell_config);
    let apply_dotfiles = ApplyDotfiles::new(dotfiles, opts.dotfiles_repo.as_deref());
    let all: [&dyn Task; 3] = [&install, &shell_config, &apply_dotfiles];
    let steps = all
        .into_iter()
        .map(|task| (task.name().to_string(), tasks::execute(task, ctx)))
        .collect();

    Ok(RestoreReport {
        profile,
        mismatch,
        steps,
    })
}

/// Compare the recorded package manager with this machine's and ask before
/// continuing when they differ. The package list is never altered.
fn reconcile(
    ctx: &Context,
    profile: &Profile,
    opts: &RestoreOptions,
) -> Result<Option<Mismatch>, Error> {
    let recorded = profile.package_manager();
    let detected = scanner::detect(ctx.executor);
    if recorded == detected {
        ctx.log.debug(&format!("package manager matches: {detected}"));
        return Ok(None);
    }

    let on_this_machine = if detected == PackageManager::Unknown {
        "no supported package manager was found here".to_string()
    } else {
        format!("this machine uses {detected}")
    };
    ctx.log.warn(&format!(
        "backup was made with {recorded} but {on_this_machine}; package names may not match"
    ));
    if !opts.yes
        && !ctx.dry_run
        && !ctx.prompt.confirm("Continue with restore anyway?", true)
    {
        return Err(Error::Cancelled(
            "package manager mismatch not accepted".to_string(),
        ));
    }
    Ok(Some(Mismatch { recorded, detected }))
}

/// Run the `restore` command.
///
/// # Errors
///
/// Returns an error for invalid input, a fatal restore error, or when any
/// restore step failed.
pub fn run(global: &GlobalOpts, opts: &RestoreOpts, log: &Logger) -> Result<()> {
    let id = BackupId::parse(&opts.backup_id)?;
    let backend = Backend::from_server_flag(opts.server.as_deref())?;
    let setup = CommandSetup::init(global, log)?;

    let executor = SystemExecutor;
    let prompt = prompt::for_session(!opts.yes);
    let ctx = Context::with_home(
        log,
        &executor,
        prompt.as_ref(),
        &setup.settings,
        setup.home.clone(),
        opts.dry_run,
    );
    if opts.dry_run {
        log.info("dry run: nothing will be changed");
    }

    let storage = backend.open(&setup.settings, &executor);
    let installer = Tuxmate::new(&executor, setup.settings.installer.clone());
    let dotfiles = Chezmoi::new(&executor, &setup.settings.dotfiles.program);
    let options = RestoreOptions {
        yes: opts.yes,
        skip_packages: opts.skip_packages,
        skip_shell_config: opts.skip_bashrc,
        merge_shell_config: opts.merge_bashrc,
        dotfiles_repo: opts.chezmoi_repo.clone().filter(|_| opts.use_chezmoi),
    };
    if opts.use_chezmoi && options.dotfiles_repo.is_none() {
        log.warn("--use-chezmoi needs --chezmoi-repo on restore; skipping dotfiles");
    }

    let report = restore(
        &ctx,
        storage.as_ref(),
        &installer,
        &dotfiles,
        &id,
        &options,
    )?;

    log.print_summary();
    let failed = report.failure_count();
    if failed > 0 {
        anyhow::bail!("{failed} restore step(s) failed");
    }
    Ok(())
}
