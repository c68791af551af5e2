//! Command: scan this machine and store a backup.

use std::io;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::CommandSetup;
use crate::cli::{BackupOpts, GlobalOpts};
use crate::dotfiles::{Chezmoi, DotfileTool, PushOutcome};
use crate::error::{Error, FilesystemError};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::platform::OsRelease;
use crate::profile::{self, Profile};
use crate::prompt::{self, Prompt};
use crate::scanner;
use crate::storage::{Backend, BackupId, Storage};
use crate::tasks::Context;

/// Choices that shape one backup run.
#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    /// Leave the shell config out.
    pub skip_shell_config: bool,
    /// Never ask questions.
    pub non_interactive: bool,
    /// Sync the dotfile tool's source repository as well.
    pub use_dotfiles: bool,
    /// Repository to initialise the dotfile tool from before pushing.
    pub dotfiles_repo: Option<String>,
}

/// A stored backup and how to restore it.
#[derive(Debug)]
pub struct BackupOutcome {
    /// Identifier issued by the backend.
    pub id: BackupId,
    /// What was stored.
    pub profile: Profile,
    /// Commands that restore this backup on another machine.
    pub restore_commands: Vec<String>,
}

/// Scan this machine, build a profile and store it.
///
/// Nothing reaches the network before the scan and the shell config read
/// have succeeded. Dotfile sync problems are reported as warnings only.
///
/// # Errors
///
/// - [`Error::Scan`] when no package manager is found or its query fails.
/// - [`Error::Cancelled`] when the scan is empty and the user declines.
/// - [`Error::Filesystem`] when the shell config exists but is unreadable.
/// - [`Error::Storage`] when the backend rejects the backup; no identifier
///   exists in that case.
pub fn backup(
    ctx: &Context,
    storage: &dyn Storage,
    backend: &Backend,
    dotfiles: &dyn DotfileTool,
    os: &OsRelease,
    now: DateTime<Utc>,
    opts: &BackupOptions,
) -> Result<BackupOutcome, Error> {
    ctx.log.stage("Scanning packages");
    let filter = ctx
        .settings
        .exclusion_filter()
        .map_err(|e| Error::InvalidInput(format!("{e:#}")))?;
    let scan = scanner::scan(ctx.executor, &filter)?;
    ctx.log.info(&format!(
        "{} packages from {} ({} excluded)",
        scan.packages.len(),
        scan.package_manager,
        scan.excluded
    ));
    if scan.packages.is_empty() {
        ctx.log.warn("no packages found to back up");
        if !opts.non_interactive && !ctx.prompt.confirm("Continue anyway?", false) {
            return Err(Error::Cancelled("no packages to back up".to_string()));
        }
    }

    let shell_config = if opts.skip_shell_config {
        ctx.log.info("shell config skipped (--no-bashrc)");
        None
    } else {
        let path = ctx.shell_config_path();
        let content = read_shell_config(&path)?;
        if content.is_none() {
            ctx.log.warn(&format!(
                "{} is missing or empty; backing up packages only",
                path.display()
            ));
        }
        content
    };

    let profile = Profile::new(now, os, scan.package_manager, scan.packages, shell_config);
    ctx.log.stage("Scan summary");
    ctx.log
        .info(&format!("Distro: {} {}", profile.distro_name(), profile.distro_version()));
    ctx.log.info(&format!("Packages: {}", profile.package_count()));
    ctx.log.info(&format!(
        "Shell config: {}",
        if profile.has_shell_config() { "yes" } else { "no" }
    ));

    if opts.use_dotfiles {
        sync_dotfiles(ctx, dotfiles, opts.dotfiles_repo.as_deref());
    }

    let payload = profile::serialize(&profile)?;
    ctx.log.stage(&format!("Uploading to {}", storage.name()));
    let id = storage.store(&payload)?;

    let restore_commands = restore_commands(ctx, backend, &id);
    ctx.log.stage("Backup complete");
    ctx.log.info(&format!("Backup ID: {id}"));
    ctx.log.info("Restore on any Linux machine with:");
    for command in &restore_commands {
        ctx.log.info(&format!("  {command}"));
    }

    Ok(BackupOutcome {
        id,
        profile,
        restore_commands,
    })
}

/// The one-line script command and the native command for `id`.
fn restore_commands(ctx: &Context, backend: &Backend, id: &BackupId) -> Vec<String> {
    let extra = backend.restore_args();
    vec![
        format!(
            "curl -fsSL {} | bash -s -- {id}{extra}",
            ctx.settings.restore_script_url()
        ),
        format!("tuxsync restore {id}{extra}"),
    ]
}

/// Read the shell config; `None` when it is missing or blank.
fn read_shell_config(path: &Path) -> Result<Option<String>, FilesystemError> {
    match std::fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FilesystemError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn sync_dotfiles(ctx: &Context, tool: &dyn DotfileTool, repo: Option<&str>) {
    let name = tool.name();
    ctx.log.stage(&format!("Syncing dotfiles with {name}"));
    if !tool.is_available() {
        ctx.log
            .warn(&format!("{name} is not installed; skipping dotfile sync"));
        return;
    }
    if let Some(repo) = repo {
        if let Err(e) = tool.init(repo) {
            ctx.log.warn(&format!("dotfile sync failed: {e:#}"));
            return;
        }
    } else if tool.source_dir().is_none() {
        ctx.log.warn(&format!(
            "no {name} repository configured; run '{name} init <repo>' or pass --chezmoi-repo"
        ));
        return;
    }
    match tool.push() {
        Ok(PushOutcome::Pushed) => ctx.log.info("dotfile changes pushed"),
        Ok(PushOutcome::Clean) => ctx.log.info("dotfiles already up to date"),
        Err(e) => ctx.log.warn(&format!("dotfile sync failed: {e:#}")),
    }
}

/// Pick the storage backend from flags, or ask.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a bad server URL, for
/// `--non-interactive` without a backend flag, or when no choice was made.
pub fn choose_backend(opts: &BackupOpts, prompt: &dyn Prompt) -> Result<Backend, Error> {
    if opts.server.is_some() {
        return Backend::from_server_flag(opts.server.as_deref());
    }
    if opts.github {
        return Ok(Backend::Gist);
    }
    if opts.non_interactive {
        return Err(Error::InvalidInput(
            "--github or --server URL is required with --non-interactive".to_string(),
        ));
    }
    let options = [
        "GitHub Gist (recommended)".to_string(),
        "Custom Server".to_string(),
    ];
    match prompt.choose("Where would you like to store your backup?", &options, 0) {
        Some(0) => Ok(Backend::Gist),
        Some(_) => {
            let url = prompt
                .input("Enter your server URL")
                .ok_or_else(|| Error::InvalidInput("server URL required".to_string()))?;
            Backend::from_server_flag(Some(&url))
        }
        None => Err(Error::InvalidInput(
            "no storage backend selected (use --github or --server URL)".to_string(),
        )),
    }
}

/// Run the `backup` command.
///
/// # Errors
///
/// Returns an error if backend selection, scanning, reading the shell
/// config or storing fails.
pub fn run(global: &GlobalOpts, opts: &BackupOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let prompt = prompt::for_session(!opts.non_interactive);
    let backend = choose_backend(opts, prompt.as_ref())?;

    let executor = SystemExecutor;
    let ctx = Context::with_home(
        log,
        &executor,
        prompt.as_ref(),
        &setup.settings,
        setup.home.clone(),
        false,
    );
    let storage = backend.open(&setup.settings, &executor);
    let dotfiles = Chezmoi::new(&executor, &setup.settings.dotfiles.program);
    let options = BackupOptions {
        skip_shell_config: opts.no_bashrc,
        non_interactive: opts.non_interactive,
        use_dotfiles: opts.use_chezmoi,
        dotfiles_repo: opts.chezmoi_repo.clone(),
    };

    backup(
        &ctx,
        storage.as_ref(),
        &backend,
        &dotfiles,
        &OsRelease::detect(),
        Utc::now(),
        &options,
    )?;
    Ok(())
}
