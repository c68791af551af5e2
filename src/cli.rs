//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "tuxsync",
    about = "Back up and restore Linux package profiles and shell config",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Config file (default: $XDG_CONFIG_HOME/tuxsync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan installed packages and store a backup
    Backup(BackupOpts),
    /// Restore packages and shell config from a backup
    Restore(RestoreOpts),
    /// List stored backups
    List(ListOpts),
    /// Print version information
    Version,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

impl Command {
    /// Subcommand name, used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Backup(_) => "backup",
            Self::Restore(_) => "restore",
            Self::List(_) => "list",
            Self::Version => "version",
            Self::Completions { .. } => "completions",
        }
    }
}

/// Options for the `backup` subcommand.
#[derive(Parser, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct BackupOpts {
    /// Do not include ~/.bashrc
    #[arg(long)]
    pub no_bashrc: bool,

    /// Store as a secret GitHub gist
    #[arg(long, conflicts_with = "server")]
    pub github: bool,

    /// Store on a custom server
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Never prompt; requires --github or --server
    #[arg(long)]
    pub non_interactive: bool,

    /// Also sync dotfiles with chezmoi
    #[arg(long)]
    pub use_chezmoi: bool,

    /// Dotfiles repository for chezmoi
    #[arg(long, value_name = "REPO", requires = "use_chezmoi")]
    pub chezmoi_repo: Option<String>,
}

/// Options for the `restore` subcommand.
#[derive(Parser, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RestoreOpts {
    /// Backup identifier printed by `tuxsync backup`
    pub backup_id: String,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Answer yes to every question
    #[arg(short, long)]
    pub yes: bool,

    /// Do not install packages
    #[arg(long)]
    pub skip_packages: bool,

    /// Do not touch ~/.bashrc
    #[arg(long)]
    pub skip_bashrc: bool,

    /// Append the saved config to ~/.bashrc instead of replacing it
    #[arg(long, conflicts_with = "skip_bashrc")]
    pub merge_bashrc: bool,

    /// Fetch from a custom server instead of GitHub
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Also apply dotfiles with chezmoi
    #[arg(long)]
    pub use_chezmoi: bool,

    /// Dotfiles repository for chezmoi
    #[arg(long, value_name = "REPO")]
    pub chezmoi_repo: Option<String>,
}

/// Options for the `list` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ListOpts {
    /// List backups on a custom server
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,
}
