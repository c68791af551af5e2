//! User settings: an optional TOML file plus `TUXSYNC_*` environment overrides.
pub mod toml_loader;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::scanner::filter::{DEFAULT_EXCLUSIONS, ExclusionFilter};

/// Resolved settings for one run.
///
/// Loaded once in the command layer and passed down explicitly; nothing
/// below the command layer reads the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `owner/repo` hosting the standalone restore script.
    pub github_repo: String,
    /// Maximum number of gists requested by `list`.
    pub gist_list_limit: usize,
    /// Shell config file to back up and restore. `~/` is expanded against
    /// the home directory.
    pub shell_config: String,
    /// External package executor.
    pub installer: InstallerSettings,
    /// Dotfile tool.
    pub dotfiles: DotfilesSettings,
    /// Package exclusion globs.
    pub exclusions: ExclusionSettings,
}

/// Package executor settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerSettings {
    /// Program name looked up on `PATH`.
    pub program: String,
    /// `owner/repo` the program is downloaded from when missing.
    pub repo: String,
    /// Download the program when it is not on `PATH`.
    pub auto_download: bool,
}

/// Dotfile tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DotfilesSettings {
    /// Program name looked up on `PATH`.
    pub program: String,
}

/// Package exclusion settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExclusionSettings {
    /// Glob patterns; replaces the built-in list when set.
    pub patterns: Vec<String>,
    /// Extra patterns appended to `patterns`.
    pub extra: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_repo: "Gururagavendra/tuxsync".to_string(),
            gist_list_limit: 20,
            shell_config: "~/.bashrc".to_string(),
            installer: InstallerSettings::default(),
            dotfiles: DotfilesSettings::default(),
            exclusions: ExclusionSettings::default(),
        }
    }
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            program: "tuxmate".to_string(),
            repo: "Gururagavendra/tuxmate".to_string(),
            auto_download: true,
        }
    }
}

impl Default for DotfilesSettings {
    fn default() -> Self {
        Self {
            program: "chezmoi".to_string(),
        }
    }
}

impl Default for ExclusionSettings {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_EXCLUSIONS.iter().map(ToString::to_string).collect(),
            extra: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (missing file means defaults), then apply
    /// environment overrides read through `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable, not valid TOML,
    /// or contains unknown keys.
    pub fn load(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let settings: Self = toml_loader::load_config(path)?;
        Ok(settings.with_env_overrides(env))
    }

    /// Default config file location.
    ///
    /// `$TUXSYNC_CONFIG`, else `$XDG_CONFIG_HOME/tuxsync/config.toml`, else
    /// `<home>/.config/tuxsync/config.toml`.
    #[must_use]
    pub fn default_path(home: &Path, env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(path) = env("TUXSYNC_CONFIG").filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        env("XDG_CONFIG_HOME")
            .filter(|p| !p.is_empty())
            .map_or_else(|| home.join(".config"), PathBuf::from)
            .join("tuxsync")
            .join("config.toml")
    }

    /// Apply `TUXSYNC_GITHUB_REPO`, `TUXSYNC_TUXMATE_REPO` and
    /// `TUXSYNC_GIST_LIST_LIMIT`. Empty or unparsable values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(repo) = env("TUXSYNC_GITHUB_REPO").filter(|v| !v.is_empty()) {
            self.github_repo = repo;
        }
        if let Some(repo) = env("TUXSYNC_TUXMATE_REPO").filter(|v| !v.is_empty()) {
            self.installer.repo = repo;
        }
        if let Some(limit) = env("TUXSYNC_GIST_LIST_LIMIT").and_then(|v| v.parse().ok()) {
            self.gist_list_limit = limit;
        }
        self
    }

    /// URL of the standalone restore script used in emitted restore commands.
    #[must_use]
    pub fn restore_script_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/main/restore.sh",
            self.github_repo
        )
    }

    /// Absolute path of the shell config file.
    #[must_use]
    pub fn shell_config_path(&self, home: &Path) -> PathBuf {
        match self.shell_config.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None if self.shell_config == "~" => home.to_path_buf(),
            None => {
                let path = PathBuf::from(&self.shell_config);
                if path.is_absolute() {
                    path
                } else {
                    home.join(path)
                }
            }
        }
    }

    /// Compile the configured exclusion globs.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid pattern.
    pub fn exclusion_filter(&self) -> Result<ExclusionFilter> {
        let all: Vec<&String> = self
            .exclusions
            .patterns
            .iter()
            .chain(&self.exclusions.extra)
            .collect();
        ExclusionFilter::new(&all).context("invalid pattern in [exclusions]")
    }
}

impl InstallerSettings {
    /// Candidate download URLs, tried in order.
    #[must_use]
    pub fn download_urls(&self) -> Vec<String> {
        vec![
            format!(
                "https://github.com/{}/releases/latest/download/{}",
                self.repo, self.program
            ),
            format!(
                "https://raw.githubusercontent.com/{}/main/{}",
                self.repo, self.program
            ),
        ]
    }
}
