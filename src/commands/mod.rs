//! Subcommand orchestration.

pub mod backup;
pub mod list;
pub mod restore;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::Settings;
use crate::logging::Logger;
use crate::tasks::context::home_dir;

/// State every command needs before it touches the system.
#[derive(Debug)]
pub struct CommandSetup {
    /// The user's home directory.
    pub home: PathBuf,
    /// Loaded settings with environment overrides applied.
    pub settings: Settings,
}

impl CommandSetup {
    /// Resolve the home directory and load settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `HOME` is unset or the config file cannot be
    /// parsed. A missing config file yields defaults.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let home = home_dir()?;
        let env = |key: &str| std::env::var(key).ok();
        let path = global
            .config
            .clone()
            .unwrap_or_else(|| Settings::default_path(&home, env));

        log.debug(&format!("config: {}", path.display()));
        let settings = Settings::load(&path, env)?;
        log.debug(&format!("gist repo: {}", settings.github_repo));
        log.debug(&format!(
            "{} exclusion patterns",
            settings.exclusions.patterns.len() + settings.exclusions.extra.len()
        ));

        Ok(Self { home, settings })
    }
}
