//! Package installation step.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::installer::{InstallOutcome, PackageInstaller};

/// Install the profile's packages through the package executor.
pub struct InstallPackages<'a> {
    packages: &'a [String],
    installer: &'a dyn PackageInstaller,
    skip: bool,
}

impl std::fmt::Debug for InstallPackages<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallPackages")
            .field("packages", &self.packages.len())
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

impl<'a> InstallPackages<'a> {
    /// Create the step. `skip` comes from `--skip-packages`.
    #[must_use]
    pub const fn new(
        packages: &'a [String],
        installer: &'a dyn PackageInstaller,
        skip: bool,
    ) -> Self {
        Self {
            packages,
            installer,
            skip,
        }
    }
}

impl Task for InstallPackages<'_> {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        !self.packages.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if self.skip {
            return Ok(TaskResult::Skipped("--skip-packages".to_string()));
        }
        let name = self.installer.name();
        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "would install {} packages via {name}",
                self.packages.len()
            ));
            for package in self.packages {
                ctx.log.dry_run(&format!("  {package}"));
            }
            return Ok(TaskResult::DryRun);
        }

        ctx.log.info(&format!(
            "installing {} packages via {name}",
            self.packages.len()
        ));
        match self.installer.install(self.packages)? {
            InstallOutcome::Installed => Ok(TaskResult::Ok),
            InstallOutcome::Failed { code } => {
                let code = code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"));
                anyhow::bail!("{name} exited with {code}; some packages may not be installed")
            }
        }
    }
}
