//! Backups stored as secret GitHub gists through the `gh` CLI.
//!
//! Authentication is whatever `gh` already holds; this backend never starts
//! an interactive login.
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use tempfile::TempDir;

use super::{BackupId, BackupSummary, Payload, Storage};
use crate::error::StorageError;
use crate::exec::Executor;

/// Gist file holding the profile document.
pub const METADATA_FILE: &str = "tuxsync.yaml";
/// Gist file holding the shell config.
pub const SHELL_CONFIG_FILE: &str = "bashrc";
/// Marker used in gist descriptions and when filtering listings.
const DESCRIPTION_PREFIX: &str = "TuxSync Backup";

/// [`Storage`] implementation backed by `gh gist`.
pub struct GistStorage<'a> {
    executor: &'a dyn Executor,
    list_limit: usize,
}

impl fmt::Debug for GistStorage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GistStorage")
            .field("executor", &"<dyn Executor>")
            .field("list_limit", &self.list_limit)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
}

/// Private scratch directory (mode 0700) removed on drop.
struct StagingDir(TempDir);

impl StagingDir {
    fn create() -> Result<Self, StorageError> {
        tempfile::Builder::new()
            .prefix("tuxsync-")
            .tempdir()
            .map(Self)
            .map_err(|e| StorageError::Transport(format!("staging directory: {e}")))
    }

    fn write(&self, name: &str, content: &str) -> Result<PathBuf, StorageError> {
        let path = self.0.path().join(name);
        std::fs::write(&path, content)
            .map_err(|e| StorageError::Transport(format!("staging {name}: {e}")))?;
        Ok(path)
    }
}

impl<'a> GistStorage<'a> {
    /// Create a gist backend listing at most `list_limit` gists.
    #[must_use]
    pub const fn new(executor: &'a dyn Executor, list_limit: usize) -> Self {
        Self {
            executor,
            list_limit,
        }
    }

    fn ensure_authenticated(&self) -> Result<(), StorageError> {
        if !self.executor.which("gh") {
            return Err(StorageError::NotAuthenticated(
                "GitHub CLI (gh) is not installed; see https://cli.github.com".to_string(),
            ));
        }
        let status = self
            .executor
            .run_unchecked("gh", &["auth", "status"])
            .map_err(|e| StorageError::Transport(format!("{e:#}")))?;
        if status.success {
            Ok(())
        } else {
            Err(StorageError::NotAuthenticated(
                "GitHub CLI is not logged in; run 'gh auth login' first".to_string(),
            ))
        }
    }

    fn gh(&self, args: &[&str]) -> Result<String, StorageError> {
        let result = self
            .executor
            .run_unchecked("gh", args)
            .map_err(|e| StorageError::Transport(format!("{e:#}")))?;
        if result.success {
            Ok(result.stdout)
        } else {
            Err(StorageError::Transport(format!(
                "gh {} failed: {}",
                args.first().copied().unwrap_or_default(),
                result.stderr.trim()
            )))
        }
    }
}

impl Storage for GistStorage<'_> {
    fn name(&self) -> String {
        "GitHub Gist".to_string()
    }

    fn store(&self, payload: &Payload) -> Result<BackupId, StorageError> {
        self.ensure_authenticated()?;

        let staging = StagingDir::create()?;
        let mut files = vec![staging.write(METADATA_FILE, &payload.metadata)?];
        if let Some(shell) = &payload.shell_config {
            files.push(staging.write(SHELL_CONFIG_FILE, shell)?);
        }

        let description = format!(
            "{DESCRIPTION_PREFIX} {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        );
        let file_args: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let mut args = vec!["gist", "create", "--desc", description.as_str()];
        args.extend(file_args.iter().map(String::as_str));

        let stdout = self.gh(&args)?;
        parse_created_id(&stdout)
    }

    fn retrieve(&self, id: &BackupId) -> Result<Payload, StorageError> {
        self.ensure_authenticated()?;

        let endpoint = format!("gists/{id}");
        let result = self
            .executor
            .run_unchecked("gh", &["api", &endpoint])
            .map_err(|e| StorageError::Transport(format!("{e:#}")))?;
        if !result.success {
            let stderr = result.stderr.trim();
            if stderr.contains("404") || stderr.contains("Not Found") {
                return Err(StorageError::NotFound { id: id.to_string() });
            }
            return Err(StorageError::Transport(format!("gh api failed: {stderr}")));
        }
        parse_gist(&result.stdout, id)
    }

    fn list(&self) -> Result<Vec<BackupSummary>, StorageError> {
        self.ensure_authenticated()?;
        let limit = self.list_limit.to_string();
        let stdout = self.gh(&["gist", "list", "--limit", &limit])?;
        Ok(parse_listing(&stdout))
    }
}

/// Extract the identifier from the gist URL `gh gist create` prints.
fn parse_created_id(stdout: &str) -> Result<BackupId, StorageError> {
    let url = stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .ok_or_else(|| StorageError::InvalidResponse("gh printed no gist URL".to_string()))?;
    let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    BackupId::parse(last)
        .map_err(|_| StorageError::InvalidResponse(format!("unrecognised gist URL '{url}'")))
}

fn parse_gist(json: &str, id: &BackupId) -> Result<Payload, StorageError> {
    let gist: GistResponse = serde_json::from_str(json)
        .map_err(|e| StorageError::InvalidResponse(format!("gist JSON: {e}")))?;
    let content = |name: &str| -> Result<Option<String>, StorageError> {
        match gist.files.get(name) {
            None => Ok(None),
            Some(file) if file.truncated => Err(StorageError::InvalidResponse(format!(
                "gist file {name} is too large to fetch"
            ))),
            Some(file) => Ok(file.content.clone()),
        }
    };
    let metadata = content(METADATA_FILE)?.ok_or_else(|| StorageError::NotFound {
        id: id.to_string(),
    })?;
    let shell_config = content(SHELL_CONFIG_FILE)?.filter(|c| !c.is_empty());
    Ok(Payload {
        metadata,
        shell_config,
    })
}

/// Parse `gh gist list` tab-separated output, keeping TuxSync gists.
fn parse_listing(stdout: &str) -> Vec<BackupSummary> {
    stdout
        .lines()
        .filter(|line| line.to_ascii_lowercase().contains("tuxsync"))
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let id = cols.next()?.trim();
            let description = cols.next().unwrap_or_default().trim();
            (!id.is_empty()).then(|| BackupSummary {
                id: id.to_string(),
                description: description.to_string(),
            })
        })
        .collect()
}

/// Path of a staged file inside a recorded `gh gist create` call, for tests.
#[cfg(test)]
fn staged_path(call: &str, name: &str) -> Option<PathBuf> {
    call.split_whitespace()
        .find(|arg| arg.ends_with(name))
        .map(PathBuf::from)
}
