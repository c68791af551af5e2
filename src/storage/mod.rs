//! Remote persistence of backups.
//!
//! A backup is two slots, the profile document and the optional shell
//! config, written together in one backend request so a failed store never
//! leaves half a backup behind. The backend is chosen once per run from CLI
//! flags ([`Backend`]) and injected as a `&dyn Storage`.
pub mod gist;
pub mod server;

use std::fmt;

use crate::config::Settings;
use crate::error::{Error, StorageError};
use crate::exec::Executor;

/// The two stored slots of a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Serialized profile document.
    pub metadata: String,
    /// Raw shell config text, if one was saved.
    pub shell_config: Option<String>,
}

/// Opaque backend-issued backup identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackupId(String);

impl BackupId {
    /// Validate a user- or backend-supplied identifier.
    ///
    /// Accepts 8 to 64 ASCII letters, digits, `-` or `_` after trimming.
    /// Identifiers end up in `gh` argument lists and URL paths, so nothing
    /// else is allowed through.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the problem.
    ///
    /// # Examples
    ///
    /// ```
    /// use tuxsync::storage::BackupId;
    ///
    /// assert!(BackupId::parse(" aa5a315d61ae9438b18d ").is_ok());
    /// assert!(BackupId::parse("short").is_err());
    /// assert!(BackupId::parse("abc12345; rm -rf /").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("backup ID cannot be empty".to_string()));
        }
        let valid_chars = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_chars || !(8..=64).contains(&id.len()) {
            return Err(Error::InvalidInput(format!(
                "invalid backup ID '{id}': expected 8-64 letters, digits, '-' or '_'"
            )));
        }
        Ok(Self(id.to_string()))
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a backend listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    /// Backup identifier.
    pub id: String,
    /// Backend-side description.
    pub description: String,
}

/// A place backups are stored.
#[cfg_attr(test, mockall::automock)]
pub trait Storage {
    /// Short backend name for messages.
    fn name(&self) -> String;

    /// Persist both payload slots in one request and return the new
    /// identifier. On error nothing is left behind and no identifier exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotAuthenticated`] when credentials are
    /// missing, otherwise a transport or response error.
    fn store(&self, payload: &Payload) -> Result<BackupId, StorageError>;

    /// Fetch both slots of a backup.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when no backup has this identifier,
    /// distinct from every other failure.
    fn retrieve(&self, id: &BackupId) -> Result<Payload, StorageError>;

    /// List backups visible to the current user.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] for backends without listing.
    fn list(&self) -> Result<Vec<BackupSummary>, StorageError>;
}

/// Which storage backend a run uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Secret GitHub gist through the `gh` CLI.
    Gist,
    /// User-operated HTTP server at this base URL.
    Server(String),
}

impl Backend {
    /// Pick the backend from an optional `--server` flag; validates the URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed server URL.
    pub fn from_server_flag(server: Option<&str>) -> Result<Self, Error> {
        server.map_or(Ok(Self::Gist), |url| {
            validate_server_url(url).map(Self::Server)
        })
    }

    /// Extra `restore` arguments needed to reach this backend.
    #[must_use]
    pub fn restore_args(&self) -> String {
        match self {
            Self::Gist => String::new(),
            Self::Server(url) => format!(" --server {url}"),
        }
    }

    /// Instantiate the backend.
    #[must_use]
    pub fn open<'a>(
        &self,
        settings: &Settings,
        executor: &'a dyn Executor,
    ) -> Box<dyn Storage + 'a> {
        match self {
            Self::Gist => Box::new(gist::GistStorage::new(executor, settings.gist_list_limit)),
            Self::Server(url) => Box::new(server::ServerStorage::new(url)),
        }
    }
}

/// Check that `raw` is an `http://` or `https://` URL with a host and no
/// whitespace, and strip any trailing `/`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming the rejected URL.
pub fn validate_server_url(raw: &str) -> Result<String, Error> {
    let url = raw.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    let valid = rest.is_some_and(|r| {
        r.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
            && !r.chars().any(|c| c.is_whitespace() || c.is_control())
    });
    if !valid {
        return Err(Error::InvalidInput(format!(
            "invalid server URL '{url}': expected http:// or https:// followed by a host"
        )));
    }
    Ok(url.trim_end_matches('/').to_string())
}
