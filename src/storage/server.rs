//! Backups stored on a user-operated HTTP server.
//!
//! Wire contract:
//!
//! - `POST {base}/api/backup` with `{"metadata": .., "bashrc": ..}` answers
//!   `201 {"backup_id": ..}`.
//! - `GET {base}/api/backup/{id}` answers `200 {"metadata": .., "bashrc": ..}`
//!   or `404 {"error": "Backup not found"}`.
//!
//! An empty `bashrc` string means no shell config was saved.
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BackupId, BackupSummary, Payload, Storage};
use crate::error::StorageError;

/// [`Storage`] implementation speaking the TuxSync server protocol.
pub struct ServerStorage {
    base_url: String,
    agent: ureq::Agent,
}

impl fmt::Debug for ServerStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerStorage")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    metadata: &'a str,
    bashrc: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    backup_id: String,
}

#[derive(Deserialize)]
struct BackupResponse {
    metadata: String,
    #[serde(default)]
    bashrc: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

fn transport(e: &ureq::Error) -> StorageError {
    StorageError::Transport(e.to_string())
}

/// Best human-readable message from a non-success body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().chars().take(200).collect())
}

fn status_error(status: u16, body: &str) -> StorageError {
    let message = error_message(body);
    match status {
        401 | 403 => {
            StorageError::NotAuthenticated(format!("server returned HTTP {status}: {message}"))
        }
        _ => StorageError::Transport(format!("server returned HTTP {status}: {message}")),
    }
}

impl ServerStorage {
    /// Create a client for the server at `base_url`.
    ///
    /// Non-success statuses are returned as responses so they can be mapped
    /// to [`StorageError`] variants.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn backup_url(&self, id: Option<&BackupId>) -> String {
        id.map_or_else(
            || format!("{}/api/backup", self.base_url),
            |id| format!("{}/api/backup/{id}", self.base_url),
        )
    }
}

impl Storage for ServerStorage {
    fn name(&self) -> String {
        format!("server {}", self.base_url)
    }

    fn store(&self, payload: &Payload) -> Result<BackupId, StorageError> {
        let body = serde_json::to_string(&UploadRequest {
            metadata: &payload.metadata,
            bashrc: payload.shell_config.as_deref().unwrap_or_default(),
        })
        .map_err(|e| StorageError::Transport(format!("encoding request: {e}")))?;

        let mut response = self
            .agent
            .post(&self.backup_url(None))
            .header("Content-Type", "application/json")
            .send(body.as_str())
            .map_err(|e| transport(&e))?;
        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| transport(&e))?;

        if !matches!(status, 200 | 201) {
            return Err(status_error(status, &text));
        }
        let created: UploadResponse = serde_json::from_str(&text)
            .map_err(|e| StorageError::InvalidResponse(format!("upload response: {e}")))?;
        BackupId::parse(&created.backup_id).map_err(|_| {
            StorageError::InvalidResponse(format!(
                "server issued an unusable backup ID '{}'",
                created.backup_id
            ))
        })
    }

    fn retrieve(&self, id: &BackupId) -> Result<Payload, StorageError> {
        let mut response = self
            .agent
            .get(&self.backup_url(Some(id)))
            .call()
            .map_err(|e| transport(&e))?;
        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| transport(&e))?;

        match status {
            200 => {
                let backup: BackupResponse = serde_json::from_str(&text)
                    .map_err(|e| StorageError::InvalidResponse(format!("backup response: {e}")))?;
                Ok(Payload {
                    metadata: backup.metadata,
                    shell_config: backup.bashrc.filter(|b| !b.is_empty()),
                })
            }
            404 => Err(StorageError::NotFound { id: id.to_string() }),
            _ => Err(status_error(status, &text)),
        }
    }

    fn list(&self) -> Result<Vec<BackupSummary>, StorageError> {
        Err(StorageError::Unsupported(
            "Listing backups is not supported for custom servers".to_string(),
        ))
    }
}
