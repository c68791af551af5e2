//! Command: list stored backups.
use std::io::Write as _;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, ListOpts};
use crate::error::{Error, StorageError};
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::storage::{Backend, BackupSummary, Storage};

/// Fetch the backups visible on `storage`.
///
/// # Errors
///
/// Returns [`Error::Storage`] when the backend cannot list, including
/// [`StorageError::Unsupported`] for backends without a listing operation.
pub fn list(storage: &dyn Storage, log: &Logger) -> Result<Vec<BackupSummary>, Error> {
    log.stage(&format!("Listing backups on {}", storage.name()));
    let backups = storage.list()?;
    log.debug(&format!("{} backups found", backups.len()));
    Ok(backups)
}

/// Render the listing as printed to stdout.
fn render(backups: &[BackupSummary]) -> String {
    if backups.is_empty() {
        return "No TuxSync backups found\nCreate one with: tuxsync backup\n".to_string();
    }
    let width = backups.iter().map(|b| b.id.len()).max().unwrap_or(0);
    backups
        .iter()
        .map(|b| format!("{:<width$}  {}\n", b.id, b.description))
        .collect()
}

/// Run the `list` command.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the backend fails.
/// A backend without listing support only produces a warning.
pub fn run(global: &GlobalOpts, opts: &ListOpts, log: &Logger) -> Result<()> {
    let backend = Backend::from_server_flag(opts.server.as_deref())?;
    let setup = CommandSetup::init(global, log)?;
    let executor = SystemExecutor;
    let storage = backend.open(&setup.settings, &executor);

    match list(storage.as_ref(), log) {
        Ok(backups) => {
            write!(std::io::stdout(), "{}", render(&backups))?;
            Ok(())
        }
        Err(Error::Storage(StorageError::Unsupported(reason))) => {
            log.warn(&reason);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::logging::isolated_logger;
    use crate::storage::MockStorage;

    fn summary(id: &str, description: &str) -> BackupSummary {
        BackupSummary {
            id: id.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn returns_backend_listing() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut storage = MockStorage::new();
        storage.expect_name().return_const("GitHub Gist".to_string());
        storage
            .expect_list()
            .returning(|| Ok(vec![summary("aa5a315d61ae9438b18d", "TuxSync Backup")]));
        let backups = list(&storage, &log).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].id, "aa5a315d61ae9438b18d");
    }

    #[test]
    fn unsupported_listing_keeps_its_kind() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut storage = MockStorage::new();
        storage.expect_name().return_const("server".to_string());
        storage
            .expect_list()
            .returning(|| Err(StorageError::Unsupported("no listing".to_string())));
        let err = list(&storage, &log).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Unsupported(_))));
        assert_eq!(err.kind(), ErrorKind::StorageError);
    }

    #[test]
    fn render_aligns_columns() {
        let out = render(&[
            summary("aa5a315d61ae9438b18d", "TuxSync Backup"),
            summary("b2", "TuxSync Backup (laptop)"),
        ]);
        insta::assert_snapshot!(out, @r"
        aa5a315d61ae9438b18d  TuxSync Backup
        b2                    TuxSync Backup (laptop)
        ");
    }

    #[test]
    fn render_empty_points_at_backup() {
        let out = render(&[]);
        assert!(out.starts_with("No TuxSync backups found"));
        assert!(out.contains("tuxsync backup"));
    }
}
