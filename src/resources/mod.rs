//! Idempotent local file changes (check + apply pattern).
pub mod helpers;
pub mod shell_config;

use std::path::PathBuf;

use crate::error::FilesystemError;

/// State of a resource relative to what it should become.
///
/// # Examples
///
/// ```
/// use tuxsync::resources::ResourceState;
///
/// let wrong = ResourceState::Incorrect { current: "differs".into() };
/// assert_ne!(wrong, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing exists at the target.
    Missing,
    /// The target already has the desired content.
    Correct,
    /// The target exists with other content.
    Incorrect {
        /// Short description of what is there.
        current: String,
    },
    /// The target cannot be changed (e.g. it is a directory).
    Invalid {
        /// Why it cannot be applied.
        reason: String,
    },
}

/// Result of applying a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The target was written. `backup` names where the previous content
    /// was preserved, if there was any.
    Applied {
        /// Copy of the previous content.
        backup: Option<PathBuf>,
    },
    /// The target already had the desired content.
    AlreadyCorrect,
}

/// A local file change that can be inspected and applied.
pub trait Resource {
    /// Human-readable description.
    fn description(&self) -> String;

    /// Inspect the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the target exists but cannot be read.
    fn current_state(&self) -> Result<ResourceState, FilesystemError>;

    /// Bring the target to the desired state. Existing content is preserved
    /// before anything is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup or the write fails. The original file
    /// is left in place or at its backup path.
    fn apply(&self) -> Result<ResourceChange, FilesystemError>;

    /// Whether [`apply`](Self::apply) would change anything.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool, FilesystemError> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}
