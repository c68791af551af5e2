//! Host distribution identification from `os-release`.
use std::fmt;
use std::path::Path;

/// Locations searched for the os-release file, in order.
const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Distribution name and version of the running system.
///
/// Purely descriptive; recorded in backups and shown on restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    /// Human-readable distribution name (`NAME`), e.g. `Ubuntu`.
    pub name: String,
    /// Distribution version (`VERSION_ID`), e.g. `24.04`. May be empty on
    /// rolling releases.
    pub version: String,
}

impl Default for OsRelease {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            version: String::new(),
        }
    }
}

impl fmt::Display for OsRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

impl OsRelease {
    /// Detect the running distribution.
    ///
    /// Falls back to `Unknown` when no os-release file is readable.
    #[must_use]
    pub fn detect() -> Self {
        OS_RELEASE_PATHS
            .iter()
            .find_map(|p| Self::from_file(Path::new(p)))
            .unwrap_or_default()
    }

    /// Read and parse an os-release file.
    #[must_use]
    pub fn from_file(path: &Path) -> Option<Self> {
        std::fs::read_to_string(path)
            .ok()
            .map(|content| Self::parse(&content))
    }

    /// Parse os-release `KEY=value` content.
    ///
    /// `NAME` is preferred over `ID` for the name; values may be single- or
    /// double-quoted.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut name = None;
        let mut id = None;
        let mut version = None;
        for line in content.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            match key {
                "NAME" => name = Some(value),
                "ID" => id = Some(value),
                "VERSION_ID" => version = Some(value),
                _ => {}
            }
        }
        let fallback = Self::default();
        Self {
            name: name.or(id).filter(|n| !n.is_empty()).unwrap_or(fallback.name),
            version: version.unwrap_or_default(),
        }
    }
}
