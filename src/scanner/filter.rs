//! Glob-based removal of library and noise packages from scan results.
use glob::{Pattern, PatternError};

/// Patterns excluded unless the configuration replaces them.
///
/// Matches shared libraries, headers, split data packages, kernels and
/// firmware on apt, dnf and pacman systems.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "lib*",
    "*-dev",
    "*-devel",
    "*-libs",
    "*-common",
    "*-data",
    "*-doc",
    "*-headers",
    "*-firmware",
    "firmware-*",
    "linux-image-*",
    "linux-headers-*",
    "linux-modules-*",
    "linux-firmware",
    "kernel-*",
    "gir1.2-*",
    "fonts-*",
    "python3-*",
    "perl-*",
];

/// Compiled set of exclusion globs.
///
/// # Examples
///
/// ```
/// use tuxsync::scanner::filter::ExclusionFilter;
///
/// let filter = ExclusionFilter::new(&["lib*", "*-dev"]).unwrap();
/// assert!(filter.is_excluded("libssl3"));
/// assert!(filter.is_excluded("zlib1g-dev"));
/// assert!(!filter.is_excluded("firefox"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    patterns: Vec<Pattern>,
}

impl ExclusionFilter {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that is not a valid glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether `package` matches any exclusion pattern.
    #[must_use]
    pub fn is_excluded(&self, package: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(package))
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the filter excludes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
