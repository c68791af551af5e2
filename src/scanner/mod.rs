//! Package manager detection and explicit-package listing.
//!
//! Supported managers live in one ordered table. Detection looks up each row's
//! program on `PATH`; the first hit wins, so a host with both `apt` and
//! `dnf` is treated as apt.
pub mod filter;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::exec::Executor;
use filter::ExclusionFilter;

/// Package manager family recorded in a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// Debian, Ubuntu and derivatives.
    Apt,
    /// Fedora, RHEL and derivatives.
    Dnf,
    /// Arch Linux and derivatives.
    Pacman,
    /// None of the above could be detected.
    Unknown,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One row of the manager table.
#[derive(Debug)]
struct ManagerSpec {
    manager: PackageManager,
    /// Program whose presence identifies the manager.
    marker: &'static str,
    /// Command listing explicitly installed packages.
    list: (&'static str, &'static [&'static str]),
    /// Native install command, shown as a hint.
    install: &'static str,
    /// Extracts a package name from one output line.
    parse: fn(&str) -> Option<String>,
}

static MANAGERS: [ManagerSpec; 3] = [
    ManagerSpec {
        manager: PackageManager::Apt,
        marker: "apt",
        list: ("apt-mark", &["showmanual"]),
        install: "sudo apt-get install -y",
        parse: parse_apt_line,
    },
    ManagerSpec {
        manager: PackageManager::Dnf,
        marker: "dnf",
        list: ("dnf", &["repoquery", "--userinstalled"]),
        install: "sudo dnf install -y",
        parse: parse_nevra_line,
    },
    ManagerSpec {
        manager: PackageManager::Pacman,
        marker: "pacman",
        list: ("pacman", &["-Qqe"]),
        install: "sudo pacman -S --needed",
        parse: parse_plain_line,
    },
];

/// Outcome of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// The detected manager.
    pub package_manager: PackageManager,
    /// Filtered, deduplicated, sorted package names.
    pub packages: Vec<String>,
    /// How many listed names the exclusion filter removed.
    pub excluded: usize,
}

/// Detect the local package manager, or [`PackageManager::Unknown`].
#[must_use]
pub fn detect(executor: &dyn Executor) -> PackageManager {
    MANAGERS
        .iter()
        .find(|spec| executor.which(spec.marker))
        .map_or(PackageManager::Unknown, |spec| spec.manager)
}

/// Native install command for `manager`, if it is a known one.
#[must_use]
pub fn install_hint(manager: PackageManager) -> Option<&'static str> {
    MANAGERS
        .iter()
        .find(|spec| spec.manager == manager)
        .map(|spec| spec.install)
}

/// Detect the package manager and list the user's explicitly installed
/// packages, minus anything `filter` excludes.
///
/// # Errors
///
/// - [`ScanError::UnknownPackageManager`] when no supported manager is found.
/// - [`ScanError::QueryFailed`] when the listing command fails; a failed
///   query never yields an empty list.
pub fn scan(executor: &dyn Executor, filter: &ExclusionFilter) -> Result<ScanResult, ScanError> {
    let spec = MANAGERS
        .iter()
        .find(|spec| executor.which(spec.marker))
        .ok_or(ScanError::UnknownPackageManager)?;

    let (program, args) = spec.list;
    let output = executor
        .run(program, args)
        .map_err(|e| ScanError::QueryFailed {
            manager: spec.manager,
            reason: format!("{e:#}"),
        })?;

    let listed: BTreeSet<String> = output.stdout.lines().filter_map(spec.parse).collect();
    let total = listed.len();
    let packages: Vec<String> = listed
        .into_iter()
        .filter(|name| !filter.is_excluded(name))
        .collect();

    Ok(ScanResult {
        package_manager: spec.manager,
        excluded: total - packages.len(),
        packages,
    })
}

/// Plain `name` per line.
fn parse_plain_line(line: &str) -> Option<String> {
    let name = line.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        None
    } else {
        Some(name.to_string())
    }
}

/// `name` or `name:arch` per line.
fn parse_apt_line(line: &str) -> Option<String> {
    let name = parse_plain_line(line)?;
    match name.split_once(':') {
        Some((base, _arch)) if !base.is_empty() => Some(base.to_string()),
        Some(_) => None,
        None => Some(name),
    }
}

/// `name-[epoch:]version-release.arch` per line.
fn parse_nevra_line(line: &str) -> Option<String> {
    let nevra = parse_plain_line(line)?;
    let mut parts = nevra.rsplitn(3, '-');
    let _release_arch = parts.next()?;
    let _version = parts.next()?;
    parts
        .next()
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::exec::test_helpers::{MockExecutor, Response};

    fn defaults() -> ExclusionFilter {
        ExclusionFilter::new(filter::DEFAULT_EXCLUSIONS).unwrap()
    }

    #[test]
    fn detection_follows_table_order() {
        let both = MockExecutor::default().with_programs(&["dnf", "apt"]);
        assert_eq!(detect(&both), PackageManager::Apt);

        let arch = MockExecutor::default().with_programs(&["pacman"]);
        assert_eq!(detect(&arch), PackageManager::Pacman);

        let none = MockExecutor::default();
        assert_eq!(detect(&none), PackageManager::Unknown);
    }

    #[test]
    fn apt_scan_is_filtered_deduplicated_and_sorted() {
        let executor = MockExecutor::with_responses(vec![Response::ok(
            "vim\ngit\nlibssl3\ngit\nhtop:amd64\npython3-yaml\nfirefox\n\n",
        )])
        .with_programs(&["apt"]);

        let result = scan(&executor, &defaults()).unwrap();

        assert_eq!(result.package_manager, PackageManager::Apt);
        assert_eq!(result.excluded, 2);
        assert_eq!(executor.calls(), vec!["apt-mark showmanual"]);
        insta::assert_snapshot!(result.packages.join("\n"), @r"
        firefox
        git
        htop
        vim
        ");
    }

    #[test]
    fn scan_is_deterministic_across_listing_order() {
        let first = MockExecutor::with_responses(vec![Response::ok("zsh\nbash\ncurl\n")])
            .with_programs(&["pacman"]);
        let second = MockExecutor::with_responses(vec![Response::ok("curl\nzsh\nbash\nzsh\n")])
            .with_programs(&["pacman"]);

        let a = scan(&first, &defaults()).unwrap();
        let b = scan(&second, &defaults()).unwrap();
        assert_eq!(a.packages, b.packages);
        assert_eq!(a.packages, vec!["bash", "curl", "zsh"]);
    }

    #[test]
    fn dnf_names_are_extracted_from_nevra() {
        let executor = MockExecutor::with_responses(vec![Response::ok(
            "git-core-0:2.43.0-1.fc39.x86_64\nneovim-0.9.5-1.fc39.x86_64\nglibc-devel-2.38-16.fc39.x86_64\n",
        )])
        .with_programs(&["dnf"]);

        let result = scan(&executor, &defaults()).unwrap();
        assert_eq!(result.package_manager, PackageManager::Dnf);
        assert_eq!(result.packages, vec!["git-core", "neovim"]);
        assert_eq!(executor.calls(), vec!["dnf repoquery --userinstalled"]);
    }

    #[test]
    fn no_manager_is_unknown_package_manager() {
        let executor = MockExecutor::default();
        let err = scan(&executor, &defaults()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownPackageManager);
        assert!(executor.calls().is_empty(), "no listing should be attempted");
    }

    #[test]
    fn failed_listing_is_scan_failure_not_empty_list() {
        let executor =
            MockExecutor::with_responses(vec![Response::fail("E: dpkg was interrupted")])
                .with_programs(&["apt"]);
        let err = scan(&executor, &defaults()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScanFailure);
        assert!(err.to_string().contains("dpkg was interrupted"), "{err}");
    }

    #[test]
    fn custom_filter_replaces_defaults() {
        let executor = MockExecutor::with_responses(vec![Response::ok("libreoffice\nsteam\n")])
            .with_programs(&["pacman"]);
        let filter = ExclusionFilter::new(&["steam"]).unwrap();
        let result = scan(&executor, &filter).unwrap();
        assert_eq!(result.packages, vec!["libreoffice"]);
    }

    #[test]
    fn line_parsers_reject_noise() {
        assert_eq!(parse_plain_line("  "), None);
        assert_eq!(
            parse_plain_line("Last metadata expiration check: 0:01:02 ago"),
            None
        );
        assert_eq!(parse_apt_line(":amd64"), None);
        assert_eq!(parse_nevra_line("single"), None);
        assert_eq!(
            parse_nevra_line("python3-dnf-4.18.0-2.fc39.noarch"),
            Some("python3-dnf".to_string())
        );
    }

    #[test]
    fn install_hints_exist_for_known_managers() {
        assert_eq!(
            install_hint(PackageManager::Pacman),
            Some("sudo pacman -S --needed")
        );
        assert_eq!(install_hint(PackageManager::Unknown), None);
    }

    #[test]
    fn display_matches_serialized_name() {
        for manager in [
            PackageManager::Apt,
            PackageManager::Dnf,
            PackageManager::Pacman,
            PackageManager::Unknown,
        ] {
            let yaml = serde_yaml::to_string(&manager).unwrap();
            assert_eq!(yaml.trim(), manager.to_string());
        }
    }
}
