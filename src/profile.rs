//! The backup profile and its versioned YAML document.
//!
//! A [`Profile`] is built once per backup and never mutated afterwards.
//! [`serialize`] turns it into the two storage slots; [`deserialize`] reads
//! them back, rejecting unknown schema versions before anything else.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::platform::OsRelease;
use crate::scanner::PackageManager;
use crate::storage::Payload;

/// Schema version written by this build.
pub const SCHEMA_VERSION: &str = "1.0";

/// Schema versions this build can read.
pub const SUPPORTED_VERSIONS: &[&str] = &[SCHEMA_VERSION];

/// Snapshot of one machine's package selection and shell config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    schema_version: String,
    created_at: DateTime<Utc>,
    distro_name: String,
    distro_version: String,
    package_manager: PackageManager,
    packages: Vec<String>,
    shell_config: Option<String>,
}

impl Profile {
    /// Build a profile. Duplicate package names are dropped, keeping the
    /// first occurrence.
    #[must_use]
    pub fn new(
        created_at: DateTime<Utc>,
        os: &OsRelease,
        package_manager: PackageManager,
        packages: Vec<String>,
        shell_config: Option<String>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at,
            distro_name: os.name.clone(),
            distro_version: os.version.clone(),
            package_manager,
            packages: dedup_preserving_order(packages),
            shell_config,
        }
    }

    /// Schema version of the document this profile came from.
    #[must_use]
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// When the backup was taken.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Source distribution name.
    #[must_use]
    pub fn distro_name(&self) -> &str {
        &self.distro_name
    }

    /// Source distribution version.
    #[must_use]
    pub fn distro_version(&self) -> &str {
        &self.distro_version
    }

    /// Package manager of the source machine.
    #[must_use]
    pub const fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    /// Package names, distinct, in recorded order.
    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Number of packages. Always equal to `packages().len()`.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Whether a shell config accompanies the profile.
    #[must_use]
    pub const fn has_shell_config(&self) -> bool {
        self.shell_config.is_some()
    }

    /// The saved shell config text.
    #[must_use]
    pub fn shell_config(&self) -> Option<&str> {
        self.shell_config.as_deref()
    }

    /// Human-readable description lines shown before a restore.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        let source = if self.distro_version.is_empty() {
            self.distro_name.clone()
        } else {
            format!("{} {}", self.distro_name, self.distro_version)
        };
        vec![
            format!("Created: {}", self.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("Source: {source}"),
            format!("Package manager: {}", self.package_manager),
            format!("Packages: {}", self.package_count()),
            format!(
                "Shell config: {}",
                if self.has_shell_config() { "yes" } else { "no" }
            ),
        ]
    }
}

fn dedup_preserving_order(packages: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    packages
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// On-disk field layout. Field order here is the document's key order.
#[derive(Debug, Serialize, Deserialize)]
struct ProfileDocument {
    version: String,
    created_at: DateTime<Utc>,
    distro: String,
    distro_version: String,
    package_manager: PackageManager,
    #[serde(default)]
    package_count: usize,
    packages: Vec<String>,
    has_bashrc: bool,
}

/// Encode `profile` into storage slots.
///
/// # Errors
///
/// Returns [`ProfileError::Encode`] if YAML serialization fails.
pub fn serialize(profile: &Profile) -> Result<Payload, ProfileError> {
    let document = ProfileDocument {
        version: profile.schema_version.clone(),
        created_at: profile.created_at,
        distro: profile.distro_name.clone(),
        distro_version: profile.distro_version.clone(),
        package_manager: profile.package_manager,
        package_count: profile.package_count(),
        packages: profile.packages.clone(),
        has_bashrc: profile.has_shell_config(),
    };
    let metadata =
        serde_yaml::to_string(&document).map_err(|e| ProfileError::Encode(e.to_string()))?;
    Ok(Payload {
        metadata,
        shell_config: profile.shell_config.clone(),
    })
}

/// Decode storage slots into a profile.
///
/// The stored `package_count` is ignored in favour of the package list, and
/// a shell config slot is ignored when the document says none was saved.
///
/// # Errors
///
/// - [`ProfileError::UnsupportedVersion`] for a version this build cannot
///   read, checked before any other field.
/// - [`ProfileError::Malformed`] for invalid YAML or missing fields.
/// - [`ProfileError::MissingShellConfig`] when `has_bashrc` is true but the
///   shell config slot is empty.
pub fn deserialize(payload: &Payload) -> Result<Profile, ProfileError> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(&payload.metadata)
        .map_err(|e| ProfileError::Malformed(e.to_string()))?;

    let version = match value.get("version") {
        Some(serde_yaml::Value::String(s)) => s.clone(),
        Some(serde_yaml::Value::Number(n)) => n.to_string(),
        Some(_) => return Err(ProfileError::Malformed("version must be a string".to_string())),
        None => return Err(ProfileError::Malformed("missing field `version`".to_string())),
    };
    if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
        return Err(ProfileError::UnsupportedVersion {
            found: version,
            supported: SUPPORTED_VERSIONS.join(", "),
        });
    }
    if let serde_yaml::Value::Mapping(map) = &mut value {
        map.insert("version".into(), version.into());
    }

    let document: ProfileDocument =
        serde_yaml::from_value(value).map_err(|e| ProfileError::Malformed(e.to_string()))?;

    let shell_config = match (document.has_bashrc, &payload.shell_config) {
        (true, Some(content)) => Some(content.clone()),
        (true, None) => return Err(ProfileError::MissingShellConfig),
        (false, _) => None,
    };

    Ok(Profile {
        schema_version: document.version,
        created_at: document.created_at,
        distro_name: document.distro,
        distro_version: document.distro_version,
        package_manager: document.package_manager,
        packages: dedup_preserving_order(document.packages),
        shell_config,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ubuntu() -> OsRelease {
        OsRelease {
            name: "Ubuntu".to_string(),
            version: "24.04".to_string(),
        }
    }

    fn sample(shell: Option<&str>) -> Profile {
        Profile::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
            &ubuntu(),
            PackageManager::Apt,
            vec!["git".to_string(), "vim".to_string(), "htop".to_string()],
            shell.map(String::from),
        )
    }

    #[test]
    fn round_trip_with_shell_config() {
        let profile = sample(Some("export EDITOR=vim\nalias ll='ls -l'\n"));
        let payload = serialize(&profile).unwrap();
        assert_eq!(deserialize(&payload).unwrap(), profile);
    }

    #[test]
    fn round_trip_without_shell_config() {
        let profile = sample(None);
        let payload = serialize(&profile).unwrap();
        assert!(payload.shell_config.is_none());
        assert_eq!(deserialize(&payload).unwrap(), profile);
    }

    #[test]
    fn round_trip_preserves_subsecond_timestamp() {
        let created = Utc.timestamp_opt(1_714_559_400, 123_456_789).unwrap();
        let profile = Profile::new(created, &ubuntu(), PackageManager::Dnf, vec![], None);
        let back = deserialize(&serialize(&profile).unwrap()).unwrap();
        assert_eq!(back.created_at(), created);
    }

    #[test]
    fn constructor_deduplicates_keeping_first() {
        let profile = Profile::new(
            Utc::now(),
            &ubuntu(),
            PackageManager::Pacman,
            vec!["b".into(), "a".into(), "b".into(), "c".into(), "a".into()],
            None,
        );
        assert_eq!(profile.packages(), ["b", "a", "c"]);
        assert_eq!(profile.package_count(), 3);
    }

    #[test]
    fn document_has_stable_fields() {
        let payload = serialize(&sample(Some("x"))).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&payload.metadata).unwrap();
        assert_eq!(value["version"].as_str(), Some("1.0"));
        assert_eq!(value["distro"].as_str(), Some("Ubuntu"));
        assert_eq!(value["distro_version"].as_str(), Some("24.04"));
        assert_eq!(value["package_manager"].as_str(), Some("apt"));
        assert_eq!(value["package_count"].as_u64(), Some(3));
        assert_eq!(value["has_bashrc"].as_bool(), Some(true));
        assert_eq!(value["packages"][0].as_str(), Some("git"));
        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(serde_yaml::Value::as_str)
            .collect();
        assert_eq!(
            keys,
            [
                "version",
                "created_at",
                "distro",
                "distro_version",
                "package_manager",
                "package_count",
                "packages",
                "has_bashrc"
            ]
        );
    }

    #[test]
    fn unknown_version_is_rejected_distinctly() {
        let metadata = "version: \"99.0\"\ncreated_at: 2024-05-01T10:30:00Z\n";
        let err = deserialize(&Payload {
            metadata: metadata.to_string(),
            shell_config: None,
        })
        .unwrap_err();
        assert!(
            matches!(err, ProfileError::UnsupportedVersion { ref found, .. } if found == "99.0"),
            "{err}"
        );
    }

    #[test]
    fn numeric_version_is_accepted() {
        let metadata = "version: 1.0\ncreated_at: 2024-05-01T10:30:00Z\ndistro: Arch Linux\n\
                        distro_version: ''\npackage_manager: pacman\npackages: [git]\nhas_bashrc: false\n";
        let profile = deserialize(&Payload {
            metadata: metadata.to_string(),
            shell_config: None,
        })
        .unwrap();
        assert_eq!(profile.schema_version(), "1.0");
        assert_eq!(profile.packages(), ["git"]);
    }

    #[test]
    fn malformed_documents() {
        for metadata in [
            "not: [valid",
            "distro: Ubuntu\n",
            "version: '1.0'\ndistro: Ubuntu\n",
            "version: '1.0'\ncreated_at: yesterday\ndistro: x\ndistro_version: ''\npackage_manager: apt\npackages: []\nhas_bashrc: false\n",
            "version: '1.0'\ncreated_at: 2024-05-01T10:30:00Z\ndistro: x\ndistro_version: ''\npackage_manager: zypper\npackages: []\nhas_bashrc: false\n",
        ] {
            let err = deserialize(&Payload {
                metadata: metadata.to_string(),
                shell_config: None,
            })
            .unwrap_err();
            assert!(matches!(err, ProfileError::Malformed(_)), "{metadata}: {err}");
        }
    }

    #[test]
    fn declared_but_missing_shell_config_is_corruption() {
        let mut payload = serialize(&sample(Some("x"))).unwrap();
        payload.shell_config = None;
        assert!(matches!(
            deserialize(&payload),
            Err(ProfileError::MissingShellConfig)
        ));
    }

    #[test]
    fn undeclared_shell_config_payload_is_ignored() {
        let mut payload = serialize(&sample(None)).unwrap();
        payload.shell_config = Some("stray".to_string());
        assert!(!deserialize(&payload).unwrap().has_shell_config());
    }

    #[test]
    fn stored_count_is_not_trusted() {
        let payload = serialize(&sample(None)).unwrap();
        let edited = payload.metadata.replace("package_count: 3", "package_count: 99");
        let profile = deserialize(&Payload {
            metadata: edited,
            shell_config: None,
        })
        .unwrap();
        assert_eq!(profile.package_count(), 3);
    }

    #[test]
    fn describe_lists_backup_info() {
        let lines = sample(Some("x")).describe();
        assert_eq!(lines[0], "Created: 2024-05-01 10:30:00 UTC");
        assert_eq!(lines[1], "Source: Ubuntu 24.04");
        assert_eq!(lines[2], "Package manager: apt");
        assert_eq!(lines[3], "Packages: 3");
        assert_eq!(lines[4], "Shell config: yes");
    }
}
