#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package manifest handling for pkgmend
//!
//! The manifest is the single mutable document of a repair session. The log
//! analyzer and the file classifier change it; the orchestrator persists it
//! before every build so the build driver sees the latest requirements,
//! flags, phases and file lists.
//!
//! Every mutating method reports whether the manifest actually changed.
//! Re-applying a fix that is already present returns `false`, which is what
//! lets the orchestrator detect a fixed point.

mod files;
mod flags;
mod store;

pub use files::FileEntry;
pub use flags::render_flag;
pub use store::{ManifestStore, MemoryManifestStore, TomlManifestStore};

use pkgmend_errors::{Error, ManifestError};
use pkgmend_types::{BuildSystemId, Dependency, FixAction, FlagValue, PackageKey, Phase};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Package manifest (manifest.toml contents)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_system: Option<BuildSystemId>,

    /// Attempts so far
    #[serde(default)]
    pub round: u32,
    /// Requirement, flag and patch fixes applied this round
    #[serde(default)]
    pub must_restart: u32,
    /// File classification changes this round
    #[serde(default)]
    pub file_restart: u32,

    #[serde(default)]
    pub build_requires: BTreeSet<Dependency>,
    /// Identifiers that may never enter `build_requires` or `requires`
    #[serde(default)]
    pub banned: BTreeSet<Dependency>,
    #[serde(default)]
    pub requires: BTreeMap<PackageKey, BTreeSet<Dependency>>,
    #[serde(default)]
    pub provides: BTreeMap<PackageKey, BTreeSet<Dependency>>,

    #[serde(default)]
    pub files: BTreeMap<PackageKey, BTreeSet<FileEntry>>,
    /// Paths excluded from the main package
    #[serde(default)]
    pub excludes: BTreeSet<String>,
    /// Locale domains shipped as `.mo` catalogs
    #[serde(default)]
    pub locales: BTreeSet<String>,
    /// Paths that must never be packaged again
    #[serde(default)]
    pub file_blacklist: BTreeSet<String>,

    #[serde(default)]
    pub flags: BTreeMap<BuildSystemId, BTreeMap<String, FlagValue>>,
    #[serde(default)]
    pub phases: BTreeMap<Phase, String>,
    /// Backport patches applied in prep, in order
    #[serde(default)]
    pub patches: Vec<String>,

    #[serde(default)]
    pub java: JavaAdjustments,
}

/// Maven-side removals. These are the only way a requirement ever leaves
/// `build_requires`, and each one is recorded here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaAdjustments {
    #[serde(default)]
    pub removed_plugins: BTreeSet<String>,
    #[serde(default)]
    pub disabled_modules: BTreeSet<String>,
    #[serde(default)]
    pub removed_deps: BTreeSet<String>,
    #[serde(default)]
    pub removed_requires: BTreeSet<Dependency>,
}

impl Manifest {
    /// Create a new manifest
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Start the next round: bump the counter and zero the progress counts
    pub fn begin_round(&mut self) -> u32 {
        self.round += 1;
        self.must_restart = 0;
        self.file_restart = 0;
        self.round
    }

    /// Count an applied fix toward this round's progress
    pub fn record_fix(&mut self, action: &FixAction) {
        if action.is_file_action() {
            self.file_restart += 1;
        } else {
            self.must_restart += 1;
        }
    }

    #[must_use]
    pub fn progress(&self) -> u32 {
        self.must_restart + self.file_restart
    }

    /// No corrective action changed the manifest this round
    #[must_use]
    pub fn is_fixed_point(&self) -> bool {
        self.must_restart == 0 && self.file_restart == 0
    }

    #[must_use]
    pub fn is_banned(&self, dep: &Dependency) -> bool {
        self.banned.contains(dep)
    }

    /// Ban a dependency, dropping it from every requirement set
    pub fn ban(&mut self, dep: Dependency) -> bool {
        self.build_requires.remove(&dep);
        for set in self.requires.values_mut() {
            set.remove(&dep);
        }
        self.banned.insert(dep)
    }

    /// Add a build requirement unless it is banned or already present
    pub fn add_build_require(&mut self, dep: Dependency) -> bool {
        if dep.is_empty() || self.is_banned(&dep) {
            return false;
        }
        self.build_requires.insert(dep)
    }

    /// Remove a build requirement on behalf of a Maven correction.
    ///
    /// The removal is recorded in `java.removed_requires`.
    pub fn remove_build_require(&mut self, dep: &Dependency) -> bool {
        if self.build_requires.remove(dep) {
            self.java.removed_requires.insert(dep.clone());
            true
        } else {
            false
        }
    }

    pub fn add_requires(&mut self, dep: Dependency, package: PackageKey) -> bool {
        if dep.is_empty() || self.is_banned(&dep) {
            return false;
        }
        self.requires.entry(package).or_default().insert(dep)
    }

    pub fn add_provides(&mut self, dep: Dependency, package: PackageKey) -> bool {
        if dep.is_empty() || self.is_banned(&dep) {
            return false;
        }
        self.provides.entry(package).or_default().insert(dep)
    }

    /// Set a build-tool flag; returns false if it already had this value
    pub fn set_flag(&mut self, tool: BuildSystemId, name: impl Into<String>, value: FlagValue) -> bool {
        let slot = self.flags.entry(tool).or_default();
        let name = name.into();
        if slot.get(&name) == Some(&value) {
            return false;
        }
        slot.insert(name, value);
        true
    }

    /// Rendered command-line arguments for one tool's flags
    #[must_use]
    pub fn flag_arguments(&self, tool: BuildSystemId) -> Vec<String> {
        self.flags
            .get(&tool)
            .map(|flags| {
                flags
                    .iter()
                    .flat_map(|(name, value)| render_flag(tool, name, value))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_phase(&mut self, phase: Phase, script: impl Into<String>) {
        self.phases.insert(phase, script.into());
    }

    /// Set a phase only when nothing has set it yet
    pub fn seed_phase(&mut self, phase: Phase, script: impl Into<String>) -> bool {
        if self.phases.contains_key(&phase) {
            return false;
        }
        self.phases.insert(phase, script.into());
        true
    }

    /// Drop a backport patch that failed to apply
    pub fn remove_patch(&mut self, name: &str) -> bool {
        let before = self.patches.len();
        self.patches.retain(|patch| patch != name);
        self.patches.len() != before
    }

    pub fn remove_java_plugin(&mut self, plugin: impl Into<String>) -> bool {
        self.java.removed_plugins.insert(plugin.into())
    }

    pub fn disable_java_module(&mut self, module: impl Into<String>) -> bool {
        self.java.disabled_modules.insert(module.into())
    }

    pub fn remove_java_dependency(&mut self, artifact: impl Into<String>) -> bool {
        self.java.removed_deps.insert(artifact.into())
    }

    /// Load manifest from TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or contains invalid manifest data.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| {
            ManifestError::InvalidManifest {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Serialize to TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized to TOML format.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| {
            ManifestError::InvalidManifest {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load manifest from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is malformed.
    pub async fn from_file(path: &Path) -> Result<Self, Error> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ManifestError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
        Self::from_toml(&content)
    }

    /// Write manifest to file
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized or if the file cannot be written.
    pub async fn write_to_file(&self, path: &Path) -> Result<(), Error> {
        let content = self.to_toml()?;
        tokio::fs::write(path, content).await.map_err(|e| {
            ManifestError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Builder for seeding a manifest before the first round
pub struct ManifestBuilder {
    manifest: Manifest,
}

impl ManifestBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            manifest: Manifest::new(name, version),
        }
    }

    #[must_use]
    pub fn build_system(mut self, id: BuildSystemId) -> Self {
        self.manifest.build_system = Some(id);
        self
    }

    #[must_use]
    pub fn build_requires<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = Dependency>,
    {
        for dep in deps {
            self.manifest.add_build_require(dep);
        }
        self
    }

    /// Banned identifiers are applied before any requirement can land
    #[must_use]
    pub fn banned<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = Dependency>,
    {
        for dep in deps {
            self.manifest.ban(dep);
        }
        self
    }

    #[must_use]
    pub fn patches<I, S>(mut self, patches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest.patches.extend(patches.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn phase(mut self, phase: Phase, script: impl Into<String>) -> Self {
        self.manifest.set_phase(phase, script);
        self
    }

    /// Finish the manifest
    ///
    /// # Errors
    ///
    /// Returns an error if the package name is empty.
    pub fn build(self) -> Result<Manifest, Error> {
        if self.manifest.name.trim().is_empty() {
            return Err(ManifestError::InvalidManifest {
                message: "package name cannot be empty".to_string(),
            }
            .into());
        }
        Ok(self.manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banned_dependency_is_never_added() {
        let mut manifest = Manifest::new("foo", "1.0");
        manifest.ban(Dependency::bare("llvm-devel"));
        assert!(!manifest.add_build_require(Dependency::bare("llvm-devel")));
        assert!(!manifest.add_requires(Dependency::bare("llvm-devel"), PackageKey::Main));
        assert!(manifest.build_requires.is_empty());
    }

    #[test]
    fn second_add_reports_no_change() {
        let mut manifest = Manifest::new("foo", "1.0");
        assert!(manifest.add_build_require(Dependency::pkgconfig("zlib")));
        assert!(!manifest.add_build_require(Dependency::pkgconfig("zlib")));
        assert!(manifest.add_build_require(Dependency::pypi("zlib")));
        assert_eq!(manifest.build_requires.len(), 2);
    }

    #[test]
    fn round_counters_reset() {
        let mut manifest = Manifest::new("foo", "1.0");
        manifest.begin_round();
        manifest.record_fix(&FixAction::RemovePatch {
            patch: "a.patch".into(),
        });
        manifest.record_fix(&FixAction::RemoveFile {
            path: "/usr/bin/x".into(),
        });
        assert_eq!((manifest.must_restart, manifest.file_restart), (1, 1));
        assert_eq!(manifest.begin_round(), 2);
        assert!(manifest.is_fixed_point());
    }

    #[test]
    fn java_removal_is_recorded() {
        let mut manifest = Manifest::new("foo", "1.0");
        let dep = Dependency::maven("org.codehaus.mojo:exec-maven-plugin");
        manifest.add_build_require(dep.clone());
        assert!(manifest.remove_build_require(&dep));
        assert!(!manifest.build_requires.contains(&dep));
        assert!(manifest.java.removed_requires.contains(&dep));
        assert!(!manifest.remove_build_require(&dep));
    }

    #[test]
    fn set_flag_is_idempotent() {
        let mut manifest = Manifest::new("foo", "1.0");
        assert!(manifest.set_flag(BuildSystemId::CMake, "BUILD_TESTING", false.into()));
        assert!(!manifest.set_flag(BuildSystemId::CMake, "BUILD_TESTING", false.into()));
        assert_eq!(
            manifest.flag_arguments(BuildSystemId::CMake),
            vec!["-DBUILD_TESTING=OFF".to_string()]
        );
    }

    #[test]
    fn patch_removal() {
        let mut manifest = ManifestBuilder::new("foo", "1.0")
            .patches(["backport-1.patch", "backport-2.patch"])
            .build()
            .unwrap();
        assert!(manifest.remove_patch("backport-1.patch"));
        assert!(!manifest.remove_patch("backport-1.patch"));
        assert_eq!(manifest.patches, vec!["backport-2.patch".to_string()]);
    }
}
