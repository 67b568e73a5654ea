#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Installed-file classification for pkgmend
//!
//! [`FileClassifier`] places every path the build reports as unpackaged into
//! one subpackage of the manifest. Before the ordered rules are consulted a
//! path is checked, in this order, against the configured exclusions, the
//! locale catalog layout, the configured setuid list and the systemd autostart
//! layout. Paths no rule matches stay in the main package.
//!
//! The reverse direction removes paths: missing files are blacklisted with
//! [`FileClassifier::remove_missing`] and directory entries are pruned against
//! the live build root with [`FileClassifier::prune_directories`].

mod glob;
mod rules;

pub use glob::{Glob, MAX_SEGMENT_LEN};
pub use rules::{ClassificationRule, ClassificationRules, PathPattern};

use pkgmend_config::Config;
use pkgmend_errors::Error;
use pkgmend_manifest::{FileEntry, Manifest};
use pkgmend_types::{FileAttr, FixAction, PackageKey};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static LOCALE_CATALOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/usr/share/locale/[^/]+/LC_MESSAGES/([^/]+)\.mo$").expect("constant regex")
});

static AUTOSTART_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/usr/lib/systemd/(?:system|user)/[^/]+\.wants/").expect("constant regex")
});

/// Subpackage receiving autostart unit links
pub const AUTOSTART_PACKAGE: &str = "autostart";

/// Where a single path goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Configured exclusion from the main package
    Exclude,
    /// Message catalog of a gettext domain
    Locale { domain: String },
    /// Configured setuid binary, kept in the main package
    Setuid,
    /// Unit link packaged in the autostart subpackage and excluded from main
    Autostart,
    /// Ordinary file; `path` is what gets recorded
    Package { package: PackageKey, path: String },
}

/// Assigns reported paths to subpackages
#[derive(Debug, Clone)]
pub struct FileClassifier {
    rules: ClassificationRules,
    setuid: BTreeSet<String>,
    excludes: BTreeSet<String>,
}

impl FileClassifier {
    #[must_use]
    pub fn new(rules: ClassificationRules) -> Self {
        Self {
            rules,
            setuid: BTreeSet::new(),
            excludes: BTreeSet::new(),
        }
    }

    /// Classifier over the built-in rule list
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in rules fail to compile.
    pub fn builtin() -> Result<Self, Error> {
        Ok(Self::new(ClassificationRules::builtin()?))
    }

    /// Classifier configured from `[classify]`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured rule file cannot be loaded.
    pub async fn from_config(config: &Config) -> Result<Self, Error> {
        let rules = match &config.classify.rule_file {
            Some(path) => ClassificationRules::load(path).await?,
            None => ClassificationRules::builtin()?,
        };
        Ok(Self::new(rules)
            .with_setuid(config.classify.setuid.iter().cloned())
            .with_excludes(config.classify.excludes.iter().cloned()))
    }

    #[must_use]
    pub fn with_setuid<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.setuid.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_excludes<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    /// Placement of `path`, independent of any manifest state
    #[must_use]
    pub fn classify_path(&self, path: &str) -> Placement {
        if self.excludes.contains(path) {
            return Placement::Exclude;
        }
        if let Some(caps) = LOCALE_CATALOG.captures(path) {
            return Placement::Locale {
                domain: caps[1].to_string(),
            };
        }
        if self.setuid.contains(path) {
            return Placement::Setuid;
        }
        if AUTOSTART_UNIT.is_match(path) {
            return Placement::Autostart;
        }
        match self.rules.first_match(path) {
            Some(rule) => Placement::Package {
                package: rule.package.clone(),
                path: rule.recorded_path(path).to_string(),
            },
            None => Placement::Package {
                package: PackageKey::Main,
                path: path.to_string(),
            },
        }
    }

    /// Place every reported path, returning the changes made.
    ///
    /// Blacklisted and already assigned paths are left alone, so classifying
    /// the same report twice changes nothing the second time.
    pub fn classify<'p, I>(&self, paths: I, manifest: &mut Manifest) -> Vec<FixAction>
    where
        I: IntoIterator<Item = &'p str>,
    {
        let mut fixes = Vec::new();
        for path in paths {
            if manifest.is_file_blacklisted(path) || manifest.file_owner(path).is_some() {
                continue;
            }
            let placement = self.classify_path(path);
            debug!(path, ?placement, "classified path");
            match placement {
                Placement::Exclude => {
                    if manifest.add_exclude(path) {
                        fixes.push(FixAction::ExcludeFile {
                            path: path.to_string(),
                        });
                    }
                }
                Placement::Locale { domain } => {
                    if manifest.add_locale(domain.clone()) {
                        fixes.push(FixAction::AddLocale { domain });
                    }
                }
                Placement::Setuid => {
                    let entry = FileEntry::with_attr(path, FileAttr::setuid_root());
                    if manifest.assign_file(entry, PackageKey::Main) {
                        fixes.push(FixAction::AssignFile {
                            path: path.to_string(),
                            package: PackageKey::Main,
                        });
                    }
                }
                Placement::Autostart => {
                    let package = PackageKey::sub(AUTOSTART_PACKAGE);
                    if manifest.assign_file(FileEntry::new(path), package.clone()) {
                        fixes.push(FixAction::AssignFile {
                            path: path.to_string(),
                            package,
                        });
                    }
                    if manifest.add_exclude(path) {
                        fixes.push(FixAction::ExcludeFile {
                            path: path.to_string(),
                        });
                    }
                }
                Placement::Package { package, path } => {
                    if manifest.file_owner(&path).is_none()
                        && manifest.assign_file(FileEntry::new(path.clone()), package.clone())
                    {
                        fixes.push(FixAction::AssignFile { path, package });
                    }
                }
            }
        }
        record(manifest, &fixes);
        if !fixes.is_empty() {
            info!(changes = fixes.len(), "classified unpackaged files");
        }
        fixes
    }

    /// Blacklist paths the packaging step could not find
    pub fn remove_missing<'p, I>(&self, paths: I, manifest: &mut Manifest) -> Vec<FixAction>
    where
        I: IntoIterator<Item = &'p str>,
    {
        let fixes: Vec<FixAction> = paths
            .into_iter()
            .filter(|path| manifest.blacklist_file(path))
            .map(|path| FixAction::RemoveFile {
                path: path.to_string(),
            })
            .collect();
        record(manifest, &fixes);
        fixes
    }

    /// Drop file entries that are directories under `build_root`.
    ///
    /// Wildcard entries and paths absent from the build root are skipped.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for any failure other than a missing path.
    pub async fn prune_directories(
        &self,
        build_root: &Path,
        manifest: &mut Manifest,
    ) -> Result<Vec<FixAction>, Error> {
        let candidates: Vec<String> = manifest
            .file_entries()
            .map(|(_, entry)| entry.path.clone())
            .filter(|path| !path.contains('*'))
            .collect();

        let mut fixes = Vec::new();
        for path in candidates {
            let on_disk = build_root.join(path.trim_start_matches('/'));
            let metadata = match tokio::fs::symlink_metadata(&on_disk).await {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(Error::io_with_path(&err, &on_disk)),
            };
            if metadata.is_dir() && manifest.blacklist_file(&path) {
                debug!(path, "pruned directory entry");
                fixes.push(FixAction::PruneDirectory { path });
            }
        }
        record(manifest, &fixes);
        Ok(fixes)
    }
}

fn record(manifest: &mut Manifest, fixes: &[FixAction]) {
    for fix in fixes {
        manifest.record_fix(fix);
    }
}
