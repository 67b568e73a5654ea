#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build system detection for pkgmend
//!
//! The detector walks a source tree and scores every marker file it finds.
//! A marker's score is its specificity, plus a bonus when it sits in the tree
//! root, minus its depth below the root. An executable `configure` script
//! outranks a bare `Makefile` found deeper; a `configure` without an execute
//! bit scores like any generic marker.
//! Every build system that scored is kept as a candidate; the repair loop
//! tries them best-first until a builder accepts one.

mod markers;
mod seed;

pub use seed::{
    parse_cmake_packages, parse_cmake_pkgconfig, parse_configure_modules, seed_requirements,
};

use pkgmend_errors::{BuildError, Error};
use pkgmend_types::BuildSystemId;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Extra score for a marker in the tree root
pub const ROOT_BONUS: i32 = 2;

/// Default number of directory levels searched below the root
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// One admissible build system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub build_system: BuildSystemId,
    pub score: i32,
    /// Marker path relative to the source root
    pub marker: PathBuf,
    /// Directory depth of the marker, 0 for the root
    pub depth: usize,
}

/// Ordered detection result; never empty
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub root: PathBuf,
    candidates: Vec<Candidate>,
}

impl Detection {
    /// Highest-ranked candidate
    #[must_use]
    pub fn best(&self) -> &Candidate {
        &self.candidates[0]
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Build systems in try order
    pub fn build_systems(&self) -> impl Iterator<Item = BuildSystemId> + '_ {
        self.candidates.iter().map(|c| c.build_system)
    }

    #[must_use]
    pub fn contains(&self, build_system: BuildSystemId) -> bool {
        self.build_systems().any(|id| id == build_system)
    }
}

/// Source tree scanner
#[derive(Debug, Clone)]
pub struct BuildSystemDetector {
    max_depth: usize,
}

impl Default for BuildSystemDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSystemDetector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Score the markers under `root` and order the candidates
    ///
    /// # Errors
    ///
    /// Returns `BuildError::NoBuildSystemDetected` if neither a marker nor a
    /// fallback build script is present.
    pub fn detect(&self, root: &Path) -> Result<Detection, Error> {
        if !root.is_dir() {
            return Err(no_build_system(root));
        }

        let mut best: HashMap<BuildSystemId, Candidate> = HashMap::new();

        let walker = WalkDir::new(root)
            .max_depth(self.max_depth + 1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "failed to read directory entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            let Some(marker) = markers::lookup(file_name) else {
                continue;
            };

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let depth = entry.depth().saturating_sub(1);

            if markers::is_python(marker.build_system) && in_python_noise_dir(relative) {
                debug!(path = %relative.display(), "skipping sample python descriptor");
                continue;
            }

            let specificity = if marker.executable && !is_executable(&entry) {
                debug!(path = %relative.display(), "marker script is not executable");
                markers::NON_EXECUTABLE_SPECIFICITY
            } else {
                marker.specificity
            };
            let bonus = if depth == 0 { ROOT_BONUS } else { 0 };
            let penalty = i32::try_from(depth).unwrap_or(i32::MAX);
            let score = (specificity + bonus).saturating_sub(penalty);
            let candidate = Candidate {
                build_system: marker.build_system,
                score,
                marker: relative.to_path_buf(),
                depth,
            };
            debug!(
                build_system = %candidate.build_system,
                marker = %candidate.marker.display(),
                score,
                "found build marker"
            );

            match best.entry(marker.build_system) {
                Entry::Occupied(mut slot) => {
                    let current = slot.get();
                    if (candidate.score, Reverse(candidate.depth)) > (current.score, Reverse(current.depth)) {
                        slot.insert(candidate);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
            }
        }

        let mut candidates: Vec<Candidate> = best.into_values().collect();
        if candidates.is_empty() {
            candidates.extend(fallback(root));
        }
        if candidates.is_empty() {
            return Err(no_build_system(root));
        }

        candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.build_system.priority().cmp(&b.build_system.priority()))
        });

        Ok(Detection {
            root: root.to_path_buf(),
            candidates,
        })
    }
}

fn no_build_system(root: &Path) -> Error {
    BuildError::NoBuildSystemDetected {
        path: root.display().to_string(),
    }
    .into()
}

#[cfg(unix)]
fn is_executable(entry: &DirEntry) -> bool {
    use std::os::unix::fs::PermissionsExt;

    entry
        .metadata()
        .is_ok_and(|metadata| metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_entry: &DirEntry) -> bool {
    true
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || markers::SKIPPED_DIRS.contains(&name))
}

fn in_python_noise_dir(relative: &Path) -> bool {
    relative.parent().is_some_and(|parent| {
        parent.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| markers::PYTHON_NOISE_DIRS.contains(&name.to_lowercase().as_str()))
        })
    })
}

/// Script-driven builds, then loose python trees
fn fallback(root: &Path) -> Option<Candidate> {
    if let Some(script) = markers::SCRIPT_MARKERS
        .iter()
        .find(|name| root.join(name).is_file())
    {
        return Some(Candidate {
            build_system: BuildSystemId::Script,
            score: 0,
            marker: PathBuf::from(script),
            depth: 0,
        });
    }

    let has_requirements = root.join("requirements.txt").is_file();
    let has_python_sources = WalkDir::new(root)
        .max_depth(2)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .any(|entry| entry.path().extension().is_some_and(|ext| ext == "py"));
    if has_requirements && has_python_sources {
        return Some(Candidate {
            build_system: BuildSystemId::Pyproject,
            score: 0,
            marker: PathBuf::from("requirements.txt"),
            depth: 0,
        });
    }
    None
}
