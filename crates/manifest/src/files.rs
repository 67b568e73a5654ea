//! Per-subpackage file sets
//!
//! A path is held by at most one subpackage at a time. Assigning it somewhere
//! else moves it.

use crate::Manifest;
use pkgmend_types::{FileAttr, PackageKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A packaged path with an optional ownership/mode annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<FileAttr>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attr: None,
        }
    }

    pub fn with_attr(path: impl Into<String>, attr: FileAttr) -> Self {
        Self {
            path: path.into(),
            attr: Some(attr),
        }
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attr {
            Some(attr) => write!(f, "{attr} {}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

impl Manifest {
    /// Subpackage currently holding `path`
    #[must_use]
    pub fn file_owner(&self, path: &str) -> Option<&PackageKey> {
        self.files
            .iter()
            .find(|(_, entries)| entries.iter().any(|entry| entry.path == path))
            .map(|(key, _)| key)
    }

    #[must_use]
    pub fn is_file_blacklisted(&self, path: &str) -> bool {
        self.file_blacklist.contains(path)
    }

    /// Place `entry` in `package`, taking it out of any other subpackage.
    ///
    /// Returns false when the entry was already there unchanged or the path is
    /// blacklisted.
    pub fn assign_file(&mut self, entry: FileEntry, package: PackageKey) -> bool {
        if self.is_file_blacklisted(&entry.path) {
            return false;
        }
        if self
            .files
            .get(&package)
            .is_some_and(|entries| entries.contains(&entry))
        {
            return false;
        }
        self.take_file(&entry.path);
        self.files.entry(package).or_default().insert(entry);
        true
    }

    /// Remove `path` from whichever subpackage holds it
    pub fn take_file(&mut self, path: &str) -> Option<(PackageKey, FileEntry)> {
        let mut found = None;
        for (key, entries) in &mut self.files {
            if let Some(entry) = entries.iter().find(|entry| entry.path == path).cloned() {
                entries.remove(&entry);
                found = Some((key.clone(), entry));
                break;
            }
        }
        self.files.retain(|_, entries| !entries.is_empty());
        found
    }

    /// Remove `path` from the file sets and never package it again.
    ///
    /// Returns false when the path was already blacklisted.
    pub fn blacklist_file(&mut self, path: &str) -> bool {
        self.take_file(path);
        self.excludes.remove(path);
        self.file_blacklist.insert(path.to_string())
    }

    pub fn add_exclude(&mut self, path: impl Into<String>) -> bool {
        self.excludes.insert(path.into())
    }

    pub fn add_locale(&mut self, domain: impl Into<String>) -> bool {
        self.locales.insert(domain.into())
    }

    /// Every packaged entry with its owner
    pub fn file_entries(&self) -> impl Iterator<Item = (&PackageKey, &FileEntry)> {
        self.files
            .iter()
            .flat_map(|(key, entries)| entries.iter().map(move |entry| (key, entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassignment_moves_path() {
        let mut manifest = Manifest::new("foo", "1.0");
        assert!(manifest.assign_file(FileEntry::new("/usr/lib64/libfoo.so"), PackageKey::Main));
        assert!(manifest.assign_file(
            FileEntry::new("/usr/lib64/libfoo.so"),
            PackageKey::sub("dev")
        ));
        assert_eq!(
            manifest.file_owner("/usr/lib64/libfoo.so"),
            Some(&PackageKey::sub("dev"))
        );
        assert_eq!(manifest.file_entries().count(), 1);
    }

    #[test]
    fn blacklisted_path_is_not_reassigned() {
        let mut manifest = Manifest::new("foo", "1.0");
        manifest.assign_file(FileEntry::new("/usr/share/foo"), PackageKey::Main);
        assert!(manifest.blacklist_file("/usr/share/foo"));
        assert!(!manifest.blacklist_file("/usr/share/foo"));
        assert_eq!(manifest.file_owner("/usr/share/foo"), None);
        assert!(!manifest.assign_file(FileEntry::new("/usr/share/foo"), PackageKey::Main));
    }

    #[test]
    fn attribute_change_counts_as_change() {
        let mut manifest = Manifest::new("foo", "1.0");
        manifest.assign_file(FileEntry::new("/usr/bin/su"), PackageKey::Main);
        assert!(manifest.assign_file(
            FileEntry::with_attr("/usr/bin/su", FileAttr::setuid_root()),
            PackageKey::Main
        ));
        assert_eq!(manifest.file_entries().count(), 1);
    }
}
