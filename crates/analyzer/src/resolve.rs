//! Mapping of file paths to the packages that own them

use pkgmend_errors::{CatalogError, Error};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Answers "which package ships this file"
pub trait PackageResolver: Send + Sync {
    fn owner_of(&self, path: &str) -> Option<String>;
}

/// Resolver that knows nothing; every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl PackageResolver for NoResolver {
    fn owner_of(&self, _path: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OwnerFile {
    files: HashMap<String, String>,
}

/// Static file-to-package index loaded from TOML:
///
/// ```toml
/// [files]
/// "/usr/lib64/libz.so" = "zlib-devel"
/// "/usr/include/zlib.h" = "zlib-devel"
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileOwnerIndex {
    owners: HashMap<String, String>,
}

impl FileOwnerIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns an error if the content is not a valid owner index.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        let file: OwnerFile = toml::from_str(content).map_err(|e| CatalogError::ParseError {
            message: format!("file owner index: {e}"),
        })?;
        Ok(Self { owners: file.files })
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| CatalogError::NotFound {
                path: path.display().to_string(),
            })?;
        let index = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), entries = index.len(), "loaded file owner index");
        Ok(index)
    }

    pub fn insert(&mut self, path: impl Into<String>, package: impl Into<String>) {
        self.owners.insert(path.into(), package.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl PackageResolver for FileOwnerIndex {
    fn owner_of(&self, path: &str) -> Option<String> {
        self.owners.get(path).cloned()
    }
}

const LIBRARY_DIRS: &[&str] = &["/usr/lib64", "/usr/lib"];
const HEADER_DIRS: &[&str] = &["/usr/include"];
const BINARY_DIRS: &[&str] = &["/usr/bin", "/usr/sbin"];

/// Candidate files a name would live at under the usual layout
///
/// `-lfoo` becomes the shared library, `foo.h` a header, anything else an
/// executable.
#[must_use]
pub fn candidate_paths(name: &str) -> Vec<String> {
    if let Some(lib) = name.strip_prefix("-l") {
        return LIBRARY_DIRS
            .iter()
            .map(|dir| format!("{dir}/lib{lib}.so"))
            .collect();
    }
    let is_header = [".h", ".hpp", ".hxx", ".h++"]
        .iter()
        .any(|ext| name.ends_with(ext));
    let dirs = if is_header { HEADER_DIRS } else { BINARY_DIRS };
    if name.contains(char::is_whitespace) {
        return Vec::new();
    }
    dirs.iter()
        .map(|dir| format!("{dir}/{}", name.trim_start_matches('/')))
        .collect()
}

/// First owning package among the candidate paths for `name`
pub fn guess_owner(resolver: &dyn PackageResolver, name: &str) -> Option<String> {
    candidate_paths(name)
        .iter()
        .find_map(|path| resolver.owner_of(path))
}
