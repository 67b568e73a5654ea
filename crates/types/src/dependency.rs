//! Namespaced dependency identifiers
//!
//! A dependency is a bare package name or a name qualified by the ecosystem
//! it lives in. The namespace is part of the identity, so `pkgconfig(zlib)`
//! and `pypi(zlib)` never compare equal.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Ecosystem a dependency identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Bare,
    Pkgconfig,
    Pypi,
    Perl,
    Maven,
    Golang,
    R,
    Rubygem,
}

impl Namespace {
    /// Wrapper prefix used in the rendered `prefix(name)` form
    fn wrapper(self) -> Option<&'static str> {
        match self {
            Self::Pkgconfig => Some("pkgconfig"),
            Self::Pypi => Some("pypi"),
            Self::Perl => Some("perl"),
            Self::Maven => Some("mvn"),
            Self::Golang => Some("golang"),
            Self::Rubygem => Some("rubygem"),
            Self::Bare | Self::R => None,
        }
    }

    const WRAPPED: [Self; 6] = [
        Self::Pkgconfig,
        Self::Pypi,
        Self::Perl,
        Self::Maven,
        Self::Golang,
        Self::Rubygem,
    ];
}

/// A build or runtime requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dependency {
    namespace: Namespace,
    name: String,
}

impl Dependency {
    /// Create a dependency in the given namespace without normalization
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into().trim().to_string(),
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(Namespace::Bare, name)
    }

    pub fn pkgconfig(module: impl Into<String>) -> Self {
        Self::new(Namespace::Pkgconfig, module)
    }

    /// Python distributions are compared lowercase with `-` folded to `_`
    pub fn pypi(module: impl Into<String>) -> Self {
        let name = module.into().trim().to_lowercase().replace('-', "_");
        Self::new(Namespace::Pypi, name)
    }

    /// Perl modules drop the bundled `inc::` prefix
    pub fn perl(module: impl Into<String>) -> Self {
        let module = module.into();
        let name = module.trim().trim_start_matches("inc::").to_string();
        Self::new(Namespace::Perl, name)
    }

    pub fn maven(artifact: impl Into<String>) -> Self {
        Self::new(Namespace::Maven, artifact)
    }

    pub fn golang(import_path: impl Into<String>) -> Self {
        Self::new(Namespace::Golang, import_path)
    }

    pub fn r(package: impl Into<String>) -> Self {
        Self::new(Namespace::R, package)
    }

    pub fn rubygem(gem: impl Into<String>) -> Self {
        Self::new(Namespace::Rubygem, gem)
    }

    #[must_use]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Namespace::Bare => f.write_str(&self.name),
            Namespace::R => write!(f, "R-{}", self.name),
            ns => match ns.wrapper() {
                Some(prefix) => write!(f, "{prefix}({})", self.name),
                None => f.write_str(&self.name),
            },
        }
    }
}

impl FromStr for Dependency {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for ns in Namespace::WRAPPED {
            let Some(prefix) = ns.wrapper() else { continue };
            if let Some(inner) = s
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('('))
                .and_then(|rest| rest.strip_suffix(')'))
            {
                return Ok(Self::new(ns, inner));
            }
        }
        if let Some(package) = s.strip_prefix("R-") {
            return Ok(Self::r(package));
        }
        Ok(Self::bare(s))
    }
}

impl From<&str> for Dependency {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(dep) => dep,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Dependency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Dependency::from(s.as_str()))
    }
}
