//! Package-shape identifiers: subpackage keys, lifecycle phases, flag values

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Key selecting the main package or one of its subpackages
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PackageKey {
    #[default]
    Main,
    Sub(String),
}

impl PackageKey {
    const MAIN: &'static str = "@main";

    pub fn sub(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() || name == Self::MAIN {
            Self::Main
        } else {
            Self::Sub(name)
        }
    }

    #[must_use]
    pub fn is_main(&self) -> bool {
        matches!(self, Self::Main)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Main => Self::MAIN,
            Self::Sub(name) => name,
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for PackageKey {
    fn from(s: &str) -> Self {
        Self::sub(s)
    }
}

impl From<Option<&str>> for PackageKey {
    fn from(s: Option<&str>) -> Self {
        s.map_or(Self::Main, Self::sub)
    }
}

impl Serialize for PackageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PackageKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::sub(s))
    }
}

/// Build lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Prep,
    Configure,
    Build,
    Install,
    Check,
    Clean,
}

impl Phase {
    pub const ALL: [Self; 6] = [
        Self::Prep,
        Self::Configure,
        Self::Build,
        Self::Install,
        Self::Check,
        Self::Clean,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prep => "prep",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
            Self::Check => "check",
            Self::Clean => "clean",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a build-tool flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    List(Vec<String>),
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FlagValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Ownership and mode annotation on a packaged file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileAttr {
    pub mode: String,
    pub user: String,
    pub group: String,
}

impl FileAttr {
    /// The annotation given to setuid-listed files
    #[must_use]
    pub fn setuid_root() -> Self {
        Self {
            mode: "4755".to_string(),
            user: "root".to_string(),
            group: "root".to_string(),
        }
    }
}

impl fmt::Display for FileAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%attr({},{},{})", self.mode, self.user, self.group)
    }
}
